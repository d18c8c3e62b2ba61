//! `std::__1::basic_string<char>` visualizer.
//!
//! libc++ stores strings with the small-string optimization. The object is a
//! union of two forms that share their first byte:
//!
//! ```text
//! __l (long):  [ __cap_ | long bit ][ __size_ ][ __data_ -> heap ]
//! __s (short): [ __size_ << 1 ][ __data_[inline capacity + 1] ]
//! ```
//!
//! On little-endian targets the low bit of the first byte is the long-form
//! flag. In short form the same byte holds the length shifted left by one.

use tracing::warn;

use super::DisplayHint;
use crate::error::{Result, VisualizerError};
use crate::value::ValueHandle;

/// Bit-packing contract for the string discriminant.
///
/// The values are tied to the target's word size and byte order, so they are
/// spelled out here instead of being inferred from the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringLayout
{
    /// Mask applied to the short-form size byte; a non-zero result means long form.
    pub long_flag_mask: u64,
    /// Right shift that recovers the short-form length from the size byte.
    pub short_size_shift: u32,
    /// Mask applied after the shift.
    pub short_size_mask: u64,
    /// Maximum number of characters the inline buffer holds.
    pub short_capacity: u64,
    /// Fixed offset added to the stored long-form size.
    pub long_size_bias: u64,
}

impl StringLayout
{
    /// libc++ on a 64-bit little-endian target.
    pub const LIBCXX: Self = Self::for_word_size(8);

    /// Layout for a little-endian target with the given word size in bytes.
    ///
    /// The inline buffer spans the three words of the long form minus the
    /// size byte and the terminating NUL: 22 characters on 64-bit targets,
    /// 10 on 32-bit ones.
    #[must_use]
    pub const fn for_word_size(word_size: u64) -> Self
    {
        Self {
            long_flag_mask: 0x1,
            short_size_shift: 1,
            short_size_mask: 0xff,
            short_capacity: 3 * word_size - 2,
            long_size_bias: 1,
        }
    }

    /// Whether a short-form size byte flags the long form.
    #[must_use]
    pub const fn is_long(&self, size_field: u64) -> bool
    {
        size_field & self.long_flag_mask != 0
    }

    /// Length encoded in a short-form size byte.
    ///
    /// ## Errors
    ///
    /// `LayoutViolation` if the decoded length exceeds the inline capacity.
    pub fn short_length(&self, size_field: u64) -> Result<u64>
    {
        let length = (size_field >> self.short_size_shift) & self.short_size_mask;
        if length > self.short_capacity {
            return Err(VisualizerError::LayoutViolation(format!(
                "short string length {length} exceeds inline capacity {}",
                self.short_capacity
            )));
        }
        Ok(length)
    }

    /// Length recorded by a long-form size word.
    ///
    /// ## Errors
    ///
    /// `LayoutViolation` if applying the bias overflows.
    pub fn long_length(&self, stored_size: u64) -> Result<u64>
    {
        stored_size.checked_add(self.long_size_bias).ok_or_else(|| {
            VisualizerError::LayoutViolation(format!("long string size {stored_size} overflows"))
        })
    }
}

impl Default for StringLayout
{
    fn default() -> Self
    {
        Self::LIBCXX
    }
}

/// Renders a string as a quoted literal.
#[derive(Debug, Clone)]
pub struct StringVisualizer<V>
{
    type_name: String,
    value: V,
    layout: StringLayout,
}

impl<V: ValueHandle> StringVisualizer<V>
{
    /// Bind to a string value using the default libc++ layout.
    pub fn new(type_name: impl Into<String>, value: V) -> Self
    {
        Self::with_layout(type_name, value, StringLayout::LIBCXX)
    }

    /// Bind to a string value with an explicit layout contract.
    pub fn with_layout(type_name: impl Into<String>, value: V, layout: StringLayout) -> Self
    {
        Self {
            type_name: type_name.into(),
            value,
            layout,
        }
    }

    /// Type name this visualizer was bound with.
    pub fn type_name(&self) -> &str
    {
        &self.type_name
    }

    /// Locate the character buffer and its length.
    fn buffer(&self) -> Result<(V, u64)>
    {
        let rep = self.value.field_path(&["__r_", "__first_"])?;
        let short = rep.field("__s")?;
        let size_field = short.field("__size_")?.as_u64()?;

        if self.layout.is_long(size_field) {
            let long = rep.field("__l")?;
            let length = self.layout.long_length(long.field("__size_")?.as_u64()?)?;
            Ok((long.field("__data_")?, length))
        } else {
            let length = self.layout.short_length(size_field).inspect_err(|err| {
                warn!(type_name = %self.type_name, "{err}");
            })?;
            Ok((short.field("__data_")?, length))
        }
    }

    /// Number of characters in the string.
    ///
    /// ## Errors
    ///
    /// Read failures on the representation, or a packed length that breaks
    /// the layout contract.
    pub fn length(&self) -> Result<u64>
    {
        self.buffer().map(|(_, length)| length)
    }

    /// The string contents, exactly `length()` characters.
    ///
    /// ## Errors
    ///
    /// Read failures on the representation or the character buffer.
    pub fn text(&self) -> Result<String>
    {
        let (data, length) = self.buffer()?;
        let length = usize::try_from(length)
            .map_err(|_| VisualizerError::LayoutViolation(format!("string length {length} exceeds address space")))?;
        data.read_string(length)
    }

    /// `"contents"`, delimited by double quotes. An empty string renders as `""`.
    ///
    /// ## Errors
    ///
    /// Same as [`StringVisualizer::text`].
    pub fn summary(&self) -> Result<String>
    {
        Ok(format!("\"{}\"", self.text()?))
    }

    /// Strings are always string-like.
    pub fn display_hint(&self) -> Option<DisplayHint>
    {
        Some(DisplayHint::String)
    }
}
