//! [`ValueHandle`] implementation over a [`Snapshot`].

use std::fmt;

use crate::error::{Result, VisualizerError};
use crate::memory::image::MemoryImage;
use crate::memory::layout::{ScalarKind, TypeLayout, TypeTable, POINTER_SIZE};
use crate::types::Address;
use crate::value::ValueHandle;

/// Nesting depth past which generic rendering prints `{...}`.
const MAX_RENDER_DEPTH: usize = 4;

/// Array elements printed by generic rendering before eliding the rest.
const MAX_RENDER_ELEMENTS: usize = 16;

/// A memory image together with the layouts needed to interpret it.
#[derive(Debug, Clone)]
pub struct Snapshot
{
    /// Mapped bytes
    pub memory: MemoryImage,
    /// Type layouts
    pub types: TypeTable,
}

impl Snapshot
{
    /// Empty image with the fundamental types registered.
    #[must_use]
    pub fn new() -> Self
    {
        Self {
            memory: MemoryImage::new(),
            types: TypeTable::new(),
        }
    }

    /// Handle to the object of type `type_name` stored at `address`.
    ///
    /// Nothing is read until the handle is used.
    #[must_use]
    pub fn value(&self, type_name: &str, address: Address) -> ImageValue<'_>
    {
        ImageValue {
            snapshot: self,
            type_name: type_name.to_string(),
            location: Location::Memory(address),
        }
    }
}

impl Default for Snapshot
{
    fn default() -> Self
    {
        Self::new()
    }
}

/// Where a value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location
{
    /// Stored in the image at this address
    Memory(Address),
    /// Computed value not backed by memory (pointer arithmetic results,
    /// static constants)
    Immediate(u64),
}

/// Handle to a typed value in a [`Snapshot`].
#[derive(Clone)]
pub struct ImageValue<'a>
{
    snapshot: &'a Snapshot,
    type_name: String,
    location: Location,
}

impl fmt::Debug for ImageValue<'_>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.debug_struct("ImageValue")
            .field("type_name", &self.type_name)
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl<'a> ImageValue<'a>
{
    /// Where this value lives.
    #[must_use]
    pub fn location(&self) -> Location
    {
        self.location
    }

    /// Address of the value, if it is stored in memory.
    #[must_use]
    pub fn address(&self) -> Option<Address>
    {
        match self.location {
            Location::Memory(address) => Some(address),
            Location::Immediate(_) => None,
        }
    }

    fn layout(&self) -> Result<&'a TypeLayout>
    {
        let types: &'a TypeTable = &self.snapshot.types;
        types.get(&self.type_name)
    }

    fn memory(&self) -> &'a MemoryImage
    {
        &self.snapshot.memory
    }

    fn derived(&self, type_name: &str, location: Location) -> Self
    {
        Self {
            snapshot: self.snapshot,
            type_name: type_name.to_string(),
            location,
        }
    }

    fn mismatch(&self, expected: &'static str) -> VisualizerError
    {
        VisualizerError::TypeMismatch {
            type_name: self.type_name.clone(),
            expected,
        }
    }

    /// Address of an aggregate; aggregates are never immediate.
    fn base_address(&self) -> Result<Address>
    {
        self.address().ok_or_else(|| self.mismatch("stored in memory"))
    }

    /// Raw bits of a scalar or pointer of `size` bytes.
    ///
    /// `size` is checked for constants as well, since `sign_extend` relies on it.
    fn raw(&self, size: usize) -> Result<u64>
    {
        if !(1..=8).contains(&size) {
            return Err(VisualizerError::InvalidArgument(format!(
                "`{}` is a {size}-byte scalar",
                self.type_name
            )));
        }
        match self.location {
            Location::Memory(address) => self.memory().read_uint(address, size),
            Location::Immediate(value) => Ok(value),
        }
    }

    /// Pointer value and pointee type name.
    fn pointer_target(&self) -> Result<(Address, &'a str)>
    {
        let TypeLayout::Pointer { pointee } = self.layout()? else {
            return Err(self.mismatch("a pointer"));
        };
        Ok((Address::new(self.raw(POINTER_SIZE)?), pointee.as_str()))
    }

    fn render_depth(&self, depth: usize) -> Result<String>
    {
        if depth > MAX_RENDER_DEPTH {
            return Ok("{...}".to_string());
        }

        match self.layout()? {
            TypeLayout::Scalar { size, kind } => {
                let raw = self.raw(*size)?;
                Ok(match kind {
                    ScalarKind::Unsigned => raw.to_string(),
                    ScalarKind::Signed => sign_extend(raw, *size).to_string(),
                    ScalarKind::Char => render_char(raw),
                })
            }
            TypeLayout::Pointer { .. } => Ok(self.pointer_target()?.0.to_string()),
            TypeLayout::Array { element, count } => {
                let base = self.base_address()?;
                let stride = self.snapshot.types.size_of(element)? as u64;
                let mut parts = Vec::with_capacity((*count).min(MAX_RENDER_ELEMENTS));
                for index in 0..(*count).min(MAX_RENDER_ELEMENTS) {
                    let address = base
                        .checked_add(stride * index as u64)
                        .ok_or_else(|| self.mismatch("inside the address space"))?;
                    parts.push(self.derived(element, Location::Memory(address)).render_depth(depth + 1)?);
                }
                if *count > MAX_RENDER_ELEMENTS {
                    parts.push("...".to_string());
                }
                Ok(format!("{{{}}}", parts.join(", ")))
            }
            TypeLayout::Struct(layout) => {
                let mut parts = Vec::with_capacity(layout.fields.len());
                for field in &layout.fields {
                    let value = self.field(&field.name)?.render_depth(depth + 1)?;
                    parts.push(format!("{} = {value}", field.name));
                }
                Ok(format!("{{{}}}", parts.join(", ")))
            }
        }
    }
}

impl ValueHandle for ImageValue<'_>
{
    fn type_name(&self) -> &str
    {
        &self.type_name
    }

    fn field(&self, name: &str) -> Result<Self>
    {
        let TypeLayout::Struct(layout) = self.layout()? else {
            return Err(self.mismatch("a struct"));
        };

        if let Some(field) = layout.fields.iter().find(|field| field.name == name) {
            let address = self
                .base_address()?
                .checked_add(field.offset as u64)
                .ok_or_else(|| VisualizerError::LayoutViolation(format!("field `{name}` lies past the address space")))?;
            return Ok(self.derived(&field.type_name, Location::Memory(address)));
        }

        if let Some(constant) = layout.constants.iter().find(|constant| constant.name == name) {
            return Ok(self.derived(&constant.type_name, Location::Immediate(constant.value)));
        }

        Err(VisualizerError::FieldNotFound {
            type_name: self.type_name.clone(),
            field: name.to_string(),
        })
    }

    fn dereference(&self) -> Result<Self>
    {
        let (target, pointee) = self.pointer_target()?;
        let size = self.snapshot.types.size_of(pointee)?;
        if target.is_null() {
            return Err(VisualizerError::ReadFailed { address: 0, length: size });
        }
        // A dangling pointer fails here, like a debugger's memory read would.
        self.memory().read(target, size)?;
        Ok(self.derived(pointee, Location::Memory(target)))
    }

    fn offset(&self, count: i64) -> Result<Self>
    {
        let (target, pointee) = self.pointer_target()?;
        let stride = self.snapshot.types.size_of(pointee)?;
        let moved = i64::try_from(stride)
            .ok()
            .and_then(|stride| stride.checked_mul(count))
            .and_then(|bytes| target.checked_offset(bytes))
            .ok_or_else(|| {
                VisualizerError::LayoutViolation(format!("{target} + {count} elements leaves the address space"))
            })?;
        Ok(self.derived(&self.type_name, Location::Immediate(moved.value())))
    }

    fn pointer_distance(&self, end: &Self) -> Result<i64>
    {
        if self.type_name != end.type_name {
            return Err(end.mismatch("a pointer of the same type"));
        }
        let (begin, pointee) = self.pointer_target()?;
        let (finish, _) = end.pointer_target()?;

        let stride = i64::try_from(self.snapshot.types.size_of(pointee)?).unwrap_or(0);
        if stride == 0 {
            return Err(VisualizerError::LayoutViolation(format!("`{pointee}` has no size")));
        }
        let bytes = begin
            .distance_to(finish)
            .ok_or_else(|| VisualizerError::LayoutViolation(format!("{begin} and {finish} are too far apart")))?;
        if bytes % stride != 0 {
            return Err(VisualizerError::LayoutViolation(format!(
                "{bytes} bytes between {begin} and {finish} is not a whole number of `{pointee}`"
            )));
        }
        Ok(bytes / stride)
    }

    fn as_u64(&self) -> Result<u64>
    {
        match self.layout()? {
            TypeLayout::Scalar { size, kind } => {
                let raw = self.raw(*size)?;
                if *kind == ScalarKind::Signed && sign_extend(raw, *size) < 0 {
                    return Err(VisualizerError::LayoutViolation(format!(
                        "negative value {} in `{}` where a count was expected",
                        sign_extend(raw, *size),
                        self.type_name
                    )));
                }
                Ok(raw)
            }
            TypeLayout::Pointer { .. } => self.pointer_target().map(|(address, _)| address.value()),
            _ => Err(self.mismatch("an integer")),
        }
    }

    fn read_string(&self, length: usize) -> Result<String>
    {
        let start = match self.layout()? {
            TypeLayout::Pointer { .. } => self.pointer_target()?.0,
            TypeLayout::Array { .. } => self.base_address()?,
            _ => return Err(self.mismatch("a character buffer")),
        };
        let bytes = self.memory().read(start, length)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn render(&self) -> Result<String>
    {
        self.render_depth(0)
    }
}

/// Interpret the low `size` bytes of `raw` as a two's complement integer.
///
/// `size` must be 1 to 8.
fn sign_extend(raw: u64, size: usize) -> i64
{
    let shift = 64 - (size as u32) * 8;
    ((raw << shift) as i64) >> shift
}

fn render_char(raw: u64) -> String
{
    let byte = (raw & 0xff) as u8;
    if byte.is_ascii_graphic() || byte == b' ' {
        format!("'{}'", byte as char)
    } else {
        format!("'\\x{byte:02x}'")
    }
}
