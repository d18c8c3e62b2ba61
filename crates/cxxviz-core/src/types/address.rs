//! Target memory address type.

use std::fmt;

/// Strongly typed address in the target's memory image
///
/// Visualizers never hold raw integers for locations: a pointer read out of a
/// container becomes an `Address`, and every step of pointer arithmetic goes
/// through the checked helpers below so a corrupted pointer surfaces as an
/// error instead of a silent wraparound.
///
/// ## Example
///
/// ```rust
/// use cxxviz_core::types::Address;
///
/// let node = Address::new(0x1000);
/// assert_eq!(node.checked_offset(-16), Some(Address::new(0xff0)));
/// assert_eq!(node.to_string(), "0x0000000000001000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address(u64);

impl Address
{
    /// The null address. Never mapped in a [`MemoryImage`](crate::memory::MemoryImage).
    pub const NULL: Self = Address(0);

    /// Create an address from a raw value (usable in const contexts).
    #[must_use]
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Raw value of this address.
    #[must_use]
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null address.
    #[must_use]
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an unsigned byte offset, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Move by a signed byte offset, returning `None` if the result leaves the
    /// 64-bit address space.
    ///
    /// ```rust
    /// use cxxviz_core::types::Address;
    ///
    /// assert_eq!(Address::new(8).checked_offset(-8), Some(Address::NULL));
    /// assert_eq!(Address::new(8).checked_offset(-9), None);
    /// ```
    #[must_use]
    pub fn checked_offset(self, offset: i64) -> Option<Self>
    {
        self.0.checked_add_signed(offset).map(Address)
    }

    /// Signed byte distance from `self` to `end` (`end - self`).
    ///
    /// Returns `None` when the distance does not fit in an `i64`.
    #[must_use]
    pub fn distance_to(self, end: Address) -> Option<i64>
    {
        let delta = i128::from(end.0) - i128::from(self.0);
        i64::try_from(delta).ok()
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}
