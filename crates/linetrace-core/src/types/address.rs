//! Instruction address type.

use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::error::LinetraceError;

/// Strongly typed instruction address
///
/// This wrapper around `u64` keeps addresses apart from the other `u64`
/// values flying around an image (offsets, sizes, symbol values).
///
/// Addresses are link-time addresses of the image being examined: the same
/// address space as `DW_LNE_set_address` operands and symbol values. A caller
/// holding a runtime address of a relocated image subtracts the load bias
/// first.
///
/// ## Example
///
/// ```rust
/// use linetrace_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// let next_addr = addr + 0x100; // Add offset
/// assert_eq!(next_addr.value(), 0x1100);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// The null address (0x0)
    ///
    /// Line tables never resolve it: rows at address zero are never treated
    /// as a match.
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    ///
    /// ## Example
    ///
    /// ```rust
    /// use linetrace_core::types::Address;
    ///
    /// const KERNEL_BASE: Address = Address::new(0xffff_ffff_8000_0000);
    /// ```
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Subtract an offset from this address, checking for underflow
    ///
    /// Used to turn a runtime address into a link-time one.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use linetrace_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_sub(0x100), Some(Address::from(0xf00)));
    /// assert_eq!(addr.checked_sub(u64::MAX), None); // Underflow
    /// ```
    pub fn checked_sub(self, offset: u64) -> Option<Self>
    {
        self.0.checked_sub(offset).map(Address)
    }

    /// Distance from `base` up to this address, if `base` is not above it.
    pub fn offset_from(self, base: Address) -> Option<u64>
    {
        self.0.checked_sub(base.0)
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

impl fmt::LowerHex for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Parse `0x`-prefixed hexadecimal or plain decimal.
///
/// ```rust
/// use linetrace_core::types::Address;
///
/// assert_eq!("0xffffffff81000000".parse::<Address>().unwrap().value(), 0xffff_ffff_8100_0000);
/// assert_eq!("4096".parse::<Address>().unwrap().value(), 4096);
/// assert!("0xnope".parse::<Address>().is_err());
/// ```
impl FromStr for Address
{
    type Err = LinetraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
            None => trimmed.replace('_', "").parse::<u64>(),
        };
        parsed
            .map(Address)
            .map_err(|err| LinetraceError::InvalidAddress(format!("{s}: {err}")))
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}

impl Sub<u64> for Address
{
    type Output = Address;

    fn sub(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_sub(rhs))
    }
}
