//! # Error Types
//!
//! Errors raised while locating sections in an ELF image.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.
//!
//! Only structural problems with the image itself are errors. Anomalies inside
//! a `.debug_line` section degrade the lookup result instead (see
//! [`crate::dwarf::ScanStop`] and [`crate::dwarf::UnitSkip`]), and an address
//! without line information is a normal "not found".

use thiserror::Error;

/// Main error type for image and address handling
///
/// ## Error Categories
///
/// 1. **Structural errors**: MalformedImage (fatal for the image, raised by `locate`)
/// 2. **Input errors**: InvalidAddress (address text that could not be parsed)
/// 3. **I/O errors**: Io (loading the image from disk)
#[derive(Error, Debug)]
pub enum LinetraceError
{
    /// The image cannot be used at all
    ///
    /// This happens when:
    /// - The buffer is shorter than an ELF header
    /// - The four magic bytes are not `\x7fELF`
    /// - The section header table lies outside the buffer
    /// - No symbol table, string table, or section-name string table exists
    #[error("Malformed ELF image: {0}")]
    MalformedImage(String),

    /// An address string could not be parsed
    ///
    /// Addresses are accepted as `0x`-prefixed hexadecimal or as decimal.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// I/O error while loading an image
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinetraceError
{
    pub(crate) fn malformed(reason: impl Into<String>) -> Self
    {
        Self::MalformedImage(reason.into())
    }
}

/// Convenience type alias for `Result<T, LinetraceError>`
///
/// ```rust
/// use linetrace_core::error::LinetraceResult;
/// fn foo() -> LinetraceResult<()>
/// {
///     Ok(())
/// }
/// ```
pub type LinetraceResult<T> = std::result::Result<T, LinetraceError>;
