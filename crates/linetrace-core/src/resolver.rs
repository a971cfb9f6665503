//! # Address Resolver
//!
//! The entry point tying the locator and the line interpreter together: given
//! a located image and an address, produce a source file and line.

use tracing::debug;

use crate::dwarf::resolve_line;
use crate::elf::ImageDescriptor;
use crate::types::{Address, LookupResult};

/// Resolve `address` to a source location using the image's `.debug_line`.
///
/// Images without `.debug_line`, and addresses no row covers, produce
/// [`LookupResult::NOT_FOUND`]. The descriptor is not modified, so lookups may
/// run concurrently against the same image.
///
/// ## Example
///
/// ```rust,no_run
/// use linetrace_core::{locate, resolve};
///
/// # fn example(image: &[u8]) -> linetrace_core::LinetraceResult<()> {
/// let descriptor = locate(image)?;
/// let result = resolve(&descriptor, 0xffff_ffff_8010_0000u64);
/// println!("{result}");
/// # Ok(())
/// # }
/// ```
pub fn resolve(descriptor: &ImageDescriptor<'_>, address: impl Into<Address>) -> LookupResult
{
    let address = address.into();
    let Some(debug_line) = descriptor.debug_line() else {
        debug!(%address, "image has no .debug_line");
        return LookupResult::NOT_FOUND;
    };
    LookupResult::from(resolve_line(debug_line, address.value()))
}
