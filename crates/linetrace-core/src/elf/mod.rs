//! # ELF images
//!
//! Little-endian ELF64 parsing: just enough of the format to find the symbol
//! table and the DWARF sections of a loaded kernel or module image.

pub mod header;
pub mod locator;
pub mod symbols;

pub use header::{Architecture, FileHeader, ProgramHeader, RawSymbol, SectionHeader};
pub use locator::{locate, DebugSection, ImageDescriptor, SectionRange, MAX_DEBUG_CANDIDATES};
pub use symbols::{ElfSymbol, Symbols};
