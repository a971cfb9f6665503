//! # linetrace-core
//!
//! Address-to-source resolution for loaded kernel and module images.
//!
//! This crate provides the pieces a panic handler or an offline tool needs to
//! turn instruction addresses into `file:line`:
//! - Locating the symbol table, string tables and DWARF sections of an ELF64 image
//! - Interpreting `.debug_line` programs (DWARF 2 through 4)
//! - Matching addresses to function symbols and demangling their names
//!
//! Everything operates on a borrowed byte buffer. Nothing is copied, cached or
//! allocated beyond the small per-unit tables and the resolved path.
//!
//! ## Example
//!
//! ```rust,no_run
//! use linetrace_core::{locate, resolve};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>>
//! {
//!     let image = std::fs::read("kernel.elf")?;
//!     let descriptor = locate(&image)?;
//!     let result = resolve(&descriptor, 0xffff_ffff_8010_2a4cu64);
//!     println!("{result}");
//!     Ok(())
//! }
//! ```

mod demangle;
pub mod dwarf;
pub mod elf;
pub mod error;
pub mod prelude;
pub mod reader;
pub mod resolver;
pub mod symbolizer;
pub mod types;

pub use elf::{locate, ImageDescriptor};
// Re-export commonly used types
pub use error::{LinetraceError, LinetraceResult};
pub use resolver::resolve;
pub use symbolizer::{Symbolication, Symbolizer};
pub use types::{Address, LookupResult};
