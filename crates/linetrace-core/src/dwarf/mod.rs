//! # DWARF line tables
//!
//! A self-contained reader for the `.debug_line` section (DWARF versions 2
//! through 4, 32-bit format only). The reader never allocates more than the
//! bounded directory/file tables of the unit being examined, and keeps no
//! state between lookups.
//!
//! ```rust
//! use linetrace_core::dwarf::resolve_line;
//!
//! // An empty section never resolves
//! assert!(resolve_line(&[], 0x1000).is_none());
//! ```

pub mod header;
pub mod program;
pub mod registers;

pub use header::{join_path, FileEntry, LineProgramHeader, UnitSkip, MAX_RETAINED_ENTRIES};
pub use program::{resolve_line, LineRows, LineUnit, LineUnits, ScanStop, UnitMatch};
pub use registers::{LineRegisters, LineRow};
