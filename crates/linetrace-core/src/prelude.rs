//! Common module for library exports

pub use crate::dwarf::{resolve_line, LineUnit, LineUnits};
pub use crate::elf::{locate, DebugSection, ImageDescriptor};
pub use crate::error::{LinetraceError, LinetraceResult};
pub use crate::resolver::resolve;
pub use crate::symbolizer::{Symbolication, Symbolizer};
pub use crate::types::{Address, LookupResult, SourceLine, SymbolName};
