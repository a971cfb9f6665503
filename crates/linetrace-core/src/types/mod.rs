//! # Types
//!
//! Value types shared by the locator, the line interpreter and the
//! symbolizer.

pub mod address;
pub mod location;
pub mod symbols;

// Re-export all public types
pub use address::Address;
pub use location::{LookupResult, SourceLine};
pub use symbols::{SymbolLanguage, SymbolName};
