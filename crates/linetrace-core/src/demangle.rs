//! Symbol demangling.
//!
//! Names in a kernel image come from Rust (legacy `_ZN...E` and v0 `_R...`
//! mangling), from C++ support code (Itanium `_Z...`), and from plain C or
//! assembly. `rustc_demangle` handles both Rust schemes; anything it rejects
//! keeps its raw name.

use rustc_demangle::try_demangle;

use crate::types::{SymbolLanguage, SymbolName};

/// Build a [`SymbolName`] from the bytes stored in `.strtab`.
///
/// Invalid UTF-8 is replaced rather than rejected so every symbol still gets a
/// printable name.
pub(crate) fn make_symbol_name(raw: &[u8]) -> SymbolName
{
    let raw = String::from_utf8_lossy(raw).into_owned();
    // `{:#}` drops the trailing `::h<hash>` of legacy names
    let demangled = try_demangle(&raw).ok().map(|name| format!("{name:#}"));
    let language = detect_language(&raw, demangled.is_some());

    SymbolName::new(raw, demangled, language)
}

fn detect_language(raw: &str, demangled_as_rust: bool) -> SymbolLanguage
{
    if raw.starts_with("_R") || (raw.starts_with("_ZN") && demangled_as_rust) || raw.contains("::") {
        SymbolLanguage::Rust
    } else if raw.starts_with("_Z") {
        SymbolLanguage::Cpp
    } else {
        SymbolLanguage::C
    }
}
