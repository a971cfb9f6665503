//! Symbol name types.

use std::fmt;

/// Programming language associated with a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolLanguage
{
    /// Rust symbol (detected via mangling or namespace patterns).
    Rust,
    /// C++ symbol (Itanium mangling without Rust extensions).
    Cpp,
    /// C symbol or unmangled global.
    C,
}

impl fmt::Display for SymbolLanguage
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let label = match self {
            SymbolLanguage::Rust => "rust",
            SymbolLanguage::Cpp => "c++",
            SymbolLanguage::C => "c",
        };
        write!(f, "{label}")
    }
}

/// A function name from the symbol table with demangling metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolName
{
    raw: String,
    demangled: Option<String>,
    language: SymbolLanguage,
}

impl SymbolName
{
    /// Construct from a raw linkage name.
    pub fn new(raw: String, demangled: Option<String>, language: SymbolLanguage) -> Self
    {
        Self {
            raw,
            demangled,
            language,
        }
    }

    /// Raw (mangled) name as stored in `.strtab`.
    pub fn raw(&self) -> &str
    {
        &self.raw
    }

    /// Demangled human-friendly name if available.
    pub fn demangled(&self) -> Option<&str>
    {
        self.demangled.as_deref()
    }

    /// Preferred presentation (demangled fallback to raw).
    pub fn display_name(&self) -> &str
    {
        self.demangled.as_deref().unwrap_or(&self.raw)
    }

    pub fn language(&self) -> SymbolLanguage
    {
        self.language
    }
}

impl fmt::Display for SymbolName
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.display_name())
    }
}
