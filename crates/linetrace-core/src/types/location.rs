//! Source location types.

use std::fmt;

/// A resolved source position: the joined `directory/name` path and line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLine
{
    pub file: String,
    pub line: u32,
}

impl fmt::Display for SourceLine
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Outcome of an address-to-line lookup.
///
/// Not finding an address is not an error: images without `.debug_line`, and
/// addresses no row covers, both produce [`LookupResult::NOT_FOUND`]. The
/// resolved path is owned by the result and released when it is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResult
{
    /// Resolved source path, `None` when nothing matched.
    pub file: Option<String>,
    /// Resolved line, 0 when nothing matched.
    pub line: u32,
}

impl LookupResult
{
    pub const NOT_FOUND: Self = Self { file: None, line: 0 };

    pub fn found(&self) -> bool
    {
        self.file.is_some()
    }

    /// Borrow the result as a `SourceLine`-like pair.
    pub fn location(&self) -> Option<(&str, u32)>
    {
        self.file.as_deref().map(|file| (file, self.line))
    }
}

impl From<Option<SourceLine>> for LookupResult
{
    fn from(location: Option<SourceLine>) -> Self
    {
        match location {
            Some(SourceLine { file, line }) => Self { file: Some(file), line },
            None => Self::NOT_FOUND,
        }
    }
}

impl From<LookupResult> for Option<SourceLine>
{
    fn from(result: LookupResult) -> Self
    {
        let line = result.line;
        result.file.map(|file| SourceLine { file, line })
    }
}

/// Formats like `addr2line`: `file:line`, or `??:0` when not found.
impl fmt::Display for LookupResult
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self.file {
            Some(file) => write!(f, "{file}:{}", self.line),
            None => f.write_str("??:0"),
        }
    }
}
