//! # Image Section Locator
//!
//! Builds an [`ImageDescriptor`] from the raw bytes of a loaded ELF64 image.
//!
//! A single pass over the section header table records the symbol table, its
//! string table and the section-name string table, and collects every section
//! whose type, flags and alignment look like DWARF data. A second pass names
//! those candidates and assigns the six debug sections the resolver knows
//! about.
//!
//! ## Example
//!
//! ```rust,no_run
//! use linetrace_core::elf::{locate, DebugSection};
//!
//! # fn example(image: &[u8]) -> linetrace_core::LinetraceResult<()> {
//! let descriptor = locate(image)?;
//! if let Some(range) = descriptor.debug_section(DebugSection::Line) {
//!     println!(".debug_line at {:#x}, {} bytes", range.offset, range.size);
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::ops::Range;

use object::elf::{ELFMAG, SHF_MERGE, SHF_STRINGS, SHT_PROGBITS, SHT_STRTAB, SHT_SYMTAB};
use smallvec::SmallVec;
use tracing::{debug, warn};

use super::header::{FileHeader, ProgramHeader, SectionHeader, FILE_HEADER_SIZE, PROGRAM_HEADER_SIZE, SECTION_HEADER_SIZE};
use crate::error::{LinetraceError, LinetraceResult};
use crate::reader::ByteReader;

/// Inline capacity of the debug-section candidate list.
pub const MAX_DEBUG_CANDIDATES: usize = 16;

/// The debug sections the locator records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugSection
{
    Info,
    Abbrev,
    LocList,
    Line,
    Str,
    LineStr,
}

impl DebugSection
{
    pub const ALL: [DebugSection; 6] = [
        DebugSection::Info,
        DebugSection::Abbrev,
        DebugSection::LocList,
        DebugSection::Line,
        DebugSection::Str,
        DebugSection::LineStr,
    ];

    pub fn name(self) -> &'static str
    {
        match self {
            DebugSection::Info => ".debug_info",
            DebugSection::Abbrev => ".debug_abbrev",
            DebugSection::LocList => ".debug_loclists",
            DebugSection::Line => ".debug_line",
            DebugSection::Str => ".debug_str",
            DebugSection::LineStr => ".debug_line_str",
        }
    }

    /// Match a section name. The location-list section is also accepted under
    /// its singular spelling.
    pub fn from_name(name: &[u8]) -> Option<Self>
    {
        match name {
            b".debug_info" => Some(DebugSection::Info),
            b".debug_abbrev" => Some(DebugSection::Abbrev),
            b".debug_loclists" | b".debug_loclist" => Some(DebugSection::LocList),
            b".debug_line" => Some(DebugSection::Line),
            b".debug_str" => Some(DebugSection::Str),
            b".debug_line_str" => Some(DebugSection::LineStr),
            _ => None,
        }
    }

    fn slot(self) -> usize
    {
        self as usize
    }
}

impl fmt::Display for DebugSection
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(self.name())
    }
}

/// File offset and size of a section known to lie inside the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionRange
{
    pub offset: usize,
    pub size: usize,
}

impl SectionRange
{
    fn of(header: &SectionHeader, image_len: usize) -> Option<Self>
    {
        header.file_range(image_len).map(|range| Self {
            offset: range.start,
            size: range.len(),
        })
    }

    pub fn range(&self) -> Range<usize>
    {
        self.offset..self.offset + self.size
    }
}

/// Borrowed view of a loaded ELF image with its interesting sections located.
///
/// The descriptor never copies the image; it is immutable once built and
/// lives no longer than the bytes it was built from.
#[derive(Debug, Clone)]
pub struct ImageDescriptor<'data>
{
    data: &'data [u8],
    header: FileHeader,
    sections: Vec<SectionHeader>,
    symtab: SectionHeader,
    symtab_range: SectionRange,
    strtab: SectionRange,
    shstrtab: SectionRange,
    debug: [Option<SectionRange>; 6],
}

/// Locate the symbol table, string tables and debug sections of an image.
///
/// ## Errors
///
/// Returns [`LinetraceError::MalformedImage`] if:
/// - `image` is shorter than an ELF header or the magic does not match
/// - the section header table does not lie inside `image`
/// - there is no symbol table, its string table is missing, or the
///   section-name string table is missing
pub fn locate(image: &[u8]) -> LinetraceResult<ImageDescriptor<'_>>
{
    if image.len() < FILE_HEADER_SIZE {
        return Err(LinetraceError::malformed(format!(
            "image is {} bytes, shorter than an ELF header",
            image.len()
        )));
    }
    let header = FileHeader::parse(image).ok_or_else(|| LinetraceError::malformed("unreadable ELF header"))?;
    if header.magic() != ELFMAG {
        return Err(LinetraceError::malformed("invalid ELF magic"));
    }

    let sections = read_section_headers(image, &header)?;

    let mut symtab = None;
    let mut shstrtab = None;
    let mut candidates: SmallVec<[usize; MAX_DEBUG_CANDIDATES]> = SmallVec::new();

    for section in &sections {
        if section.kind == SHT_SYMTAB {
            // A later symbol table replaces an earlier one
            symtab = Some(*section);
        } else if section.kind == SHT_STRTAB && section.index == usize::from(header.shstrndx) {
            shstrtab = Some(*section);
        }

        if looks_like_debug_data(section) {
            candidates.push(section.index);
        }
    }

    let symtab = symtab.ok_or_else(|| LinetraceError::malformed("no symbol table found"))?;
    let strtab = usize::try_from(symtab.link)
        .ok()
        .and_then(|link| sections.get(link))
        .ok_or_else(|| LinetraceError::malformed("no string table found"))?;
    let shstrtab = shstrtab.ok_or_else(|| LinetraceError::malformed("no section header string table found"))?;

    let symtab_range = required_range(&symtab, image.len(), "symbol table")?;
    let strtab = required_range(strtab, image.len(), "string table")?;
    let shstrtab = required_range(&shstrtab, image.len(), "section header string table")?;

    let mut debug_sections = [None; 6];
    let names = &image[shstrtab.range()];
    for index in candidates {
        let section = &sections[index];
        let Some(kind) = string_at(names, section.name).and_then(DebugSection::from_name) else {
            continue;
        };
        match SectionRange::of(section, image.len()) {
            Some(range) => {
                if debug_sections[kind.slot()].is_some() {
                    debug!(section = %kind, index, "duplicate debug section, keeping the later one");
                }
                debug_sections[kind.slot()] = Some(range);
            }
            None => warn!(section = %kind, index, "debug section lies outside the image, ignoring it"),
        }
    }

    debug!(
        sections = sections.len(),
        symtab = symtab.index,
        has_debug_line = debug_sections[DebugSection::Line.slot()].is_some(),
        "located image sections"
    );

    Ok(ImageDescriptor {
        data: image,
        header,
        sections,
        symtab,
        symtab_range,
        strtab,
        shstrtab,
        debug: debug_sections,
    })
}

fn read_section_headers(image: &[u8], header: &FileHeader) -> LinetraceResult<Vec<SectionHeader>>
{
    let count = usize::from(header.shnum);
    let table = usize::try_from(header.shoff)
        .ok()
        .and_then(|start| Some(start..start.checked_add(count.checked_mul(SECTION_HEADER_SIZE)?)?))
        .and_then(|range| image.get(range))
        .ok_or_else(|| {
            LinetraceError::malformed(format!(
                "section header table ({count} entries at {:#x}) lies outside the image",
                header.shoff
            ))
        })?;

    table
        .chunks_exact(SECTION_HEADER_SIZE)
        .enumerate()
        .map(|(index, entry)| {
            SectionHeader::parse(index, entry)
                .ok_or_else(|| LinetraceError::malformed(format!("unreadable section header {index}")))
        })
        .collect()
}

/// Untyped, unallocated, byte-aligned `PROGBITS`: how linkers emit DWARF.
fn looks_like_debug_data(section: &SectionHeader) -> bool
{
    section.kind == SHT_PROGBITS
        && (section.flags == 0 || section.flags == u64::from(SHF_MERGE | SHF_STRINGS))
        && section.addralign == 1
}

fn required_range(section: &SectionHeader, image_len: usize, what: &str) -> LinetraceResult<SectionRange>
{
    SectionRange::of(section, image_len).ok_or_else(|| {
        LinetraceError::malformed(format!(
            "{what} (section {}) lies outside the image",
            section.index
        ))
    })
}

/// NUL-terminated string starting at `offset` within a string table.
pub(crate) fn string_at(table: &[u8], offset: u32) -> Option<&[u8]>
{
    let mut reader = ByteReader::new(table);
    reader.seek(usize::try_from(offset).ok()?);
    if reader.is_at_end() {
        return None;
    }
    reader.read_cstr()
}

impl<'data> ImageDescriptor<'data>
{
    /// The image bytes this descriptor borrows.
    pub fn data(&self) -> &'data [u8]
    {
        self.data
    }

    pub fn header(&self) -> &FileHeader
    {
        &self.header
    }

    pub fn entry_point(&self) -> u64
    {
        self.header.entry
    }

    pub fn sections(&self) -> &[SectionHeader]
    {
        &self.sections
    }

    /// Name of a section from the section-name string table.
    pub fn section_name(&self, section: &SectionHeader) -> Option<&'data str>
    {
        string_at(self.section_names(), section.name).and_then(|name| std::str::from_utf8(name).ok())
    }

    pub fn section_by_name(&self, name: &str) -> Option<&SectionHeader>
    {
        self.sections
            .iter()
            .find(|section| self.section_name(section) == Some(name))
    }

    /// Contents of a section, `None` for sections outside the image.
    pub fn section_data(&self, section: &SectionHeader) -> Option<&'data [u8]>
    {
        section.file_range(self.data.len()).map(|range| &self.data[range])
    }

    pub fn symtab(&self) -> &SectionHeader
    {
        &self.symtab
    }

    pub fn symtab_range(&self) -> SectionRange
    {
        self.symtab_range
    }

    pub fn strtab_range(&self) -> SectionRange
    {
        self.strtab
    }

    pub fn shstrtab_range(&self) -> SectionRange
    {
        self.shstrtab
    }

    pub(crate) fn symtab_data(&self) -> &'data [u8]
    {
        &self.data[self.symtab_range.range()]
    }

    pub(crate) fn strtab_data(&self) -> &'data [u8]
    {
        &self.data[self.strtab.range()]
    }

    fn section_names(&self) -> &'data [u8]
    {
        &self.data[self.shstrtab.range()]
    }

    pub fn debug_section(&self, kind: DebugSection) -> Option<SectionRange>
    {
        self.debug[kind.slot()]
    }

    pub fn debug_section_data(&self, kind: DebugSection) -> Option<&'data [u8]>
    {
        self.debug_section(kind).map(|range| &self.data[range.range()])
    }

    /// The `.debug_line` bytes, if the image has them.
    pub fn debug_line(&self) -> Option<&'data [u8]>
    {
        self.debug_section_data(DebugSection::Line)
    }

    /// Program headers that lie inside the image.
    pub fn program_headers(&self) -> impl Iterator<Item = ProgramHeader> + 'data
    {
        let data = self.data;
        let start = usize::try_from(self.header.phoff).unwrap_or(usize::MAX);
        (0..usize::from(self.header.phnum)).map_while(move |index| {
            let offset = start.checked_add(index.checked_mul(PROGRAM_HEADER_SIZE)?)?;
            let entry = data.get(offset..offset.checked_add(PROGRAM_HEADER_SIZE)?)?;
            ProgramHeader::parse(entry)
        })
    }
}
