//! Line-number program header (DWARF 2-4).

use smallvec::SmallVec;

use crate::reader::ByteReader;

/// Maximum number of include directories or file entries retained per unit,
/// counting the reserved index 0.
///
/// Entries past the cap are still consumed so the header stays aligned, but
/// rows that refer to them cannot be resolved to a path.
pub const MAX_RETAINED_ENTRIES: usize = 255;

/// Bytes between the end of the `unit_length` field and the first field
/// covered by `header_length` (version + header_length).
const PRE_HEADER_FIELDS: usize = 2 + 4;

/// The compilation directory stands in for directory index 0.
const COMPILATION_DIRECTORY: &[u8] = b".";

/// A file entry of the header's `file_names` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileEntry<'data>
{
    pub name: &'data [u8],
    pub directory_index: u64,
}

/// Why a unit was parsed past without being interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSkip
{
    /// Version 5 and later use a different directory/file table layout.
    UnsupportedVersion(u16),
    /// The unit ends before its fixed header fields do.
    TruncatedHeader,
    /// A `line_range` of zero makes special opcodes undefined.
    ZeroLineRange,
}

/// Per-unit metadata of a line-number program.
///
/// Parsed fresh on every query; it borrows the section bytes and owns only the
/// small lookup tables.
#[derive(Debug, Clone)]
pub struct LineProgramHeader<'data>
{
    /// Offset of the unit's `unit_length` field within `.debug_line`.
    pub offset: usize,
    pub unit_length: u32,
    pub version: u16,
    pub header_length: u32,
    pub minimum_instruction_length: u8,
    /// Only present from version 4 on. Read but not modelled.
    pub maximum_operations_per_instruction: u8,
    pub default_is_stmt: bool,
    pub line_base: i8,
    pub line_range: u8,
    pub opcode_base: u8,
    /// Operand counts for standard opcodes `1..opcode_base`, indexed by `opcode - 1`.
    pub standard_opcode_lengths: SmallVec<[u8; 12]>,
    /// Index 0 is the compilation directory.
    pub include_directories: Vec<&'data [u8]>,
    /// Index 0 is unused.
    pub file_names: Vec<FileEntry<'data>>,
    pub(crate) program: &'data [u8],
}

impl<'data> LineProgramHeader<'data>
{
    /// Parse the header of one unit.
    ///
    /// `unit` holds the bytes following the `unit_length` field, exactly
    /// `unit_length` of them. Nothing outside `unit` is ever read.
    pub(crate) fn parse(offset: usize, unit: &'data [u8]) -> Result<Self, UnitSkip>
    {
        let mut reader = ByteReader::new(unit);
        let unit_length = u32::try_from(unit.len()).map_err(|_| UnitSkip::TruncatedHeader)?;

        let version = reader.read_u16().ok_or(UnitSkip::TruncatedHeader)?;
        if version > 4 {
            return Err(UnitSkip::UnsupportedVersion(version));
        }

        let header_length = reader.read_u32().ok_or(UnitSkip::TruncatedHeader)?;
        let program_start = usize::try_from(header_length)
            .ok()
            .and_then(|len| len.checked_add(PRE_HEADER_FIELDS))
            .map_or(unit.len(), |start| start.min(unit.len()));

        let minimum_instruction_length = reader.read_u8().ok_or(UnitSkip::TruncatedHeader)?;
        let maximum_operations_per_instruction = if version >= 4 {
            reader.read_u8().ok_or(UnitSkip::TruncatedHeader)?
        } else {
            1
        };
        let default_is_stmt = reader.read_u8().ok_or(UnitSkip::TruncatedHeader)? != 0;
        let line_base = reader.read_i8().ok_or(UnitSkip::TruncatedHeader)?;
        let line_range = reader.read_u8().ok_or(UnitSkip::TruncatedHeader)?;
        let opcode_base = reader.read_u8().ok_or(UnitSkip::TruncatedHeader)?;
        if line_range == 0 {
            return Err(UnitSkip::ZeroLineRange);
        }

        // The variable-length tables are bounded by the declared program start
        let tables_end = program_start.max(reader.position());
        let mut tables = ByteReader::new(&unit[..tables_end]);
        tables.seek(reader.position());

        let mut standard_opcode_lengths = SmallVec::new();
        for _ in 1..opcode_base {
            match tables.read_u8() {
                Some(len) => standard_opcode_lengths.push(len),
                None => break,
            }
        }

        let include_directories = parse_include_directories(&mut tables);
        let file_names = parse_file_names(&mut tables);

        Ok(Self {
            offset,
            unit_length,
            version,
            header_length,
            minimum_instruction_length,
            maximum_operations_per_instruction,
            default_is_stmt,
            line_base,
            line_range,
            opcode_base,
            standard_opcode_lengths,
            include_directories,
            file_names,
            program: &unit[program_start..],
        })
    }

    /// Number of ULEB128 operands a standard opcode takes, per the header.
    pub fn operand_count(&self, opcode: u8) -> u8
    {
        opcode
            .checked_sub(1)
            .and_then(|index| self.standard_opcode_lengths.get(usize::from(index)))
            .copied()
            .unwrap_or(0)
    }

    /// Whether a row's file register refers to a retained file entry.
    pub fn has_file(&self, file: u64) -> bool
    {
        file > 0 && usize::try_from(file).is_ok_and(|index| index < self.file_names.len())
    }

    /// Resolve a file register to `directory/name`.
    ///
    /// A directory index outside the retained table falls back to the
    /// compilation directory. Returns `None` for index 0 and dropped entries.
    pub fn file_path(&self, file: u64) -> Option<String>
    {
        if !self.has_file(file) {
            return None;
        }
        let entry = self.file_names.get(usize::try_from(file).ok()?)?;
        let directory = usize::try_from(entry.directory_index)
            .ok()
            .and_then(|index| self.include_directories.get(index))
            .copied()
            .unwrap_or(COMPILATION_DIRECTORY);
        Some(join_path(directory, entry.name))
    }
}

fn parse_include_directories<'data>(tables: &mut ByteReader<'data>) -> Vec<&'data [u8]>
{
    let mut directories = vec![COMPILATION_DIRECTORY];
    while tables.peek_u8().is_some_and(|byte| byte != 0) {
        let Some(directory) = tables.read_cstr() else {
            break;
        };
        if directories.len() < MAX_RETAINED_ENTRIES {
            directories.push(directory);
        }
    }
    // Table terminator
    let _ = tables.read_u8();
    directories
}

fn parse_file_names<'data>(tables: &mut ByteReader<'data>) -> Vec<FileEntry<'data>>
{
    let mut files = vec![FileEntry {
        name: &[],
        directory_index: 0,
    }];
    while tables.peek_u8().is_some_and(|byte| byte != 0) {
        let Some(name) = tables.read_cstr() else {
            break;
        };
        // A missing operand reads as zero, like the rest of a truncated table
        let directory_index = tables.read_uleb128().unwrap_or(0);
        let _modification_time = tables.read_uleb128();
        let _file_size = tables.read_uleb128();
        if files.len() < MAX_RETAINED_ENTRIES {
            files.push(FileEntry { name, directory_index });
        }
    }
    let _ = tables.read_u8();
    files
}

/// Join a directory and a file name with exactly one separator.
///
/// The compilation directory (`.`) and an empty directory yield the bare name.
pub fn join_path(directory: &[u8], name: &[u8]) -> String
{
    let name = String::from_utf8_lossy(name);
    if directory.is_empty() || directory == COMPILATION_DIRECTORY {
        return name.into_owned();
    }

    let directory = String::from_utf8_lossy(directory);
    let mut path = String::with_capacity(directory.len() + 1 + name.len());
    path.push_str(&directory);
    if !directory.ends_with('/') {
        path.push('/');
    }
    path.push_str(&name);
    path
}

#[cfg(test)]
mod tests
{
    use super::*;

    /// Unit body (everything after `unit_length`) for a version 3 header.
    fn unit_v3(directories: &[&str], files: &[(&str, u8)], program: &[u8]) -> Vec<u8>
    {
        let mut tables = vec![1, 1, (-5i8).to_le_bytes()[0], 14, 13];
        tables.extend_from_slice(&[0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1]);
        for dir in directories {
            tables.extend_from_slice(dir.as_bytes());
            tables.push(0);
        }
        tables.push(0);
        for (name, dir) in files {
            tables.extend_from_slice(name.as_bytes());
            tables.extend_from_slice(&[0, *dir, 0, 0]);
        }
        tables.push(0);

        let mut unit = 3u16.to_le_bytes().to_vec();
        unit.extend_from_slice(&u32::try_from(tables.len()).unwrap().to_le_bytes());
        unit.extend_from_slice(&tables);
        unit.extend_from_slice(program);
        unit
    }

    #[test]
    fn test_parse_v3_header()
    {
        let unit = unit_v3(&["/usr/src", "include"], &[("main.c", 0), ("util.h", 2)], &[0xaa, 0xbb]);
        let header = LineProgramHeader::parse(0, &unit).unwrap();

        assert_eq!(header.version, 3);
        assert_eq!(header.minimum_instruction_length, 1);
        assert_eq!(header.maximum_operations_per_instruction, 1);
        assert!(header.default_is_stmt);
        assert_eq!(header.line_base, -5);
        assert_eq!(header.line_range, 14);
        assert_eq!(header.opcode_base, 13);
        assert_eq!(header.standard_opcode_lengths.len(), 12);
        assert_eq!(header.operand_count(2), 1);
        assert_eq!(header.operand_count(9), 1);
        assert_eq!(header.operand_count(0), 0);
        assert_eq!(header.include_directories, vec![&b"."[..], &b"/usr/src"[..], &b"include"[..]]);
        assert_eq!(header.file_names.len(), 3);
        assert_eq!(header.program, &[0xaa, 0xbb]);
    }

    #[test]
    fn test_file_path_join()
    {
        let unit = unit_v3(&["/usr/src", "include/"], &[("main.c", 0), ("a.h", 1), ("b.h", 2), ("c.h", 9)], &[]);
        let header = LineProgramHeader::parse(0, &unit).unwrap();

        assert_eq!(header.file_path(0), None);
        assert_eq!(header.file_path(1).as_deref(), Some("main.c"));
        assert_eq!(header.file_path(2).as_deref(), Some("/usr/src/a.h"));
        assert_eq!(header.file_path(3).as_deref(), Some("include/b.h"));
        // Directory index past the table falls back to the compilation directory
        assert_eq!(header.file_path(4).as_deref(), Some("c.h"));
        assert_eq!(header.file_path(5), None);
    }

    #[test]
    fn test_version_5_is_skipped()
    {
        let mut unit = 5u16.to_le_bytes().to_vec();
        unit.extend_from_slice(&[0; 16]);
        assert_eq!(
            LineProgramHeader::parse(0, &unit).unwrap_err(),
            UnitSkip::UnsupportedVersion(5)
        );
    }

    #[test]
    fn test_truncated_fixed_fields()
    {
        let unit = [2, 0, 10, 0, 0, 0, 1];
        assert_eq!(LineProgramHeader::parse(0, &unit).unwrap_err(), UnitSkip::TruncatedHeader);
    }

    #[test]
    fn test_zero_line_range()
    {
        let mut unit = unit_v3(&[], &[("a.c", 0)], &[]);
        // line_range is the fourth byte after version + header_length
        unit[PRE_HEADER_FIELDS + 3] = 0;
        assert_eq!(LineProgramHeader::parse(0, &unit).unwrap_err(), UnitSkip::ZeroLineRange);
    }

    #[test]
    fn test_retention_cap()
    {
        let directories: Vec<String> = (0..300).map(|i| format!("d{i}")).collect();
        let directory_refs: Vec<&str> = directories.iter().map(String::as_str).collect();
        let names: Vec<String> = (0..300).map(|i| format!("f{i}.c")).collect();
        let files: Vec<(&str, u8)> = names.iter().map(|name| (name.as_str(), 1)).collect();

        let unit = unit_v3(&directory_refs, &files, &[0x42]);
        let header = LineProgramHeader::parse(0, &unit).unwrap();

        assert_eq!(header.include_directories.len(), MAX_RETAINED_ENTRIES);
        assert_eq!(header.file_names.len(), MAX_RETAINED_ENTRIES);
        assert_eq!(header.file_path(254).as_deref(), Some("d0/f253.c"));
        assert_eq!(header.file_path(255), None);
        // Dropped entries were still consumed
        assert_eq!(header.program, &[0x42]);
    }

    #[test]
    fn test_join_path()
    {
        assert_eq!(join_path(b".", b"main.c"), "main.c");
        assert_eq!(join_path(b"", b"main.c"), "main.c");
        assert_eq!(join_path(b"src", b"main.c"), "src/main.c");
        assert_eq!(join_path(b"src/", b"main.c"), "src/main.c");
    }
}
