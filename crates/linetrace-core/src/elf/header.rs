//! ELF64 on-disk structures.
//!
//! Fields are read at their fixed little-endian offsets. Beyond the magic
//! bytes nothing is validated here: class, data encoding and machine are
//! taken as they come.

use std::ops::Range;

use object::elf::{EM_AARCH64, EM_RISCV, EM_X86_64};

use crate::reader::ByteReader;

pub const FILE_HEADER_SIZE: usize = 64;
pub const PROGRAM_HEADER_SIZE: usize = 56;
pub const SECTION_HEADER_SIZE: usize = 64;
pub const SYMBOL_SIZE: usize = 24;

/// The ELF file header (`Elf64_Ehdr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader
{
    pub ident: [u8; 16],
    pub kind: u16,
    pub machine: u16,
    pub version: u32,
    pub entry: u64,
    pub phoff: u64,
    pub shoff: u64,
    pub flags: u32,
    pub ehsize: u16,
    pub phentsize: u16,
    pub phnum: u16,
    pub shentsize: u16,
    pub shnum: u16,
    pub shstrndx: u16,
}

impl FileHeader
{
    /// Read the header from the start of `data`.
    pub fn parse(data: &[u8]) -> Option<Self>
    {
        let mut reader = ByteReader::new(data);
        let mut ident = [0u8; 16];
        ident.copy_from_slice(reader.read_bytes(16)?);
        Some(Self {
            ident,
            kind: reader.read_u16()?,
            machine: reader.read_u16()?,
            version: reader.read_u32()?,
            entry: reader.read_u64()?,
            phoff: reader.read_u64()?,
            shoff: reader.read_u64()?,
            flags: reader.read_u32()?,
            ehsize: reader.read_u16()?,
            phentsize: reader.read_u16()?,
            phnum: reader.read_u16()?,
            shentsize: reader.read_u16()?,
            shnum: reader.read_u16()?,
            shstrndx: reader.read_u16()?,
        })
    }

    pub fn magic(&self) -> [u8; 4]
    {
        [self.ident[0], self.ident[1], self.ident[2], self.ident[3]]
    }

    pub fn architecture(&self) -> Architecture
    {
        Architecture::from_machine(self.machine)
    }
}

/// Target architecture named by `e_machine`. Reported, never checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture
{
    X86_64,
    Arm64,
    RiscV,
    Unknown(u16),
}

impl Architecture
{
    pub fn from_machine(machine: u16) -> Self
    {
        match machine {
            EM_X86_64 => Architecture::X86_64,
            EM_AARCH64 => Architecture::Arm64,
            EM_RISCV => Architecture::RiscV,
            other => Architecture::Unknown(other),
        }
    }
}

impl std::fmt::Display for Architecture
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        match self {
            Architecture::X86_64 => write!(f, "x86_64"),
            Architecture::Arm64 => write!(f, "arm64"),
            Architecture::RiscV => write!(f, "riscv"),
            Architecture::Unknown(machine) => write!(f, "unknown (e_machine {machine})"),
        }
    }
}

/// A section header (`Elf64_Shdr`) together with its index in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader
{
    pub index: usize,
    pub name: u32,
    pub kind: u32,
    pub flags: u64,
    pub addr: u64,
    pub offset: u64,
    pub size: u64,
    pub link: u32,
    pub info: u32,
    pub addralign: u64,
    pub entsize: u64,
}

impl SectionHeader
{
    pub fn parse(index: usize, data: &[u8]) -> Option<Self>
    {
        let mut reader = ByteReader::new(data);
        Some(Self {
            index,
            name: reader.read_u32()?,
            kind: reader.read_u32()?,
            flags: reader.read_u64()?,
            addr: reader.read_u64()?,
            offset: reader.read_u64()?,
            size: reader.read_u64()?,
            link: reader.read_u32()?,
            info: reader.read_u32()?,
            addralign: reader.read_u64()?,
            entsize: reader.read_u64()?,
        })
    }

    /// File range of the section contents, if it fits inside an image of
    /// `image_len` bytes.
    pub fn file_range(&self, image_len: usize) -> Option<Range<usize>>
    {
        let start = usize::try_from(self.offset).ok()?;
        let end = start.checked_add(usize::try_from(self.size).ok()?)?;
        (end <= image_len).then_some(start..end)
    }
}

/// A program header (`Elf64_Phdr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramHeader
{
    pub kind: u32,
    pub flags: u32,
    pub offset: u64,
    pub vaddr: u64,
    pub paddr: u64,
    pub filesz: u64,
    pub memsz: u64,
    pub align: u64,
}

impl ProgramHeader
{
    pub fn parse(data: &[u8]) -> Option<Self>
    {
        let mut reader = ByteReader::new(data);
        Some(Self {
            kind: reader.read_u32()?,
            flags: reader.read_u32()?,
            offset: reader.read_u64()?,
            vaddr: reader.read_u64()?,
            paddr: reader.read_u64()?,
            filesz: reader.read_u64()?,
            memsz: reader.read_u64()?,
            align: reader.read_u64()?,
        })
    }
}

/// A symbol table entry (`Elf64_Sym`) before its name is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSymbol
{
    pub name: u32,
    pub info: u8,
    pub other: u8,
    pub shndx: u16,
    pub value: u64,
    pub size: u64,
}

impl RawSymbol
{
    pub fn parse(data: &[u8]) -> Option<Self>
    {
        let mut reader = ByteReader::new(data);
        Some(Self {
            name: reader.read_u32()?,
            info: reader.read_u8()?,
            other: reader.read_u8()?,
            shndx: reader.read_u16()?,
            value: reader.read_u64()?,
            size: reader.read_u64()?,
        })
    }

    /// `ELF64_ST_BIND`
    pub fn binding(&self) -> u8
    {
        self.info >> 4
    }

    /// `ELF64_ST_TYPE`
    pub fn kind(&self) -> u8
    {
        self.info & 0xf
    }
}
