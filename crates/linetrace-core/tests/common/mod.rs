//! Hand-assembled ELF images and `.debug_line` units for integration tests.

#![allow(dead_code)]

use object::elf::{SHF_MERGE, SHF_STRINGS, SHT_PROGBITS, SHT_STRTAB, SHT_SYMTAB, STB_GLOBAL};

/// Encodes a line-number program opcode by opcode.
#[derive(Debug, Default, Clone)]
pub struct Program
{
    bytes: Vec<u8>,
}

impl Program
{
    pub fn new() -> Self
    {
        Self::default()
    }

    pub fn set_address(mut self, address: u64) -> Self
    {
        self.bytes.extend_from_slice(&[0, 9, 2]);
        self.bytes.extend_from_slice(&address.to_le_bytes());
        self
    }

    pub fn advance_pc(mut self, delta: u64) -> Self
    {
        self.bytes.push(2);
        uleb(&mut self.bytes, delta);
        self
    }

    pub fn advance_line(mut self, delta: i64) -> Self
    {
        self.bytes.push(3);
        sleb(&mut self.bytes, delta);
        self
    }

    pub fn set_file(mut self, file: u64) -> Self
    {
        self.bytes.push(4);
        uleb(&mut self.bytes, file);
        self
    }

    pub fn copy(mut self) -> Self
    {
        self.bytes.push(1);
        self
    }

    pub fn end_sequence(mut self) -> Self
    {
        self.bytes.extend_from_slice(&[0, 1, 1]);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self
    {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn bytes(&self) -> &[u8]
    {
        &self.bytes
    }
}

/// A complete `.debug_line` unit, `unit_length` included.
///
/// Uses the common GCC parameters: minimum instruction length 1, `line_base`
/// -5, `line_range` 14, `opcode_base` 13.
pub fn line_unit(version: u16, directories: &[&str], files: &[(&str, u64)], program: &Program) -> Vec<u8>
{
    let mut tables = vec![1];
    if version >= 4 {
        // maximum_operations_per_instruction
        tables.push(1);
    }
    tables.extend_from_slice(&[1, (-5i8).to_le_bytes()[0], 14, 13]);
    tables.extend_from_slice(&[0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1]);
    for directory in directories {
        tables.extend_from_slice(directory.as_bytes());
        tables.push(0);
    }
    tables.push(0);
    for (name, directory) in files {
        tables.extend_from_slice(name.as_bytes());
        tables.push(0);
        uleb(&mut tables, *directory);
        tables.extend_from_slice(&[0, 0]);
    }
    tables.push(0);

    let mut body = version.to_le_bytes().to_vec();
    body.extend_from_slice(&u32::try_from(tables.len()).unwrap().to_le_bytes());
    body.extend_from_slice(&tables);
    body.extend_from_slice(program.bytes());

    let mut unit = u32::try_from(body.len()).unwrap().to_le_bytes().to_vec();
    unit.extend_from_slice(&body);
    unit
}

/// The reference sequence: 0x1000 at line 10, 0x1010 at line 20, then the
/// end of the sequence at 0x1020.
pub fn reference_program() -> Program
{
    Program::new()
        .set_address(0x1000)
        .advance_line(9)
        .copy()
        .advance_pc(0x10)
        .advance_line(10)
        .copy()
        .advance_pc(0x10)
        .end_sequence()
}

pub fn reference_debug_line() -> Vec<u8>
{
    line_unit(3, &[], &[("main.c", 0)], &reference_program())
}

#[derive(Debug, Clone)]
struct Section
{
    name: String,
    kind: u32,
    flags: u64,
    addralign: u64,
    data: Vec<u8>,
}

#[derive(Debug, Clone)]
struct Symbol
{
    name: String,
    value: u64,
    size: u64,
    kind: u8,
}

/// Builds a little-endian ELF64 image.
///
/// Layout: file header, section contents, then the section header table. The
/// table starts with the null section and ends with `.symtab`, `.strtab` and
/// `.shstrtab`, in that order.
#[derive(Debug, Clone)]
pub struct ElfBuilder
{
    sections: Vec<Section>,
    symbols: Vec<Symbol>,
    with_symtab: bool,
    with_shstrtab: bool,
}

impl Default for ElfBuilder
{
    fn default() -> Self
    {
        Self {
            sections: Vec::new(),
            symbols: Vec::new(),
            with_symtab: true,
            with_shstrtab: true,
        }
    }
}

impl ElfBuilder
{
    pub fn new() -> Self
    {
        Self::default()
    }

    /// A section that passes the debug-data heuristic.
    pub fn debug_section(self, name: &str, data: &[u8]) -> Self
    {
        self.section(name, SHT_PROGBITS, 0, 1, data)
    }

    /// A merged-strings section that passes the debug-data heuristic.
    pub fn string_section(self, name: &str, data: &[u8]) -> Self
    {
        self.section(name, SHT_PROGBITS, u64::from(SHF_MERGE | SHF_STRINGS), 1, data)
    }

    pub fn section(mut self, name: &str, kind: u32, flags: u64, addralign: u64, data: &[u8]) -> Self
    {
        self.sections.push(Section {
            name: name.to_string(),
            kind,
            flags,
            addralign,
            data: data.to_vec(),
        });
        self
    }

    pub fn symbol(mut self, name: &str, value: u64, size: u64, kind: u8) -> Self
    {
        self.symbols.push(Symbol {
            name: name.to_string(),
            value,
            size,
            kind,
        });
        self
    }

    pub fn without_symtab(mut self) -> Self
    {
        self.with_symtab = false;
        self
    }

    pub fn without_shstrtab(mut self) -> Self
    {
        self.with_shstrtab = false;
        self
    }

    pub fn build(&self) -> Vec<u8>
    {
        let mut sections = self.sections.clone();

        let mut symtab_index = None;
        if self.with_symtab {
            let mut strtab = vec![0u8];
            let mut symtab = vec![0u8; 24];
            for symbol in &self.symbols {
                let name = u32::try_from(strtab.len()).unwrap();
                strtab.extend_from_slice(symbol.name.as_bytes());
                strtab.push(0);

                symtab.extend_from_slice(&name.to_le_bytes());
                symtab.push((STB_GLOBAL << 4) | symbol.kind);
                symtab.push(0);
                symtab.extend_from_slice(&1u16.to_le_bytes());
                symtab.extend_from_slice(&symbol.value.to_le_bytes());
                symtab.extend_from_slice(&symbol.size.to_le_bytes());
            }
            symtab_index = Some(sections.len() + 1);
            sections.push(Section {
                name: ".symtab".to_string(),
                kind: SHT_SYMTAB,
                flags: 0,
                addralign: 8,
                data: symtab,
            });
            sections.push(Section {
                name: ".strtab".to_string(),
                kind: SHT_STRTAB,
                flags: 0,
                addralign: 1,
                data: strtab,
            });
        }

        let mut shstrtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for section in &sections {
            name_offsets.push(u32::try_from(shstrtab.len()).unwrap());
            shstrtab.extend_from_slice(section.name.as_bytes());
            shstrtab.push(0);
        }
        let shstrtab_name = u32::try_from(shstrtab.len()).unwrap();
        shstrtab.extend_from_slice(b".shstrtab\0");
        // Section header string table, or an unrelated string table when omitted
        sections.push(Section {
            name: String::new(),
            kind: if self.with_shstrtab { SHT_STRTAB } else { SHT_PROGBITS },
            flags: 0,
            addralign: 8,
            data: shstrtab,
        });
        name_offsets.push(shstrtab_name);

        let mut image = vec![0u8; 64];
        let mut offsets = Vec::new();
        for section in &sections {
            offsets.push(image.len());
            image.extend_from_slice(&section.data);
        }
        while image.len() % 8 != 0 {
            image.push(0);
        }
        let shoff = image.len();

        // Null section
        image.extend_from_slice(&[0u8; 64]);
        for (index, section) in sections.iter().enumerate() {
            let link = match symtab_index {
                Some(symtab) if index + 1 == symtab => u32::try_from(symtab + 1).unwrap(),
                _ => 0,
            };
            image.extend_from_slice(&name_offsets[index].to_le_bytes());
            image.extend_from_slice(&section.kind.to_le_bytes());
            image.extend_from_slice(&section.flags.to_le_bytes());
            image.extend_from_slice(&0u64.to_le_bytes());
            image.extend_from_slice(&(offsets[index] as u64).to_le_bytes());
            image.extend_from_slice(&(section.data.len() as u64).to_le_bytes());
            image.extend_from_slice(&link.to_le_bytes());
            image.extend_from_slice(&0u32.to_le_bytes());
            image.extend_from_slice(&section.addralign.to_le_bytes());
            image.extend_from_slice(&0u64.to_le_bytes());
        }

        let shnum = u16::try_from(sections.len() + 1).unwrap();
        write_file_header(&mut image, shoff as u64, shnum, shnum - 1);
        image
    }
}

fn write_file_header(image: &mut [u8], shoff: u64, shnum: u16, shstrndx: u16)
{
    image[..4].copy_from_slice(b"\x7fELF");
    // ELFCLASS64, ELFDATA2LSB, EV_CURRENT
    image[4..7].copy_from_slice(&[2, 1, 1]);
    // ET_EXEC, EM_X86_64
    image[16..18].copy_from_slice(&2u16.to_le_bytes());
    image[18..20].copy_from_slice(&62u16.to_le_bytes());
    image[20..24].copy_from_slice(&1u32.to_le_bytes());
    image[24..32].copy_from_slice(&0x1000u64.to_le_bytes());
    image[40..48].copy_from_slice(&shoff.to_le_bytes());
    image[52..54].copy_from_slice(&64u16.to_le_bytes());
    image[54..56].copy_from_slice(&56u16.to_le_bytes());
    image[58..60].copy_from_slice(&64u16.to_le_bytes());
    image[60..62].copy_from_slice(&shnum.to_le_bytes());
    image[62..64].copy_from_slice(&shstrndx.to_le_bytes());
}

/// An image whose `.debug_line` holds `debug_line`.
pub fn image_with_debug_line(debug_line: &[u8]) -> Vec<u8>
{
    ElfBuilder::new()
        .section(".text", SHT_PROGBITS, 6, 16, &[0x90; 32])
        .debug_section(".debug_line", debug_line)
        .string_section(".debug_str", b"main.c\0")
        .build()
}

pub fn uleb(out: &mut Vec<u8>, mut value: u64)
{
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

pub fn sleb(out: &mut Vec<u8>, mut value: i64)
{
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
