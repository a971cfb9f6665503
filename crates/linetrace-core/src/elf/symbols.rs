//! Symbol table access.

use object::elf::{STT_FUNC, STT_NOTYPE};

use super::header::{RawSymbol, SYMBOL_SIZE};
use super::locator::{string_at, ImageDescriptor};

/// A `.symtab` entry with its name resolved through the linked string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfSymbol<'data>
{
    pub index: usize,
    pub name: &'data [u8],
    pub raw: RawSymbol,
}

impl ElfSymbol<'_>
{
    pub fn value(&self) -> u64
    {
        self.raw.value
    }

    pub fn size(&self) -> u64
    {
        self.raw.size
    }

    /// Whether the symbol describes code that a stack trace can land in.
    pub fn is_code(&self) -> bool
    {
        match self.raw.kind() {
            STT_FUNC => true,
            // Hand-written assembly often leaves the type unset
            STT_NOTYPE => self.raw.size > 0 && !self.name.is_empty(),
            _ => false,
        }
    }

    /// Whether `address` falls inside `[value, value + size)`.
    pub fn contains(&self, address: u64) -> bool
    {
        address
            .checked_sub(self.raw.value)
            .is_some_and(|offset| offset < self.raw.size)
    }
}

/// Iterator over the entries of the image's symbol table.
#[derive(Debug, Clone)]
pub struct Symbols<'data>
{
    entries: std::iter::Enumerate<std::slice::ChunksExact<'data, u8>>,
    strtab: &'data [u8],
}

impl<'data> Iterator for Symbols<'data>
{
    type Item = ElfSymbol<'data>;

    fn next(&mut self) -> Option<Self::Item>
    {
        let (index, entry) = self.entries.next()?;
        let raw = RawSymbol::parse(entry)?;
        Some(ElfSymbol {
            index,
            name: string_at(self.strtab, raw.name).unwrap_or_default(),
            raw,
        })
    }
}

impl<'data> ImageDescriptor<'data>
{
    pub fn symbols(&self) -> Symbols<'data>
    {
        Symbols {
            entries: self.symtab_data().chunks_exact(SYMBOL_SIZE).enumerate(),
            strtab: self.strtab_data(),
        }
    }

    /// The code symbol containing `address`; the one starting closest below
    /// it when several overlap.
    pub fn symbol_for_address(&self, address: u64) -> Option<ElfSymbol<'data>>
    {
        self.symbols()
            .filter(|symbol| symbol.is_code() && symbol.contains(address))
            .max_by_key(ElfSymbol::value)
    }
}
