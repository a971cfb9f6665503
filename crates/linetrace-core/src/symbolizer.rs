//! # Symbolizer
//!
//! Annotates stack-trace addresses with the enclosing function and the source
//! line, the way a kernel panic handler prints its backtrace.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use linetrace_core::symbolizer::Symbolizer;
//! use linetrace_core::types::Address;
//!
//! # fn example(image: &[u8], trace: &[Address]) -> linetrace_core::LinetraceResult<()> {
//! let descriptor = linetrace_core::locate(image)?;
//! let symbolizer = Symbolizer::new(&descriptor);
//! for frame in symbolizer.symbolicate_trace(trace) {
//!     println!("{frame}");
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;

use tracing::trace;

use crate::demangle::make_symbol_name;
use crate::elf::ImageDescriptor;
use crate::resolver::resolve;
use crate::types::{Address, LookupResult, SymbolName};

/// Symbol and line information for a single address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbolication
{
    pub address: Address,
    /// Enclosing function, if the symbol table covers the address
    pub symbol: Option<SymbolName>,
    /// Distance from the start of `symbol`
    pub offset: u64,
    pub location: LookupResult,
}

impl fmt::Display for Symbolication
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}  ", self.address)?;
        match &self.symbol {
            Some(symbol) => write!(f, "{symbol}+{:#x}", self.offset)?,
            None => f.write_str("??")?,
        }
        write!(f, " at {}", self.location)
    }
}

/// Address annotation over a located image.
#[derive(Debug, Clone, Copy)]
pub struct Symbolizer<'a, 'data>
{
    descriptor: &'a ImageDescriptor<'data>,
}

impl<'a, 'data> Symbolizer<'a, 'data>
{
    pub fn new(descriptor: &'a ImageDescriptor<'data>) -> Self
    {
        Self { descriptor }
    }

    /// The function symbol containing `address` and the offset into it.
    pub fn symbol_for(&self, address: Address) -> Option<(SymbolName, u64)>
    {
        let symbol = self.descriptor.symbol_for_address(address.value())?;
        let offset = address.value() - symbol.value();
        trace!(%address, index = symbol.index, offset, "matched symbol");
        Some((make_symbol_name(symbol.name), offset))
    }

    pub fn symbolicate(&self, address: Address) -> Symbolication
    {
        let (symbol, offset) = match self.symbol_for(address) {
            Some((symbol, offset)) => (Some(symbol), offset),
            None => (None, 0),
        };
        Symbolication {
            address,
            symbol,
            offset,
            location: resolve(self.descriptor, address),
        }
    }

    /// Symbolicate every frame of a backtrace, innermost first as given.
    pub fn symbolicate_trace(&self, trace: &[Address]) -> Vec<Symbolication>
    {
        trace.iter().map(|&address| self.symbolicate(address)).collect()
    }
}
