//! # Line Program Interpreter
//!
//! Runs the DWARF line-number state machine over every unit of a
//! `.debug_line` section and picks the row that best describes an address.
//!
//! ## Matching
//!
//! Within a unit, a row is a candidate when its address is at or below the
//! target and strictly above the best address matched so far in that unit,
//! and its file register names a retained file entry. Across units, the unit
//! whose best match has the numerically largest address wins, regardless of
//! the order in which the units appear.
//!
//! ## Malformed input
//!
//! Nothing here returns an error. Anomalies degrade the result instead:
//!
//! - a 64-bit DWARF unit stops the scan and the lookup reports nothing
//! - a unit whose length runs past the section stops the scan, keeping the
//!   best match of the units before it
//! - a version 5 unit (or one with an unusable header) is skipped
//! - an opcode whose operands run past the unit ends that unit

use gimli::constants::{self, DwLne, DwLns};
use tracing::{debug, trace, warn};

use super::header::{LineProgramHeader, UnitSkip};
use super::registers::{LineRegisters, LineRow};
use crate::reader::ByteReader;
use crate::types::SourceLine;

/// `unit_length` value announcing the 64-bit DWARF format.
const DWARF64_ESCAPE: u32 = 0xffff_ffff;

/// Why the scan of a `.debug_line` section ended before its last byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStop
{
    /// A unit uses the 64-bit DWARF format.
    Format64
    {
        offset: usize,
    },
    /// A unit's declared length runs past the end of the section.
    Truncated
    {
        offset: usize,
        declared: u32,
        available: usize,
    },
    /// Fewer than four bytes follow the last complete unit.
    TrailingBytes
    {
        offset: usize,
    },
}

/// One unit of a `.debug_line` section.
#[derive(Debug, Clone)]
pub enum LineUnit<'data>
{
    Program(LineProgramHeader<'data>),
    Skipped
    {
        offset: usize,
        reason: UnitSkip,
    },
}

/// Iterator over the units of a `.debug_line` section.
///
/// After iteration, [`LineUnits::stop_reason`] tells whether the section was
/// scanned to its end.
#[derive(Debug, Clone)]
pub struct LineUnits<'data>
{
    reader: ByteReader<'data>,
    data: &'data [u8],
    stopped: Option<ScanStop>,
}

impl<'data> LineUnits<'data>
{
    pub fn new(debug_line: &'data [u8]) -> Self
    {
        Self {
            reader: ByteReader::new(debug_line),
            data: debug_line,
            stopped: None,
        }
    }

    pub fn stop_reason(&self) -> Option<ScanStop>
    {
        self.stopped
    }

    fn stop(&mut self, reason: ScanStop) -> Option<LineUnit<'data>>
    {
        self.stopped = Some(reason);
        self.reader.seek(self.data.len());
        None
    }
}

impl<'data> Iterator for LineUnits<'data>
{
    type Item = LineUnit<'data>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.stopped.is_some() || self.reader.is_at_end() {
            return None;
        }

        let offset = self.reader.position();
        let Some(unit_length) = self.reader.read_u32() else {
            warn!(offset, "trailing bytes too short for a line unit length");
            return self.stop(ScanStop::TrailingBytes { offset });
        };

        if unit_length == DWARF64_ESCAPE {
            warn!(offset, "64-bit DWARF line unit is unsupported, abandoning scan");
            return self.stop(ScanStop::Format64 { offset });
        }

        let available = self.reader.remaining();
        let Some(unit) = usize::try_from(unit_length)
            .ok()
            .and_then(|len| self.reader.read_bytes(len))
        else {
            warn!(offset, unit_length, available, "line unit runs past the end of .debug_line");
            return self.stop(ScanStop::Truncated {
                offset,
                declared: unit_length,
                available,
            });
        };

        match LineProgramHeader::parse(offset, unit) {
            Ok(header) => {
                debug!(
                    offset,
                    version = header.version,
                    files = header.file_names.len() - 1,
                    "parsed line program header"
                );
                Some(LineUnit::Program(header))
            }
            Err(reason) => {
                debug!(offset, ?reason, "skipping line unit");
                Some(LineUnit::Skipped { offset, reason })
            }
        }
    }
}

impl<'data> LineProgramHeader<'data>
{
    /// Rows produced by executing this unit's line-number program.
    ///
    /// End-of-sequence events are yielded as rows with `end_sequence` set.
    pub fn rows(&self) -> LineRows<'_, 'data>
    {
        LineRows {
            header: self,
            reader: ByteReader::new(self.program),
            registers: LineRegisters::new(self.default_is_stmt),
        }
    }

    /// The best row of this unit for `target`, with its resolved path.
    pub fn best_match(&self, target: u64) -> Option<UnitMatch>
    {
        let mut best: Option<LineRow> = None;
        for row in self.rows() {
            if row.end_sequence || row.address > target || !self.has_file(row.file) {
                continue;
            }
            let best_address = best.map_or(0, |best| best.address);
            if row.address > best_address {
                trace!(address = row.address, line = row.line, "candidate line row");
                best = Some(row);
            }
        }

        let row = best?;
        let file = self.file_path(row.file)?;
        Some(UnitMatch {
            address: row.address,
            location: SourceLine { file, line: row.line },
        })
    }
}

/// The best match found within one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitMatch
{
    pub address: u64,
    pub location: SourceLine,
}

/// Executes a line-number program, yielding rows.
#[derive(Debug, Clone)]
pub struct LineRows<'h, 'data>
{
    header: &'h LineProgramHeader<'data>,
    reader: ByteReader<'data>,
    registers: LineRegisters,
}

impl LineRows<'_, '_>
{
    /// Execute one opcode. `None` means the program ended or an operand ran
    /// past the end of the unit; `Some(None)` means no row was produced.
    fn step(&mut self) -> Option<Option<LineRow>>
    {
        let opcode = self.reader.read_u8()?;
        if opcode == 0 {
            return self.extended();
        }
        if opcode < self.header.opcode_base {
            return self.standard(opcode);
        }
        Some(Some(self.special(opcode)))
    }

    fn emit(&mut self) -> LineRow
    {
        let row = LineRow::from(&self.registers);
        self.registers.after_row();
        row
    }

    fn special(&mut self, opcode: u8) -> LineRow
    {
        let header = self.header;
        let adjusted = opcode - header.opcode_base;
        let operation_advance = u64::from(adjusted / header.line_range);
        self.registers
            .advance_address(operation_advance.wrapping_mul(u64::from(header.minimum_instruction_length)));
        let line_advance = i64::from(header.line_base) + i64::from(adjusted % header.line_range);
        self.registers.advance_line(line_advance);
        self.emit()
    }

    fn standard(&mut self, opcode: u8) -> Option<Option<LineRow>>
    {
        let header = self.header;
        let min_inst_len = u64::from(header.minimum_instruction_length);
        match DwLns(opcode) {
            constants::DW_LNS_copy => return Some(Some(self.emit())),
            constants::DW_LNS_advance_pc => {
                let advance = self.reader.read_uleb128()?;
                self.registers.advance_address(advance.wrapping_mul(min_inst_len));
            }
            constants::DW_LNS_advance_line => {
                let delta = self.reader.read_sleb128()?;
                self.registers.advance_line(delta);
            }
            constants::DW_LNS_set_file => self.registers.file = self.reader.read_uleb128()?,
            constants::DW_LNS_set_column => self.registers.column = self.reader.read_uleb128()?,
            constants::DW_LNS_negate_stmt => self.registers.is_stmt = !self.registers.is_stmt,
            constants::DW_LNS_set_basic_block => self.registers.basic_block = true,
            constants::DW_LNS_const_add_pc => {
                let adjusted = 255 - header.opcode_base;
                let advance = u64::from(adjusted / header.line_range);
                self.registers.advance_address(advance.wrapping_mul(min_inst_len));
            }
            constants::DW_LNS_fixed_advance_pc => {
                let advance = self.reader.read_u16()?;
                self.registers.advance_address(u64::from(advance));
            }
            constants::DW_LNS_set_prologue_end => self.registers.prologue_end = true,
            constants::DW_LNS_set_epilogue_begin => self.registers.epilogue_begin = true,
            constants::DW_LNS_set_isa => self.registers.isa = self.reader.read_uleb128()?,
            _ => {
                for _ in 0..header.operand_count(opcode) {
                    self.reader.read_uleb128()?;
                }
            }
        }
        Some(None)
    }

    fn extended(&mut self) -> Option<Option<LineRow>>
    {
        let length = usize::try_from(self.reader.read_uleb128()?).ok()?;
        let end = self.reader.position().checked_add(length)?;
        if end > self.reader.len() {
            trace!(length, "extended opcode runs past the end of the unit");
            return None;
        }
        if length == 0 {
            return Some(None);
        }

        let mut row = None;
        match DwLne(self.reader.read_u8()?) {
            constants::DW_LNE_end_sequence => {
                self.registers.end_sequence = true;
                row = Some(LineRow::from(&self.registers));
                self.registers.reset(self.header.default_is_stmt);
            }
            constants::DW_LNE_set_address if length == 9 => {
                self.registers.address = self.reader.read_u64()?;
            }
            // Other sub-opcodes, and set_address with a non-64-bit operand, are opaque
            _ => {}
        }
        self.reader.seek(end);
        Some(row)
    }
}

impl Iterator for LineRows<'_, '_>
{
    type Item = LineRow;

    fn next(&mut self) -> Option<Self::Item>
    {
        loop {
            match self.step() {
                Some(Some(row)) => return Some(row),
                Some(None) => {}
                None => {
                    self.reader.seek(self.reader.len());
                    return None;
                }
            }
        }
    }
}

/// Resolve `target` against a `.debug_line` section.
///
/// Returns `None` when no row matches, when the section uses the 64-bit DWARF
/// format, or when it is empty.
pub fn resolve_line(debug_line: &[u8], target: u64) -> Option<SourceLine>
{
    let mut units = LineUnits::new(debug_line);
    let mut best: Option<UnitMatch> = None;

    for unit in &mut units {
        let LineUnit::Program(header) = unit else {
            continue;
        };
        let Some(found) = header.best_match(target) else {
            continue;
        };
        if best.as_ref().is_none_or(|best| found.address > best.address) {
            best = Some(found);
        }
    }

    if let Some(ScanStop::Format64 { .. }) = units.stop_reason() {
        return None;
    }

    best.map(|found| {
        debug!(
            target,
            matched = found.address,
            file = %found.location.file,
            line = found.location.line,
            "resolved address to line"
        );
        found.location
    })
}
