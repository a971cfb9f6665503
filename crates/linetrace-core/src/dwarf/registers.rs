//! Line-number state machine registers (DWARF 4, section 6.2.2).

/// The register file of the line-number state machine.
///
/// `address` and `line` wrap on overflow like the fixed-width registers of
/// the producer's target; a malformed program can therefore move them
/// anywhere, but never out of the unit being interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRegisters
{
    pub address: u64,
    pub file: u64,
    pub line: u32,
    pub column: u64,
    pub is_stmt: bool,
    pub basic_block: bool,
    pub end_sequence: bool,
    pub prologue_end: bool,
    pub epilogue_begin: bool,
    pub isa: u64,
    pub discriminator: u64,
}

impl LineRegisters
{
    /// Registers as they are at the start of every sequence.
    pub fn new(default_is_stmt: bool) -> Self
    {
        Self {
            address: 0,
            file: 1,
            line: 1,
            column: 0,
            is_stmt: default_is_stmt,
            basic_block: false,
            end_sequence: false,
            prologue_end: false,
            epilogue_begin: false,
            isa: 0,
            discriminator: 0,
        }
    }

    pub fn reset(&mut self, default_is_stmt: bool)
    {
        *self = Self::new(default_is_stmt);
    }

    pub fn advance_address(&mut self, delta: u64)
    {
        self.address = self.address.wrapping_add(delta);
    }

    pub fn advance_line(&mut self, delta: i64)
    {
        // Truncation to the 32-bit register is intended
        #[allow(clippy::cast_possible_truncation)]
        let delta = delta as i32;
        self.line = self.line.wrapping_add_signed(delta);
    }

    /// Clear the per-row flags after a row has been appended.
    pub fn after_row(&mut self)
    {
        self.basic_block = false;
        self.prologue_end = false;
        self.epilogue_begin = false;
        self.discriminator = 0;
    }
}

/// One row of the line table, as emitted by a copy or special opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRow
{
    pub address: u64,
    pub file: u64,
    pub line: u32,
    pub column: u64,
    pub is_stmt: bool,
    pub end_sequence: bool,
}

impl From<&LineRegisters> for LineRow
{
    fn from(registers: &LineRegisters) -> Self
    {
        Self {
            address: registers.address,
            file: registers.file,
            line: registers.line,
            column: registers.column,
            is_stmt: registers.is_stmt,
            end_sequence: registers.end_sequence,
        }
    }
}
