//! Bounded little-endian cursor over a byte slice.
//!
//! Every read is checked against the end of the slice the reader was created
//! over and returns `None` instead of running past it. Both the ELF structures
//! and the line-program units are read through it; the interpreter creates one
//! reader per unit, so a malformed unit can never cause a read beyond its own
//! computed end.

/// Forward-only cursor over borrowed bytes.
#[derive(Debug, Clone)]
pub struct ByteReader<'data>
{
    data: &'data [u8],
    pos: usize,
}

impl<'data> ByteReader<'data>
{
    pub fn new(data: &'data [u8]) -> Self
    {
        Self { data, pos: 0 }
    }

    /// Current offset from the start of the underlying slice.
    pub fn position(&self) -> usize
    {
        self.pos
    }

    pub fn len(&self) -> usize
    {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize
    {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn is_at_end(&self) -> bool
    {
        self.pos >= self.data.len()
    }

    /// Move the cursor to an absolute offset, clamped to the end of the data.
    pub fn seek(&mut self, offset: usize)
    {
        self.pos = offset.min(self.data.len());
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Option<u8>
    {
        self.data.get(self.pos).copied()
    }

    pub fn read_u8(&mut self) -> Option<u8>
    {
        let value = self.peek_u8()?;
        self.pos += 1;
        Some(value)
    }

    pub fn read_i8(&mut self) -> Option<i8>
    {
        self.read_u8().map(|byte| i8::from_le_bytes([byte]))
    }

    pub fn read_u16(&mut self) -> Option<u16>
    {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Option<u32>
    {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Option<u64>
    {
        self.read_array().map(u64::from_le_bytes)
    }

    pub fn read_bytes(&mut self, count: usize) -> Option<&'data [u8]>
    {
        let end = self.pos.checked_add(count)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    pub fn skip(&mut self, count: usize) -> Option<()>
    {
        self.read_bytes(count).map(|_| ())
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]>
    {
        let bytes = self.read_bytes(N)?;
        let mut array = [0u8; N];
        array.copy_from_slice(bytes);
        Some(array)
    }

    /// Read an unsigned LEB128 value.
    ///
    /// Bits beyond the 64th are discarded. Returns `None` if the data ends
    /// before a byte without the continuation bit is seen.
    pub fn read_uleb128(&mut self) -> Option<u64>
    {
        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            if shift < 64 {
                result |= u64::from(byte & 0x7f) << shift;
            }
            if byte & 0x80 == 0 {
                return Some(result);
            }
            shift += 7;
        }
    }

    /// Read a signed LEB128 value, sign-extending from the last byte read.
    pub fn read_sleb128(&mut self) -> Option<i64>
    {
        let mut result = 0i64;
        let mut shift = 0u32;
        let mut byte;
        loop {
            byte = self.read_u8()?;
            if shift < 64 {
                result |= i64::from(byte & 0x7f) << shift;
            }
            shift += 7;
            if byte & 0x80 == 0 {
                break;
            }
        }

        if shift < 64 && byte & 0x40 != 0 {
            result |= -1i64 << shift;
        }
        Some(result)
    }

    /// Read a NUL-terminated string and consume its terminator.
    ///
    /// A string that runs into the end of the data is returned without a
    /// terminator. Invalid UTF-8 is replaced lossily by the caller, so the raw
    /// bytes are returned here.
    pub fn read_cstr(&mut self) -> Option<&'data [u8]>
    {
        let rest = self.data.get(self.pos..)?;
        match rest.iter().position(|&byte| byte == 0) {
            Some(len) => {
                self.pos += len + 1;
                Some(&rest[..len])
            }
            None => {
                self.pos = self.data.len();
                Some(rest)
            }
        }
    }
}
