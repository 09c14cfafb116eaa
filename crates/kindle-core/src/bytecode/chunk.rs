//! Bytecode chunk - a sequence of instructions with constants and line info

#![allow(clippy::cast_possible_truncation)] // Constant indices are bounded by MAX_CONSTANTS

use super::opcode::OpCode;
use super::value::Value;

/// Maximum number of constants addressable by `CONSTANT_LONG` (24-bit index)
pub const MAX_CONSTANTS: usize = 1 << 24;

/// Largest constant index encodable in a single `CONSTANT` operand byte
pub const MAX_SHORT_CONSTANT: u32 = u8::MAX as u32;

/// Initial capacity of the code and line buffers
const MIN_CAPACITY: usize = 8;

/// Capacity to grow to from `capacity`
#[must_use]
pub const fn grow_capacity(capacity: usize) -> usize {
    if capacity < MIN_CAPACITY {
        MIN_CAPACITY
    } else {
        capacity * 2
    }
}

/// A chunk of bytecode
///
/// Holds the raw instruction bytes, one source line per byte, and the
/// constant pool the instructions reference. `code` and `lines` always have
/// the same length and grow together.
#[derive(Clone, Default)]
pub struct Chunk {
    /// Raw bytecode instructions
    code: Vec<u8>,

    /// Source line of each byte in `code`
    lines: Vec<u32>,

    /// Constant pool (duplicates permitted)
    constants: Vec<Value>,

    /// Shared capacity of `code` and `lines`
    capacity: usize,
}

impl Chunk {
    /// Create a new empty chunk
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bytes in the chunk
    #[must_use]
    pub fn len(&self) -> usize {
        self.code.len()
    }

    /// Returns true if the chunk is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Returns the allocated capacity of the instruction buffer
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the raw bytecode
    #[must_use]
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Returns the line table
    #[must_use]
    pub fn lines(&self) -> &[u32] {
        &self.lines
    }

    /// Returns the constant pool
    #[must_use]
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Get a constant by index
    #[must_use]
    pub fn get_constant(&self, index: u32) -> Option<&Value> {
        self.constants.get(index as usize)
    }

    /// Write a single byte to the chunk
    pub fn write_byte(&mut self, byte: u8, line: u32) {
        if self.code.len() == self.capacity {
            let capacity = grow_capacity(self.capacity);
            self.code.reserve_exact(capacity - self.code.len());
            self.lines.reserve_exact(capacity - self.lines.len());
            self.capacity = capacity;
        }
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Write an opcode to the chunk
    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op.into(), line);
    }

    /// Add a constant to the pool and return its index
    ///
    /// Returns `None` if the pool already holds [`MAX_CONSTANTS`] values.
    pub fn add_constant(&mut self, value: Value) -> Option<u32> {
        let index = self.constants.len();
        if index >= MAX_CONSTANTS {
            return None;
        }
        self.constants.push(value);
        Some(index as u32)
    }

    /// Find an existing constant that can stand in for `value`
    #[must_use]
    pub fn find_constant(&self, value: &Value) -> Option<u32> {
        self.constants
            .iter()
            .position(|existing| existing.is_identical(value))
            .map(|index| index as u32)
    }

    /// Emit the instruction that loads the constant at `index`
    ///
    /// Indices up to 255 use `CONSTANT` with one operand byte; larger ones
    /// use `CONSTANT_LONG` with a 3-byte big-endian operand.
    pub fn write_constant_index(&mut self, index: u32, line: u32) {
        if index <= MAX_SHORT_CONSTANT {
            self.write_op(OpCode::Constant, line);
            self.write_byte(index as u8, line);
        } else {
            self.write_op(OpCode::ConstantLong, line);
            self.write_byte((index >> 16) as u8, line);
            self.write_byte((index >> 8) as u8, line);
            self.write_byte(index as u8, line);
        }
    }

    /// Add `value` to the pool and emit the instruction that loads it
    ///
    /// Returns `None` if the constant pool is full.
    pub fn write_constant(&mut self, value: Value, line: u32) -> Option<u32> {
        let index = self.add_constant(value)?;
        self.write_constant_index(index, line);
        Some(index)
    }

    /// Read a byte at a position
    #[must_use]
    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    /// Read a big-endian u24 at a position
    #[must_use]
    pub fn read_u24(&self, offset: usize) -> Option<u32> {
        let high = u32::from(self.read_byte(offset)?);
        let mid = u32::from(self.read_byte(offset + 1)?);
        let low = u32::from(self.read_byte(offset + 2)?);
        Some((high << 16) | (mid << 8) | low)
    }

    /// Get the line number for a bytecode offset
    #[must_use]
    pub fn get_line(&self, offset: usize) -> u32 {
        self.lines
            .get(offset)
            .or_else(|| self.lines.last())
            .copied()
            .unwrap_or(0)
    }

    /// Release all buffers and return to the empty state
    ///
    /// Safe to call any number of times.
    pub fn free(&mut self) {
        *self = Self::new();
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("code_len", &self.code.len())
            .field("capacity", &self.capacity)
            .field("constants_len", &self.constants.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_lines_stay_parallel() {
        let mut chunk = Chunk::new();

        chunk.write_op(OpCode::Nil, 1);
        chunk.write_op(OpCode::Not, 2);
        chunk.write_op(OpCode::Return, 2);

        assert_eq!(chunk.code().len(), chunk.lines().len());
        assert_eq!(chunk.lines(), &[1, 2, 2]);
        assert_eq!(chunk.get_line(1), 2);
    }

    #[test]
    fn capacity_doubles_from_eight() {
        let mut chunk = Chunk::new();
        assert_eq!(chunk.capacity(), 0);

        chunk.write_byte(0, 1);
        assert_eq!(chunk.capacity(), 8);

        for _ in 0..8 {
            chunk.write_byte(0, 1);
        }
        assert_eq!(chunk.len(), 9);
        assert_eq!(chunk.capacity(), 16);
        assert!(chunk.code.capacity() >= 16);
        assert!(chunk.lines.capacity() >= 16);
    }

    #[test]
    fn constants_are_not_deduplicated() {
        let mut chunk = Chunk::new();

        let a = chunk.add_constant(Value::Number(1.0)).unwrap();
        let b = chunk.add_constant(Value::Number(1.0)).unwrap();

        assert_eq!((a, b), (0, 1));
        assert_eq!(chunk.find_constant(&Value::Number(1.0)), Some(0));
        assert_eq!(chunk.find_constant(&Value::Number(2.0)), None);
    }

    #[test]
    fn short_constant_encoding() {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Number(2.5), 1).unwrap();

        assert_eq!(chunk.code(), &[u8::from(OpCode::Constant), 0]);
        assert_eq!(chunk.get_constant(0), Some(&Value::Number(2.5)));
    }

    #[test]
    fn long_constant_encoding_switches_at_256() {
        let mut chunk = Chunk::new();
        for i in 0..256 {
            chunk.add_constant(Value::Number(f64::from(i))).unwrap();
        }

        let index = chunk.write_constant(Value::Nil, 7).unwrap();
        assert_eq!(index, 256);
        assert_eq!(chunk.code(), &[u8::from(OpCode::ConstantLong), 0x00, 0x01, 0x00]);
        assert_eq!(chunk.read_u24(1), Some(256));
        assert_eq!(chunk.lines(), &[7, 7, 7, 7]);
    }

    #[test]
    fn constant_pool_is_bounded() {
        let mut chunk = Chunk::new();
        chunk.constants.reserve_exact(MAX_CONSTANTS);
        for _ in 0..MAX_CONSTANTS {
            chunk.add_constant(Value::Nil).unwrap();
        }

        assert_eq!(chunk.add_constant(Value::Nil), None);
        assert_eq!(chunk.write_constant(Value::Nil, 1), None);
        assert_eq!(chunk.constants().len(), MAX_CONSTANTS);
        assert!(chunk.is_empty());
    }

    #[test]
    fn long_operand_is_big_endian() {
        let mut chunk = Chunk::new();
        chunk.write_constant_index(0x01_02_03, 1);
        assert_eq!(&chunk.code()[1..], &[0x01, 0x02, 0x03]);
        assert_eq!(chunk.read_u24(1), Some(0x01_02_03));
        assert_eq!(chunk.read_u24(2), None);
    }

    #[test]
    fn free_is_idempotent() {
        let mut chunk = Chunk::new();
        chunk.write_constant(Value::Bool(true), 1).unwrap();
        chunk.write_op(OpCode::Return, 1);

        chunk.free();
        assert!(chunk.is_empty());
        assert_eq!(chunk.capacity(), 0);
        assert!(chunk.constants().is_empty());

        chunk.free();
        assert!(chunk.is_empty());
        assert_eq!(chunk.capacity(), 0);
        assert!(chunk.lines().is_empty());
    }
}
