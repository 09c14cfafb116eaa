//! Bytecode instruction set for the Kindle virtual machine

/// Bytecode operation codes
///
/// This is a stack-based instruction set. Most operations pop operands from
/// the stack and push results back onto it. Discriminants are part of the
/// bytecode format and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // ===== Constants =====
    /// Push a constant from the constant pool onto the stack
    /// Operand: u8 constant index
    Constant,

    /// Push a constant from the constant pool onto the stack
    /// Operand: u24 constant index (big-endian)
    ConstantLong,

    // ===== Literals =====
    /// Push nil onto the stack
    Nil,

    /// Push true onto the stack
    True,

    /// Push false onto the stack
    False,

    // ===== Comparison Operations =====
    /// Equal: pop two values, push true if equal
    Equal,

    /// Greater than: pop two values, push true if left > right
    Greater,

    /// Less than: pop two values, push true if left < right
    Less,

    // ===== Arithmetic Operations =====
    /// Add: pop two values, push their sum (or concatenation)
    Add,

    /// Subtract: pop two values (right, left), push left - right
    Subtract,

    /// Multiply: pop two values, push their product
    Multiply,

    /// Divide: pop two values (right, left), push left / right
    Divide,

    // ===== Unary Operations =====
    /// Logical NOT: pop one value, push its logical negation
    Not,

    /// Negate: pop one value, push its negation
    Negate,

    // ===== Control Flow =====
    /// Return the top of stack to the caller
    Return,
}

impl OpCode {
    /// Returns the size of the instruction including operands
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            OpCode::Nil
            | OpCode::True
            | OpCode::False
            | OpCode::Equal
            | OpCode::Greater
            | OpCode::Less
            | OpCode::Add
            | OpCode::Subtract
            | OpCode::Multiply
            | OpCode::Divide
            | OpCode::Not
            | OpCode::Negate
            | OpCode::Return => 1,

            // Single u8 operand (2 bytes)
            OpCode::Constant => 2,

            // u24 operand (4 bytes)
            OpCode::ConstantLong => 4,
        }
    }

    /// Returns a human-readable name for the opcode
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            OpCode::Constant => "CONSTANT",
            OpCode::ConstantLong => "CONSTANT_LONG",
            OpCode::Nil => "NIL",
            OpCode::True => "TRUE",
            OpCode::False => "FALSE",
            OpCode::Equal => "EQUAL",
            OpCode::Greater => "GREATER",
            OpCode::Less => "LESS",
            OpCode::Add => "ADD",
            OpCode::Subtract => "SUBTRACT",
            OpCode::Multiply => "MULTIPLY",
            OpCode::Divide => "DIVIDE",
            OpCode::Not => "NOT",
            OpCode::Negate => "NEGATE",
            OpCode::Return => "RETURN",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> Self {
        op as u8
    }
}

impl TryFrom<u8> for OpCode {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OpCode::Constant),
            1 => Ok(OpCode::ConstantLong),
            2 => Ok(OpCode::Nil),
            3 => Ok(OpCode::True),
            4 => Ok(OpCode::False),
            5 => Ok(OpCode::Equal),
            6 => Ok(OpCode::Greater),
            7 => Ok(OpCode::Less),
            8 => Ok(OpCode::Add),
            9 => Ok(OpCode::Subtract),
            10 => Ok(OpCode::Multiply),
            11 => Ok(OpCode::Divide),
            12 => Ok(OpCode::Not),
            13 => Ok(OpCode::Negate),
            14 => Ok(OpCode::Return),
            _ => Err(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_roundtrip() {
        for i in 0..=14u8 {
            let op = OpCode::try_from(i).unwrap();
            assert_eq!(op as u8, i, "OpCode {:?} has wrong discriminant", op);
        }
        assert_eq!(OpCode::try_from(15), Err(15));
    }

    #[test]
    fn opcode_sizes() {
        assert_eq!(OpCode::Constant.size(), 2);
        assert_eq!(OpCode::ConstantLong.size(), 4);
        assert_eq!(OpCode::Return.size(), 1);
    }

    #[test]
    fn opcode_names() {
        assert_eq!(OpCode::ConstantLong.name(), "CONSTANT_LONG");
        assert_eq!(OpCode::Negate.to_string(), "NEGATE");
    }
}
