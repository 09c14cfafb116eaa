//! Runtime errors for the Kindle virtual machine

use std::fmt;

use thiserror::Error;

use crate::compiler::CompileError;

/// A runtime error that occurred during VM execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    /// The kind of error
    pub kind: RuntimeErrorKind,

    /// Source line of the failing instruction
    pub line: u32,
}

impl RuntimeError {
    /// Create a new runtime error
    #[must_use]
    pub fn new(kind: RuntimeErrorKind, line: u32) -> Self {
        Self { kind, line }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n[line {}] in script", self.kind, self.line)
    }
}

impl std::error::Error for RuntimeError {}

/// The kind of runtime error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Unary operand was not a number
    OperandNotNumber,

    /// Binary operands were not both numbers
    OperandsNotNumbers,

    /// `+` operands were neither two numbers nor two strings
    OperandsNotAddable,

    /// Stack underflow (malformed bytecode)
    StackUnderflow,

    /// Stack overflow
    StackOverflow,

    /// Byte that is not an opcode
    InvalidOpcode(u8),

    /// Instruction operand runs past the end of the chunk
    TruncatedOperand,

    /// Constant index outside the pool
    InvalidConstant(u32),

    /// Execution ran off the end of the chunk without `RETURN`
    MissingReturn,
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeErrorKind::OperandNotNumber => write!(f, "Operand must be a number."),
            RuntimeErrorKind::OperandsNotNumbers => write!(f, "Operands must be numbers."),
            RuntimeErrorKind::OperandsNotAddable => {
                write!(f, "Operands must be two numbers or two strings.")
            }
            RuntimeErrorKind::StackUnderflow => write!(f, "Stack underflow."),
            RuntimeErrorKind::StackOverflow => write!(f, "Stack overflow."),
            RuntimeErrorKind::InvalidOpcode(byte) => write!(f, "Unknown opcode {byte}."),
            RuntimeErrorKind::TruncatedOperand => write!(f, "Truncated instruction operand."),
            RuntimeErrorKind::InvalidConstant(index) => {
                write!(f, "Constant index {index} out of range.")
            }
            RuntimeErrorKind::MissingReturn => write!(f, "Reached end of chunk without return."),
        }
    }
}

/// Result type for VM operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failure of a compile-and-run request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpretError {
    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}
