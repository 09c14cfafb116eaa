//! Stack-based virtual machine for Kindle bytecode
//!
//! Executes a finished [`Chunk`] from its first byte until `RETURN`.

mod error;

pub use error::{InterpretError, RuntimeError, RuntimeErrorKind, RuntimeResult};

use crate::bytecode::{Chunk, Heap, OpCode, Value};
use crate::compiler::{compile_with, CompileOptions};

/// Maximum number of values on the stack
pub const STACK_MAX: usize = 256;

/// Compile `source` and run it, returning the value of the expression
///
/// The VM is only invoked when compilation succeeds.
pub fn interpret(source: &str, heap: &mut Heap) -> Result<Value, InterpretError> {
    interpret_with(source, heap, CompileOptions::default())
}

/// [`interpret`] with explicit compile options
pub fn interpret_with(
    source: &str,
    heap: &mut Heap,
    options: CompileOptions,
) -> Result<Value, InterpretError> {
    let mut chunk = Chunk::new();
    compile_with(source, &mut chunk, heap, options)?;
    let value = Vm::new().interpret(&chunk, heap)?;
    Ok(value)
}

/// The Kindle virtual machine
#[derive(Debug, Default)]
pub struct Vm {
    stack: Vec<Value>,
    /// Offset of the instruction being executed
    ip: usize,
}

impl Vm {
    /// Create a new VM
    #[must_use]
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(STACK_MAX),
            ip: 0,
        }
    }

    /// Execute `chunk`, returning the value popped by `RETURN`
    pub fn interpret(&mut self, chunk: &Chunk, heap: &mut Heap) -> RuntimeResult<Value> {
        self.stack.clear();
        self.ip = 0;
        tracing::debug!(bytes = chunk.len(), "vm start");

        let result = self.run(chunk, heap);
        match &result {
            Ok(value) => tracing::debug!(%value, "vm finish"),
            Err(error) => tracing::debug!(error = %error.kind, line = error.line, "vm error"),
        }
        result
    }

    fn run(&mut self, chunk: &Chunk, heap: &mut Heap) -> RuntimeResult<Value> {
        loop {
            let offset = self.ip;
            let line = chunk.get_line(offset);
            let Some(byte) = chunk.read_byte(offset) else {
                return Err(RuntimeError::new(RuntimeErrorKind::MissingReturn, line));
            };
            let op = OpCode::try_from(byte)
                .map_err(|byte| RuntimeError::new(RuntimeErrorKind::InvalidOpcode(byte), line))?;
            self.ip += op.size();

            if tracing::enabled!(tracing::Level::TRACE) {
                let (text, _) = crate::bytecode::disassemble_instruction(chunk, offset);
                tracing::trace!(stack = ?self.stack, "{text}");
            }

            self.execute(op, offset, chunk, heap)
                .map_err(|kind| RuntimeError::new(kind, line))?;

            if op == OpCode::Return {
                return self
                    .stack
                    .pop()
                    .ok_or(RuntimeError::new(RuntimeErrorKind::StackUnderflow, line));
            }
        }
    }

    fn execute(
        &mut self,
        op: OpCode,
        offset: usize,
        chunk: &Chunk,
        heap: &mut Heap,
    ) -> Result<(), RuntimeErrorKind> {
        match op {
            OpCode::Constant => {
                let index = chunk
                    .read_byte(offset + 1)
                    .map(u32::from)
                    .ok_or(RuntimeErrorKind::TruncatedOperand)?;
                self.push_constant(chunk, index)
            }
            OpCode::ConstantLong => {
                let index = chunk
                    .read_u24(offset + 1)
                    .ok_or(RuntimeErrorKind::TruncatedOperand)?;
                self.push_constant(chunk, index)
            }
            OpCode::Nil => self.push(Value::Nil),
            OpCode::True => self.push(Value::Bool(true)),
            OpCode::False => self.push(Value::Bool(false)),
            OpCode::Equal => {
                let right = self.pop()?;
                let left = self.pop()?;
                self.push(Value::from(left == right))
            }
            OpCode::Greater => self.comparison(|a, b| a > b),
            OpCode::Less => self.comparison(|a, b| a < b),
            OpCode::Add => self.add(heap),
            OpCode::Subtract => self.arithmetic(|a, b| a - b),
            OpCode::Multiply => self.arithmetic(|a, b| a * b),
            OpCode::Divide => self.arithmetic(|a, b| a / b),
            OpCode::Not => {
                let value = self.pop()?;
                self.push(Value::from(value.is_falsey()))
            }
            OpCode::Negate => {
                let n = self
                    .peek(0)?
                    .as_number()
                    .ok_or(RuntimeErrorKind::OperandNotNumber)?;
                self.pop()?;
                self.push(Value::from(-n))
            }
            // The caller pops the result
            OpCode::Return => Ok(()),
        }
    }

    // ===== Stack operations =====

    fn push(&mut self, value: Value) -> Result<(), RuntimeErrorKind> {
        if self.stack.len() >= STACK_MAX {
            return Err(RuntimeErrorKind::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeErrorKind> {
        self.stack.pop().ok_or(RuntimeErrorKind::StackUnderflow)
    }

    fn peek(&self, distance: usize) -> Result<&Value, RuntimeErrorKind> {
        self.stack
            .len()
            .checked_sub(1 + distance)
            .and_then(|index| self.stack.get(index))
            .ok_or(RuntimeErrorKind::StackUnderflow)
    }

    fn push_constant(&mut self, chunk: &Chunk, index: u32) -> Result<(), RuntimeErrorKind> {
        let value = chunk
            .get_constant(index)
            .cloned()
            .ok_or(RuntimeErrorKind::InvalidConstant(index))?;
        self.push(value)
    }

    // ===== Binary operations =====

    /// Pop two numbers, leaving the stack untouched on a type error
    fn pop_numbers(&mut self) -> Result<(f64, f64), RuntimeErrorKind> {
        let (Some(b), Some(a)) = (self.peek(0)?.as_number(), self.peek(1)?.as_number()) else {
            return Err(RuntimeErrorKind::OperandsNotNumbers);
        };
        self.pop()?;
        self.pop()?;
        Ok((a, b))
    }

    fn arithmetic(&mut self, f: impl FnOnce(f64, f64) -> f64) -> Result<(), RuntimeErrorKind> {
        let (a, b) = self.pop_numbers()?;
        self.push(Value::from(f(a, b)))
    }

    fn comparison(&mut self, f: impl FnOnce(f64, f64) -> bool) -> Result<(), RuntimeErrorKind> {
        let (a, b) = self.pop_numbers()?;
        self.push(Value::from(f(a, b)))
    }

    fn add(&mut self, heap: &mut Heap) -> Result<(), RuntimeErrorKind> {
        let right = self.peek(0)?;
        let left = self.peek(1)?;
        let result = match (left, right) {
            (Value::Number(a), Value::Number(b)) => Value::from(a + b),
            (Value::Obj(a), Value::Obj(b)) => match (a.as_str(), b.as_str()) {
                (Some(a), Some(b)) => {
                    let joined = format!("{a}{b}");
                    Value::from(heap.intern(&joined))
                }
                _ => return Err(RuntimeErrorKind::OperandsNotAddable),
            },
            (Value::Bool(_) | Value::Nil | Value::Number(_) | Value::Obj(_), _) => {
                return Err(RuntimeErrorKind::OperandsNotAddable);
            }
        };
        self.pop()?;
        self.pop()?;
        self.push(result)
    }
}
