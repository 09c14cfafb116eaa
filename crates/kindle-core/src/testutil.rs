//! Test utilities for Kindle
//!
//! Helpers for compiling and evaluating source snippets in tests and
//! benchmarks.

use crate::bytecode::{Chunk, Heap, OpCode, Value};
use crate::compiler::{compile, CompileResult};
use crate::vm::interpret;

/// Result type for test helpers
pub type TestResult<T> = Result<T, String>;

/// Compile `source` into a fresh chunk
///
/// # Errors
/// Returns the compile error if compilation fails
pub fn compile_source(source: &str) -> CompileResult<Chunk> {
    let mut chunk = Chunk::new();
    let mut heap = Heap::new();
    compile(source, &mut chunk, &mut heap)?;
    Ok(chunk)
}

/// Decode the opcode of every instruction in `chunk`, skipping operands
///
/// Decoding stops at the first byte that is not an opcode.
#[must_use]
pub fn opcodes(chunk: &Chunk) -> Vec<OpCode> {
    let mut ops = Vec::new();
    let mut offset = 0;
    while let Some(Ok(op)) = chunk.read_byte(offset).map(OpCode::try_from) {
        ops.push(op);
        offset += op.size();
    }
    ops
}

/// Compile and run a Kindle expression
///
/// # Errors
/// Returns error if compilation or execution fails
pub fn eval(source: &str) -> TestResult<Value> {
    let mut heap = Heap::new();
    interpret(source, &mut heap).map_err(|e| e.to_string())
}

/// Evaluate a Kindle expression and expect a number
///
/// # Errors
/// Returns error if evaluation fails or result is not a number
pub fn eval_number(source: &str) -> TestResult<f64> {
    let value = eval(source)?;
    value
        .as_number()
        .ok_or_else(|| format!("Expected number, got {}", value.type_name()))
}

/// Evaluate a Kindle expression and expect a boolean
///
/// # Errors
/// Returns error if evaluation fails or result is not a boolean
pub fn eval_bool(source: &str) -> TestResult<bool> {
    match eval(source)? {
        Value::Bool(b) => Ok(b),
        other => Err(format!("Expected bool, got {}", other.type_name())),
    }
}
