//! Bytecode module for the Kindle virtual machine
//!
//! This module provides:
//! - `OpCode`: The bytecode instruction set
//! - `Value`: Runtime value representation
//! - `Heap`: Object registry and string interner
//! - `Chunk`: A sequence of bytecode instructions with its constant pool
//! - Disassembler utilities for debugging

mod chunk;
mod debug;
mod object;
mod opcode;
mod value;

pub use chunk::{grow_capacity, Chunk, MAX_CONSTANTS, MAX_SHORT_CONSTANT};
pub use debug::{disassemble_chunk, disassemble_instruction};
pub use object::{Heap, ObjRef, Object};
pub use opcode::OpCode;
pub use value::Value;
