//! Kindle Core - single-pass bytecode compiler for the Kindle expression language
//!
//! This crate provides:
//! - Lexer: logos-backed scanner behind the `TokenSource` trait
//! - Bytecode: opcodes, chunks, values, the object heap, and a disassembler
//! - Compiler: table-driven Pratt parser emitting bytecode directly
//! - VM: stack machine that executes finished chunks

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lexer module - tokenization of Kindle source code
pub mod lexer;

/// Bytecode module - instruction set, chunks, and values
pub mod bytecode;

/// Compiler module - expressions to bytecode in one pass
pub mod compiler;

/// Virtual Machine module - bytecode execution
pub mod vm;

/// Test utilities - helpers for testing Kindle code
pub mod testutil;

/// Convenience re-export of the scanner
pub use lexer::Scanner;

/// Convenience re-export of bytecode types
pub use bytecode::{Chunk, Heap, OpCode, Value};

/// Convenience re-export of compiler entry points
pub use compiler::{compile, compile_with, CompileError, CompileOptions, Compiler};

/// Convenience re-export of the VM
pub use vm::{interpret, InterpretError, Vm};
