//! Compile-and-run pipeline shared by `eval`, `run`, and `disasm`

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use kindle_core::bytecode::{disassemble_chunk, Chunk, Heap};
use kindle_core::compiler::{CompileOptions, Compiler, TraceEvent};
use kindle_core::lexer::Scanner;
use kindle_core::vm::Vm;

/// Exit status for a compile error (`EX_DATAERR`)
pub const EXIT_COMPILE_ERROR: u8 = 65;
/// Exit status for a runtime error (`EX_SOFTWARE`)
pub const EXIT_RUNTIME_ERROR: u8 = 70;

/// How a source buffer should be processed
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub compile: CompileOptions,
    /// Print the chunk before executing it
    pub disassemble: bool,
    /// Print every compiler step to the error stream
    pub trace: bool,
    /// Stop after compiling
    pub compile_only: bool,
}

/// Outcome of running one source buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    CompileError,
    RuntimeError,
}

impl Status {
    /// Process exit code for this status
    #[must_use]
    pub fn exit_code(self) -> ExitCode {
        match self {
            Status::Success => ExitCode::SUCCESS,
            Status::CompileError => ExitCode::from(EXIT_COMPILE_ERROR),
            Status::RuntimeError => ExitCode::from(EXIT_RUNTIME_ERROR),
        }
    }
}

/// Compile `source` and, unless compiling only, execute it
///
/// Results go to `out`; diagnostics and trace lines go to `err`.
pub fn execute(
    source: &str,
    name: &str,
    heap: &mut Heap,
    options: RunOptions,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<Status> {
    let mut chunk = Chunk::new();
    let compiled = if options.trace {
        let mut trace_lines = Vec::new();
        let mut hook = |event: &TraceEvent<'_>| trace_lines.push(format_event(event));
        let result = Compiler::new(Scanner::new(source), &mut chunk, heap)
            .with_options(options.compile)
            .with_trace(&mut hook)
            .compile();
        for line in trace_lines {
            writeln!(err, "{line}")?;
        }
        result
    } else {
        Compiler::new(Scanner::new(source), &mut chunk, heap)
            .with_options(options.compile)
            .compile()
    };

    if let Err(error) = compiled {
        writeln!(err, "{error}")?;
        return Ok(Status::CompileError);
    }

    if options.disassemble || options.compile_only {
        write!(out, "{}", disassemble_chunk(&chunk, name))?;
    }
    if options.compile_only {
        return Ok(Status::Success);
    }

    match Vm::new().interpret(&chunk, heap) {
        Ok(value) => {
            writeln!(out, "{value}")?;
            Ok(Status::Success)
        }
        Err(error) => {
            writeln!(err, "{error}")?;
            Ok(Status::RuntimeError)
        }
    }
}

/// Read `path` and [`execute`] it against the standard streams
pub fn execute_file(path: &Path, options: RunOptions) -> Result<Status> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let name = path.display().to_string();
    let mut heap = Heap::new();
    execute(
        &source,
        &name,
        &mut heap,
        options,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )
}

/// One human-readable line per trace event
#[must_use]
pub fn format_event(event: &TraceEvent<'_>) -> String {
    match event {
        TraceEvent::Advance { previous, current } => format!(
            "advance   previous {:?} '{}', current {:?} '{}'",
            previous.kind, previous.lexeme, current.kind, current.lexeme
        ),
        TraceEvent::ParsePrecedence { precedence, depth } => {
            format!("parse     {precedence:?} (depth {depth})")
        }
        TraceEvent::Prefix { handler, token } => {
            format!("prefix    {handler:?} '{}'", token.lexeme)
        }
        TraceEvent::Infix { handler, token } => {
            format!("infix     {handler:?} '{}'", token.lexeme)
        }
        TraceEvent::Emit { offset, op, line } => {
            format!("emit      {offset:04} {op} (line {line})")
        }
    }
}
