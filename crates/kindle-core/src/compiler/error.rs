//! Compiler error types and panic-mode reporting

use std::fmt;

use thiserror::Error;

use crate::lexer::{Token, TokenKind};

/// Result type for compilation
pub type CompileResult<T> = Result<T, CompileError>;

/// The kind of compilation error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    #[error("Expected expression.")]
    ExpectedExpression,

    #[error("Expected ')' after expression.")]
    ExpectedRightParen,

    #[error("Expected end of expression.")]
    ExpectedEndOfExpression,

    #[error("Too many constants in one chunk.")]
    TooManyConstants,

    #[error("Expression nested too deeply.")]
    NestingTooDeep,

    #[error("Invalid number literal.")]
    InvalidNumber,

    /// Reported by the scanner through an error token
    #[error("{0}")]
    Lexical(String),
}

/// Where in the offending token a diagnostic points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// The token is end of input
    AtEnd,
    /// An ordinary token, echoed by its lexeme
    AtLexeme(String),
    /// An error token; its text is already the message
    Omitted,
}

impl ErrorLocation {
    fn of(token: &Token<'_>) -> Self {
        match token.kind {
            TokenKind::Eof => ErrorLocation::AtEnd,
            TokenKind::Error => ErrorLocation::Omitted,
            _ => ErrorLocation::AtLexeme(token.lexeme.to_string()),
        }
    }
}

/// A single surfaced compile error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: CompileErrorKind,
    pub line: u32,
    pub location: ErrorLocation,
}

impl Diagnostic {
    /// Create a diagnostic pointing at `token`
    #[must_use]
    pub fn at(token: &Token<'_>, kind: CompileErrorKind) -> Self {
        Self {
            kind,
            line: token.line,
            location: ErrorLocation::of(token),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error", self.line)?;
        match &self.location {
            ErrorLocation::AtEnd => write!(f, " at end")?,
            ErrorLocation::AtLexeme(lexeme) => write!(f, " at '{lexeme}'")?,
            ErrorLocation::Omitted => {}
        }
        write!(f, ": {}", self.kind)
    }
}

/// A failed compilation
///
/// Only the first error is surfaced as a diagnostic; later ones are
/// counted but suppressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub diagnostics: Vec<Diagnostic>,
    pub error_count: usize,
}

impl CompileError {
    /// The first surfaced diagnostic
    #[must_use]
    pub fn first(&self) -> Option<&Diagnostic> {
        self.diagnostics.first()
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for diagnostic in &self.diagnostics {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
            first = false;
        }
        if first {
            write!(f, "compilation failed")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileError {}

/// Error state for one compilation
///
/// `had_error` is sticky. `panic_mode` is set by the first error and never
/// cleared, so every later error is recorded silently.
#[derive(Debug, Default)]
pub(crate) struct ErrorReporter {
    had_error: bool,
    panic_mode: bool,
    error_count: usize,
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub(crate) fn report(&mut self, token: &Token<'_>, kind: CompileErrorKind) {
        self.had_error = true;
        self.error_count += 1;
        if self.panic_mode {
            tracing::trace!(line = token.line, error = %kind, "suppressed compile error");
            return;
        }
        self.panic_mode = true;

        let diagnostic = Diagnostic::at(token, kind);
        tracing::debug!(%diagnostic, "compile error");
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn had_error(&self) -> bool {
        self.had_error
    }

    pub(crate) fn finish(self) -> CompileResult<()> {
        if self.had_error {
            Err(CompileError {
                diagnostics: self.diagnostics,
                error_count: self.error_count,
            })
        } else {
            Ok(())
        }
    }
}
