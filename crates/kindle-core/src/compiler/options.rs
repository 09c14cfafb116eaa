//! Compiler configuration and the trace hook

use crate::bytecode::OpCode;
use crate::lexer::Token;

use super::rules::{Infix, Precedence, Prefix};

/// Default limit on expression nesting
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options controlling a compilation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Maximum recursion depth of the expression parser
    pub max_depth: usize,
    /// Reuse constant pool slots for identical literals
    pub dedupe_constants: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            dedupe_constants: false,
        }
    }
}

impl CompileOptions {
    /// Create the default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the nesting limit
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enable or disable constant deduplication
    #[must_use]
    pub fn with_dedupe_constants(mut self, dedupe: bool) -> Self {
        self.dedupe_constants = dedupe;
        self
    }
}

/// An observable step of the compiler, delivered to the trace hook
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TraceEvent<'src> {
    /// The lookahead moved forward
    Advance {
        previous: Token<'src>,
        current: Token<'src>,
    },
    /// A sub-expression is being parsed at `precedence`
    ParsePrecedence { precedence: Precedence, depth: usize },
    /// A prefix handler is about to run for `token`
    Prefix { handler: Prefix, token: Token<'src> },
    /// An infix handler is about to run for `token`
    Infix { handler: Infix, token: Token<'src> },
    /// An instruction was written at `offset`
    Emit { offset: usize, op: OpCode, line: u32 },
}

/// Callback that observes compilation without influencing it
pub type TraceHook<'h> = &'h mut dyn FnMut(&TraceEvent<'_>);
