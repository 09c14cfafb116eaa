//! Single-pass compiler from Kindle expressions to bytecode
//!
//! The compiler is a Pratt parser that emits code as it parses; there is no
//! syntax tree. Each token kind has a row in a static precedence table
//! naming its prefix handler, infix handler and binding precedence.
//!
//! # Example
//!
//! ```
//! use kindle_core::bytecode::{Chunk, Heap, OpCode};
//! use kindle_core::compiler::compile;
//!
//! let mut chunk = Chunk::new();
//! let mut heap = Heap::new();
//! compile("1 + 2", &mut chunk, &mut heap).unwrap();
//! assert_eq!(chunk.code().last(), Some(&u8::from(OpCode::Return)));
//! ```

mod error;
mod options;
mod rules;

pub use error::{CompileError, CompileErrorKind, CompileResult, Diagnostic, ErrorLocation};
pub use options::{CompileOptions, TraceEvent, TraceHook, DEFAULT_MAX_DEPTH};
pub use rules::{get_rule, Infix, ParseRule, Precedence, Prefix};

use error::ErrorReporter;

use crate::bytecode::{disassemble_chunk, Chunk, Heap, OpCode, Value, MAX_SHORT_CONSTANT};
use crate::lexer::{Scanner, Token, TokenKind, TokenSource};

/// Compile `source` into `chunk` with default options
///
/// On failure the chunk may be partially written and must not be executed.
pub fn compile(source: &str, chunk: &mut Chunk, heap: &mut Heap) -> CompileResult<()> {
    compile_with(source, chunk, heap, CompileOptions::default())
}

/// Compile `source` into `chunk`
pub fn compile_with(
    source: &str,
    chunk: &mut Chunk,
    heap: &mut Heap,
    options: CompileOptions,
) -> CompileResult<()> {
    Compiler::new(Scanner::new(source), chunk, heap)
        .with_options(options)
        .compile()
}

/// The Kindle compiler
///
/// Holds the two-token lookahead, the chunk being written, and the error
/// state of a single compilation. Consumed by [`Compiler::compile`].
pub struct Compiler<'src, 'ctx, S: TokenSource<'src>> {
    tokens: S,
    chunk: &'ctx mut Chunk,
    heap: &'ctx mut Heap,
    options: CompileOptions,
    trace: Option<TraceHook<'ctx>>,
    previous: Token<'src>,
    current: Token<'src>,
    reporter: ErrorReporter,
    depth: usize,
}

impl<'src, 'ctx, S: TokenSource<'src>> Compiler<'src, 'ctx, S> {
    /// Create a compiler reading from `tokens` and writing into `chunk`
    pub fn new(tokens: S, chunk: &'ctx mut Chunk, heap: &'ctx mut Heap) -> Self {
        Self {
            tokens,
            chunk,
            heap,
            options: CompileOptions::default(),
            trace: None,
            previous: Token::synthetic(),
            current: Token::synthetic(),
            reporter: ErrorReporter::default(),
            depth: 0,
        }
    }

    /// Replace the compile options
    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Attach a trace hook
    #[must_use]
    pub fn with_trace(mut self, hook: TraceHook<'ctx>) -> Self {
        self.trace = Some(hook);
        self
    }

    /// Compile one expression followed by end of input
    ///
    /// Always terminates the chunk with `RETURN`. Succeeds when no error
    /// was recorded.
    pub fn compile(mut self) -> CompileResult<()> {
        tracing::debug!(max_depth = self.options.max_depth, "compile start");

        self.advance();
        self.expression();
        self.consume(TokenKind::Eof, CompileErrorKind::ExpectedEndOfExpression);
        self.end_compiler();

        tracing::debug!(
            bytes = self.chunk.len(),
            constants = self.chunk.constants().len(),
            ok = !self.reporter.had_error(),
            "compile finish"
        );
        self.reporter.finish()
    }

    // ==================== Token Management ====================

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.tokens.next_token();
            self.trace(TraceEvent::Advance {
                previous: self.previous,
                current: self.current,
            });
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = self.current.lexeme.to_string();
            self.error_at_current(CompileErrorKind::Lexical(message));
        }
    }

    fn consume(&mut self, kind: TokenKind, error: CompileErrorKind) {
        if self.current.kind == kind {
            self.advance();
        } else {
            self.error_at_current(error);
        }
    }

    // ==================== Error Reporting ====================

    fn error(&mut self, kind: CompileErrorKind) {
        self.reporter.report(&self.previous, kind);
    }

    fn error_at_current(&mut self, kind: CompileErrorKind) {
        self.reporter.report(&self.current, kind);
    }

    // ==================== Emission ====================

    fn emit_op(&mut self, op: OpCode) {
        let offset = self.chunk.len();
        let line = self.previous.line;
        self.chunk.write_op(op, line);
        self.trace(TraceEvent::Emit { offset, op, line });
    }

    fn emit_ops(&mut self, first: OpCode, second: OpCode) {
        self.emit_op(first);
        self.emit_op(second);
    }

    fn emit_constant(&mut self, value: Value) {
        let offset = self.chunk.len();
        let line = self.previous.line;

        let reused = if self.options.dedupe_constants {
            self.chunk.find_constant(&value)
        } else {
            None
        };
        let index = match reused {
            Some(index) => index,
            None => match self.chunk.add_constant(value) {
                Some(index) => index,
                None => {
                    self.error(CompileErrorKind::TooManyConstants);
                    return;
                }
            },
        };

        self.chunk.write_constant_index(index, line);
        let op = if index <= MAX_SHORT_CONSTANT {
            OpCode::Constant
        } else {
            OpCode::ConstantLong
        };
        self.trace(TraceEvent::Emit { offset, op, line });
    }

    fn end_compiler(&mut self) {
        self.emit_op(OpCode::Return);

        if !self.reporter.had_error() && tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!("\n{}", disassemble_chunk(self.chunk, "code"));
        }
    }

    // ==================== Expressions ====================

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        if self.depth >= self.options.max_depth {
            self.error_at_current(CompileErrorKind::NestingTooDeep);
            return;
        }
        self.depth += 1;
        self.trace(TraceEvent::ParsePrecedence {
            precedence,
            depth: self.depth,
        });

        self.advance();
        match get_rule(self.previous.kind).prefix {
            Some(prefix) => {
                self.prefix(prefix);
                self.infix_loop(precedence);
            }
            None => self.error(CompileErrorKind::ExpectedExpression),
        }

        self.depth -= 1;
    }

    /// Extend the expression while the next operator binds at least as
    /// tightly as `precedence`
    fn infix_loop(&mut self, precedence: Precedence) {
        loop {
            let rule = get_rule(self.current.kind);
            let Some(infix) = rule.infix else { break };
            if rule.precedence < precedence {
                break;
            }
            self.advance();
            self.infix(infix);
        }
    }

    fn prefix(&mut self, handler: Prefix) {
        self.trace(TraceEvent::Prefix {
            handler,
            token: self.previous,
        });
        match handler {
            Prefix::Grouping => self.grouping(),
            Prefix::Unary => self.unary(),
            Prefix::Number => self.number(),
            Prefix::String => self.string(),
            Prefix::Literal => self.literal(),
        }
    }

    fn infix(&mut self, handler: Infix) {
        self.trace(TraceEvent::Infix {
            handler,
            token: self.previous,
        });
        match handler {
            Infix::Binary => self.binary(),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, CompileErrorKind::ExpectedRightParen);
    }

    fn unary(&mut self) {
        let operator = self.previous.kind;

        // Operand first; the operator transforms it in place
        self.parse_precedence(Precedence::Unary);

        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => {}
        }
    }

    fn binary(&mut self) {
        let operator = self.previous.kind;
        let precedence = get_rule(operator).precedence;
        self.parse_precedence(precedence.next());

        match operator {
            TokenKind::BangEqual => self.emit_ops(OpCode::Equal, OpCode::Not),
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_ops(OpCode::Less, OpCode::Not),
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => self.emit_ops(OpCode::Greater, OpCode::Not),
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            _ => {}
        }
    }

    fn literal(&mut self) {
        match self.previous.kind {
            TokenKind::False => self.emit_op(OpCode::False),
            TokenKind::Nil => self.emit_op(OpCode::Nil),
            TokenKind::True => self.emit_op(OpCode::True),
            _ => {}
        }
    }

    fn number(&mut self) {
        match self.previous.lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::from(value)),
            Err(_) => self.error(CompileErrorKind::InvalidNumber),
        }
    }

    fn string(&mut self) {
        let lexeme = self.previous.lexeme;
        let text = lexeme.get(1..lexeme.len().saturating_sub(1)).unwrap_or("");
        let object = self.heap.intern(text);
        self.emit_constant(Value::from(object));
    }

    fn trace(&mut self, event: TraceEvent<'src>) {
        tracing::trace!(?event, "compile step");
        if let Some(hook) = self.trace.as_mut() {
            hook(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::MAX_CONSTANTS;
    use crate::testutil::{compile_source, opcodes};
    use pretty_assertions::assert_eq;

    fn compile_err(source: &str) -> CompileError {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        compile(source, &mut chunk, &mut heap).unwrap_err()
    }

    #[test]
    fn multiply_binds_tighter_than_add() {
        let chunk = compile_source("1 + 2 * 3").unwrap();
        assert_eq!(
            opcodes(&chunk),
            vec![
                OpCode::Constant,
                OpCode::Constant,
                OpCode::Constant,
                OpCode::Multiply,
                OpCode::Add,
                OpCode::Return,
            ]
        );
    }

    #[test]
    fn grouping_overrides_precedence() {
        let chunk = compile_source("(1 + 2) * 3").unwrap();
        assert_eq!(
            opcodes(&chunk),
            vec![
                OpCode::Constant,
                OpCode::Constant,
                OpCode::Add,
                OpCode::Constant,
                OpCode::Multiply,
                OpCode::Return,
            ]
        );
    }

    #[test]
    fn subtraction_is_left_associative() {
        let chunk = compile_source("1 - 2 - 3").unwrap();
        assert_eq!(
            opcodes(&chunk),
            vec![
                OpCode::Constant,
                OpCode::Constant,
                OpCode::Subtract,
                OpCode::Constant,
                OpCode::Subtract,
                OpCode::Return,
            ]
        );
    }

    #[test]
    fn unary_binds_tighter_than_binary() {
        let chunk = compile_source("-1 + 2").unwrap();
        assert_eq!(
            opcodes(&chunk),
            vec![
                OpCode::Constant,
                OpCode::Negate,
                OpCode::Constant,
                OpCode::Add,
                OpCode::Return,
            ]
        );
    }

    #[test]
    fn synthesized_comparisons() {
        let cases = [
            ("1 != 2", vec![OpCode::Equal, OpCode::Not]),
            ("1 >= 2", vec![OpCode::Less, OpCode::Not]),
            ("1 <= 2", vec![OpCode::Greater, OpCode::Not]),
            ("1 == 2", vec![OpCode::Equal]),
            ("1 > 2", vec![OpCode::Greater]),
            ("1 < 2", vec![OpCode::Less]),
        ];
        for (source, expected) in cases {
            let chunk = compile_source(source).unwrap();
            let ops = opcodes(&chunk);
            assert_eq!(&ops[2..ops.len() - 1], expected.as_slice(), "{source}");
        }
    }

    #[test]
    fn string_inequality_emits_equal_then_not() {
        let chunk = compile_source("\"ab\" != \"ab\"").unwrap();
        let ops = opcodes(&chunk);
        let equal = ops.iter().position(|op| *op == OpCode::Equal).unwrap();
        assert_eq!(ops[equal + 1], OpCode::Not);
        assert_eq!(chunk.constants()[0].as_str(), Some("ab"));
        assert_eq!(chunk.constants()[0], chunk.constants()[1]);
    }

    #[test]
    fn literals() {
        let chunk = compile_source("!nil == !false").unwrap();
        assert_eq!(
            opcodes(&chunk),
            vec![
                OpCode::Nil,
                OpCode::Not,
                OpCode::False,
                OpCode::Not,
                OpCode::Equal,
                OpCode::Return,
            ]
        );
        assert!(chunk.constants().is_empty());
    }

    #[test]
    #[allow(clippy::approx_constant)]
    fn number_constant_round_trips() {
        let chunk = compile_source("3.14").unwrap();
        let index = chunk.read_byte(1).unwrap();
        assert_eq!(chunk.get_constant(u32::from(index)), Some(&Value::Number(3.14)));
    }

    #[test]
    fn string_quotes_are_stripped() {
        let chunk = compile_source("\"hello\"").unwrap();
        assert_eq!(chunk.constants()[0].as_str(), Some("hello"));
    }

    #[test]
    fn repeated_literals_get_separate_slots() {
        let chunk = compile_source("1 + 1").unwrap();
        assert_eq!(chunk.constants().len(), 2);
    }

    #[test]
    fn dedupe_reuses_slots() {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        let options = CompileOptions::new().with_dedupe_constants(true);
        compile_with("1 + 1 + \"a\" + \"a\"", &mut chunk, &mut heap, options).unwrap();
        assert_eq!(chunk.constants().len(), 2);
        assert_eq!(chunk.code()[1], chunk.code()[3]);
    }

    #[test]
    fn lines_follow_tokens() {
        let chunk = compile_source("1 +\n2").unwrap();
        assert_eq!(chunk.lines(), &[1, 1, 2, 2, 2, 2]);
    }

    #[test]
    fn unterminated_grouping_fails_at_end() {
        let error = compile_err("(1 + 2");
        assert_eq!(error.diagnostics.len(), 1);
        assert_eq!(
            error.to_string(),
            "[line 1] Error at end: Expected ')' after expression."
        );
    }

    #[test]
    fn missing_operand() {
        let error = compile_err("1 +");
        assert_eq!(error.to_string(), "[line 1] Error at end: Expected expression.");

        let error = compile_err("\n* 2");
        assert_eq!(error.to_string(), "[line 2] Error at '*': Expected expression.");
    }

    #[test]
    fn trailing_tokens() {
        let error = compile_err("1 2");
        assert_eq!(error.to_string(), "[line 1] Error at '2': Expected end of expression.");
    }

    #[test]
    fn only_first_error_is_surfaced() {
        let error = compile_err("(* 1");
        assert_eq!(error.diagnostics.len(), 1);
        assert!(error.error_count >= 2);
        assert_eq!(error.first().unwrap().kind, CompileErrorKind::ExpectedExpression);
    }

    #[test]
    fn lexical_error_omits_lexeme() {
        let error = compile_err("1 + @");
        assert_eq!(error.to_string(), "[line 1] Error: Unexpected character.");

        let error = compile_err("\"open");
        assert_eq!(error.to_string(), "[line 1] Error: Unterminated string.");
    }

    #[test]
    fn failed_compile_still_ends_with_return() {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        assert!(compile(")", &mut chunk, &mut heap).is_err());
        assert_eq!(chunk.code().last(), Some(&u8::from(OpCode::Return)));
    }

    #[test]
    fn nesting_limit() {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        let options = CompileOptions::new().with_max_depth(4);

        compile_with("((1))", &mut chunk, &mut heap, options).unwrap();

        chunk.free();
        let error = compile_with("((((((1))))))", &mut chunk, &mut heap, options).unwrap_err();
        assert_eq!(error.first().unwrap().kind, CompileErrorKind::NestingTooDeep);
    }

    #[test]
    fn full_constant_pool_is_a_compile_error() {
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        for _ in 0..MAX_CONSTANTS {
            chunk.add_constant(Value::Nil).unwrap();
        }

        let error = compile("1 + 2", &mut chunk, &mut heap).unwrap_err();
        let first = error.first().unwrap();
        assert_eq!(first.kind, CompileErrorKind::TooManyConstants);
        assert_eq!(
            first.to_string(),
            "[line 1] Error at '1': Too many constants in one chunk."
        );
        assert_eq!(error.error_count, 2);
        assert_eq!(chunk.constants().len(), MAX_CONSTANTS);
        assert_eq!(chunk.code().last(), Some(&u8::from(OpCode::Return)));
    }

    #[test]
    fn deep_nesting_within_default_limit() {
        let source = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert!(compile_source(&source).is_ok());

        let source = format!("{}1", "-".repeat(300));
        let error = compile_source(&source).unwrap_err();
        assert_eq!(error.first().unwrap().kind, CompileErrorKind::NestingTooDeep);
    }

    #[test]
    fn custom_token_source() {
        let tokens = vec![
            Token::new(TokenKind::True, "true", 7),
            Token::new(TokenKind::Eof, "", 7),
        ];
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        Compiler::new(tokens.into_iter(), &mut chunk, &mut heap)
            .compile()
            .unwrap();
        assert_eq!(opcodes(&chunk), vec![OpCode::True, OpCode::Return]);
        assert_eq!(chunk.lines(), &[7, 7]);
    }

    #[test]
    fn invalid_number_from_token_source() {
        let tokens = vec![Token::new(TokenKind::Number, "1.2.3", 1)];
        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        let error = Compiler::new(tokens.into_iter(), &mut chunk, &mut heap)
            .compile()
            .unwrap_err();
        assert_eq!(error.first().unwrap().kind, CompileErrorKind::InvalidNumber);
    }

    #[test]
    fn trace_hook_observes_events() {
        let mut events = Vec::new();
        let mut hook = |event: &TraceEvent<'_>| {
            let name = match event {
                TraceEvent::Advance { .. } => "advance",
                TraceEvent::ParsePrecedence { .. } => "precedence",
                TraceEvent::Prefix { .. } => "prefix",
                TraceEvent::Infix { .. } => "infix",
                TraceEvent::Emit { .. } => "emit",
            };
            events.push(name);
        };

        let mut chunk = Chunk::new();
        let mut heap = Heap::new();
        Compiler::new(Scanner::new("-1"), &mut chunk, &mut heap)
            .with_trace(&mut hook)
            .compile()
            .unwrap();

        assert_eq!(
            events,
            vec![
                "advance",
                "precedence",
                "advance",
                "prefix",
                "precedence",
                "advance",
                "prefix",
                "emit",
                "emit",
                "advance",
                "emit",
            ]
        );
    }

    #[test]
    fn trace_hook_does_not_change_output() {
        let mut plain = Chunk::new();
        let mut heap = Heap::new();
        compile("1 + 2 * -3", &mut plain, &mut heap).unwrap();

        let mut traced = Chunk::new();
        let mut count = 0;
        let mut hook = |_: &TraceEvent<'_>| count += 1;
        Compiler::new(Scanner::new("1 + 2 * -3"), &mut traced, &mut heap)
            .with_trace(&mut hook)
            .compile()
            .unwrap();

        assert_eq!(plain.code(), traced.code());
        assert!(count > 0);
    }
}
