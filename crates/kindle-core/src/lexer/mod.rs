//! Scanner for the Kindle language
//!
//! The compiler pulls tokens one at a time through the [`TokenSource`]
//! trait. [`Scanner`] is the logos-backed implementation over a source
//! string:
//! - Punctuation, operators, keywords, identifiers
//! - Number literals (`12`, `3.14`) and string literals (no escapes)
//! - `//` line comments and whitespace are skipped
//! - Lexical errors surface inline as [`TokenKind::Error`] tokens

mod lines;
mod token;

pub use lines::LineIndex;
pub use token::TokenKind;

use logos::Logos;

/// A token with its kind, source text, and line
///
/// The lexeme borrows from the source buffer. For [`TokenKind::Error`]
/// tokens the lexeme is the error message instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token
    pub kind: TokenKind,
    /// The source text of the token
    pub lexeme: &'src str,
    /// 1-based source line
    pub line: u32,
}

impl<'src> Token<'src> {
    /// Create a new token
    #[must_use]
    pub const fn new(kind: TokenKind, lexeme: &'src str, line: u32) -> Self {
        Self { kind, lexeme, line }
    }

    /// Placeholder used before the first token is fetched
    #[must_use]
    pub const fn synthetic() -> Self {
        Self::new(TokenKind::Eof, "", 0)
    }
}

/// Lexer error types
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LexError {
    #[default]
    UnexpectedChar,
    UnterminatedString,
}

impl LexError {
    /// The static message carried by the error token
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            LexError::UnexpectedChar => "Unexpected character.",
            LexError::UnterminatedString => "Unterminated string.",
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for LexError {}

/// Anything that can hand the compiler its next token
///
/// Implementations must keep returning [`TokenKind::Eof`] once the input
/// is exhausted.
pub trait TokenSource<'src> {
    /// Produce the next token
    fn next_token(&mut self) -> Token<'src>;
}

/// The Kindle scanner
pub struct Scanner<'src> {
    lexer: logos::Lexer<'src, TokenKind>,
    lines: LineIndex,
}

impl<'src> Scanner<'src> {
    /// Create a new scanner for the given source code
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: TokenKind::lexer(source),
            lines: LineIndex::new(source),
        }
    }

    /// Tokenize the entire source, up to and including the first EOF
    #[must_use]
    pub fn tokenize(source: &'src str) -> Vec<Token<'src>> {
        let mut scanner = Scanner::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.next_token();
            tokens.push(token);
            if token.kind == TokenKind::Eof {
                return tokens;
            }
        }
    }
}

impl<'src> TokenSource<'src> for Scanner<'src> {
    fn next_token(&mut self) -> Token<'src> {
        match self.lexer.next() {
            Some(Ok(kind)) => {
                let line = self.lines.line(self.lexer.span().start);
                Token::new(kind, self.lexer.slice(), line)
            }
            Some(Err(error)) => {
                let line = self.lines.line(self.lexer.span().start);
                Token::new(TokenKind::Error, error.message(), line)
            }
            None => {
                let end = self.lexer.source().len();
                Token::new(TokenKind::Eof, "", self.lines.line(end))
            }
        }
    }
}

/// A pre-scanned token vector can be replayed as a source
impl<'src> TokenSource<'src> for std::vec::IntoIter<Token<'src>> {
    fn next_token(&mut self) -> Token<'src> {
        self.next().unwrap_or(Token::new(TokenKind::Eof, "", 0))
    }
}
