//! Token types for the Kindle scanner

use logos::Logos;

use super::LexError;

/// The kind of token produced by the scanner
///
/// Discriminants are dense and start at zero; the compiler's precedence
/// table is indexed directly by `kind as usize`.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // ========== Single-character tokens ==========
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token(";")]
    Semicolon,
    #[token("/")]
    Slash,
    #[token("*")]
    Star,

    // ========== One or two character tokens ==========
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,

    // ========== Literals ==========
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    /// String literal, quotes included in the lexeme; may span lines
    #[token("\"", lex_string)]
    String,

    #[regex(r"[0-9]+(\.[0-9]+)?")]
    Number,

    // ========== Keywords ==========
    #[token("and")]
    And,
    #[token("class")]
    Class,
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("for")]
    For,
    #[token("fun")]
    Fun,
    #[token("if")]
    If,
    #[token("nil")]
    Nil,
    #[token("or")]
    Or,
    #[token("print")]
    Print,
    #[token("return")]
    Return,
    #[token("super")]
    Super,
    #[token("this")]
    This,
    #[token("true")]
    True,
    #[token("var")]
    Var,
    #[token("while")]
    While,

    // ========== Special ==========
    /// Lexical error; the token's lexeme holds the error message
    Error,

    /// End of input (produced by the scanner, not matched by logos)
    Eof,
}

/// Consume the body of a string literal after its opening quote
fn lex_string(lex: &mut logos::Lexer<TokenKind>) -> Result<(), LexError> {
    let remainder = lex.remainder();
    match remainder.find('"') {
        Some(close) => {
            lex.bump(close + 1);
            Ok(())
        }
        None => {
            lex.bump(remainder.len());
            Err(LexError::UnterminatedString)
        }
    }
}

impl TokenKind {
    /// Every token kind, in discriminant order
    pub const ALL: [TokenKind; 40] = [
        TokenKind::LeftParen,
        TokenKind::RightParen,
        TokenKind::LeftBrace,
        TokenKind::RightBrace,
        TokenKind::Comma,
        TokenKind::Dot,
        TokenKind::Minus,
        TokenKind::Plus,
        TokenKind::Semicolon,
        TokenKind::Slash,
        TokenKind::Star,
        TokenKind::Bang,
        TokenKind::BangEqual,
        TokenKind::Equal,
        TokenKind::EqualEqual,
        TokenKind::Greater,
        TokenKind::GreaterEqual,
        TokenKind::Less,
        TokenKind::LessEqual,
        TokenKind::Identifier,
        TokenKind::String,
        TokenKind::Number,
        TokenKind::And,
        TokenKind::Class,
        TokenKind::Else,
        TokenKind::False,
        TokenKind::For,
        TokenKind::Fun,
        TokenKind::If,
        TokenKind::Nil,
        TokenKind::Or,
        TokenKind::Print,
        TokenKind::Return,
        TokenKind::Super,
        TokenKind::This,
        TokenKind::True,
        TokenKind::Var,
        TokenKind::While,
        TokenKind::Error,
        TokenKind::Eof,
    ];

    /// Number of token kinds
    pub const COUNT: usize = Self::ALL.len();
}

// `Eof` is the last variant, so a kind missing from `ALL` fails to build
const _: () = assert!(TokenKind::Eof as usize + 1 == TokenKind::COUNT);
