//! Precedence table for the Pratt parser

use crate::lexer::TokenKind;

/// Binding precedence, lowest to highest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Precedence {
    None,
    /// `=`
    Assignment,
    /// `or`
    Or,
    /// `and`
    And,
    /// `==` `!=`
    Equality,
    /// `<` `>` `<=` `>=`
    Comparison,
    /// `+` `-`
    Term,
    /// `*` `/`
    Factor,
    /// `!` `-`
    Unary,
    /// `.` `()`
    Call,
    Primary,
}

impl Precedence {
    /// The next tighter level (saturates at `Primary`)
    ///
    /// Binary operators parse their right operand at `self.next()`, which
    /// makes them left-associative.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::None => Self::Assignment,
            Self::Assignment => Self::Or,
            Self::Or => Self::And,
            Self::And => Self::Equality,
            Self::Equality => Self::Comparison,
            Self::Comparison => Self::Term,
            Self::Term => Self::Factor,
            Self::Factor => Self::Unary,
            Self::Unary => Self::Call,
            Self::Call | Self::Primary => Self::Primary,
        }
    }
}

/// Handlers for tokens that start an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Grouping,
    Unary,
    Number,
    String,
    Literal,
}

/// Handlers for tokens that extend an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infix {
    Binary,
}

/// One row of the precedence table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseRule {
    pub prefix: Option<Prefix>,
    pub infix: Option<Infix>,
    pub precedence: Precedence,
}

impl ParseRule {
    const NONE: Self = Self::new(None, None, Precedence::None);

    const fn new(prefix: Option<Prefix>, infix: Option<Infix>, precedence: Precedence) -> Self {
        Self {
            prefix,
            infix,
            precedence,
        }
    }

    const fn prefix(prefix: Prefix) -> Self {
        Self::new(Some(prefix), None, Precedence::None)
    }

    const fn binary(precedence: Precedence) -> Self {
        Self::new(None, Some(Infix::Binary), precedence)
    }
}

/// Table indexed by `TokenKind as usize`
static RULES: [ParseRule; TokenKind::COUNT] = build_rules();

const fn build_rules() -> [ParseRule; TokenKind::COUNT] {
    let mut rules = [ParseRule::NONE; TokenKind::COUNT];
    let mut i = 0;
    while i < TokenKind::COUNT {
        rules[i] = rule_for(TokenKind::ALL[i]);
        i += 1;
    }
    rules
}

const fn rule_for(kind: TokenKind) -> ParseRule {
    match kind {
        TokenKind::LeftParen => ParseRule::prefix(Prefix::Grouping),
        TokenKind::Minus => ParseRule::new(
            Some(Prefix::Unary),
            Some(Infix::Binary),
            Precedence::Term,
        ),
        TokenKind::Plus => ParseRule::binary(Precedence::Term),
        TokenKind::Slash | TokenKind::Star => ParseRule::binary(Precedence::Factor),
        TokenKind::Bang => ParseRule::prefix(Prefix::Unary),
        TokenKind::BangEqual | TokenKind::EqualEqual => ParseRule::binary(Precedence::Equality),
        TokenKind::Greater
        | TokenKind::GreaterEqual
        | TokenKind::Less
        | TokenKind::LessEqual => ParseRule::binary(Precedence::Comparison),
        TokenKind::String => ParseRule::prefix(Prefix::String),
        TokenKind::Number => ParseRule::prefix(Prefix::Number),
        TokenKind::False | TokenKind::Nil | TokenKind::True => ParseRule::prefix(Prefix::Literal),
        TokenKind::RightParen
        | TokenKind::LeftBrace
        | TokenKind::RightBrace
        | TokenKind::Comma
        | TokenKind::Dot
        | TokenKind::Semicolon
        | TokenKind::Equal
        | TokenKind::Identifier
        | TokenKind::And
        | TokenKind::Class
        | TokenKind::Else
        | TokenKind::For
        | TokenKind::Fun
        | TokenKind::If
        | TokenKind::Or
        | TokenKind::Print
        | TokenKind::Return
        | TokenKind::Super
        | TokenKind::This
        | TokenKind::Var
        | TokenKind::While
        | TokenKind::Error
        | TokenKind::Eof => ParseRule::NONE,
    }
}

/// Look up the parse rule for a token kind
#[must_use]
pub fn get_rule(kind: TokenKind) -> &'static ParseRule {
    &RULES[kind as usize]
}
