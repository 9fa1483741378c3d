use std::fmt;

use crate::span::Span;

/// Token types of the state machine language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'src> {
    /// State, event, action or header name
    Name(&'src str),

    OpenBrace,   // {
    ClosedBrace, // }
    OpenParen,   // (
    ClosedParen, // )
    OpenAngle,   // <
    ClosedAngle, // >
    Dash,        // - or *
    Colon,       // :
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(name) => write!(f, "{name}"),
            Token::OpenBrace => write!(f, "{{"),
            Token::ClosedBrace => write!(f, "}}"),
            Token::OpenParen => write!(f, "("),
            Token::ClosedParen => write!(f, ")"),
            Token::OpenAngle => write!(f, "<"),
            Token::ClosedAngle => write!(f, ">"),
            Token::Dash => write!(f, "-"),
            Token::Colon => write!(f, ":"),
        }
    }
}

/// A token with its byte span and its line/column position.
///
/// Lines are 1-based; columns are 0-based and count characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
    pub line: usize,
    pub column: usize,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span, line: usize, column: usize) -> Self {
        Self {
            token,
            span,
            line,
            column,
        }
    }
}

impl<'src> std::ops::Deref for PositionedToken<'src> {
    type Target = Token<'src>;

    fn deref(&self) -> &Self::Target {
        &self.token
    }
}

impl<'src> AsRef<Token<'src>> for PositionedToken<'src> {
    fn as_ref(&self) -> &Token<'src> {
        &self.token
    }
}

impl fmt::Display for PositionedToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.token.fmt(f)
    }
}

/// A character that does not start any token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexicalError {
    pub character: char,
    pub span: Span,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for LexicalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unexpected character '{}'", self.character)
    }
}

/// One element of the lexer's output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexEvent<'src> {
    Token(PositionedToken<'src>),
    Error(LexicalError),
}

impl LexEvent<'_> {
    pub fn span(&self) -> Span {
        match self {
            LexEvent::Token(token) => token.span,
            LexEvent::Error(error) => error.span,
        }
    }

    /// The `(line, column)` pair of the event.
    pub fn position(&self) -> (usize, usize) {
        match self {
            LexEvent::Token(token) => (token.line, token.column),
            LexEvent::Error(error) => (error.line, error.column),
        }
    }
}
