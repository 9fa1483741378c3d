//! Lexical analyzer for state machine source text.
//!
//! The lexer converts source text into a stream of [`LexEvent`]s. Whitespace
//! and `//` comments are skipped. Every other character ends up in exactly
//! one token or in one lexical error; lexing never stops early.
//!
//! The public entry point is [`tokenize`].

use winnow::{
    Parser as _,
    combinator::{alt, preceded},
    error::ModalResult,
    stream::{LocatingSlice, Location, Stream},
    token::take_while,
};

use crate::{
    span::Span,
    tokens::{LexEvent, LexicalError, PositionedToken, Token},
};

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O>;

/// Parse a line comment starting with '//'
fn line_comment(input: &mut Input<'_>) -> IResult<()> {
    preceded("//", take_while(0.., |c| c != '\n'))
        .void()
        .parse_next(input)
}

/// ASCII whitespace plus the vertical tab
fn is_blank(c: char) -> bool {
    c.is_ascii_whitespace() || c == '\x0B'
}

/// Parse a run of whitespace, newlines included
fn whitespace(input: &mut Input<'_>) -> IResult<()> {
    take_while(1.., is_blank)
        .void()
        .parse_next(input)
}

/// Parse anything that produces no token
fn trivia(input: &mut Input<'_>) -> IResult<()> {
    alt((whitespace, line_comment)).parse_next(input)
}

/// Parse a name: a run of ASCII letters, digits and underscores
fn name<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_')
        .map(Token::Name)
        .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '{'.value(Token::OpenBrace),
        '}'.value(Token::ClosedBrace),
        '('.value(Token::OpenParen),
        ')'.value(Token::ClosedParen),
        '<'.value(Token::OpenAngle),
        '>'.value(Token::ClosedAngle),
        '-'.value(Token::Dash),
        '*'.value(Token::Dash),
        ':'.value(Token::Colon),
    ))
    .parse_next(input)
}

fn token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((single_char_token, name)).parse_next(input)
}

/// Maps byte offsets to 1-based lines and 0-based character columns.
struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    fn locate(&self, offset: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = self.source[line_start..offset].chars().count();
        (line, column)
    }
}

/// Lexer that accumulates tokens and lexical errors in source order.
struct Lexer<'a> {
    lines: LineIndex<'a>,
    events: Vec<LexEvent<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: LineIndex::new(source),
            events: Vec::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            let checkpoint = input.checkpoint();
            if trivia(&mut input).is_ok() {
                continue;
            }
            input.reset(&checkpoint);

            let start = input.current_token_start();
            let (line, column) = self.lines.locate(start);
            match token(&mut input) {
                Ok(token) => {
                    let span = Span::new(start..input.current_token_start());
                    self.events.push(LexEvent::Token(PositionedToken::new(
                        token, span, line, column,
                    )));
                }
                Err(_) => {
                    input.reset(&checkpoint);
                    let Some(character) = input.next_token() else {
                        break;
                    };
                    let span = Span::new(start..start + character.len_utf8());
                    self.events.push(LexEvent::Error(LexicalError {
                        character,
                        span,
                        line,
                        column,
                    }));
                }
            }
        }
    }

    fn finish(self) -> Vec<LexEvent<'a>> {
        self.events
    }
}

/// Split source text into tokens and lexical errors.
///
/// Errors do not stop the scan: each offending character is reported once
/// and lexing resumes right after it.
pub fn tokenize(source: &str) -> Vec<LexEvent<'_>> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize(LocatingSlice::new(source));
    lexer.finish()
}

/// Line and column just past the last character of `source`.
pub(crate) fn end_of_input(source: &str) -> (usize, usize) {
    LineIndex::new(source).locate(source.len())
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    /// Source text mixing names, punctuation, whitespace and stray characters.
    fn source_strategy() -> impl Strategy<Value = String> {
        r"[a-zA-Z0-9_ \t\n\x0B{}()<>:*.,;#@é-]{0,64}"
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Every non-whitespace character lands in exactly one event.
    fn check_events_cover_all_characters(source: &str) -> Result<(), TestCaseError> {
        let events = tokenize(source);

        let covered: String = events
            .iter()
            .map(|event| &source[event.span().range()])
            .collect();
        let expected: String = source
            .chars()
            .filter(|c| !is_blank(*c))
            .collect();
        prop_assert_eq!(covered, expected);

        for event in &events {
            if let LexEvent::Error(error) = event {
                prop_assert_eq!(error.span.len(), error.character.len_utf8());
            }
        }
        Ok(())
    }

    /// Spans and line/column positions never go backwards.
    fn check_positions_are_monotonic(source: &str) -> Result<(), TestCaseError> {
        let events = tokenize(source);

        for pair in events.windows(2) {
            prop_assert!(pair[0].span().end() <= pair[1].span().start());
            prop_assert!(pair[0].position() < pair[1].position());
        }
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn events_cover_all_characters(source in source_strategy()) {
            check_events_cover_all_characters(&source)?;
        }

        #[test]
        fn positions_are_monotonic(source in source_strategy()) {
            check_positions_are_monotonic(&source)?;
        }
    }
}
