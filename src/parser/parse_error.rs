use thiserror::Error;

use crate::parser::QueryParser;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ParseError: {message}\n  at [{start}:{end}] -> '{text}'")]
pub struct ParseError {
    pub message: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

impl ParseError {
    /// Error spanning from the token at `pivot` up to the current token.
    pub fn new(message: &str, pivot: usize, parser: &QueryParser) -> Self {
        let start = parser.token_start(pivot);
        let end = parser.token_end(parser.position).max(start);
        Self {
            message: message.to_string(),
            text: parser.text_from_range(start, end),
            start,
            end,
        }
    }

    /// Error over a raw byte range of the source text.
    pub fn at(message: &str, start: usize, end: usize, source: &str) -> Self {
        let end = end.min(source.len()).max(start);
        Self {
            message: message.to_string(),
            text: source.get(start..end).unwrap_or_default().to_string(),
            start,
            end,
        }
    }

    pub fn err<T>(self) -> Result<T, ParseError> {
        Err(self)
    }
}
