use crate::parser::{
    ast::{ExprArena, Span},
    tokens::{Token, TokenKind, Tokenizer},
    ParseError,
};

/// Cursor over the tokens of one statement.
///
/// Holds the expression arena being filled while parsing and the running
/// placeholder ordinal, so that every `?` gets its source-order index.
#[derive(Debug)]
pub struct QueryParser {
    pub position: usize,
    pub text: String,
    pub tokens: Vec<Token>,
    pub arena: ExprArena,
    pub placeholders: usize,
}

impl QueryParser {
    pub fn new(query: &str) -> Result<Self, ParseError> {
        Ok(Self {
            position: 0,
            text: query.to_string(),
            tokens: Tokenizer::tokenize(query)?,
            arena: ExprArena::default(),
            placeholders: 0,
        })
    }

    pub fn eof(&self) -> bool {
        self.position >= self.tokens.len()
    }

    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    pub fn peek(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.position + ahead)
    }

    pub fn next(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    /// Advance and return the token that was current.
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.current().cloned();
        self.next();
        token
    }

    pub fn is_word(&self, word: &str) -> bool {
        self.current().map(|t| t.is_word(word)).unwrap_or(false)
    }

    pub fn is_symbol(&self, symbol: &str) -> bool {
        self.current().map(|t| t.is_symbol(symbol)).unwrap_or(false)
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.current().map(|t| t.kind == kind).unwrap_or(false)
    }

    /// Consume `word` when it is the current token.
    pub fn accept_word(&mut self, word: &str) -> bool {
        if self.is_word(word) {
            self.next();
            return true;
        }
        false
    }

    pub fn accept_symbol(&mut self, symbol: &str) -> bool {
        if self.is_symbol(symbol) {
            self.next();
            return true;
        }
        false
    }

    pub fn expect_word(&mut self, word: &str) -> Result<(), ParseError> {
        if self.accept_word(word) {
            return Ok(());
        }
        ParseError::new(&format!("Expected {}", word), self.position, self).err()
    }

    pub fn expect_symbol(&mut self, symbol: &str) -> Result<(), ParseError> {
        if self.accept_symbol(symbol) {
            return Ok(());
        }
        ParseError::new(&format!("Expected '{}'", symbol), self.position, self).err()
    }

    /// Consume an identifier (plain or quoted) and return its name.
    pub fn expect_identifier(&mut self) -> Result<String, ParseError> {
        match self.current() {
            Some(token) if token.is_identifier() => {
                let name = token.text.clone();
                self.next();
                Ok(name)
            }
            _ => ParseError::new("Expected identifier", self.position, self).err(),
        }
    }

    /// Byte offset where the token at `index` starts (end of text past the last token).
    pub fn token_start(&self, index: usize) -> usize {
        self.tokens.get(index).map(|t| t.start).unwrap_or(self.text.len())
    }

    pub fn token_end(&self, index: usize) -> usize {
        self.tokens.get(index).map(|t| t.end).unwrap_or(self.text.len())
    }

    /// End offset of the last consumed token.
    pub fn previous_end(&self) -> usize {
        if self.position == 0 {
            return 0;
        }
        self.token_end(self.position - 1)
    }

    /// Span from the token at `pivot` to the last consumed token.
    pub fn span_from(&self, pivot: usize) -> Span {
        let start = self.token_start(pivot);
        Span::new(start, self.previous_end().max(start))
    }

    pub fn text_from_range(&self, start: usize, end: usize) -> String {
        let end = end.min(self.text.len());
        self.text.get(start..end).unwrap_or_default().to_string()
    }

    pub fn next_placeholder(&mut self) -> usize {
        let ordinal = self.placeholders;
        self.placeholders += 1;
        ordinal
    }
}

#[cfg(test)]
mod test {
    use crate::parser::*;

    #[test]
    pub fn test_cursor_moves_over_tokens() {
        let mut parser = QueryParser::new("SELECT a, b FROM t").unwrap();
        assert!(parser.accept_word("select"));
        assert_eq!(parser.expect_identifier().unwrap(), "a");
        assert!(parser.accept_symbol(","));
        assert!(!parser.accept_word("FROM"));
        parser.next();
        assert!(parser.is_word("from"));
        parser.next();
        parser.next();
        assert!(parser.eof());
        assert!(parser.current().is_none());
    }

    #[test]
    pub fn test_error_carries_span() {
        let mut parser = QueryParser::new("SELECT a b c").unwrap();
        parser.next();
        let pivot = parser.position;
        parser.next();
        parser.next();
        let err = ParseError::new("Unexpected", pivot, &parser);
        assert_eq!(err.start, 7);
        assert_eq!(err.end, 12);
        assert_eq!(err.text, "a b c");
        assert_eq!(err.to_string(), "ParseError: Unexpected\n  at [7:12] -> 'a b c'");
    }
}
