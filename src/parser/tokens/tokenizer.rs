use crate::parser::{tokens::{Token, TokenKind}, ParseError};

const SYMBOLS_3: [&str; 1] = ["<=>"];
const SYMBOLS_2: [&str; 8] = ["<=", ">=", "<>", "!=", "||", "&&", "<<", ">>"];
const SYMBOLS_1: &str = "(),.;*+-/%=<>|&^~!@";

/// Splits SQL text into tokens, dropping whitespace and comments.
pub struct Tokenizer<'a> {
    text: &'a str,
    chars: Vec<(usize, char)>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, chars: text.char_indices().collect(), position: 0 }
    }

    pub fn tokenize(text: &'a str) -> Result<Vec<Token>, ParseError> {
        let mut tokenizer = Self::new(text);
        let mut tokens = Vec::new();
        while let Some(token) = tokenizer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn eof(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn current(&self) -> char {
        self.peek(0)
    }

    fn peek(&self, ahead: usize) -> char {
        self.chars.get(self.position + ahead).map(|(_, c)| *c).unwrap_or('\0')
    }

    fn offset(&self) -> usize {
        self.chars.get(self.position).map(|(o, _)| *o).unwrap_or(self.text.len())
    }

    fn next(&mut self) {
        self.position += 1;
    }

    fn skip_ignored(&mut self) -> Result<(), ParseError> {
        loop {
            let current = self.current();
            if current.is_whitespace() {
                self.next();
            } else if (current == '-' && self.peek(1) == '-') || current == '#' {
                while !self.eof() && self.current() != '\n' {
                    self.next();
                }
            } else if current == '/' && self.peek(1) == '*' {
                let pivot = self.offset();
                self.position += 2;
                while !(self.current() == '*' && self.peek(1) == '/') {
                    if self.eof() {
                        return ParseError::at("Unterminated comment", pivot, self.text.len(), self.text).err();
                    }
                    self.next();
                }
                self.position += 2;
            } else {
                return Ok(());
            }
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, ParseError> {
        self.skip_ignored()?;
        if self.eof() {
            return Ok(None);
        }

        let current = self.current();
        let token = if current == '\'' || current == '"' {
            self.parse_string(current)?
        } else if current == '`' {
            self.parse_quoted_identifier()?
        } else if current.is_ascii_digit() || (current == '.' && self.peek(1).is_ascii_digit()) {
            self.parse_number()
        } else if current == '?' {
            let start = self.offset();
            self.next();
            Token::new(TokenKind::Placeholder, "?", start, self.offset())
        } else if current.is_alphabetic() || current == '_' || current == '$' {
            self.parse_word()
        } else {
            self.parse_symbol()?
        };
        Ok(Some(token))
    }

    fn parse_word(&mut self) -> Token {
        let start = self.offset();
        while self.current().is_alphanumeric() || self.current() == '_' || self.current() == '$' {
            self.next();
        }
        let end = self.offset();
        Token::new(TokenKind::Word, &self.text[start..end], start, end)
    }

    fn parse_number(&mut self) -> Token {
        let start = self.offset();
        while self.current().is_ascii_digit() {
            self.next();
        }
        if self.current() == '.' && self.peek(1) != '.' {
            self.next();
            while self.current().is_ascii_digit() {
                self.next();
            }
        }
        let exponent_digit = self.peek(1).is_ascii_digit()
            || ((self.peek(1) == '-' || self.peek(1) == '+') && self.peek(2).is_ascii_digit());
        if (self.current() == 'e' || self.current() == 'E') && exponent_digit {
            self.next();
            if self.current() == '-' || self.current() == '+' {
                self.next();
            }
            while self.current().is_ascii_digit() {
                self.next();
            }
        }
        let end = self.offset();
        Token::new(TokenKind::Number, &self.text[start..end], start, end)
    }

    fn parse_string(&mut self, delimiter: char) -> Result<Token, ParseError> {
        let start = self.offset();
        self.next();
        let mut value = String::new();
        loop {
            if self.eof() {
                return ParseError::at("Invalid string", start, self.text.len(), self.text).err();
            }
            let current = self.current();
            if current == delimiter {
                if self.peek(1) == delimiter {
                    value.push(delimiter);
                    self.position += 2;
                    continue;
                }
                self.next();
                break;
            }
            if current == '\\' && !self.eof() {
                self.next();
                let escaped = match self.current() {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    '0' => '\0',
                    other => other,
                };
                value.push(escaped);
                self.next();
                continue;
            }
            value.push(current);
            self.next();
        }
        Ok(Token::new(TokenKind::String, value, start, self.offset()))
    }

    fn parse_quoted_identifier(&mut self) -> Result<Token, ParseError> {
        let start = self.offset();
        self.next();
        let pivot = self.offset();
        while self.current() != '`' {
            if self.eof() {
                return ParseError::at("Invalid quoted identifier", start, self.text.len(), self.text).err();
            }
            self.next();
        }
        let value = self.text[pivot..self.offset()].to_string();
        self.next();
        Ok(Token::new(TokenKind::QuotedIdent, value, start, self.offset()))
    }

    fn parse_symbol(&mut self) -> Result<Token, ParseError> {
        let start = self.offset();
        let rest = &self.text[start..];

        for symbol in SYMBOLS_3.iter().chain(SYMBOLS_2.iter()) {
            if rest.starts_with(symbol) {
                self.position += symbol.chars().count();
                return Ok(Token::new(TokenKind::Symbol, *symbol, start, self.offset()));
            }
        }

        let current = self.current();
        if SYMBOLS_1.contains(current) {
            self.next();
            return Ok(Token::new(TokenKind::Symbol, current.to_string(), start, self.offset()));
        }

        self.next();
        ParseError::at("Unexpected character", start, self.offset(), self.text).err()
    }
}
