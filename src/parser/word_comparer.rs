use crate::parser::QueryParser;

/// Matches a sequence of keywords (`LEFT OUTER JOIN`) against the upcoming
/// tokens, case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct WordComparer {
    pub length: usize,
    pub words: Vec<String>,
    optional: Vec<usize>,
    delimiter: Option<String>,
}

impl WordComparer {
    pub fn new(words: &str) -> Self {
        let words: Vec<String> = words.split_whitespace().map(|w| w.to_uppercase()).collect();
        Self { length: words.len(), words, optional: vec![], delimiter: None }
    }

    /// The word at `index` may be absent (`OUTER` in `LEFT OUTER JOIN`).
    pub fn with_optional(mut self, index: usize) -> Self {
        self.optional.push(index);
        self
    }

    /// Require a symbol right after the words (`IN (`).
    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = Some(delimiter.to_string());
        self
    }

    /// Number of tokens the comparer would consume at the current position.
    fn matched_length(&self, parser: &QueryParser) -> Option<usize> {
        let mut offset = 0;
        for (index, word) in self.words.iter().enumerate() {
            match parser.peek(offset) {
                Some(token) if token.is_word(word) => offset += 1,
                _ if self.optional.contains(&index) => {}
                _ => return None,
            }
        }
        if let Some(delimiter) = &self.delimiter {
            match parser.peek(offset) {
                Some(token) if token.is_symbol(delimiter) => {}
                _ => return None,
            }
        }
        Some(offset)
    }

    pub fn compare(&self, parser: &QueryParser) -> bool {
        self.matched_length(parser).is_some()
    }

    /// Compare and, on a match, move the parser past the words.
    pub fn consume(&self, parser: &mut QueryParser) -> bool {
        match self.matched_length(parser) {
            Some(length) => {
                for _ in 0..length {
                    parser.next();
                }
                true
            }
            None => false,
        }
    }
}
