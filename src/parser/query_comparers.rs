use once_cell::sync::Lazy;

use crate::parser::WordComparer;

pub static COMPARERS: Lazy<QueryComparers> = Lazy::new(QueryComparers::new);

/// Keyword sequences that open or close a clause.
#[derive(Debug)]
pub struct QueryComparers {
    pub select: WordComparer,
    pub from: WordComparer,
    pub r#where: WordComparer,
    pub group_by: WordComparer,
    pub having: WordComparer,
    pub order_by: WordComparer,
    pub limit: WordComparer,
    pub offset: WordComparer,
    pub union: WordComparer,
    pub inner_join: WordComparer,
    pub cross_join: WordComparer,
    pub left_join: WordComparer,
    pub right_join: WordComparer,
    pub full_join: WordComparer,
    pub join: WordComparer,
    pub on: WordComparer,
    pub using: WordComparer,
    pub is_not: WordComparer,
    pub not_in: WordComparer,
    pub not_between: WordComparer,
    pub not_like: WordComparer,
    pub not_regexp: WordComparer,
    pub on_duplicate_key_update: WordComparer,
}

impl Default for QueryComparers {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryComparers {
    pub fn new() -> Self {
        Self {
            select: WordComparer::new("SELECT"),
            from: WordComparer::new("FROM"),
            r#where: WordComparer::new("WHERE"),
            group_by: WordComparer::new("GROUP BY"),
            having: WordComparer::new("HAVING"),
            order_by: WordComparer::new("ORDER BY"),
            limit: WordComparer::new("LIMIT"),
            offset: WordComparer::new("OFFSET"),
            union: WordComparer::new("UNION"),
            inner_join: WordComparer::new("INNER JOIN"),
            cross_join: WordComparer::new("CROSS JOIN"),
            left_join: WordComparer::new("LEFT OUTER JOIN").with_optional(1),
            right_join: WordComparer::new("RIGHT OUTER JOIN").with_optional(1),
            full_join: WordComparer::new("FULL OUTER JOIN").with_optional(1),
            join: WordComparer::new("JOIN"),
            on: WordComparer::new("ON"),
            using: WordComparer::new("USING").with_delimiter("("),
            is_not: WordComparer::new("IS NOT"),
            not_in: WordComparer::new("NOT IN").with_delimiter("("),
            not_between: WordComparer::new("NOT BETWEEN"),
            not_like: WordComparer::new("NOT LIKE"),
            not_regexp: WordComparer::new("NOT REGEXP"),
            on_duplicate_key_update: WordComparer::new("ON DUPLICATE KEY UPDATE"),
        }
    }
}

/// Words that end an expression or a clause and can never be a bare alias or
/// column name.
pub const RESERVED_WORDS: [&str; 46] = [
    "SELECT", "FROM", "WHERE", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET", "UNION", "JOIN", "INNER",
    "LEFT", "RIGHT", "FULL", "CROSS", "OUTER", "NATURAL", "ON", "USING", "SET", "VALUES", "AND",
    "OR", "XOR", "NOT", "IS", "IN", "BETWEEN", "LIKE", "REGEXP", "RLIKE", "CASE", "WHEN", "THEN", "ELSE",
    "END", "AS", "INTO", "ASC", "DESC", "BY", "DIV", "MOD", "FOR", "WINDOW", "DUPLICATE",
];

pub fn is_reserved(word: &str) -> bool {
    RESERVED_WORDS.iter().any(|reserved| reserved.eq_ignore_ascii_case(word))
}
