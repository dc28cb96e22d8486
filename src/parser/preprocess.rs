use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Quoted text and comments are matched first so that placeholders inside
/// them are left alone; the last two alternatives are `:name` and `?`.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*"|`[^`]*`|--[^\n]*|/\*(?s:.*?)\*/|:([a-zA-Z\d_]+)|(\?)"#).unwrap()
});

static NESTED_ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"--\s*@nested\b").unwrap());

static DYNAMIC_ANNOTATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"--\s*@dynamicQuery\b").unwrap());

/// Statement text with `:name` placeholders rewritten to `?`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreprocessedSql {
    pub sql: String,
    /// One entry per placeholder ordinal: the `:name` it was written with,
    /// `None` for a plain `?`.
    pub parameters: Vec<Option<String>>,
    pub nested: bool,
    pub dynamic: bool,
}

impl PreprocessedSql {
    pub fn has_named_parameters(&self) -> bool {
        self.parameters.iter().any(Option::is_some)
    }

    /// `:name` occurrences in source order, repeats included.
    pub fn named_parameters(&self) -> Vec<String> {
        self.parameters.iter().flatten().cloned().collect()
    }
}

pub fn preprocess_sql(sql: &str) -> PreprocessedSql {
    let mut parameters = Vec::new();
    let processed = PLACEHOLDER.replace_all(sql, |captures: &Captures| match (captures.get(1), captures.get(2)) {
        (Some(name), _) => {
            parameters.push(Some(name.as_str().to_string()));
            "?".to_string()
        }
        (None, Some(_)) => {
            parameters.push(None);
            "?".to_string()
        }
        (None, None) => captures[0].to_string(),
    });

    PreprocessedSql {
        sql: processed.into_owned(),
        parameters,
        nested: NESTED_ANNOTATION.is_match(sql),
        dynamic: DYNAMIC_ANNOTATION.is_match(sql),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_named_parameters_are_rewritten() {
        let processed = preprocess_sql("update mytable1 set value = :value where id > :min and id < :max");
        assert_eq!(processed.sql, "update mytable1 set value = ? where id > ? and id < ?");
        assert_eq!(processed.named_parameters(), vec!["value", "min", "max"]);
        assert!(processed.has_named_parameters());
    }

    #[test]
    pub fn test_repeated_names_are_kept() {
        let processed = preprocess_sql("SELECT id FROM mytable1 WHERE id in (:ids) or COALESCE(:ids, null) is null");
        assert_eq!(processed.named_parameters(), vec!["ids", "ids"]);
    }

    #[test]
    pub fn test_quoted_text_is_skipped() {
        let processed = preprocess_sql("SELECT '10:30', `a:b` FROM t WHERE x = :x -- :ignored");
        assert_eq!(processed.sql, "SELECT '10:30', `a:b` FROM t WHERE x = ? -- :ignored");
        assert_eq!(processed.named_parameters(), vec!["x"]);
    }

    #[test]
    pub fn test_annotations() {
        let processed = preprocess_sql("-- @nested\nSELECT * FROM users");
        assert!(processed.nested);
        assert!(!processed.dynamic);

        let processed = preprocess_sql("--@dynamicQuery\nSELECT * FROM users WHERE id = ?");
        assert!(processed.dynamic);
        assert!(!processed.has_named_parameters());
        assert_eq!(processed.parameters, vec![None]);
    }

    #[test]
    pub fn test_mixed_placeholders_keep_their_ordinals() {
        let processed = preprocess_sql("SELECT id FROM mytable1 WHERE id = ? AND value = :val AND '?' <> ?");
        assert_eq!(processed.sql, "SELECT id FROM mytable1 WHERE id = ? AND value = ? AND '?' <> ?");
        assert_eq!(processed.parameters, vec![None, Some("val".to_string()), None]);
        assert_eq!(processed.named_parameters(), vec!["val"]);
    }
}
