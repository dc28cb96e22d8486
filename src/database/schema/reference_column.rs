use serde::{Deserialize, Serialize};

/// A foreign key from `table.column` to `ref_table.ref_column`.
///
/// Used by the nested decomposer to decide the cardinality of a joined
/// relation when the join condition alone does not settle it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

impl ForeignKey {
    pub fn new(table: &str, column: &str, ref_table: &str, ref_column: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            ref_table: ref_table.to_string(),
            ref_column: ref_column.to_string(),
        }
    }

    /// True when this key links the two tables in either direction.
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.table.eq_ignore_ascii_case(a) && self.ref_table.eq_ignore_ascii_case(b))
            || (self.table.eq_ignore_ascii_case(b) && self.ref_table.eq_ignore_ascii_case(a))
    }
}
