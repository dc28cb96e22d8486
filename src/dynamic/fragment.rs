use serde::Serialize;

/// A column read by a fragment: `table` is the name visible in the query and
/// `name` the result column (or column) it is known by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableField {
    pub field: String,
    pub table: String,
    pub name: String,
}

impl TableField {
    pub fn new(field: &str, table: &str, name: &str) -> Self {
        Self { field: field.to_string(), table: table.to_string(), name: name.to_string() }
    }

    pub fn same_column(&self, other: &TableField) -> bool {
        self.field.eq_ignore_ascii_case(&other.field) && self.table.eq_ignore_ascii_case(&other.table)
    }
}

/// A removable piece of a SELECT: a select item, a FROM item or a WHERE conjunct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentInfo {
    pub fragment: String,
    pub fields: Vec<TableField>,
    /// Ordinals of the placeholders inside the fragment.
    pub depend_on_params: Vec<usize>,
    /// Visible name of the source a FROM fragment introduces.
    pub relation: Option<String>,
    /// Visible name of the source a FROM fragment is joined to.
    pub parent_relation: Option<String>,
}

impl FragmentInfo {
    pub fn new(fragment: &str) -> Self {
        Self { fragment: fragment.to_string(), fields: vec![], depend_on_params: vec![], relation: None, parent_relation: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DynamicSqlInfo {
    pub select: Vec<FragmentInfo>,
    pub from: Vec<FragmentInfo>,
    #[serde(rename = "where")]
    pub r#where: Vec<FragmentInfo>,
}

/// A fragment with the selected columns and parameter names that decide
/// whether it has to be kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentInfoResult {
    pub fragment: String,
    pub depend_on_fields: Vec<String>,
    pub depend_on_params: Vec<String>,
}

impl FragmentInfoResult {
    pub fn new(fragment: &str, depend_on_fields: &[&str], depend_on_params: &[&str]) -> Self {
        Self {
            fragment: fragment.to_string(),
            depend_on_fields: depend_on_fields.iter().map(|f| f.to_string()).collect(),
            depend_on_params: depend_on_params.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DynamicSqlInfoResult {
    pub select: Vec<FragmentInfoResult>,
    pub from: Vec<FragmentInfoResult>,
    #[serde(rename = "where")]
    pub r#where: Vec<FragmentInfoResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_where_key_is_plain() {
        let result = DynamicSqlInfoResult {
            r#where: vec![FragmentInfoResult::new("AND id = ?", &[], &["id"])],
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"select":[],"from":[],"where":[{"fragment":"AND id = ?","dependOnFields":[],"dependOnParams":["id"]}]}"#
        );
    }

    #[test]
    pub fn test_same_column_ignores_case() {
        let field = TableField::new("id", "u", "id");
        assert!(field.same_column(&TableField::new("ID", "U", "user_id")));
        assert!(!field.same_column(&TableField::new("id", "p", "id")));
    }
}
