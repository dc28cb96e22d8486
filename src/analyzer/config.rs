use serde::{Deserialize, Serialize};

use crate::database::SqlType;

/// Knobs of the analysis.
///
/// - `default_parameter_type` is given to a placeholder nothing constrains.
/// - `rename_duplicated_columns` appends `_2`, `_3`, ... to repeated result names.
/// - `data_not_null_from_schema` takes the not-null flag of INSERT/UPDATE
///   value parameters from the target column instead of reporting them nullable.
/// - `infer_multiple_rows` enables the single-row detection for SELECT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalyzerConfig {
    pub default_parameter_type: SqlType,
    pub rename_duplicated_columns: bool,
    pub data_not_null_from_schema: bool,
    pub infer_multiple_rows: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            default_parameter_type: SqlType::Varchar,
            rename_duplicated_columns: true,
            data_not_null_from_schema: false,
            infer_multiple_rows: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_parameter_type(mut self, default_parameter_type: SqlType) -> Self {
        self.default_parameter_type = default_parameter_type;
        self
    }

    pub fn with_rename_duplicated_columns(mut self, rename: bool) -> Self {
        self.rename_duplicated_columns = rename;
        self
    }

    pub fn with_data_not_null_from_schema(mut self, from_schema: bool) -> Self {
        self.data_not_null_from_schema = from_schema;
        self
    }

    pub fn with_infer_multiple_rows(mut self, infer: bool) -> Self {
        self.infer_multiple_rows = infer;
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_defaults() {
        let config = AnalyzerConfig::new();
        assert_eq!(config.default_parameter_type, SqlType::Varchar);
        assert!(config.rename_duplicated_columns);
        assert!(!config.data_not_null_from_schema);
        assert!(config.infer_multiple_rows);
    }

    #[test]
    pub fn test_partial_json_keeps_defaults() {
        let config = AnalyzerConfig::from_json_str(r#"{ "defaultParameterType": "int", "inferMultipleRows": false }"#).unwrap();
        assert_eq!(config, AnalyzerConfig::new().with_default_parameter_type(SqlType::Int).with_infer_multiple_rows(false));
    }
}
