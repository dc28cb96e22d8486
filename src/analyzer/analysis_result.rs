use std::fmt;

use serde::Serialize;

use crate::{database::SqlType, dynamic::DynamicSqlInfoResult, nested::NestedResultInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
}

/// Resolved type of a column or parameter: one concrete type, or the set of
/// types a polymorphic expression was observed to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ColumnType {
    Single(SqlType),
    OneOf(Vec<SqlType>),
}

impl ColumnType {
    /// Single type standing for the whole set when a scalar is needed.
    pub fn promoted(&self) -> SqlType {
        match self {
            ColumnType::Single(single) => *single,
            ColumnType::OneOf(types) => types.iter().copied().fold(SqlType::Null, SqlType::promote),
        }
    }
}

impl From<SqlType> for ColumnType {
    fn from(value: SqlType) -> Self {
        ColumnType::Single(value)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Single(single) => write!(f, "{}", single),
            ColumnType::OneOf(types) => {
                let names: Vec<&str> = types.iter().map(|t| t.name()).collect();
                write!(f, "{}", names.join(" | "))
            }
        }
    }
}

/// Table column a result column was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrigin {
    /// Position of the table in the FROM clause of the first query specification.
    pub source: usize,
    pub table: String,
    pub visible: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultColumn {
    pub name: String,
    #[serde(rename = "dbtype")]
    pub column_type: ColumnType,
    pub not_null: bool,
    #[serde(skip)]
    pub origin: Option<ColumnOrigin>,
    /// Name before duplicate renaming.
    #[serde(skip)]
    pub source_name: String,
}

impl ResultColumn {
    pub fn new(name: &str, column_type: SqlType, not_null: bool) -> Self {
        Self {
            name: name.to_string(),
            column_type: ColumnType::Single(column_type),
            not_null,
            origin: None,
            source_name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,
    pub column_type: ColumnType,
    pub not_null: bool,
    /// `IN (?)` parameter bound to a collection.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub list: bool,
}

impl ParameterDescriptor {
    pub fn new(name: &str, column_type: SqlType, not_null: bool) -> Self {
        Self { name: name.to_string(), column_type: ColumnType::Single(column_type), not_null, list: false }
    }

    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }
}

/// Everything known about one statement's inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Statement text with named placeholders rewritten to `?`.
    pub sql: String,
    pub query_type: QueryType,
    pub multiple_rows_result: bool,
    pub columns: Vec<ResultColumn>,
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<ParameterDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_names: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_result_info: Option<NestedResultInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_sql_query: Option<DynamicSqlInfoResult>,
}

impl AnalysisResult {
    pub fn new(sql: &str, query_type: QueryType) -> Self {
        Self {
            sql: sql.to_string(),
            query_type,
            multiple_rows_result: false,
            columns: vec![],
            parameters: vec![],
            data: None,
            order_by_columns: None,
            parameter_names: None,
            nested_result_info: None,
            dynamic_sql_query: None,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_serialized_shape() {
        let mut result = AnalysisResult::new("SELECT id FROM mytable1 WHERE id IN (?)", QueryType::Select);
        result.multiple_rows_result = true;
        result.columns.push(ResultColumn::new("id", SqlType::Int, true));
        result.parameters.push(ParameterDescriptor::new("param1", SqlType::Int, false).list());

        let json = result.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"sql":"SELECT id FROM mytable1 WHERE id IN (?)","queryType":"Select","multipleRowsResult":true,"columns":[{"name":"id","dbtype":"int","notNull":true}],"parameters":[{"name":"param1","columnType":"int","notNull":false,"list":true}]}"#
        );
    }

    #[test]
    pub fn test_one_of_type() {
        let column_type = ColumnType::OneOf(vec![SqlType::Int, SqlType::Double]);
        assert_eq!(column_type.promoted(), SqlType::Double);
        assert_eq!(column_type.to_string(), "int | double");
        assert_eq!(serde_json::to_string(&column_type).unwrap(), r#"["int","double"]"#);
    }
}
