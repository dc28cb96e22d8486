#[cfg(test)]
pub mod fixtures {
    use crate::{
        analyzer::{
            AnalysisResult, AnalyzerConfig, AnalyzerError, ColumnType, ExpressionTypeMap, ExpressionTypeResolver,
            ParameterDescriptor, QueryAnalyzer, QueryType,
        },
        database::{ColumnKey, ColumnSchema, ForeignKey, SchemaCatalog, SqlType},
        parser::{ast::StatementParser, preprocess_sql},
    };

    fn pk(table: &str, column: &str) -> ColumnSchema {
        ColumnSchema::new(table, column, SqlType::Int, true).with_key(ColumnKey::Primary)
    }

    fn col(table: &str, column: &str, column_type: SqlType, not_null: bool) -> ColumnSchema {
        ColumnSchema::new(table, column, column_type, not_null)
    }

    pub fn catalog() -> SchemaCatalog {
        use SqlType::*;
        let mut catalog = SchemaCatalog::from_columns(vec![
            pk("mytable1", "id"),
            col("mytable1", "value", Int, false),
            pk("mytable2", "id"),
            col("mytable2", "name", Varchar, false),
            col("mytable2", "descr", Varchar, false),
            pk("mytable3", "id"),
            col("mytable3", "double_value", Double, false),
            col("mytable3", "name", Varchar, true),
            pk("users", "id"),
            col("users", "name", Varchar, true),
            pk("posts", "id"),
            col("posts", "title", Varchar, true),
            col("posts", "body", Text, true),
            col("posts", "fk_user", Int, true),
            pk("roles", "id"),
            col("roles", "role", Varchar, true),
            col("roles", "fk_user", Int, true),
            pk("comments", "id"),
            col("comments", "comment", Varchar, true),
            col("comments", "fk_post", Int, true),
            pk("surveys", "id"),
            col("surveys", "name", Varchar, true),
            pk("participants", "id"),
            col("participants", "fk_survey", Int, true),
            col("participants", "fk_user", Int, true),
            pk("questions", "id"),
            col("questions", "questions", Varchar, true),
            col("questions", "fk_survey", Int, true),
            pk("answers", "id"),
            col("answers", "answer", Varchar, true),
            col("answers", "fk_question", Int, true),
            col("answers", "fk_user", Int, true),
        ])
        .unwrap();

        for (table, column, ref_table) in [
            ("posts", "fk_user", "users"),
            ("roles", "fk_user", "users"),
            ("comments", "fk_post", "posts"),
            ("participants", "fk_survey", "surveys"),
            ("participants", "fk_user", "users"),
            ("questions", "fk_survey", "surveys"),
            ("answers", "fk_question", "questions"),
            ("answers", "fk_user", "users"),
        ] {
            catalog.add_foreign_key(ForeignKey::new(table, column, ref_table, "id")).unwrap();
        }
        catalog
    }

    pub fn analyze(sql: &str, config: &AnalyzerConfig, resolver: Option<&dyn ExpressionTypeResolver>) -> Result<AnalysisResult, AnalyzerError> {
        let processed = preprocess_sql(sql);
        let statement = StatementParser::parse(&processed.sql).unwrap();
        QueryAnalyzer::analyze(&statement, &catalog(), &processed.parameters, config, resolver).map(|a| a.result)
    }

    pub fn describe(sql: &str) -> AnalysisResult {
        analyze(sql, &AnalyzerConfig::new(), None).unwrap()
    }

    /// `(name, type, not null)` of every result column.
    pub fn columns(result: &AnalysisResult) -> Vec<(&str, SqlType, bool)> {
        result
            .columns
            .iter()
            .map(|c| (c.name.as_str(), c.column_type.promoted(), c.not_null))
            .collect()
    }

    fn param(name: &str, column_type: SqlType, not_null: bool) -> ParameterDescriptor {
        ParameterDescriptor::new(name, column_type, not_null)
    }

    #[test]
    fn select_columns_follow_the_schema() {
        let result = describe("SELECT id, value FROM mytable1");
        assert_eq!(result.query_type, QueryType::Select);
        assert_eq!(columns(&result), vec![("id", SqlType::Int, true), ("value", SqlType::Int, false)]);
        assert!(result.multiple_rows_result);
        assert!(result.parameters.is_empty());
        assert_eq!(result.data, None);
        assert_eq!(result.order_by_columns, None);
        assert_eq!(result.parameter_names, None);
    }

    #[test]
    fn star_expands_in_from_order_with_renamed_duplicates() {
        let result = describe("SELECT * FROM mytable1 t1 INNER JOIN mytable2 t2 ON t2.id = t1.id");
        assert_eq!(
            columns(&result),
            vec![
                ("id", SqlType::Int, true),
                ("value", SqlType::Int, false),
                ("id_2", SqlType::Int, true),
                ("name", SqlType::Varchar, false),
                ("descr", SqlType::Varchar, false),
            ]
        );

        let config = AnalyzerConfig::new().with_rename_duplicated_columns(false);
        let result = analyze("SELECT t1.*, t2.id FROM mytable1 t1, mytable2 t2", &config, None).unwrap();
        let names: Vec<&str> = result.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "value", "id"]);
    }

    #[test]
    fn placeholder_takes_the_type_of_its_counterpart() {
        let result = describe("SELECT id FROM mytable2 WHERE name = ? AND id > ?");
        assert_eq!(result.parameters, vec![param("param1", SqlType::Varchar, true), param("param2", SqlType::Int, true)]);
    }

    #[test]
    fn arithmetic_with_placeholder_is_double() {
        let result = describe("SELECT ? + id AS total FROM mytable1");
        assert_eq!(columns(&result), vec![("total", SqlType::Double, true)]);
        assert_eq!(result.parameters, vec![param("param1", SqlType::Double, true)]);
    }

    #[test]
    fn expression_without_alias_is_named_by_its_text() {
        let result = describe("SELECT id + 1, concat(name, ?) FROM mytable2");
        assert_eq!(
            columns(&result),
            vec![("id + 1", SqlType::BigInt, true), ("concat(name, ?)", SqlType::Varchar, false)]
        );
        assert_eq!(result.parameters, vec![param("param1", SqlType::Varchar, true)]);
    }

    #[test]
    fn unconstrained_placeholder_takes_the_default_type() {
        let result = describe("SELECT ? AS anything");
        assert_eq!(columns(&result), vec![("anything", SqlType::Varchar, true)]);

        let config = AnalyzerConfig::new().with_default_parameter_type(SqlType::Int);
        let result = analyze("SELECT ? AS anything", &config, None).unwrap();
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, true)]);
    }

    #[test]
    fn in_list_placeholder_is_a_nullable_list() {
        let result = describe("SELECT id FROM mytable1 WHERE id IN (?)");
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, false).list()]);

        let result = describe("SELECT id FROM mytable1 WHERE id IN (?, ?)");
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, true), param("param2", SqlType::Int, true)]);
    }

    #[test]
    fn between_and_like_type_their_placeholders() {
        let result = describe("SELECT id FROM mytable2 WHERE id BETWEEN ? AND ? AND name LIKE ?");
        assert_eq!(
            result.parameters,
            vec![param("param1", SqlType::Int, true), param("param2", SqlType::Int, true), param("param3", SqlType::Varchar, true)]
        );
    }

    #[test]
    fn case_nullability_depends_on_else() {
        let result = describe(
            "SELECT CASE WHEN id = 1 THEN 'one' ELSE 'other' END AS label, CASE WHEN id = 1 THEN 'one' END AS maybe FROM mytable1",
        );
        assert_eq!(columns(&result), vec![("label", SqlType::Varchar, true), ("maybe", SqlType::Varchar, false)]);
    }

    #[test]
    fn aggregates() {
        let result = describe("SELECT count(*) AS total, sum(value) AS amount, avg(value) AS average, max(id) AS biggest FROM mytable1");
        assert_eq!(
            columns(&result),
            vec![
                ("total", SqlType::BigInt, true),
                ("amount", SqlType::Decimal, false),
                ("average", SqlType::Decimal, false),
                ("biggest", SqlType::Int, false),
            ]
        );
        assert!(!result.multiple_rows_result);

        let result = describe("SELECT sum(double_value) AS amount FROM mytable3");
        assert_eq!(columns(&result), vec![("amount", SqlType::Double, false)]);
    }

    #[test]
    fn ifnull_with_not_null_fallback_is_not_null() {
        let result = describe("SELECT ifnull(value, 0) AS value FROM mytable1");
        assert_eq!(columns(&result), vec![("value", SqlType::Int, true)]);

        let result = describe("SELECT id FROM mytable1 WHERE value = ifnull(?, value)");
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, false)]);
    }

    #[test]
    fn str_to_date_is_nullable() {
        let result = describe("SELECT str_to_date(name, '%d/%m/%Y') AS day FROM mytable3");
        assert_eq!(columns(&result), vec![("day", SqlType::Date, false)]);
    }

    #[test]
    fn outer_join_makes_columns_nullable() {
        let result = describe("SELECT t1.id, t2.id AS other FROM mytable1 t1 LEFT JOIN mytable2 t2 ON t2.id = t1.id");
        assert_eq!(columns(&result), vec![("id", SqlType::Int, true), ("other", SqlType::Int, false)]);

        let result = describe("SELECT t1.id, t2.id AS other FROM mytable1 t1 RIGHT JOIN mytable2 t2 ON t2.id = t1.id");
        assert_eq!(columns(&result), vec![("id", SqlType::Int, false), ("other", SqlType::Int, true)]);
    }

    #[test]
    fn right_join_pads_earlier_inner_joins() {
        let result = describe(
            "SELECT t1.id, t1.value, t2.name, t3.id AS third FROM mytable1 t1 INNER JOIN mytable2 t2 ON t1.value = t2.id RIGHT JOIN mytable3 t3 ON t3.id = t1.id",
        );
        assert_eq!(
            columns(&result),
            vec![
                ("id", SqlType::Int, false),
                ("value", SqlType::Int, false),
                ("name", SqlType::Varchar, false),
                ("third", SqlType::Int, true),
            ]
        );

        let result = describe(
            "SELECT t1.value FROM mytable1 t1 INNER JOIN mytable2 t2 ON t1.value = t2.id LEFT JOIN mytable3 t3 ON t3.id = t1.id",
        );
        assert_eq!(columns(&result), vec![("value", SqlType::Int, true)]);

        let result = describe(
            "SELECT t1.value FROM mytable1 t1 INNER JOIN mytable2 t2 ON t1.value = t2.id RIGHT JOIN mytable3 t3 ON t3.id = t1.id WHERE t1.value > 0",
        );
        assert_eq!(columns(&result), vec![("value", SqlType::Int, true)]);
    }

    #[test]
    fn filters_prove_columns_not_null() {
        let result = describe("SELECT value FROM mytable1 WHERE value IS NOT NULL");
        assert_eq!(columns(&result), vec![("value", SqlType::Int, true)]);

        let result = describe("SELECT value FROM mytable1 WHERE value > ?");
        assert_eq!(columns(&result), vec![("value", SqlType::Int, true)]);

        let result = describe("SELECT value FROM mytable1 WHERE value > ? OR id = 1");
        assert_eq!(columns(&result), vec![("value", SqlType::Int, false)]);

        let result = describe("SELECT t2.name FROM mytable1 t1 INNER JOIN mytable2 t2 ON t2.name = t1.value");
        assert_eq!(columns(&result), vec![("name", SqlType::Varchar, true)]);
    }

    #[test]
    fn single_row_detection() {
        assert!(!describe("SELECT id FROM mytable1 WHERE id = ?").multiple_rows_result);
        assert!(!describe("SELECT id FROM mytable1 WHERE id = 10 AND value > 2").multiple_rows_result);
        assert!(!describe("SELECT id FROM mytable1 LIMIT 1").multiple_rows_result);
        assert!(!describe("SELECT ? AS anything").multiple_rows_result);
        assert!(describe("SELECT id FROM mytable1 WHERE value = ?").multiple_rows_result);
        assert!(describe("SELECT value, count(*) FROM mytable1 GROUP BY value").multiple_rows_result);
        assert!(describe("SELECT t1.id FROM mytable1 t1, mytable2 t2 WHERE t1.id = 1 AND t2.id = t1.id").multiple_rows_result);

        let config = AnalyzerConfig::new().with_infer_multiple_rows(false);
        assert!(analyze("SELECT id FROM mytable1 WHERE id = ?", &config, None).unwrap().multiple_rows_result);
    }

    #[test]
    fn limit_and_offset_are_bigint() {
        let result = describe("SELECT id FROM mytable1 LIMIT ? OFFSET ?");
        assert_eq!(result.parameters, vec![param("param1", SqlType::BigInt, true), param("param2", SqlType::BigInt, true)]);
    }

    #[test]
    fn union_widens_types_and_intersects_not_null() {
        let result = describe("SELECT id, value FROM mytable1 WHERE id = ? UNION SELECT id, name FROM mytable2 WHERE name = ?");
        assert_eq!(columns(&result), vec![("id", SqlType::Int, true), ("value", SqlType::Varchar, false)]);
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, true), param("param2", SqlType::Varchar, true)]);
        assert!(result.multiple_rows_result);

        let result = describe("SELECT id FROM mytable1 UNION ALL SELECT value FROM mytable1");
        assert_eq!(columns(&result), vec![("id", SqlType::Int, false)]);
    }

    #[test]
    fn order_by_reports_sortable_names() {
        let result = describe("SELECT id, value * 2 AS doubled FROM mytable1 ORDER BY doubled");
        assert_eq!(result.order_by_columns, Some(vec!["id".to_string(), "value".to_string(), "doubled".to_string()]));

        let result = describe("SELECT id FROM mytable1 UNION SELECT id FROM mytable2 ORDER BY id");
        assert_eq!(result.order_by_columns, Some(vec!["id".to_string(), "value".to_string()]));
    }

    #[test]
    fn having_may_name_select_aliases() {
        let result = describe("SELECT value, count(*) AS total FROM mytable1 GROUP BY value HAVING total > ?");
        assert_eq!(result.parameters, vec![param("param1", SqlType::BigInt, true)]);
    }

    #[test]
    fn derived_tables_and_subqueries() {
        let result = describe("SELECT t.id, t.value FROM (SELECT id, value FROM mytable1 WHERE value IS NOT NULL) t");
        assert_eq!(columns(&result), vec![("id", SqlType::Int, true), ("value", SqlType::Int, true)]);

        let result = describe("SELECT (SELECT name FROM mytable2 t2 WHERE t2.id = t1.id) AS name FROM mytable1 t1");
        assert_eq!(columns(&result), vec![("name", SqlType::Varchar, false)]);

        let result = describe("SELECT id FROM mytable1 t1 WHERE EXISTS (SELECT 1 FROM mytable2 t2 WHERE t2.id = t1.id AND t2.name = ?)");
        assert_eq!(result.parameters, vec![param("param1", SqlType::Varchar, true)]);

        let result = describe("SELECT id FROM mytable1 WHERE id IN (SELECT id FROM mytable2 WHERE name = ?)");
        assert_eq!(result.parameters, vec![param("param1", SqlType::Varchar, true)]);
    }

    #[test]
    fn named_parameters_collapse_in_filters() {
        let result = describe("SELECT id FROM mytable1 WHERE id > :min AND id < :max");
        assert_eq!(result.sql, "SELECT id FROM mytable1 WHERE id > ? AND id < ?");
        assert_eq!(result.parameters, vec![param("min", SqlType::Int, true), param("max", SqlType::Int, true)]);
        assert_eq!(result.parameter_names, Some(vec!["min".to_string(), "max".to_string()]));

        let result = describe("SELECT id FROM mytable1 WHERE (:value IS NULL OR value = :value)");
        assert_eq!(result.parameters, vec![param("value", SqlType::Int, true)]);
        assert_eq!(result.parameter_names, Some(vec!["value".to_string(), "value".to_string()]));
    }

    #[test]
    fn mixed_placeholders_keep_their_names() {
        let result = describe("SELECT id FROM mytable1 WHERE id = ? AND value = :val");
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, true), param("val", SqlType::Int, true)]);
        assert_eq!(result.parameter_names, Some(vec!["val".to_string()]));

        let result = describe("SELECT t1.id FROM mytable1 t1, mytable2 t2 WHERE t1.id = :id AND t2.name = ? AND t1.value = :id");
        assert_eq!(result.parameters, vec![param("id", SqlType::Int, true), param("param2", SqlType::Varchar, true)]);
    }

    #[test]
    fn unknown_function_is_opaque_without_resolver() {
        let result = describe("SELECT my_func(id) AS computed FROM mytable1");
        assert_eq!(columns(&result), vec![("computed", SqlType::Unknown, false)]);
    }

    #[test]
    fn unknown_function_is_delegated_to_the_resolver() {
        let resolver = ExpressionTypeMap::new()
            .with("my_func(id)", ColumnType::Single(SqlType::Date))
            .with("other_func(value)", ColumnType::OneOf(vec![SqlType::Int, SqlType::Double]));
        let result = analyze("SELECT my_func(id) AS day, other_func(value) AS mixed FROM mytable1", &AnalyzerConfig::new(), Some(&resolver))
            .unwrap();
        assert_eq!(result.columns[0].column_type, ColumnType::Single(SqlType::Date));
        assert_eq!(result.columns[1].column_type, ColumnType::OneOf(vec![SqlType::Int, SqlType::Double]));
    }

    #[test]
    fn insert_values() {
        let result = describe("INSERT INTO mytable1 (value) VALUES (?)");
        assert_eq!(result.query_type, QueryType::Insert);
        assert_eq!(
            columns(&result),
            vec![("affectedRows", SqlType::Int, true), ("insertId", SqlType::Int, true)]
        );
        assert_eq!(result.data, Some(vec![param("value", SqlType::Int, false)]));
        assert!(result.parameters.is_empty());
        assert!(!result.multiple_rows_result);
    }

    #[test]
    fn insert_literal_values_have_no_data_entry() {
        let result = describe("INSERT INTO mytable1 (id, value) VALUES (1, ?)");
        assert_eq!(result.data, Some(vec![param("value", SqlType::Int, false)]));

        let result = describe("INSERT INTO mytable1 (id, value) VALUES (1, 2)");
        assert_eq!(result.data, Some(vec![]));
    }

    #[test]
    fn insert_data_not_null_from_schema() {
        let sql = "INSERT INTO mytable1 (id, value) VALUES (?, ?)";
        assert_eq!(
            describe(sql).data,
            Some(vec![param("id", SqlType::Int, false), param("value", SqlType::Int, false)])
        );

        let config = AnalyzerConfig::new().with_data_not_null_from_schema(true);
        assert_eq!(
            analyze(sql, &config, None).unwrap().data,
            Some(vec![param("id", SqlType::Int, true), param("value", SqlType::Int, false)])
        );
    }

    #[test]
    fn insert_expression_values_are_parameters() {
        let result = describe("INSERT INTO mytable1 (value) VALUES (? + 1)");
        assert_eq!(result.data, Some(vec![]));
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, false)]);
    }

    #[test]
    fn insert_select() {
        let result = describe("INSERT INTO mytable1 (value) SELECT id FROM mytable2 WHERE name = ?");
        assert_eq!(result.parameters, vec![param("param1", SqlType::Varchar, true)]);

        let result = describe("INSERT INTO mytable1 (value) SELECT ? FROM mytable2");
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, false)]);
    }

    #[test]
    fn insert_unknown_column() {
        let err = analyze("INSERT INTO mytable1 (nope) VALUES (?)", &AnalyzerConfig::new(), None).unwrap_err();
        assert_eq!(err, AnalyzerError::UnknownColumn { name: "nope".into(), candidates: vec!["id".into(), "value".into()] });
    }

    #[test]
    fn update_with_positional_parameters() {
        let result = describe("UPDATE mytable1 SET value = ? WHERE id = ?");
        assert_eq!(result.query_type, QueryType::Update);
        assert_eq!(columns(&result), vec![("affectedRows", SqlType::Int, true)]);
        assert_eq!(result.data, Some(vec![param("value", SqlType::Int, false)]));
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, true)]);
    }

    #[test]
    fn update_with_named_parameters() {
        let result = describe("UPDATE mytable1 SET value = :value WHERE id > :min AND id < :max");
        assert_eq!(result.data, Some(vec![param("value", SqlType::Int, false)]));
        assert_eq!(result.parameters, vec![param("min", SqlType::Int, true), param("max", SqlType::Int, true)]);
        assert_eq!(result.parameter_names, None);
    }

    #[test]
    fn update_filter_keeps_repeated_names() {
        let result = describe("UPDATE mytable1 SET value = :value WHERE id > :value OR id < :value");
        assert_eq!(result.data, Some(vec![param("value", SqlType::Int, false)]));
        assert_eq!(result.parameters, vec![param("value", SqlType::Int, true), param("value", SqlType::Int, true)]);
    }

    #[test]
    fn update_with_ifnull_value() {
        let result = describe("UPDATE mytable1 SET value = IFNULL(:value, value) WHERE id = :id");
        assert_eq!(result.data, Some(vec![param("value", SqlType::Int, false)]));
        assert_eq!(result.parameters, vec![param("id", SqlType::Int, true)]);
    }

    #[test]
    fn delete_with_filter() {
        let result = describe("DELETE FROM mytable1 WHERE id = ?");
        assert_eq!(result.query_type, QueryType::Delete);
        assert_eq!(columns(&result), vec![("affectedRows", SqlType::Int, true)]);
        assert_eq!(result.data, None);
        assert_eq!(result.parameters, vec![param("param1", SqlType::Int, true)]);

        let result = describe("DELETE FROM mytable1 WHERE id = :id OR value = :id");
        assert_eq!(result.parameters, vec![param("id", SqlType::Int, true)]);
    }

    #[test]
    fn resolution_errors() {
        let config = AnalyzerConfig::new();
        assert_eq!(
            analyze("SELECT x FROM mytable1", &config, None).unwrap_err(),
            AnalyzerError::UnknownColumn { name: "x".into(), candidates: vec!["id".into(), "value".into()] }
        );
        assert_eq!(
            analyze("SELECT id FROM nope", &config, None).unwrap_err(),
            AnalyzerError::UnknownTable("nope".into())
        );
        assert_eq!(
            analyze("SELECT id FROM mytable1, mytable2", &config, None).unwrap_err(),
            AnalyzerError::AmbiguousColumn { name: "id".into(), matches: vec!["mytable1.id".into(), "mytable2.id".into()] }
        );
        assert_eq!(
            analyze("SELECT t9.id FROM mytable1 t1", &config, None).unwrap_err(),
            AnalyzerError::UnknownTable("t9".into())
        );
    }

    #[test]
    fn analysis_is_deterministic() {
        let sql = "SELECT t1.id, t2.name, ? AS extra FROM mytable1 t1 LEFT JOIN mytable2 t2 ON t2.id = t1.id WHERE t1.value > ?";
        let first = analyze(sql, &AnalyzerConfig::new(), None);
        let second = analyze(sql, &AnalyzerConfig::new(), None);
        assert_eq!(first, second);
    }
}
