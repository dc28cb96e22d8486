use crate::parser::{
    ast::{
        Assignment, DeleteStatement, ExprId, ExprParser, InsertSource, InsertStatement, SelectParser, Statement,
        StatementKind, UpdateStatement,
    },
    ParseError, QueryParser, COMPARERS,
};

/// Entry point turning one SQL statement into a [`Statement`].
pub struct StatementParser;

impl StatementParser {
    pub fn parse(sql: &str) -> Result<Statement, ParseError> {
        let mut parser = QueryParser::new(sql)?;
        if parser.eof() {
            return ParseError::at("Empty statement", 0, sql.len(), sql).err();
        }

        let kind = if parser.is_word("SELECT") || parser.is_symbol("(") {
            StatementKind::Select(SelectParser::parse_select_statement(&mut parser)?)
        } else if parser.is_word("INSERT") || parser.is_word("REPLACE") {
            StatementKind::Insert(Self::parse_insert(&mut parser)?)
        } else if parser.is_word("UPDATE") {
            StatementKind::Update(Self::parse_update(&mut parser)?)
        } else if parser.is_word("DELETE") {
            StatementKind::Delete(Self::parse_delete(&mut parser)?)
        } else {
            return ParseError::new("Unsupported statement", parser.position, &parser).err();
        };

        while parser.accept_symbol(";") {}
        if !parser.eof() {
            let pivot = parser.position;
            parser.position = parser.tokens.len();
            return ParseError::new("Unexpected token", pivot, &parser).err();
        }

        let QueryParser { arena, placeholders, .. } = parser;
        Ok(Statement { sql: sql.to_string(), arena, kind, placeholders })
    }

    fn parse_insert(parser: &mut QueryParser) -> Result<InsertStatement, ParseError> {
        parser.next();
        parser.accept_word("IGNORE");
        parser.accept_word("INTO");
        let table = SelectParser::parse_table_name(parser, false)?;

        let mut columns = Vec::new();
        if parser.accept_symbol("(") {
            columns.push(parser.expect_identifier()?);
            while parser.accept_symbol(",") {
                columns.push(parser.expect_identifier()?);
            }
            parser.expect_symbol(")")?;
        }

        let source = if parser.accept_word("VALUES") || parser.accept_word("VALUE") {
            let mut rows = vec![Self::parse_row(parser)?];
            while parser.accept_symbol(",") {
                rows.push(Self::parse_row(parser)?);
            }
            InsertSource::Values(rows)
        } else if parser.accept_word("SET") {
            let assignments = Self::parse_assignments(parser)?;
            columns = assignments.iter().map(|a| a.column.clone()).collect();
            InsertSource::Values(vec![assignments.iter().map(|a| a.value).collect()])
        } else if parser.is_word("SELECT") || parser.is_symbol("(") {
            InsertSource::Select(Box::new(SelectParser::parse_select_statement(parser)?))
        } else {
            return ParseError::new("Expected VALUES or SELECT", parser.position, parser).err();
        };

        let on_duplicate = if COMPARERS.on_duplicate_key_update.consume(parser) {
            Self::parse_assignments(parser)?
        } else {
            vec![]
        };

        Ok(InsertStatement { table, columns, source, on_duplicate })
    }

    fn parse_row(parser: &mut QueryParser) -> Result<Vec<ExprId>, ParseError> {
        parser.expect_symbol("(")?;
        if parser.accept_symbol(")") {
            return Ok(vec![]);
        }
        let row = ExprParser::parse_list(parser)?;
        parser.expect_symbol(")")?;
        Ok(row)
    }

    fn parse_update(parser: &mut QueryParser) -> Result<UpdateStatement, ParseError> {
        parser.next();
        parser.accept_word("LOW_PRIORITY");
        parser.accept_word("IGNORE");

        let mut tables = vec![SelectParser::parse_table_ref(parser)?];
        while parser.accept_symbol(",") {
            tables.push(SelectParser::parse_table_ref(parser)?);
        }

        parser.expect_word("SET")?;
        let assignments = Self::parse_assignments(parser)?;
        let where_clause = if COMPARERS.r#where.consume(parser) { Some(ExprParser::parse(parser)?) } else { None };

        Ok(UpdateStatement { tables, assignments, where_clause })
    }

    fn parse_delete(parser: &mut QueryParser) -> Result<DeleteStatement, ParseError> {
        parser.next();
        parser.accept_word("LOW_PRIORITY");
        parser.accept_word("QUICK");
        parser.accept_word("IGNORE");
        parser.expect_word("FROM")?;
        let table = SelectParser::parse_table_name(parser, true)?;
        let where_clause = if COMPARERS.r#where.consume(parser) { Some(ExprParser::parse(parser)?) } else { None };

        Ok(DeleteStatement { table, where_clause })
    }

    fn parse_assignments(parser: &mut QueryParser) -> Result<Vec<Assignment>, ParseError> {
        let mut assignments = vec![Self::parse_assignment(parser)?];
        while parser.accept_symbol(",") {
            assignments.push(Self::parse_assignment(parser)?);
        }
        Ok(assignments)
    }

    fn parse_assignment(parser: &mut QueryParser) -> Result<Assignment, ParseError> {
        let pivot = parser.position;
        let first = parser.expect_identifier()?;
        let (table, column) = if parser.accept_symbol(".") {
            (Some(first), parser.expect_identifier()?)
        } else {
            (None, first)
        };
        parser.expect_symbol("=")?;
        let value = ExprParser::parse(parser)?;
        Ok(Assignment { table, column, value, span: parser.span_from(pivot) })
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::ast::*;

    #[test]
    pub fn test_select_statement() {
        let statement = StatementParser::parse("SELECT id FROM mytable1 WHERE id = ? and value > ?;").unwrap();
        assert_eq!(statement.placeholders, 2);
        match statement.kind {
            StatementKind::Select(select) => assert_eq!(select.specs.len(), 1),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    pub fn test_insert_values_and_on_duplicate() {
        let statement = StatementParser::parse(
            "INSERT INTO mytable1 (id, value) VALUES (?, ?), (1, concat(?, 'x')) ON DUPLICATE KEY UPDATE value = ?",
        )
        .unwrap();
        assert_eq!(statement.placeholders, 4);
        match statement.kind {
            StatementKind::Insert(insert) => {
                assert_eq!(insert.table.name, "mytable1");
                assert_eq!(insert.columns, vec!["id", "value"]);
                match insert.source {
                    InsertSource::Values(rows) => assert_eq!(rows.len(), 2),
                    other => panic!("{other:?}"),
                }
                assert_eq!(insert.on_duplicate[0].column, "value");
            }
            other => panic!("{other:?}"),
        }
    }

    #[test]
    pub fn test_insert_set_and_select() {
        match StatementParser::parse("INSERT INTO mytable1 SET id = ?, value = ?").unwrap().kind {
            StatementKind::Insert(insert) => {
                assert_eq!(insert.columns, vec!["id", "value"]);
                assert!(matches!(insert.source, InsertSource::Values(ref rows) if rows[0].len() == 2));
            }
            other => panic!("{other:?}"),
        }
        match StatementParser::parse("INSERT INTO mytable2 (name) SELECT name FROM mytable3 WHERE id = ?").unwrap().kind {
            StatementKind::Insert(insert) => assert!(matches!(insert.source, InsertSource::Select(_))),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    pub fn test_update_and_delete() {
        let statement = StatementParser::parse("UPDATE mytable1 t SET t.value = ? WHERE t.id = ?").unwrap();
        match statement.kind {
            StatementKind::Update(update) => {
                assert_eq!(update.assignments[0].table.as_deref(), Some("t"));
                assert!(update.where_clause.is_some());
            }
            other => panic!("{other:?}"),
        }

        match StatementParser::parse("DELETE FROM mytable1 WHERE id = ?").unwrap().kind {
            StatementKind::Delete(delete) => assert_eq!(delete.table.name, "mytable1"),
            other => panic!("{other:?}"),
        }
    }

    #[test]
    pub fn test_unsupported_and_trailing() {
        match StatementParser::parse("CREATE TABLE t (id int)") {
            Ok(_) => panic!(),
            Err(err) => assert_eq!(err.message, "Unsupported statement"),
        }
        match StatementParser::parse("SELECT 1 garbage here") {
            Ok(_) => panic!(),
            Err(err) => assert_eq!(err.message, "Unexpected token"),
        }
    }
}
