use crate::parser::{
    ast::{
        ExprParser, Join, JoinConstraint, JoinKind, Limit, OrderByItem, QuerySpec, SelectItem, SelectStatement,
        TableFactor, TableName, TableRef,
    },
    is_reserved,
    tokens::TokenKind,
    ParseError, QueryParser, COMPARERS,
};

pub struct SelectParser;

impl SelectParser {
    pub fn parse_select_statement(parser: &mut QueryParser) -> Result<SelectStatement, ParseError> {
        let pivot = parser.position;
        let mut specs = vec![Self::parse_query_spec(parser)?];
        let mut union_all = Vec::new();

        while COMPARERS.union.consume(parser) {
            let all = parser.accept_word("ALL");
            if !all {
                parser.accept_word("DISTINCT");
            }
            union_all.push(all);
            specs.push(Self::parse_query_spec(parser)?);
        }

        let order_by = if COMPARERS.order_by.consume(parser) { Self::parse_order_by(parser)? } else { vec![] };
        let limit = Self::parse_limit(parser)?;

        Ok(SelectStatement { specs, union_all, order_by, limit, span: parser.span_from(pivot) })
    }

    pub fn parse_query_spec(parser: &mut QueryParser) -> Result<QuerySpec, ParseError> {
        if parser.accept_symbol("(") {
            let spec = Self::parse_query_spec(parser)?;
            parser.expect_symbol(")")?;
            return Ok(spec);
        }

        let pivot = parser.position;
        parser.expect_word("SELECT")?;
        let distinct = parser.accept_word("DISTINCT") || parser.accept_word("DISTINCTROW");
        parser.accept_word("ALL");
        parser.accept_word("SQL_CALC_FOUND_ROWS");

        let mut items = vec![Self::parse_select_item(parser)?];
        while parser.accept_symbol(",") {
            items.push(Self::parse_select_item(parser)?);
        }

        let from = if COMPARERS.from.consume(parser) { Self::parse_from(parser)? } else { vec![] };

        let where_clause = if COMPARERS.r#where.consume(parser) { Some(ExprParser::parse(parser)?) } else { None };

        let group_by = if COMPARERS.group_by.consume(parser) {
            let list = ExprParser::parse_list(parser)?;
            if parser.accept_word("WITH") {
                parser.expect_word("ROLLUP")?;
            }
            list
        } else {
            vec![]
        };

        let having = if COMPARERS.having.consume(parser) { Some(ExprParser::parse(parser)?) } else { None };

        Ok(QuerySpec { distinct, items, from, where_clause, group_by, having, span: parser.span_from(pivot) })
    }

    fn parse_select_item(parser: &mut QueryParser) -> Result<SelectItem, ParseError> {
        let pivot = parser.position;

        if parser.accept_symbol("*") {
            return Ok(SelectItem::Wildcard { span: parser.span_from(pivot) });
        }

        let qualified_wildcard = parser.current().map(|t| t.is_identifier()).unwrap_or(false)
            && parser.peek(1).map(|t| t.is_symbol(".")).unwrap_or(false)
            && parser.peek(2).map(|t| t.is_symbol("*")).unwrap_or(false);
        if qualified_wildcard {
            let table = parser.expect_identifier()?;
            parser.next();
            parser.next();
            return Ok(SelectItem::QualifiedWildcard { table, span: parser.span_from(pivot) });
        }

        let expr = ExprParser::parse(parser)?;
        let alias = Self::parse_alias(parser, true)?;
        Ok(SelectItem::Expr { expr, alias, span: parser.span_from(pivot) })
    }

    /// `[AS] alias`; string aliases are allowed on select items only.
    pub fn parse_alias(parser: &mut QueryParser, allow_string: bool) -> Result<Option<String>, ParseError> {
        let explicit = parser.accept_word("AS");
        let Some(token) = parser.current() else {
            return match explicit {
                true => ParseError::new("Expected alias", parser.position, parser).err(),
                false => Ok(None),
            };
        };

        let usable = match token.kind {
            TokenKind::QuotedIdent => true,
            TokenKind::Word => explicit || !is_reserved(&token.text),
            TokenKind::String => allow_string,
            _ => false,
        };
        if usable {
            let alias = token.text.clone();
            parser.next();
            return Ok(Some(alias));
        }
        if explicit {
            return ParseError::new("Expected alias", parser.position, parser).err();
        }
        Ok(None)
    }

    fn parse_from(parser: &mut QueryParser) -> Result<Vec<TableRef>, ParseError> {
        let mut from = vec![Self::parse_table_ref(parser)?];
        while parser.accept_symbol(",") {
            from.push(Self::parse_table_ref(parser)?);
        }
        Ok(from)
    }

    pub fn parse_table_ref(parser: &mut QueryParser) -> Result<TableRef, ParseError> {
        let pivot = parser.position;
        let factor = Self::parse_factor(parser)?;
        let mut joins = Vec::new();

        loop {
            let join_pivot = parser.position;
            let kind = if COMPARERS.inner_join.consume(parser) || COMPARERS.join.consume(parser) {
                JoinKind::Inner
            } else if parser.accept_word("STRAIGHT_JOIN") {
                JoinKind::Inner
            } else if COMPARERS.cross_join.consume(parser) {
                JoinKind::Cross
            } else if COMPARERS.left_join.consume(parser) {
                JoinKind::Left
            } else if COMPARERS.right_join.consume(parser) {
                JoinKind::Right
            } else if COMPARERS.full_join.consume(parser) {
                JoinKind::Full
            } else {
                break;
            };

            let factor = Self::parse_factor(parser)?;
            let constraint = if COMPARERS.on.consume(parser) {
                JoinConstraint::On(ExprParser::parse(parser)?)
            } else if COMPARERS.using.consume(parser) {
                parser.expect_symbol("(")?;
                let mut columns = vec![parser.expect_identifier()?];
                while parser.accept_symbol(",") {
                    columns.push(parser.expect_identifier()?);
                }
                parser.expect_symbol(")")?;
                JoinConstraint::Using(columns)
            } else {
                JoinConstraint::None
            };
            joins.push(Join { kind, factor, constraint, span: parser.span_from(join_pivot) });
        }

        Ok(TableRef { factor, joins, span: parser.span_from(pivot) })
    }

    fn parse_factor(parser: &mut QueryParser) -> Result<TableFactor, ParseError> {
        let pivot = parser.position;
        if parser.accept_symbol("(") {
            if !parser.is_word("SELECT") {
                return ParseError::new("Expected derived table", pivot, parser).err();
            }
            let query = Self::parse_select_statement(parser)?;
            parser.expect_symbol(")")?;
            let alias = Self::parse_alias(parser, false)?
                .ok_or_else(|| ParseError::new("Every derived table must have an alias", pivot, parser))?;
            return Ok(TableFactor::Derived { query: Box::new(query), alias, span: parser.span_from(pivot) });
        }

        let table = Self::parse_table_name(parser, true)?;
        Ok(TableFactor::Table { schema: table.schema, name: table.name, alias: table.alias, span: parser.span_from(pivot) })
    }

    /// `[schema.]name [[AS] alias]`
    pub fn parse_table_name(parser: &mut QueryParser, with_alias: bool) -> Result<TableName, ParseError> {
        let first = parser.expect_identifier()?;
        let (schema, name) = if parser.accept_symbol(".") {
            (Some(first), parser.expect_identifier()?)
        } else {
            (None, first)
        };
        let alias = if with_alias { Self::parse_alias(parser, false)? } else { None };
        Ok(TableName { schema, name, alias })
    }

    fn parse_order_by(parser: &mut QueryParser) -> Result<Vec<OrderByItem>, ParseError> {
        let mut items = Vec::new();
        loop {
            let expr = ExprParser::parse(parser)?;
            let descending = if parser.accept_word("DESC") {
                true
            } else {
                parser.accept_word("ASC");
                false
            };
            items.push(OrderByItem { expr, descending });
            if !parser.accept_symbol(",") {
                return Ok(items);
            }
        }
    }

    fn parse_limit(parser: &mut QueryParser) -> Result<Option<Limit>, ParseError> {
        if !COMPARERS.limit.consume(parser) {
            return Ok(None);
        }
        let first = ExprParser::parse_primary(parser)?;
        if parser.accept_symbol(",") {
            let count = ExprParser::parse_primary(parser)?;
            return Ok(Some(Limit { count, offset: Some(first) }));
        }
        let offset = if COMPARERS.offset.consume(parser) { Some(ExprParser::parse_primary(parser)?) } else { None };
        Ok(Some(Limit { count: first, offset }))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{ast::*, QueryParser};

    fn parse(text: &str) -> (QueryParser, SelectStatement) {
        let mut parser = QueryParser::new(text).unwrap();
        let select = SelectParser::parse_select_statement(&mut parser).unwrap();
        assert!(parser.eof(), "trailing tokens in {text}");
        (parser, select)
    }

    #[test]
    pub fn test_select_items_and_aliases() {
        let (_, select) = parse("SELECT *, t.*, id AS a, name b, value 'c' FROM mytable1 t");
        let spec = &select.specs[0];
        assert!(matches!(spec.items[0], SelectItem::Wildcard { .. }));
        match &spec.items[1] {
            SelectItem::QualifiedWildcard { table, .. } => assert_eq!(table, "t"),
            other => panic!("{other:?}"),
        }
        let aliases: Vec<_> = spec.items[2..]
            .iter()
            .map(|item| match item {
                SelectItem::Expr { alias, .. } => alias.clone().unwrap(),
                other => panic!("{other:?}"),
            })
            .collect();
        assert_eq!(aliases, vec!["a", "b", "c"]);
        assert_eq!(spec.from[0].factor.visible_name(), "t");
    }

    #[test]
    pub fn test_joins() {
        let (_, select) = parse(
            "SELECT * FROM a INNER JOIN b ON a.id = b.id LEFT OUTER JOIN c USING (id) RIGHT JOIN d ON d.x = c.x CROSS JOIN e",
        );
        let joins = &select.specs[0].from[0].joins;
        let kinds: Vec<_> = joins.iter().map(|j| j.kind).collect();
        assert_eq!(kinds, vec![JoinKind::Inner, JoinKind::Left, JoinKind::Right, JoinKind::Cross]);
        assert!(matches!(joins[0].constraint, JoinConstraint::On(_)));
        assert_eq!(joins[1].constraint, JoinConstraint::Using(vec!["id".to_string()]));
        assert_eq!(joins[3].constraint, JoinConstraint::None);
    }

    #[test]
    pub fn test_join_span_covers_constraint() {
        let (parser, select) = parse("SELECT * FROM a INNER JOIN b ON a.id = b.id WHERE a.x = 1");
        let join = &select.specs[0].from[0].joins[0];
        assert_eq!(join.span.text(&parser.text), "INNER JOIN b ON a.id = b.id");
    }

    #[test]
    pub fn test_union_order_limit() {
        let (_, select) = parse("SELECT id FROM a UNION ALL SELECT id FROM b UNION SELECT id FROM c ORDER BY id DESC LIMIT 10, 5");
        assert_eq!(select.specs.len(), 3);
        assert_eq!(select.union_all, vec![true, false]);
        assert!(select.order_by[0].descending);
        let limit = select.limit.unwrap();
        assert!(limit.offset.is_some());
    }

    #[test]
    pub fn test_derived_table_requires_alias() {
        let mut parser = QueryParser::new("SELECT * FROM (SELECT 1)").unwrap();
        match SelectParser::parse_select_statement(&mut parser) {
            Ok(_) => panic!(),
            Err(err) => assert_eq!(err.message, "Every derived table must have an alias"),
        }

        let (_, select) = parse("SELECT x.id FROM (SELECT id FROM t) AS x WHERE x.id > ? GROUP BY x.id HAVING count(*) > 1");
        let spec = &select.specs[0];
        assert!(matches!(spec.from[0].factor, TableFactor::Derived { .. }));
        assert_eq!(spec.group_by.len(), 1);
        assert!(spec.having.is_some());
    }
}
