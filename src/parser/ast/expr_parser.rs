use ordered_float::NotNan;

use crate::{
    database::SqlType,
    parser::{
        ast::{BinaryOp, ColumnRef, ExprId, ExprKind, Literal, SelectParser, Span, UnaryOp},
        is_reserved,
        tokens::TokenKind,
        ParseError, QueryParser, COMPARERS,
    },
};

const COMPARISONS: [(&str, BinaryOp); 8] = [
    ("=", BinaryOp::Eq),
    ("<>", BinaryOp::NotEq),
    ("!=", BinaryOp::NotEq),
    ("<", BinaryOp::Lt),
    ("<=", BinaryOp::LtEq),
    (">", BinaryOp::Gt),
    (">=", BinaryOp::GtEq),
    ("<=>", BinaryOp::NullSafeEq),
];

/// Functions MySQL lets you call without parentheses.
const NILADIC_FUNCTIONS: [&str; 8] = [
    "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "LOCALTIME", "LOCALTIMESTAMP", "UTC_DATE", "UTC_TIME",
    "UTC_TIMESTAMP",
];

/// Recursive-descent expression parser following MySQL operator precedence.
pub struct ExprParser;

impl ExprParser {
    pub fn parse(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        Self::parse_or(parser)
    }

    /// Comma separated expressions up to (not including) the closing token.
    pub fn parse_list(parser: &mut QueryParser) -> Result<Vec<ExprId>, ParseError> {
        let mut list = vec![Self::parse(parser)?];
        while parser.accept_symbol(",") {
            list.push(Self::parse(parser)?);
        }
        Ok(list)
    }

    fn binary(parser: &mut QueryParser, op: BinaryOp, left: ExprId, right: ExprId) -> ExprId {
        let span = parser.arena.span(left).to(parser.arena.span(right));
        parser.arena.alloc(ExprKind::Binary { op, left, right }, span)
    }

    fn finish(parser: &mut QueryParser, start: usize, kind: ExprKind) -> ExprId {
        let span = Span::new(start, parser.previous_end().max(start));
        parser.arena.alloc(kind, span)
    }

    fn parse_or(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        let mut left = Self::parse_xor(parser)?;
        while parser.accept_word("OR") {
            let right = Self::parse_xor(parser)?;
            left = Self::binary(parser, BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_xor(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        let mut left = Self::parse_and(parser)?;
        while parser.accept_word("XOR") {
            let right = Self::parse_and(parser)?;
            left = Self::binary(parser, BinaryOp::Xor, left, right);
        }
        Ok(left)
    }

    fn parse_and(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        let mut left = Self::parse_not(parser)?;
        while parser.accept_word("AND") || parser.accept_symbol("&&") {
            let right = Self::parse_not(parser)?;
            left = Self::binary(parser, BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        if parser.is_word("NOT") {
            let start = parser.token_start(parser.position);
            parser.next();
            let expr = Self::parse_not(parser)?;
            return Ok(Self::finish(parser, start, ExprKind::Unary { op: UnaryOp::Not, expr }));
        }
        Self::parse_predicate(parser)
    }

    fn parse_predicate(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        let mut left = Self::parse_bit_or(parser)?;
        loop {
            let start = parser.arena.span(left).start;

            if parser.accept_word("IS") {
                let negated = parser.accept_word("NOT");
                let kind = if parser.accept_word("NULL") || parser.accept_word("UNKNOWN") {
                    ExprKind::IsNull { expr: left, negated }
                } else if parser.accept_word("TRUE") {
                    ExprKind::IsBool { expr: left, value: true, negated }
                } else if parser.accept_word("FALSE") {
                    ExprKind::IsBool { expr: left, value: false, negated }
                } else {
                    return ParseError::new("Expected NULL, TRUE or FALSE after IS", parser.position, parser).err();
                };
                left = Self::finish(parser, start, kind);
                continue;
            }

            let negated = COMPARERS.not_in.compare(parser)
                || COMPARERS.not_between.compare(parser)
                || COMPARERS.not_like.compare(parser)
                || COMPARERS.not_regexp.compare(parser);
            if negated {
                parser.next();
            }

            if parser.is_word("IN") {
                parser.next();
                left = Self::parse_in(parser, left, negated, start)?;
                continue;
            }
            if parser.accept_word("BETWEEN") {
                let low = Self::parse_bit_or(parser)?;
                parser.expect_word("AND")?;
                let high = Self::parse_bit_or(parser)?;
                left = Self::finish(parser, start, ExprKind::Between { expr: left, low, high, negated });
                continue;
            }
            if parser.accept_word("LIKE") {
                let pattern = Self::parse_bit_or(parser)?;
                let escape = if parser.accept_word("ESCAPE") { Some(Self::parse_primary(parser)?) } else { None };
                left = Self::finish(parser, start, ExprKind::Like { expr: left, pattern, escape, negated });
                continue;
            }
            if parser.accept_word("REGEXP") || parser.accept_word("RLIKE") {
                let right = Self::parse_bit_or(parser)?;
                let regexp = Self::binary(parser, BinaryOp::Regexp, left, right);
                left = if negated {
                    Self::finish(parser, start, ExprKind::Unary { op: UnaryOp::Not, expr: regexp })
                } else {
                    regexp
                };
                continue;
            }

            let comparison = COMPARISONS.iter().find(|(symbol, _)| parser.is_symbol(symbol)).map(|(_, op)| *op);
            match comparison {
                Some(op) => {
                    parser.next();
                    let right = Self::parse_bit_or(parser)?;
                    left = Self::binary(parser, op, left, right);
                }
                None => break,
            }
        }
        Ok(left)
    }

    fn parse_in(parser: &mut QueryParser, expr: ExprId, negated: bool, start: usize) -> Result<ExprId, ParseError> {
        parser.expect_symbol("(")?;
        if parser.is_word("SELECT") {
            let query = SelectParser::parse_select_statement(parser)?;
            parser.expect_symbol(")")?;
            return Ok(Self::finish(parser, start, ExprKind::InSubquery { expr, query: Box::new(query), negated }));
        }
        let list = Self::parse_list(parser)?;
        parser.expect_symbol(")")?;
        Ok(Self::finish(parser, start, ExprKind::InList { expr, list, negated }))
    }

    fn parse_left_assoc(
        parser: &mut QueryParser,
        operators: &[(&str, BinaryOp)],
        operand: fn(&mut QueryParser) -> Result<ExprId, ParseError>,
    ) -> Result<ExprId, ParseError> {
        let mut left = operand(parser)?;
        loop {
            let found = operators.iter().find(|(symbol, _)| match parser.current() {
                Some(token) if token.kind == TokenKind::Symbol => token.text == *symbol,
                Some(token) if token.kind == TokenKind::Word => token.text.eq_ignore_ascii_case(symbol),
                _ => false,
            });
            let Some((_, op)) = found else {
                break;
            };
            let op = *op;
            parser.next();
            let right = operand(parser)?;
            left = Self::binary(parser, op, left, right);
        }
        Ok(left)
    }

    fn parse_bit_or(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        Self::parse_left_assoc(parser, &[("|", BinaryOp::BitOr)], Self::parse_bit_and)
    }

    fn parse_bit_and(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        Self::parse_left_assoc(parser, &[("&", BinaryOp::BitAnd)], Self::parse_shift)
    }

    fn parse_shift(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        Self::parse_left_assoc(parser, &[("<<", BinaryOp::ShiftLeft), (">>", BinaryOp::ShiftRight)], Self::parse_additive)
    }

    fn parse_additive(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        Self::parse_left_assoc(
            parser,
            &[("+", BinaryOp::Add), ("-", BinaryOp::Sub), ("||", BinaryOp::Concat)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        Self::parse_left_assoc(
            parser,
            &[
                ("*", BinaryOp::Mul),
                ("/", BinaryOp::Div),
                ("%", BinaryOp::Mod),
                ("DIV", BinaryOp::IntDiv),
                ("MOD", BinaryOp::Mod),
            ],
            Self::parse_bit_xor,
        )
    }

    fn parse_bit_xor(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        Self::parse_left_assoc(parser, &[("^", BinaryOp::BitXor)], Self::parse_unary)
    }

    fn parse_unary(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        let op = match parser.current() {
            Some(token) if token.is_symbol("-") => Some(UnaryOp::Minus),
            Some(token) if token.is_symbol("+") => Some(UnaryOp::Plus),
            Some(token) if token.is_symbol("~") => Some(UnaryOp::BitNot),
            Some(token) if token.is_symbol("!") => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let start = parser.token_start(parser.position);
            parser.next();
            let expr = Self::parse_unary(parser)?;
            return Ok(Self::finish(parser, start, ExprKind::Unary { op, expr }));
        }
        let expr = Self::parse_primary(parser)?;
        if parser.accept_word("COLLATE") {
            parser.expect_identifier()?;
        }
        Ok(expr)
    }

    pub fn parse_primary(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        let pivot = parser.position;
        let Some(token) = parser.current().cloned() else {
            return ParseError::new("Unexpected end of statement", pivot, parser).err();
        };
        let start = token.start;

        match token.kind {
            TokenKind::Number => {
                parser.next();
                let literal = Self::number_literal(&token.text)
                    .ok_or_else(|| ParseError::new("Invalid number", pivot, parser))?;
                Ok(Self::finish(parser, start, ExprKind::Literal(literal)))
            }
            TokenKind::String => {
                parser.next();
                Ok(Self::finish(parser, start, ExprKind::Literal(Literal::String(token.text))))
            }
            TokenKind::Placeholder => {
                parser.next();
                let ordinal = parser.next_placeholder();
                Ok(Self::finish(parser, start, ExprKind::Placeholder(ordinal)))
            }
            TokenKind::Symbol if token.text == "(" => {
                parser.next();
                if parser.is_word("SELECT") {
                    let query = SelectParser::parse_select_statement(parser)?;
                    parser.expect_symbol(")")?;
                    return Ok(Self::finish(parser, start, ExprKind::Subquery(Box::new(query))));
                }
                let expr = Self::parse(parser)?;
                parser.expect_symbol(")")?;
                Ok(expr)
            }
            TokenKind::QuotedIdent => Self::parse_column(parser),
            TokenKind::Word => Self::parse_word(parser, start),
            _ => ParseError::new("Unexpected token", pivot, parser).err(),
        }
    }

    fn number_literal(text: &str) -> Option<Literal> {
        if text.contains(['e', 'E']) {
            let value: f64 = text.parse().ok()?;
            return NotNan::new(value).ok().map(Literal::Float);
        }
        if text.contains('.') {
            let value: f64 = text.parse().ok()?;
            return NotNan::new(value).ok().map(Literal::Decimal);
        }
        match text.parse::<i64>() {
            Ok(value) => Some(Literal::Int(value)),
            Err(_) => {
                let value: f64 = text.parse().ok()?;
                NotNan::new(value).ok().map(Literal::Decimal)
            }
        }
    }

    fn parse_word(parser: &mut QueryParser, start: usize) -> Result<ExprId, ParseError> {
        let pivot = parser.position;
        let word = parser.current().map(|t| t.text.to_ascii_uppercase()).unwrap_or_default();
        let call = parser.peek(1).map(|t| t.is_symbol("(")).unwrap_or(false);

        match word.as_str() {
            "NULL" => {
                parser.next();
                return Ok(Self::finish(parser, start, ExprKind::Literal(Literal::Null)));
            }
            "TRUE" | "FALSE" => {
                parser.next();
                return Ok(Self::finish(parser, start, ExprKind::Literal(Literal::Bool(word == "TRUE"))));
            }
            "CASE" => return Self::parse_case(parser, start),
            "CAST" if call => return Self::parse_cast(parser, start),
            "CONVERT" if call => return Self::parse_convert(parser, start),
            "EXISTS" if call => {
                parser.next();
                parser.expect_symbol("(")?;
                let query = SelectParser::parse_select_statement(parser)?;
                parser.expect_symbol(")")?;
                return Ok(Self::finish(parser, start, ExprKind::Exists { query: Box::new(query) }));
            }
            "INTERVAL" => {
                parser.next();
                let expr = Self::parse_bit_or(parser)?;
                let unit = parser.expect_identifier()?.to_ascii_uppercase();
                return Ok(Self::finish(parser, start, ExprKind::Interval { expr, unit }));
            }
            "DATE" | "TIME" | "TIMESTAMP" if parser.peek(1).map(|t| t.kind == TokenKind::String).unwrap_or(false) => {
                parser.next();
                let literal = Self::parse_primary(parser)?;
                let target = SqlType::from_declared(&word);
                return Ok(Self::finish(parser, start, ExprKind::Cast { expr: literal, target }));
            }
            _ => {}
        }

        if call {
            return Self::parse_function(parser, start);
        }
        if NILADIC_FUNCTIONS.contains(&word.as_str()) {
            parser.next();
            let name = word.to_ascii_lowercase();
            return Ok(Self::finish(parser, start, ExprKind::Function { name, args: vec![], distinct: false, star: false }));
        }
        if is_reserved(&word) {
            return ParseError::new("Unexpected keyword", pivot, parser).err();
        }
        Self::parse_column(parser)
    }

    fn parse_column(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        let pivot = parser.position;
        let start = parser.token_start(pivot);
        let mut parts = vec![parser.expect_identifier()?];
        while parser.is_symbol(".") {
            parser.next();
            parts.push(parser.expect_identifier()?);
        }
        let column = match parts.len() {
            1 => ColumnRef { schema: None, table: None, name: parts.remove(0) },
            2 => ColumnRef { schema: None, table: Some(parts.remove(0)), name: parts.remove(0) },
            3 => ColumnRef { schema: Some(parts.remove(0)), table: Some(parts.remove(0)), name: parts.remove(0) },
            _ => return ParseError::new("Invalid column reference", pivot, parser).err(),
        };
        Ok(Self::finish(parser, start, ExprKind::Column(column)))
    }

    fn parse_case(parser: &mut QueryParser, start: usize) -> Result<ExprId, ParseError> {
        parser.expect_word("CASE")?;
        let operand = if parser.is_word("WHEN") { None } else { Some(Self::parse(parser)?) };
        let mut branches = Vec::new();
        while parser.accept_word("WHEN") {
            let when = Self::parse(parser)?;
            parser.expect_word("THEN")?;
            let then = Self::parse(parser)?;
            branches.push((when, then));
        }
        if branches.is_empty() {
            return ParseError::new("CASE without WHEN", parser.position, parser).err();
        }
        let else_result = if parser.accept_word("ELSE") { Some(Self::parse(parser)?) } else { None };
        parser.expect_word("END")?;
        Ok(Self::finish(parser, start, ExprKind::Case { operand, branches, else_result }))
    }

    /// Target type of `CAST`/`CONVERT`, e.g. `SIGNED`, `CHAR(10)`, `DECIMAL(10,2)`.
    pub fn parse_type_name(parser: &mut QueryParser) -> Result<SqlType, ParseError> {
        let name = parser.expect_identifier()?.to_ascii_uppercase();
        let target = match name.as_str() {
            "SIGNED" | "UNSIGNED" => {
                parser.accept_word("INTEGER");
                parser.accept_word("INT");
                SqlType::BigInt
            }
            "CHAR" | "NCHAR" => SqlType::Varchar,
            "BINARY" => SqlType::VarBinary,
            "DOUBLE" => {
                parser.accept_word("PRECISION");
                SqlType::Double
            }
            other => SqlType::from_declared(other),
        };
        if parser.accept_symbol("(") {
            while !parser.eof() && !parser.is_symbol(")") {
                parser.next();
            }
            parser.expect_symbol(")")?;
        }
        Ok(target)
    }

    fn parse_cast(parser: &mut QueryParser, start: usize) -> Result<ExprId, ParseError> {
        parser.next();
        parser.expect_symbol("(")?;
        let expr = Self::parse(parser)?;
        parser.expect_word("AS")?;
        let target = Self::parse_type_name(parser)?;
        parser.expect_symbol(")")?;
        Ok(Self::finish(parser, start, ExprKind::Cast { expr, target }))
    }

    fn parse_convert(parser: &mut QueryParser, start: usize) -> Result<ExprId, ParseError> {
        parser.next();
        parser.expect_symbol("(")?;
        let expr = Self::parse(parser)?;
        let target = if parser.accept_word("USING") {
            parser.expect_identifier()?;
            SqlType::Varchar
        } else {
            parser.expect_symbol(",")?;
            Self::parse_type_name(parser)?
        };
        parser.expect_symbol(")")?;
        Ok(Self::finish(parser, start, ExprKind::Cast { expr, target }))
    }

    /// A bare unit keyword (`DAY`, `MONTH`) used as a function argument.
    fn parse_unit(parser: &mut QueryParser) -> Result<ExprId, ParseError> {
        let start = parser.token_start(parser.position);
        let unit = parser.expect_identifier()?.to_ascii_uppercase();
        Ok(Self::finish(parser, start, ExprKind::Literal(Literal::String(unit))))
    }

    fn parse_function(parser: &mut QueryParser, start: usize) -> Result<ExprId, ParseError> {
        let name = parser.expect_identifier()?.to_ascii_lowercase();
        parser.expect_symbol("(")?;

        let mut args = Vec::new();
        let mut distinct = false;
        let mut star = false;

        if parser.accept_symbol(")") {
            return Ok(Self::finish(parser, start, ExprKind::Function { name, args, distinct, star }));
        }

        match name.as_str() {
            "timestampdiff" | "timestampadd" => {
                args.push(Self::parse_unit(parser)?);
                parser.expect_symbol(",")?;
                args.extend(Self::parse_list(parser)?);
            }
            "extract" => {
                args.push(Self::parse_unit(parser)?);
                parser.expect_word("FROM")?;
                args.push(Self::parse(parser)?);
            }
            "position" => {
                args.push(Self::parse_bit_or(parser)?);
                parser.expect_word("IN")?;
                args.push(Self::parse(parser)?);
            }
            "substring" | "substr" => {
                args.push(Self::parse(parser)?);
                if parser.accept_word("FROM") {
                    args.push(Self::parse(parser)?);
                    if parser.accept_word("FOR") {
                        args.push(Self::parse(parser)?);
                    }
                } else {
                    while parser.accept_symbol(",") {
                        args.push(Self::parse(parser)?);
                    }
                }
            }
            _ if parser.is_symbol("*") => {
                parser.next();
                star = true;
            }
            _ => {
                distinct = parser.accept_word("DISTINCT");
                args = Self::parse_list(parser)?;
                if COMPARERS.order_by.consume(parser) {
                    Self::parse_list(parser)?;
                    let _ = parser.accept_word("ASC") || parser.accept_word("DESC");
                }
                if parser.accept_word("SEPARATOR") {
                    Self::parse_primary(parser)?;
                }
            }
        }

        parser.expect_symbol(")")?;
        Ok(Self::finish(parser, start, ExprKind::Function { name, args, distinct, star }))
    }
}
