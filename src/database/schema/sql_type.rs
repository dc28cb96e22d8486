use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Concrete column/expression type known to the analyzer.
///
/// Names follow MySQL; SQLite affinities (`INTEGER`, `TEXT`, `REAL`, `BLOB`,
/// `NUMERIC`) are accepted when parsing declared types and mapped onto the
/// closest variant. `Unknown` is the opaque type reported for expressions no
/// rule can type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SqlType {
    Null,
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Decimal,
    Float,
    Double,
    Bit,
    Year,
    Date,
    Time,
    DateTime,
    Timestamp,
    Char,
    Varchar,
    TinyText,
    Text,
    MediumText,
    LongText,
    Binary,
    VarBinary,
    Blob,
    Enum,
    Set,
    Json,
    Geometry,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Numeric,
    Temporal,
    Textual,
    Bit,
    Json,
    Geometry,
    Null,
    Unknown,
}

impl SqlType {
    fn category(self) -> Category {
        use SqlType::*;
        match self {
            TinyInt | SmallInt | MediumInt | Int | BigInt | Decimal | Float | Double => Category::Numeric,
            Year | Date | Time | DateTime | Timestamp => Category::Temporal,
            Char | Varchar | TinyText | Text | MediumText | LongText | Binary | VarBinary | Blob | Enum | Set => Category::Textual,
            Bit => Category::Bit,
            Json => Category::Json,
            Geometry => Category::Geometry,
            Null => Category::Null,
            Unknown => Category::Unknown,
        }
    }

    /// Widening rank inside the numeric family.
    fn numeric_rank(self) -> u8 {
        use SqlType::*;
        match self {
            TinyInt => 1,
            SmallInt => 2,
            MediumInt => 3,
            Int => 4,
            BigInt => 5,
            Decimal => 6,
            Float => 7,
            Double => 8,
            _ => 0,
        }
    }

    /// Total order over the string-like family; binary wins a tie with text.
    fn textual_rank(self) -> u8 {
        use SqlType::*;
        match self {
            Char => 10,
            Binary => 11,
            Enum => 12,
            Set => 13,
            Varchar => 20,
            VarBinary => 21,
            TinyText => 30,
            Text => 40,
            Blob => 41,
            MediumText => 50,
            LongText => 60,
            _ => 0,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.category() == Category::Numeric
    }

    pub fn is_integer(self) -> bool {
        use SqlType::*;
        matches!(self, TinyInt | SmallInt | MediumInt | Int | BigInt | Bit | Year)
    }

    pub fn is_approximate(self) -> bool {
        matches!(self, SqlType::Float | SqlType::Double)
    }

    pub fn is_temporal(self) -> bool {
        self.category() == Category::Temporal
    }

    pub fn is_textual(self) -> bool {
        self.category() == Category::Textual
    }

    pub fn is_unknown(self) -> bool {
        self == SqlType::Unknown
    }

    /// Least common type of two types (union branches, CASE/IF branches,
    /// COALESCE arguments).
    ///
    /// The operation is commutative and associative, with `Null` as identity,
    /// so folding it over any number of types gives the same answer in any
    /// order. Numbers widen, temporals meet at `datetime`, everything else
    /// meets in the string family (never below `varchar`).
    pub fn promote(a: SqlType, b: SqlType) -> SqlType {
        if a == b {
            return a;
        }
        match (a.category(), b.category()) {
            (Category::Null, _) => b,
            (_, Category::Null) => a,
            (Category::Unknown, _) => b,
            (_, Category::Unknown) => a,
            (Category::Numeric, Category::Numeric) => {
                if a.numeric_rank() >= b.numeric_rank() { a } else { b }
            }
            (Category::Temporal, Category::Temporal) => SqlType::DateTime,
            _ => {
                let a = a.lift_textual();
                let b = b.lift_textual();
                if a.textual_rank() >= b.textual_rank() { a } else { b }
            }
        }
    }

    fn lift_textual(self) -> SqlType {
        if self.is_textual() && self.textual_rank() >= SqlType::Varchar.textual_rank() {
            self
        } else {
            SqlType::Varchar
        }
    }

    /// Result type of `+`, `-`, `*` and `%`.
    pub fn arithmetic(a: SqlType, b: SqlType) -> SqlType {
        if a.is_unknown() || b.is_unknown() {
            return SqlType::Unknown;
        }
        if a.is_approximate() || b.is_approximate() {
            return SqlType::Double;
        }
        let exact = |t: SqlType| t.is_integer() || t == SqlType::Decimal || t == SqlType::Null;
        if !exact(a) || !exact(b) {
            return SqlType::Double;
        }
        if a == SqlType::Decimal || b == SqlType::Decimal {
            return SqlType::Decimal;
        }
        SqlType::BigInt
    }

    /// Result type of `/`.
    pub fn division(a: SqlType, b: SqlType) -> SqlType {
        match SqlType::arithmetic(a, b) {
            SqlType::BigInt => SqlType::Decimal,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        use SqlType::*;
        match self {
            Null => "null",
            TinyInt => "tinyint",
            SmallInt => "smallint",
            MediumInt => "mediumint",
            Int => "int",
            BigInt => "bigint",
            Decimal => "decimal",
            Float => "float",
            Double => "double",
            Bit => "bit",
            Year => "year",
            Date => "date",
            Time => "time",
            DateTime => "datetime",
            Timestamp => "timestamp",
            Char => "char",
            Varchar => "varchar",
            TinyText => "tinytext",
            Text => "text",
            MediumText => "mediumtext",
            LongText => "longtext",
            Binary => "binary",
            VarBinary => "varbinary",
            Blob => "blob",
            Enum => "enum",
            Set => "set",
            Json => "json",
            Geometry => "geometry",
            Unknown => "?",
        }
    }

    /// Parse a declared column type such as `varchar(255)`, `INT UNSIGNED`
    /// or a SQLite affinity. Unrecognised names become `Unknown`.
    pub fn from_declared(declared: &str) -> SqlType {
        use SqlType::*;
        let lowered = declared.trim().to_ascii_lowercase();
        let base = lowered
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();
        match base {
            "null" => Null,
            "tinyint" | "bool" | "boolean" => TinyInt,
            "smallint" => SmallInt,
            "mediumint" => MediumInt,
            "int" | "integer" => Int,
            "bigint" => BigInt,
            "decimal" | "dec" | "numeric" | "fixed" => Decimal,
            "float" => Float,
            "double" | "real" => Double,
            "bit" => Bit,
            "year" => Year,
            "date" => Date,
            "time" => Time,
            "datetime" => DateTime,
            "timestamp" => Timestamp,
            "char" | "nchar" => Char,
            "varchar" | "nvarchar" | "string" => Varchar,
            "tinytext" => TinyText,
            "text" | "clob" => Text,
            "mediumtext" => MediumText,
            "longtext" => LongText,
            "binary" => Binary,
            "varbinary" => VarBinary,
            "blob" | "tinyblob" | "mediumblob" | "longblob" => Blob,
            "enum" => Enum,
            "set" => Set,
            "json" => Json,
            "geometry" | "point" | "linestring" | "polygon" => Geometry,
            _ => Unknown,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SqlType::from_declared(s))
    }
}

impl From<String> for SqlType {
    fn from(value: String) -> Self {
        SqlType::from_declared(&value)
    }
}

impl From<SqlType> for String {
    fn from(value: SqlType) -> Self {
        value.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SqlType::*;

    const SAMPLE: [SqlType; 12] = [Null, TinyInt, Int, BigInt, Decimal, Double, Date, DateTime, Char, Varchar, Text, Unknown];

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(SqlType::promote(Int, BigInt), BigInt);
        assert_eq!(SqlType::promote(Int, Double), Double);
        assert_eq!(SqlType::promote(Decimal, TinyInt), Decimal);
    }

    #[test]
    fn test_mixed_categories_meet_in_varchar() {
        assert_eq!(SqlType::promote(Int, Varchar), Varchar);
        assert_eq!(SqlType::promote(Char, Int), Varchar);
        assert_eq!(SqlType::promote(Date, Int), Varchar);
        assert_eq!(SqlType::promote(LongText, Int), LongText);
        assert_eq!(SqlType::promote(Date, Time), DateTime);
    }

    #[test]
    fn test_null_and_unknown_are_identities() {
        assert_eq!(SqlType::promote(Null, Int), Int);
        assert_eq!(SqlType::promote(Varchar, Null), Varchar);
        assert_eq!(SqlType::promote(Unknown, Date), Date);
    }

    #[test]
    fn test_promotion_is_commutative_and_associative() {
        for a in SAMPLE {
            for b in SAMPLE {
                assert_eq!(SqlType::promote(a, b), SqlType::promote(b, a), "{a} {b}");
                for c in SAMPLE {
                    assert_eq!(
                        SqlType::promote(SqlType::promote(a, b), c),
                        SqlType::promote(a, SqlType::promote(b, c)),
                        "{a} {b} {c}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_arithmetic_rules() {
        assert_eq!(SqlType::arithmetic(Int, Int), BigInt);
        assert_eq!(SqlType::arithmetic(Int, Double), Double);
        assert_eq!(SqlType::arithmetic(Int, Decimal), Decimal);
        assert_eq!(SqlType::arithmetic(Varchar, Int), Double);
        assert_eq!(SqlType::division(Int, Int), Decimal);
    }

    #[test]
    fn test_from_declared() {
        assert_eq!(SqlType::from_declared("varchar(255)"), Varchar);
        assert_eq!(SqlType::from_declared("INT UNSIGNED"), Int);
        assert_eq!(SqlType::from_declared("INTEGER"), Int);
        assert_eq!(SqlType::from_declared("REAL"), Double);
        assert_eq!(SqlType::from_declared("decimal(10,2)"), Decimal);
        assert_eq!(SqlType::from_declared("whatever"), Unknown);
    }

    #[test]
    fn test_serde_uses_sql_names() {
        assert_eq!(serde_json::to_string(&DateTime).unwrap(), "\"datetime\"");
        let parsed: SqlType = serde_json::from_str("\"BIGINT(20)\"").unwrap();
        assert_eq!(parsed, BigInt);
    }
}
