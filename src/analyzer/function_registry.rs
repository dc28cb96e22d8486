use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::database::SqlType;

/// How the result type of a call follows from its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnRule {
    Fixed(SqlType),
    SameAsArg(usize),
    /// Least common type of every argument.
    Widen,
    /// Least common type of the arguments from the given position on.
    WidenFrom(usize),
    /// `decimal`, or `double` for approximate input.
    Sum,
}

/// Type each argument position expects; drives placeholder typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgRule {
    Any,
    All(SqlType),
    Positional(&'static [Option<SqlType>]),
}

impl ArgRule {
    pub fn expected(&self, index: usize) -> Option<SqlType> {
        match self {
            ArgRule::Any => None,
            ArgRule::All(expected) => Some(*expected),
            ArgRule::Positional(positions) => positions.get(index).copied().flatten(),
        }
    }
}

/// Not-null fact of a call given the facts of its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullRule {
    /// Not null when every argument is.
    AllArgs,
    /// Never null.
    Always,
    /// May be null whatever the arguments are.
    Nullable,
    /// Not null when any argument is.
    AnyArg,
    /// Not null when the arguments at these positions are.
    ArgsAt(&'static [usize]),
}

impl NullRule {
    pub fn evaluate(&self, args: &[bool]) -> bool {
        match self {
            NullRule::AllArgs => args.iter().all(|not_null| *not_null),
            NullRule::Always => true,
            NullRule::Nullable => false,
            NullRule::AnyArg => args.iter().any(|not_null| *not_null),
            NullRule::ArgsAt(positions) => positions.iter().all(|index| args.get(*index).copied().unwrap_or(true)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSignature {
    pub returns: ReturnRule,
    pub args: ArgRule,
    pub nullability: NullRule,
    pub aggregate: bool,
    /// Placeholders passed straight to this function are reported nullable.
    pub nullable_args: bool,
}

impl FunctionSignature {
    const fn new(returns: ReturnRule, args: ArgRule, nullability: NullRule) -> Self {
        Self { returns, args, nullability, aggregate: false, nullable_args: false }
    }

    const fn aggregate(mut self) -> Self {
        self.aggregate = true;
        self
    }

    const fn nullable_args(mut self) -> Self {
        self.nullable_args = true;
        self
    }
}

use ArgRule::{All, Any, Positional};
use NullRule::{AllArgs, AnyArg, ArgsAt, Always, Nullable};
use ReturnRule::{Fixed, SameAsArg, Sum, Widen, WidenFrom};
use SqlType::{BigInt, Date, DateTime, Double, Int, Json, Text, Time, Varchar};

static FUNCTIONS: Lazy<IndexMap<&'static str, FunctionSignature>> = Lazy::new(|| {
    let mut functions = IndexMap::new();
    let mut add = |names: &[&'static str], signature: FunctionSignature| {
        for name in names {
            functions.insert(*name, signature);
        }
    };

    // aggregates
    add(&["count"], FunctionSignature::new(Fixed(BigInt), Any, Always).aggregate());
    add(&["sum", "avg"], FunctionSignature::new(Sum, All(Double), Nullable).aggregate());
    add(&["min", "max"], FunctionSignature::new(SameAsArg(0), Any, Nullable).aggregate());
    add(&["group_concat"], FunctionSignature::new(Fixed(Text), Any, Nullable).aggregate());
    add(
        &["std", "stddev", "stddev_pop", "stddev_samp", "variance", "var_pop", "var_samp"],
        FunctionSignature::new(Fixed(Double), All(Double), Nullable).aggregate(),
    );
    add(&["bit_and", "bit_or", "bit_xor"], FunctionSignature::new(Fixed(BigInt), All(BigInt), Always).aggregate());
    add(&["json_arrayagg", "json_objectagg"], FunctionSignature::new(Fixed(Json), Any, Nullable).aggregate());

    // strings
    add(&["concat"], FunctionSignature::new(Fixed(Varchar), All(Varchar), AllArgs));
    add(&["concat_ws"], FunctionSignature::new(Fixed(Varchar), All(Varchar), ArgsAt(&[0])));
    add(
        &["upper", "lower", "ucase", "lcase", "trim", "ltrim", "rtrim", "reverse", "replace", "quote", "soundex"],
        FunctionSignature::new(Fixed(Varchar), All(Varchar), AllArgs),
    );
    add(
        &["substring", "substr", "mid"],
        FunctionSignature::new(Fixed(Varchar), Positional(&[Some(Varchar), Some(BigInt), Some(BigInt)]), AllArgs),
    );
    add(
        &["left", "right", "repeat"],
        FunctionSignature::new(Fixed(Varchar), Positional(&[Some(Varchar), Some(BigInt)]), AllArgs),
    );
    add(
        &["lpad", "rpad"],
        FunctionSignature::new(Fixed(Varchar), Positional(&[Some(Varchar), Some(BigInt), Some(Varchar)]), AllArgs),
    );
    add(
        &["length", "char_length", "character_length", "octet_length", "bit_length", "ascii", "ord"],
        FunctionSignature::new(Fixed(BigInt), All(Varchar), AllArgs),
    );
    add(
        &["locate", "instr", "position"],
        FunctionSignature::new(Fixed(BigInt), Positional(&[Some(Varchar), Some(Varchar), Some(BigInt)]), AllArgs),
    );
    add(&["format"], FunctionSignature::new(Fixed(Varchar), Positional(&[Some(Double), Some(BigInt)]), AllArgs));
    add(&["md5", "sha1", "sha2", "hex", "to_base64", "uuid_to_bin"], FunctionSignature::new(Fixed(Varchar), Any, AllArgs));
    add(&["uuid", "database", "user", "current_user", "version"], FunctionSignature::new(Fixed(Varchar), Any, Always));

    // numbers
    add(&["abs", "sign"], FunctionSignature::new(SameAsArg(0), All(Double), AllArgs));
    add(&["round", "truncate"], FunctionSignature::new(SameAsArg(0), Positional(&[Some(Double), Some(BigInt)]), AllArgs));
    add(&["ceil", "ceiling", "floor"], FunctionSignature::new(Fixed(BigInt), All(Double), AllArgs));
    add(&["mod"], FunctionSignature::new(Widen, All(Double), AllArgs));
    add(
        &["sqrt", "exp", "ln", "log", "log2", "log10", "pow", "power", "sin", "cos", "tan", "asin", "acos", "atan", "degrees", "radians"],
        FunctionSignature::new(Fixed(Double), All(Double), AllArgs),
    );
    add(&["rand", "pi"], FunctionSignature::new(Fixed(Double), All(BigInt), Always));
    add(&["greatest", "least"], FunctionSignature::new(Widen, Any, AllArgs));

    // dates
    add(
        &["now", "current_timestamp", "localtime", "localtimestamp", "sysdate", "utc_timestamp"],
        FunctionSignature::new(Fixed(DateTime), Any, Always),
    );
    add(&["curdate", "current_date", "utc_date"], FunctionSignature::new(Fixed(Date), Any, Always));
    add(&["curtime", "current_time", "utc_time"], FunctionSignature::new(Fixed(Time), Any, Always));
    add(&["date"], FunctionSignature::new(Fixed(Date), All(DateTime), AllArgs));
    add(
        &["year", "month", "day", "dayofmonth", "dayofweek", "dayofyear", "week", "weekday", "quarter", "hour", "minute", "second"],
        FunctionSignature::new(Fixed(Int), All(DateTime), AllArgs),
    );
    add(&["datediff"], FunctionSignature::new(Fixed(BigInt), All(Date), AllArgs));
    add(
        &["timestampdiff"],
        FunctionSignature::new(Fixed(BigInt), Positional(&[None, Some(DateTime), Some(DateTime)]), AllArgs),
    );
    add(
        &["timestampadd"],
        FunctionSignature::new(Fixed(DateTime), Positional(&[None, Some(BigInt), Some(DateTime)]), AllArgs),
    );
    add(
        &["date_add", "date_sub", "adddate", "subdate"],
        FunctionSignature::new(SameAsArg(0), Positional(&[Some(DateTime)]), AllArgs),
    );
    add(&["date_format"], FunctionSignature::new(Fixed(Varchar), Positional(&[Some(DateTime), Some(Varchar)]), AllArgs));
    add(&["str_to_date"], FunctionSignature::new(Fixed(Date), All(Varchar), Nullable));
    add(&["last_day"], FunctionSignature::new(Fixed(Date), All(Date), Nullable));
    add(&["unix_timestamp"], FunctionSignature::new(Fixed(BigInt), All(DateTime), AllArgs));
    add(&["from_unixtime"], FunctionSignature::new(Fixed(DateTime), All(BigInt), AllArgs));
    add(&["extract"], FunctionSignature::new(Fixed(BigInt), Positional(&[None, Some(DateTime)]), AllArgs));

    // null handling and conditionals
    add(&["ifnull", "coalesce"], FunctionSignature::new(Widen, Any, AnyArg).nullable_args());
    add(&["nullif"], FunctionSignature::new(SameAsArg(0), Any, Nullable).nullable_args());
    add(&["if"], FunctionSignature::new(WidenFrom(1), Any, ArgsAt(&[1, 2])));

    // misc
    add(&["json_extract"], FunctionSignature::new(Fixed(Json), Positional(&[Some(Json), Some(Varchar)]), Nullable));
    add(&["json_object", "json_array"], FunctionSignature::new(Fixed(Json), Any, Always));
    add(&["json_unquote"], FunctionSignature::new(Fixed(Varchar), All(Varchar), AllArgs));
    add(&["last_insert_id", "row_count", "found_rows"], FunctionSignature::new(Fixed(BigInt), Any, Always));
    add(&["values"], FunctionSignature::new(SameAsArg(0), Any, AllArgs));

    functions
});

/// Static table of the functions the analyzer knows how to type.
pub struct FunctionRegistry;

impl FunctionRegistry {
    /// Look a function up by name, case-insensitively.
    pub fn get(name: &str) -> Option<&'static FunctionSignature> {
        FUNCTIONS.get(name.to_ascii_lowercase().as_str())
    }

    pub fn is_aggregate(name: &str) -> bool {
        Self::get(name).map(|signature| signature.aggregate).unwrap_or(false)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        FUNCTIONS.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_lookup_is_case_insensitive() {
        let count = FunctionRegistry::get("COUNT").unwrap();
        assert_eq!(count.returns, ReturnRule::Fixed(SqlType::BigInt));
        assert!(count.aggregate);
        assert!(FunctionRegistry::is_aggregate("Max"));
        assert!(!FunctionRegistry::is_aggregate("concat"));
        assert!(FunctionRegistry::get("no_such_function").is_none());
    }

    #[test]
    pub fn test_null_rules() {
        assert!(NullRule::AnyArg.evaluate(&[false, true]));
        assert!(!NullRule::AllArgs.evaluate(&[false, true]));
        assert!(NullRule::ArgsAt(&[0]).evaluate(&[true, false, false]));
        assert!(!NullRule::Nullable.evaluate(&[true]));
        assert!(NullRule::AllArgs.evaluate(&[]));
    }

    #[test]
    pub fn test_arg_rules() {
        let concat_ws = FunctionRegistry::get("concat_ws").unwrap();
        assert_eq!(concat_ws.args.expected(3), Some(SqlType::Varchar));

        let timestampdiff = FunctionRegistry::get("timestampdiff").unwrap();
        assert_eq!(timestampdiff.args.expected(0), None);
        assert_eq!(timestampdiff.args.expected(2), Some(SqlType::DateTime));
        assert_eq!(timestampdiff.args.expected(3), None);

        let ifnull = FunctionRegistry::get("ifnull").unwrap();
        assert!(ifnull.nullable_args);
        assert_eq!(ifnull.returns, ReturnRule::Widen);
    }

    #[test]
    pub fn test_every_name_is_lowercase() {
        for name in FunctionRegistry::names() {
            assert_eq!(name, name.to_ascii_lowercase());
        }
    }
}
