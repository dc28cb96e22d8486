pub mod expr;
pub use expr::*;

pub mod literal;
pub use literal::*;

pub mod operators;
pub use operators::*;

pub mod query;
pub use query::*;

pub mod table_ref;
pub use table_ref::*;

pub mod statement;
pub use statement::*;

pub mod expr_parser;
pub use expr_parser::*;

pub mod select_parser;
pub use select_parser::*;

pub mod statement_parser;
pub use statement_parser::*;
