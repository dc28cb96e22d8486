pub mod config;
pub use config::*;

pub mod analyzer_error;
pub use analyzer_error::*;

pub mod expression_resolver;
pub use expression_resolver::*;

pub mod analysis_result;
pub use analysis_result::*;

pub mod type_var;
pub use type_var::*;

pub mod function_registry;
pub use function_registry::*;

pub mod type_inference;
pub use type_inference::*;

pub mod scope;
pub use scope::*;

pub mod analysis_context;
pub use analysis_context::*;

pub mod resolvers;
pub use resolvers::*;

pub mod expression_analyzer;
pub use expression_analyzer::*;

pub mod nullability;
pub use nullability::*;

pub mod spec_layout;
pub use spec_layout::*;

pub mod select_analyzer;
pub use select_analyzer::*;

pub mod dml_analyzer;
pub use dml_analyzer::*;

pub mod query_analyzer;
pub use query_analyzer::*;

#[cfg(test)]
pub mod _tests;
