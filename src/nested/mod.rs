pub mod nested_result;
pub use nested_result::*;

pub mod decomposer;
pub use decomposer::*;
