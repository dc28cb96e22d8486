pub mod token;
pub use token::*;

pub mod tokenizer;
pub use tokenizer::*;
