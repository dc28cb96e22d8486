pub mod fragment;
pub use fragment::*;

pub mod fragment_extractor;
pub use fragment_extractor::*;

pub mod describe_dynamic;
pub use describe_dynamic::*;
