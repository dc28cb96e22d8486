pub mod column_resolver;
pub use column_resolver::*;

pub mod wildcard_resolver;
pub use wildcard_resolver::*;

pub mod join_resolver;
pub use join_resolver::*;

pub mod order_by_resolver;
pub use order_by_resolver::*;
