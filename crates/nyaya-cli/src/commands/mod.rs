//! Command implementations.

pub mod analyze;
pub mod classify;
pub mod neighbors;
pub mod search;
pub mod validate;

pub use self::analyze::execute_analyze;
pub use self::classify::execute_classify;
pub use self::neighbors::execute_neighbors;
pub use self::search::execute_search;
pub use self::validate::execute_validate;
