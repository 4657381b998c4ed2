// Ledger domain models
pub mod order;
pub mod transaction;

pub use order::*;
pub use transaction::*;
