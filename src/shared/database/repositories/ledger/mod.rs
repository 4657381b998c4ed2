// Ledger repositories
pub mod order_repository;
pub mod transaction_repository;

pub use order_repository::*;
pub use transaction_repository::*;
