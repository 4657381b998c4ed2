// Shared errors
pub mod auth_error;
pub mod ledger_error;

pub use auth_error::*;
pub use ledger_error::*;
