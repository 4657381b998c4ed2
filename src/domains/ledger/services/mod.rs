// Ledger domain services
pub mod ledger_service;
pub mod order_service;
pub mod state;

pub use ledger_service::*;
pub use order_service::*;
pub use state::*;
