// Ledger domain handlers
pub mod balance_handler;
pub mod order_handler;
