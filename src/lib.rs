//! Loyalty points ledger: order reconciliation against an external accrual
//! system, non-overdraft withdrawals and realtime accrual notifications.

pub mod domains;
pub mod routes;
pub mod shared;
