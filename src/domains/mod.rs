// Domain modules
pub mod auth;
pub mod ledger;
pub mod notification;
