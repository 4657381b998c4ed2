// External system clients
pub mod accrual;

pub use accrual::*;
