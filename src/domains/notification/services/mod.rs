// Notification domain services
pub mod bus;
pub mod hub;
pub mod pipeline;

pub use bus::*;
pub use hub::*;
pub use pipeline::*;
