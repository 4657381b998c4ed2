// Notification domain handlers
pub mod ws_handler;
