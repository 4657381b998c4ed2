// Notification domain routes
// 알림 도메인 라우터
use axum::{routing::get, Router};
use crate::domains::notification::handlers::ws_handler;
use crate::shared::services::AppState;

/// Create notification router
pub fn create_notification_router() -> Router<AppState> {
    Router::new().route("/notifications/ws", get(ws_handler::notifications_ws))
}
