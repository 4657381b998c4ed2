// Routes module: 라우팅 설정
// 역할: 모든 도메인의 라우터를 조합
// Routes module: combines all domain routers

use axum::Router;
use crate::shared::services::AppState;

// 각 도메인의 routes import
use crate::domains::auth::routes::create_auth_router;
use crate::domains::ledger::routes::create_ledger_router;
use crate::domains::notification::routes::create_notification_router;

/// Create main router (combines all domain routers)
/// 메인 라우터 생성 (모든 도메인 라우터 조합)
///
/// 모든 경로는 `/api/user` 아래에 위치
pub fn create_router() -> Router<AppState> {
    Router::new().nest(
        "/api/user",
        Router::new()
            .merge(create_auth_router())
            .merge(create_ledger_router())
            .merge(create_notification_router()),
    )
}
