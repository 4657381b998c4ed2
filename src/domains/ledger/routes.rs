// Ledger domain routes
// 원장 도메인 라우터
use axum::{routing::{get, post}, Router};
use crate::domains::ledger::handlers::{balance_handler, order_handler};
use crate::shared::services::AppState;

/// Create ledger router (orders, balance, withdrawals)
/// 원장 라우터 생성
pub fn create_ledger_router() -> Router<AppState> {
    Router::new()
        .route(
            "/orders",
            post(order_handler::upload_order).get(order_handler::get_orders),
        )
        .route("/balance", get(balance_handler::get_balance))
        .route("/balance/withdraw", post(balance_handler::withdraw))
        .route("/withdrawals", get(balance_handler::get_withdrawals))
}
