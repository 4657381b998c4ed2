use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::domains::ledger::models::{OrderResponse, OrderSubmission};
use crate::shared::errors::LedgerError;
use crate::shared::middleware::auth::AuthenticatedUser;
use crate::shared::services::AppState;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

/// 주문 업로드 핸들러
/// Upload an order number (plain-text body)
#[utoipa::path(
    post,
    path = "/api/user/orders",
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 202, description = "Order accepted for processing", body = OrderResponse),
        (status = 200, description = "Order already uploaded by this user", body = OrderResponse),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Order already uploaded by another user"),
        (status = 422, description = "Malformed order number"),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Orders"
)]
pub async fn upload_order(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    body: String,
) -> Result<(StatusCode, Json<OrderResponse>), ErrorResponse> {
    let submission = app_state
        .ledger_state
        .order_service
        .add_order(authenticated_user.user_id, &body)
        .await
        .map_err(|e: LedgerError| -> ErrorResponse { e.into() })?;

    let status = match &submission {
        OrderSubmission::Accepted(_) => StatusCode::ACCEPTED,
        OrderSubmission::AlreadySubmitted(_) => StatusCode::OK,
    };

    let order = match submission {
        OrderSubmission::Accepted(order) | OrderSubmission::AlreadySubmitted(order) => order,
    };

    Ok((status, Json(order.into())))
}

/// 주문 목록 핸들러
/// List the caller's orders, newest first
#[utoipa::path(
    get,
    path = "/api/user/orders",
    responses(
        (status = 200, description = "Orders", body = [OrderResponse]),
        (status = 204, description = "No orders uploaded yet"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Orders"
)]
pub async fn get_orders(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Response, ErrorResponse> {
    let orders = app_state
        .ledger_state
        .order_service
        .get_orders(authenticated_user.user_id)
        .await
        .map_err(|e: LedgerError| -> ErrorResponse { e.into() })?;

    if orders.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let orders: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(Json(orders).into_response())
}
