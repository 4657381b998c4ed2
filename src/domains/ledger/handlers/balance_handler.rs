use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::domains::ledger::models::{BalanceResponse, WithdrawRequest, WithdrawalResponse};
use crate::shared::errors::LedgerError;
use crate::shared::middleware::auth::AuthenticatedUser;
use crate::shared::services::AppState;
use crate::shared::utils::to_minor_units_exact;

type ErrorResponse = (StatusCode, Json<serde_json::Value>);

/// 잔고 조회 핸들러
#[utoipa::path(
    get,
    path = "/api/user/balance",
    responses(
        (status = 200, description = "Current balance and total withdrawn", body = BalanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Balance"
)]
pub async fn get_balance(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<BalanceResponse>, ErrorResponse> {
    let balance = app_state
        .ledger_state
        .ledger_service
        .get_balance(authenticated_user.user_id)
        .await
        .map_err(|e: LedgerError| -> ErrorResponse { e.into() })?;

    Ok(Json(balance.into()))
}

/// 포인트 사용 핸들러
#[utoipa::path(
    post,
    path = "/api/user/balance/withdraw",
    request_body = WithdrawRequest,
    responses(
        (status = 200, description = "Withdrawal recorded", body = WithdrawalResponse),
        (status = 401, description = "Unauthorized"),
        (status = 402, description = "Insufficient funds"),
        (status = 409, description = "Order reference already used for a withdrawal"),
        (status = 422, description = "Malformed order number or amount"),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Balance"
)]
pub async fn withdraw(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<WithdrawalResponse>, ErrorResponse> {
    let amount = to_minor_units_exact(request.sum).ok_or_else(|| -> ErrorResponse {
        LedgerError::InvalidInput(format!("invalid withdrawal amount {}", request.sum)).into()
    })?;

    let tx = app_state
        .ledger_state
        .ledger_service
        .add_withdrawal(authenticated_user.user_id, &request.order, amount)
        .await
        .map_err(|e: LedgerError| -> ErrorResponse { e.into() })?;

    Ok(Json(tx.into()))
}

/// 포인트 사용 내역 핸들러
#[utoipa::path(
    get,
    path = "/api/user/withdrawals",
    responses(
        (status = 200, description = "Withdrawals, newest first", body = [WithdrawalResponse]),
        (status = 204, description = "No withdrawals yet"),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Storage unavailable")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Balance"
)]
pub async fn get_withdrawals(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Response, ErrorResponse> {
    let withdrawals = app_state
        .ledger_state
        .ledger_service
        .get_withdrawals(authenticated_user.user_id)
        .await
        .map_err(|e: LedgerError| -> ErrorResponse { e.into() })?;

    if withdrawals.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let withdrawals: Vec<WithdrawalResponse> = withdrawals.into_iter().map(Into::into).collect();
    Ok(Json(withdrawals).into_response())
}
