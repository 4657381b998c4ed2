use crate::domains::auth::models::{CredentialsRequest, TokenResponse};
use crate::shared::services::AppState;
use crate::shared::errors::AuthError;
use axum::{extract::State, http::{header, StatusCode}, Json};

type ErrorResponse = (StatusCode, Json<serde_json::Value>);
type TokenReply = ([(header::HeaderName, String); 1], Json<TokenResponse>);

fn token_reply(state: &AppState, token: String) -> TokenReply {
    (
        [(header::AUTHORIZATION, format!("Bearer {}", token))],
        Json(TokenResponse {
            access_token: token,
            token_type: "Bearer".to_string(),
            expires_in: state.auth_state.jwt_service.ttl_secs(),
        }),
    )
}

// 회원가입 핸들러
#[utoipa::path(
    post,
    path = "/api/user/register",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "User registered and authenticated", body = TokenResponse),
        (status = 400, description = "Malformed login or password"),
        (status = 409, description = "Login already taken"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    State(app_state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<TokenReply, ErrorResponse> {
    let (_, token) = app_state
        .auth_state
        .auth_service
        .register(request)
        .await
        .map_err(|e: AuthError| -> ErrorResponse { e.into() })?;

    Ok(token_reply(&app_state, token))
}

// 로그인 핸들러
#[utoipa::path(
    post,
    path = "/api/user/login",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Wrong login or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<TokenReply, ErrorResponse> {
    let (_, token) = app_state
        .auth_state
        .auth_service
        .login(request)
        .await
        .map_err(|e: AuthError| -> ErrorResponse { e.into() })?;

    Ok(token_reply(&app_state, token))
}
