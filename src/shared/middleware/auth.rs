use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
};
use serde::Deserialize;
use crate::shared::services::AppState;
use crate::shared::errors::AuthError;

/// 인증된 사용자 정보 (JWT 토큰에서 추출)
/// Authenticated user information (extracted from JWT token)
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: u64,
    pub login: String,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// 요청에서 토큰 추출
///
/// 1. `Authorization: Bearer <token>` 헤더
/// 2. 없으면 `?token=` 쿼리 (브라우저 WebSocket은 헤더를 설정할 수 없음)
fn extract_token(parts: &Parts) -> Result<String, AuthError> {
    if let Some(header) = parts.headers.get(AUTHORIZATION) {
        let value = header.to_str().map_err(|_| AuthError::InvalidToken)?;
        return value
            .strip_prefix("Bearer ")
            .map(|token| token.trim().to_string())
            .ok_or(AuthError::InvalidToken);
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|query| query.0.token)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// AuthenticatedUser를 Axum Extractor로 구현
///
/// 사용법:
/// ```ignore
/// pub async fn get_balance(
///     State(app_state): State<AppState>,
///     authenticated_user: AuthenticatedUser,
/// ) -> Result<...> {
///     let user_id = authenticated_user.user_id;
///     // ...
/// }
/// ```
#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = (StatusCode, axum::Json<serde_json::Value>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts).map_err(|e| -> Self::Rejection { e.into() })?;

        let claims = state
            .auth_state
            .jwt_service
            .verify_access_token(&token)
            .map_err(|e| -> Self::Rejection { e.into() })?;

        Ok(AuthenticatedUser {
            user_id: claims.user_id,
            login: claims.login,
        })
    }
}
