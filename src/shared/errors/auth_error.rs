use thiserror::Error;
use axum::{http::StatusCode, Json};
use serde_json::json;

/// 인증 관련 에러
/// Authentication-related errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// 로그인이 이미 존재함
    /// Login already exists
    #[error("Login already exists: {login}")]
    LoginAlreadyExists { login: String },

    /// 잘못된 로그인 또는 비밀번호
    /// Wrong login or password
    #[error("Wrong credentials")]
    WrongCredentials,

    /// 잘못된 입력 (로그인/비밀번호 형식)
    /// Invalid login or password format
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 비밀번호 해싱 실패
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    PasswordHashingFailed(String),

    /// 저장소 에러
    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// 내부 서버 에러
    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),

    /// 잘못된 또는 만료된 토큰
    /// Invalid or expired token
    #[error("Invalid or expired token")]
    InvalidToken,

    /// 토큰이 제공되지 않음
    /// Token not provided
    #[error("Token not provided")]
    MissingToken,
}

/// AuthError를 HTTP 응답으로 변환
impl From<AuthError> for (StatusCode, Json<serde_json::Value>) {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::LoginAlreadyExists { .. } => StatusCode::CONFLICT,
            AuthError::WrongCredentials => StatusCode::UNAUTHORIZED,
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::PasswordHashingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::InvalidToken | AuthError::MissingToken => StatusCode::UNAUTHORIZED,
        };

        (status, Json(json!({ "error": err.to_string() })))
    }
}
