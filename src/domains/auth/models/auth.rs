use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// 회원가입 / 로그인 요청 모델 (동일한 형태)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = CredentialsRequest)]
pub struct CredentialsRequest {
    /// Login
    /// 로그인 ID
    #[schema(example = "alice")]
    pub login: String,

    /// Password (will be hashed on register)
    /// 비밀번호 (회원가입 시 해싱됨)
    #[schema(example = "password123")]
    pub password: String,
}

// 토큰 응답 모델
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = TokenResponse)]
pub struct TokenResponse {
    /// JWT Access Token (also returned in the `Authorization` header)
    /// JWT Access Token (Authorization 헤더로도 반환)
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,

    /// Token type
    #[schema(example = "Bearer")]
    pub token_type: String,

    /// Lifetime in seconds
    /// 만료까지 남은 시간 (초)
    #[schema(example = 86400)]
    pub expires_in: i64,
}
