use crate::shared::errors::AuthError;
use crate::domains::auth::models::jwt::Claims;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

/// JWT 서비스
/// JWT Service for token generation and verification (HS256)
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_hours: i64,
}

impl JwtService {
    /// JWT Service 생성
    /// Create JWT Service
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    /// 토큰 수명 (초)
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_hours * 3600
    }

    /// Access Token 발급
    /// Generate Access Token
    pub fn generate_access_token(&self, user_id: u64, login: &str) -> Result<String, AuthError> {
        let claims = Claims::new(user_id, login.to_string(), self.ttl_hours);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Failed to generate access token: {}", e)))
    }

    /// Access Token 검증
    /// Verify Access Token (expired or tampered tokens are `InvalidToken`)
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}
