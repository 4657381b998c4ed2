use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use tracing::{info, instrument};

use crate::domains::auth::models::{CredentialsRequest, User};
use crate::domains::auth::services::JwtService;
use crate::shared::database::LedgerStore;
use crate::shared::errors::{AuthError, LedgerError};

/// 로그인 최소 길이
pub const MIN_LOGIN_LEN: usize = 3;
/// 로그인 최대 길이 (users.login 컬럼 크기)
pub const MAX_LOGIN_LEN: usize = 64;

// 인증 서비스
// AuthService: registration and login, issuing JWT access tokens
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn LedgerStore>,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(store: Arc<dyn LedgerStore>, jwt_service: JwtService) -> Self {
        Self { store, jwt_service }
    }

    // 회원가입 → 토큰 발급
    #[instrument(skip(self, request), fields(login = %request.login))]
    pub async fn register(&self, request: CredentialsRequest) -> Result<(User, String), AuthError> {
        Self::validate(&request)?;

        let password_hash = Self::hash_password(&request.password)?;

        let user = self
            .store
            .create_user(&request.login, &password_hash)
            .await
            .map_err(|e| match e {
                LedgerError::AlreadyExists(_) => AuthError::LoginAlreadyExists {
                    login: request.login.clone(),
                },
                other => AuthError::Storage(other.to_string()),
            })?;

        let token = self.jwt_service.generate_access_token(user.id, &user.login)?;
        info!(user_id = user.id, "User registered");
        Ok((user, token))
    }

    // 로그인 → 토큰 발급
    #[instrument(skip(self, request), fields(login = %request.login))]
    pub async fn login(&self, request: CredentialsRequest) -> Result<(User, String), AuthError> {
        let user = self
            .store
            .find_user_by_login(&request.login)
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or(AuthError::WrongCredentials)?;

        Self::verify_password(&request.password, &user.password_hash)?;

        let token = self.jwt_service.generate_access_token(user.id, &user.login)?;
        Ok((user, token))
    }

    fn validate(request: &CredentialsRequest) -> Result<(), AuthError> {
        let len = request.login.chars().count();
        if !(MIN_LOGIN_LEN..=MAX_LOGIN_LEN).contains(&len) {
            return Err(AuthError::InvalidInput(format!(
                "login must be {}-{} characters long",
                MIN_LOGIN_LEN, MAX_LOGIN_LEN
            )));
        }
        if request.login.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidInput("login must not contain whitespace".to_string()));
        }
        if request.password.is_empty() {
            return Err(AuthError::InvalidInput("password must not be empty".to_string()));
        }
        Ok(())
    }

    fn hash_password(password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHashingFailed(format!("Failed to hash password: {}", e)))
    }

    fn verify_password(password: &str, password_hash: &str) -> Result<(), AuthError> {
        let parsed_hash = PasswordHash::new(password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::WrongCredentials)
    }
}
