// Auth domain state
// 인증 도메인 상태
use std::sync::Arc;

use crate::domains::auth::services::{AuthService, JwtService};
use crate::shared::database::LedgerStore;

/// Auth domain state
/// 인증 도메인에서 필요한 서비스들을 포함하는 상태
#[derive(Clone)]
pub struct AuthState {
    pub auth_service: AuthService,
    pub jwt_service: JwtService,
}

impl AuthState {
    /// Create AuthState with the store and JWT service
    pub fn new(store: Arc<dyn LedgerStore>, jwt_service: JwtService) -> Self {
        Self {
            auth_service: AuthService::new(store, jwt_service.clone()),
            jwt_service,
        }
    }
}
