use chrono::{DateTime, Utc};

/// 사용자 모델 (DB에서 조회)
/// User entity as stored by the ledger store
///
/// 로그인 이후 원장 엔진은 `id`만 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
