use thiserror::Error;
use axum::{http::StatusCode, Json};
use serde_json::json;

/// 원장 관련 에러
/// Ledger-related errors (orders, balance, withdrawals, storage)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// 잘못된 입력 (주문 번호 형식, 금액 등)
    /// Malformed order / withdrawal reference or amount
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 이미 존재함 (다른 사용자의 주문 번호, 중복 출금 참조, 중복 로그인)
    /// Duplicate order number / withdrawal reference / login
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// 잔고 부족
    /// Withdrawal exceeds the current balance
    #[error("Non-sufficient funds: requested {requested}, available {available}")]
    NonSufficientFunds { requested: i64, available: i64 },

    /// 스토리지 / 외부 시스템 접근 불가
    /// Store or gateway unreachable
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// 내부 에러
    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// 저장소 에러 분류
    /// Classify a repository failure: connection-level sqlx errors become
    /// `Unavailable`, everything else is `Internal`.
    pub fn from_storage(err: anyhow::Error) -> Self {
        let unreachable = err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<sqlx::Error>(),
                Some(sqlx::Error::Io(_))
                    | Some(sqlx::Error::Tls(_))
                    | Some(sqlx::Error::PoolTimedOut)
                    | Some(sqlx::Error::PoolClosed)
            )
        });

        if unreachable {
            LedgerError::Unavailable(format!("{:#}", err))
        } else {
            LedgerError::Internal(format!("{:#}", err))
        }
    }
}

/// LedgerError를 HTTP 응답으로 변환
impl From<LedgerError> for (StatusCode, Json<serde_json::Value>) {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LedgerError::AlreadyExists(_) => StatusCode::CONFLICT,
            LedgerError::NonSufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            LedgerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            LedgerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({ "error": err.to_string() })))
    }
}
