use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::shared::utils::from_minor_units;

// =====================================================
// Order 모델
// =====================================================
// 역할: 사용자가 업로드한 구매 주문 번호와 적립 처리 상태
//
// 상태 전이:
//   NEW ──> PROCESSING ──> PROCESSED | INVALID
//    └──────────────────────> PROCESSED | INVALID
//
// - NEW: 생성 시 유일한 상태
// - PROCESSED / INVALID: 종료 상태 (이후 변경 불가)
// - accrual: PROCESSED일 때만 의미 있음 (minor units)
// =====================================================

/// 주문 처리 상태
/// Order processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

/// 알 수 없는 상태 문자열
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct UnknownOrderStatus(pub String);

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Processed => "PROCESSED",
        }
    }

    /// 상태 전이 가능 여부
    /// Whether moving from `self` to `next` is a forward transition.
    ///
    /// Staying in the same state is not a transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        match (self, next) {
            (OrderStatus::New, OrderStatus::Processing)
            | (OrderStatus::New, OrderStatus::Processed)
            | (OrderStatus::New, OrderStatus::Invalid)
            | (OrderStatus::Processing, OrderStatus::Processed)
            | (OrderStatus::Processing, OrderStatus::Invalid) => true,
            _ => false,
        }
    }

    /// 리컨실러가 재조회하는 상태 목록
    pub const PENDING: [OrderStatus; 2] = [OrderStatus::New, OrderStatus::Processing];
}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(OrderStatus::New),
            "PROCESSING" => Ok(OrderStatus::Processing),
            "INVALID" => Ok(OrderStatus::Invalid),
            "PROCESSED" => Ok(OrderStatus::Processed),
            other => Err(UnknownOrderStatus(other.to_string())),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 주문 (저장소에서 조회한 정규 모델)
/// Order (canonical entity returned by the store)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    /// 주문 소유자 (최초 업로드한 사용자)
    pub owner_id: u64,

    /// 주문 번호 (전역 유일)
    pub number: String,

    pub status: OrderStatus,

    /// 적립 금액 (minor units, PROCESSED일 때만 의미 있음)
    pub accrual: i64,

    pub submitted_at: DateTime<Utc>,
}

impl Order {
    /// 새 주문 생성 (항상 NEW)
    pub fn new(owner_id: u64, number: impl Into<String>) -> Self {
        Self {
            owner_id,
            number: number.into(),
            status: OrderStatus::New,
            accrual: 0,
            submitted_at: Utc::now(),
        }
    }
}

/// 주문 업로드 결과
/// Outcome of an order submission that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSubmission {
    /// 새 주문으로 등록됨
    Accepted(Order),
    /// 같은 사용자가 이미 업로드한 주문 (정상 재전송)
    AlreadySubmitted(Order),
}

impl OrderSubmission {
    pub fn order(&self) -> &Order {
        match self {
            OrderSubmission::Accepted(order) | OrderSubmission::AlreadySubmitted(order) => order,
        }
    }
}

/// 리컨실러가 생성하는 상태 업데이트
/// Status/accrual update produced by the reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderUpdate {
    pub number: String,
    pub status: OrderStatus,
    pub accrual: i64,
}

// =====================================================
// 응답 모델 (Response)
// =====================================================

/// 주문 응답 모델
/// Order response model
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = OrderResponse)]
pub struct OrderResponse {
    /// Order number
    /// 주문 번호
    #[schema(example = "12345678903")]
    pub number: String,

    /// Processing status
    /// 처리 상태
    pub status: OrderStatus,

    /// Accrued points (only for PROCESSED orders)
    /// 적립 포인트 (PROCESSED인 경우만)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "5.00")]
    pub accrual: Option<Decimal>,

    /// Upload timestamp
    /// 업로드 시간
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let accrual = (order.status == OrderStatus::Processed && order.accrual > 0)
            .then(|| from_minor_units(order.accrual));

        Self {
            number: order.number,
            status: order.status,
            accrual,
            uploaded_at: order.submitted_at,
        }
    }
}
