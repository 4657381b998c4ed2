use std::sync::Arc;

use tracing::{info, instrument};

use crate::domains::ledger::models::{Order, OrderSubmission};
use crate::shared::database::LedgerStore;
use crate::shared::errors::LedgerError;
use crate::shared::utils::validate_order_number;

// 주문 서비스
// OrderService: order submission and listing
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn LedgerStore>,
}

impl OrderService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// 주문 업로드
    /// Submit an order number for accrual.
    ///
    /// 번호 형식과 체크섬은 저장소 접근 전에 검증됩니다.
    ///
    /// # Returns
    /// * `Accepted` - 새 주문
    /// * `AlreadySubmitted` - 같은 사용자가 이미 업로드함
    /// * `Err(AlreadyExists)` - 다른 사용자가 소유한 번호
    #[instrument(skip(self))]
    pub async fn add_order(&self, owner_id: u64, number: &str) -> Result<OrderSubmission, LedgerError> {
        let number = number.trim();
        validate_order_number(number)?;

        let submission = self.store.add_order(owner_id, number).await?;
        if let OrderSubmission::Accepted(order) = &submission {
            info!(owner_id, order = %order.number, "Order accepted");
        }
        Ok(submission)
    }

    /// 주문 목록 조회 (최신순)
    pub async fn get_orders(&self, owner_id: u64) -> Result<Vec<Order>, LedgerError> {
        self.store.orders_by_owner(owner_id).await
    }
}
