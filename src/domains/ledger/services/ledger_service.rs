use std::sync::Arc;

use tracing::{info, instrument};

use crate::domains::ledger::models::{Balance, LedgerTransaction};
use crate::shared::database::LedgerStore;
use crate::shared::errors::LedgerError;
use crate::shared::utils::validate_order_number;

// =====================================================
// LedgerService - 잔고 / 포인트 사용
// =====================================================
// - 잔고는 원장에서 계산 (current = Σcredit - Σdebit)
// - 출금은 잔고 확인과 기록이 원자적 (저장소가 사용자 단위로 직렬화)
// - 잔고와 같은 금액까지 출금 가능
// =====================================================

#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// 잔고 조회 (거래가 없으면 (0, 0))
    pub async fn get_balance(&self, owner_id: u64) -> Result<Balance, LedgerError> {
        self.store.balance(owner_id).await
    }

    /// 포인트 사용
    /// Withdraw `amount` minor units against order reference `order_ref`.
    ///
    /// # Errors
    /// * `InvalidInput` - 잘못된 참조 번호 또는 0 이하 금액 (저장소 접근 전)
    /// * `NonSufficientFunds` - 잔고 부족, 기록 없음
    /// * `AlreadyExists` - 이미 사용된 참조 번호
    #[instrument(skip(self))]
    pub async fn add_withdrawal(
        &self,
        owner_id: u64,
        order_ref: &str,
        amount: i64,
    ) -> Result<LedgerTransaction, LedgerError> {
        let order_ref = order_ref.trim();
        validate_order_number(order_ref)?;

        if amount <= 0 {
            return Err(LedgerError::InvalidInput(format!(
                "withdrawal amount must be positive, got {}",
                amount
            )));
        }

        let tx = self.store.withdraw(owner_id, order_ref, amount).await?;
        info!(owner_id, order = %tx.order_number, amount, "Withdrawal recorded");
        Ok(tx)
    }

    /// 출금 내역 (최신순)
    pub async fn get_withdrawals(&self, owner_id: u64) -> Result<Vec<LedgerTransaction>, LedgerError> {
        self.store.withdrawals(owner_id).await
    }
}
