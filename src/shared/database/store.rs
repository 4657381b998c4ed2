// =====================================================
// LedgerStore - 원장 저장소 추상화
// =====================================================
// 역할: 사용자, 주문, 원장 거래의 영구 저장
//
// 구현체:
// - PgLedgerStore: PostgreSQL (운영)
// - MemoryLedgerStore: 프로세스 내 메모리 (테스트 / 로컬 실험)
//
// 보장:
// - 주문 번호는 전역 유일, 최초 등록자가 소유
// - commit_reconciliation: 상태 업데이트 → 적립, 하나의 트랜잭션
// - withdraw: 잔고 확인과 출금 기록이 사용자 단위로 원자적
// =====================================================

use async_trait::async_trait;
use tracing::debug;

use crate::domains::auth::models::User;
use crate::domains::ledger::models::{
    Balance, LedgerTransaction, NewCredit, Order, OrderSubmission, OrderUpdate,
};
use crate::shared::database::Database;
use crate::shared::database::repositories::{
    DebitOutcome, OrderRepository, TransactionRepository, UserRepository,
};
use crate::shared::errors::LedgerError;

/// 원장 저장소 트레이트
/// Durable storage behind the ledger engine
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// 사용자 생성 (로그인 중복 시 AlreadyExists)
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, LedgerError>;

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, LedgerError>;

    /// 주문 등록
    ///
    /// * 새 번호 → `Accepted`
    /// * 같은 사용자의 재등록 → `AlreadySubmitted`
    /// * 다른 사용자가 소유한 번호 → `Err(AlreadyExists)`
    async fn add_order(&self, owner_id: u64, number: &str) -> Result<OrderSubmission, LedgerError>;

    /// 사용자의 주문 목록 (최신순)
    async fn orders_by_owner(&self, owner_id: u64) -> Result<Vec<Order>, LedgerError>;

    /// 미처리 주문 (NEW, PROCESSING)
    async fn pending_orders(&self) -> Result<Vec<Order>, LedgerError>;

    /// 상태 업데이트와 적립을 하나의 트랜잭션으로 반영
    /// Apply status updates, then credits, atomically.
    ///
    /// Returns only the credits actually inserted; order numbers that were
    /// already credited are skipped silently.
    async fn commit_reconciliation(
        &self,
        updates: &[OrderUpdate],
        credits: &[NewCredit],
    ) -> Result<Vec<LedgerTransaction>, LedgerError>;

    async fn balance(&self, owner_id: u64) -> Result<Balance, LedgerError>;

    /// 잔고 확인 후 출금 (원자적)
    ///
    /// * 잔고 부족 → `Err(NonSufficientFunds)`, 기록 없음
    /// * 이미 사용된 참조 번호 → `Err(AlreadyExists)`
    async fn withdraw(
        &self,
        owner_id: u64,
        order_number: &str,
        amount: i64,
    ) -> Result<LedgerTransaction, LedgerError>;

    /// 출금 내역 (최신순)
    async fn withdrawals(&self, owner_id: u64) -> Result<Vec<LedgerTransaction>, LedgerError>;
}

// =====================================================
// PgLedgerStore
// =====================================================

/// PostgreSQL 기반 원장 저장소
#[derive(Clone)]
pub struct PgLedgerStore {
    db: Database,
}

impl PgLedgerStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn users(&self) -> UserRepository {
        UserRepository::new(self.db.pool().clone())
    }

    fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.db.pool().clone())
    }

    fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.db.pool().clone())
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, LedgerError> {
        self.users()
            .create_user(login, password_hash)
            .await
            .map_err(LedgerError::from_storage)?
            .ok_or_else(|| LedgerError::AlreadyExists(format!("login {} is taken", login)))
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, LedgerError> {
        self.users()
            .get_user_by_login(login)
            .await
            .map_err(LedgerError::from_storage)
    }

    async fn add_order(&self, owner_id: u64, number: &str) -> Result<OrderSubmission, LedgerError> {
        let (order, inserted) = self
            .orders()
            .insert_or_get(owner_id, number)
            .await
            .map_err(LedgerError::from_storage)?
            .ok_or_else(|| LedgerError::Internal(format!("order {} has an unreadable status", number)))?;

        match (inserted, order.owner_id == owner_id) {
            (true, _) => Ok(OrderSubmission::Accepted(order)),
            (false, true) => Ok(OrderSubmission::AlreadySubmitted(order)),
            (false, false) => Err(LedgerError::AlreadyExists(format!(
                "order {} was uploaded by another user",
                number
            ))),
        }
    }

    async fn orders_by_owner(&self, owner_id: u64) -> Result<Vec<Order>, LedgerError> {
        self.orders()
            .get_by_owner(owner_id)
            .await
            .map_err(LedgerError::from_storage)
    }

    async fn pending_orders(&self) -> Result<Vec<Order>, LedgerError> {
        self.orders()
            .get_pending()
            .await
            .map_err(LedgerError::from_storage)
    }

    async fn commit_reconciliation(
        &self,
        updates: &[OrderUpdate],
        credits: &[NewCredit],
    ) -> Result<Vec<LedgerTransaction>, LedgerError> {
        if updates.is_empty() && credits.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| LedgerError::from_storage(e.into()))?;

        let updated = OrderRepository::apply_updates(&mut *tx, updates)
            .await
            .map_err(LedgerError::from_storage)?;
        let inserted = TransactionRepository::insert_credits(&mut *tx, credits)
            .await
            .map_err(LedgerError::from_storage)?;

        tx.commit()
            .await
            .map_err(|e| LedgerError::from_storage(e.into()))?;

        debug!(updated, credited = inserted.len(), "Reconciliation committed");
        Ok(inserted)
    }

    async fn balance(&self, owner_id: u64) -> Result<Balance, LedgerError> {
        self.transactions()
            .get_balance(owner_id)
            .await
            .map_err(LedgerError::from_storage)
    }

    async fn withdraw(
        &self,
        owner_id: u64,
        order_number: &str,
        amount: i64,
    ) -> Result<LedgerTransaction, LedgerError> {
        let outcome = self
            .transactions()
            .withdraw(owner_id, order_number, amount)
            .await
            .map_err(LedgerError::from_storage)?;

        match outcome {
            DebitOutcome::Accepted(tx) => Ok(tx),
            DebitOutcome::Insufficient { available } => Err(LedgerError::NonSufficientFunds {
                requested: amount,
                available,
            }),
            DebitOutcome::Duplicate => Err(LedgerError::AlreadyExists(format!(
                "withdrawal for order {} already registered",
                order_number
            ))),
            DebitOutcome::UnknownOwner => Err(LedgerError::InvalidInput(format!(
                "unknown user {}",
                owner_id
            ))),
        }
    }

    async fn withdrawals(&self, owner_id: u64) -> Result<Vec<LedgerTransaction>, LedgerError> {
        self.transactions()
            .get_withdrawals(owner_id)
            .await
            .map_err(LedgerError::from_storage)
    }
}
