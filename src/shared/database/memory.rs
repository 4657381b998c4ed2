// =====================================================
// MemoryLedgerStore - 메모리 기반 원장 저장소
// =====================================================
// 역할: 테스트와 로컬 실험용 LedgerStore 구현
//
// - 모든 상태는 하나의 Mutex 아래에 있음 (출금 확인/기록이 원자적)
// - set_unavailable(true)로 저장소 장애를 흉내낼 수 있음
// =====================================================

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::domains::auth::models::User;
use crate::domains::ledger::models::{
    Balance, LedgerTransaction, NewCredit, Order, OrderStatus, OrderSubmission, OrderUpdate,
};
use crate::shared::database::LedgerStore;
use crate::shared::errors::LedgerError;

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    next_user_id: u64,
    /// number → (등록 순번, 주문)
    orders: BTreeMap<String, (u64, Order)>,
    next_order_seq: u64,
    transactions: Vec<LedgerTransaction>,
}

/// 메모리 기반 원장 저장소
#[derive(Default)]
pub struct MemoryLedgerStore {
    state: Mutex<MemoryState>,
    unavailable: AtomicBool,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장소 장애 시뮬레이션
    /// While set, every operation fails with `LedgerError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// 주문 조회 (테스트용)
    pub fn order(&self, number: &str) -> Option<Order> {
        self.state.lock().orders.get(number).map(|(_, order)| order.clone())
    }

    /// 전체 원장 스냅샷 (테스트용)
    pub fn ledger(&self) -> Vec<LedgerTransaction> {
        self.state.lock().transactions.clone()
    }

    fn ensure_available(&self) -> Result<(), LedgerError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(LedgerError::Unavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn create_user(&self, login: &str, password_hash: &str) -> Result<User, LedgerError> {
        self.ensure_available()?;
        let mut state = self.state.lock();

        if state.users.contains_key(login) {
            return Err(LedgerError::AlreadyExists(format!("login {} is taken", login)));
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_user_id,
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        state.users.insert(login.to_string(), user.clone());
        Ok(user)
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<User>, LedgerError> {
        self.ensure_available()?;
        Ok(self.state.lock().users.get(login).cloned())
    }

    async fn add_order(&self, owner_id: u64, number: &str) -> Result<OrderSubmission, LedgerError> {
        self.ensure_available()?;
        let mut state = self.state.lock();

        if let Some((_, existing)) = state.orders.get(number) {
            if existing.owner_id == owner_id {
                return Ok(OrderSubmission::AlreadySubmitted(existing.clone()));
            }
            return Err(LedgerError::AlreadyExists(format!(
                "order {} was uploaded by another user",
                number
            )));
        }

        state.next_order_seq += 1;
        let seq = state.next_order_seq;
        let order = Order::new(owner_id, number);
        state.orders.insert(number.to_string(), (seq, order.clone()));
        Ok(OrderSubmission::Accepted(order))
    }

    async fn orders_by_owner(&self, owner_id: u64) -> Result<Vec<Order>, LedgerError> {
        self.ensure_available()?;
        let state = self.state.lock();

        let mut owned: Vec<&(u64, Order)> = state
            .orders
            .values()
            .filter(|(_, order)| order.owner_id == owner_id)
            .collect();
        owned.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(owned.into_iter().map(|(_, order)| order.clone()).collect())
    }

    async fn pending_orders(&self) -> Result<Vec<Order>, LedgerError> {
        self.ensure_available()?;
        let state = self.state.lock();

        let mut pending: Vec<&(u64, Order)> = state
            .orders
            .values()
            .filter(|(_, order)| OrderStatus::PENDING.contains(&order.status))
            .collect();
        pending.sort_by_key(|(seq, _)| *seq);

        Ok(pending.into_iter().map(|(_, order)| order.clone()).collect())
    }

    async fn commit_reconciliation(
        &self,
        updates: &[OrderUpdate],
        credits: &[NewCredit],
    ) -> Result<Vec<LedgerTransaction>, LedgerError> {
        self.ensure_available()?;
        let mut state = self.state.lock();

        for update in updates {
            if let Some((_, order)) = state.orders.get_mut(&update.number) {
                // 전진하는 전이만 반영 (종료 상태, 역행, 같은 상태는 무시)
                if order.status.can_transition_to(update.status) {
                    order.status = update.status;
                    order.accrual = update.accrual;
                }
            }
        }

        let mut inserted = Vec::new();
        for credit in credits {
            let already_credited = state
                .transactions
                .iter()
                .any(|tx| tx.is_credit() && tx.order_number == credit.order_number);
            if already_credited {
                continue;
            }

            let tx = LedgerTransaction::credit(credit.owner_id, credit.order_number.clone(), credit.amount);
            state.transactions.push(tx.clone());
            inserted.push(tx);
        }

        Ok(inserted)
    }

    async fn balance(&self, owner_id: u64) -> Result<Balance, LedgerError> {
        self.ensure_available()?;
        let state = self.state.lock();
        Ok(Balance::from_transactions(
            state.transactions.iter().filter(|tx| tx.owner_id == owner_id),
        ))
    }

    async fn withdraw(
        &self,
        owner_id: u64,
        order_number: &str,
        amount: i64,
    ) -> Result<LedgerTransaction, LedgerError> {
        self.ensure_available()?;
        let mut state = self.state.lock();

        let duplicate = state
            .transactions
            .iter()
            .any(|tx| tx.debit_amount > 0 && tx.order_number == order_number);
        if duplicate {
            return Err(LedgerError::AlreadyExists(format!(
                "withdrawal for order {} already registered",
                order_number
            )));
        }

        let balance = Balance::from_transactions(
            state.transactions.iter().filter(|tx| tx.owner_id == owner_id),
        );
        if balance.current < amount {
            return Err(LedgerError::NonSufficientFunds {
                requested: amount,
                available: balance.current,
            });
        }

        let tx = LedgerTransaction::debit(owner_id, order_number, amount);
        state.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn withdrawals(&self, owner_id: u64) -> Result<Vec<LedgerTransaction>, LedgerError> {
        self.ensure_available()?;
        let state = self.state.lock();

        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|tx| tx.owner_id == owner_id && tx.debit_amount > 0)
            .cloned()
            .collect())
    }
}
