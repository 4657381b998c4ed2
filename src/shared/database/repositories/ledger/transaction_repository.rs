use sqlx::{PgConnection, PgPool, Row};
use sqlx::postgres::PgRow;
use anyhow::{Context, Result};
use crate::domains::ledger::models::{Balance, LedgerTransaction, NewCredit};

/// 출금 시도 결과
/// Outcome of the guarded debit insert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebitOutcome {
    Accepted(LedgerTransaction),
    Insufficient { available: i64 },
    /// 같은 참조 번호로 이미 출금됨
    Duplicate,
    UnknownOwner,
}

pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 적립 일괄 등록 (트랜잭션 내부)
    /// Insert credits, skipping order numbers that were already credited.
    /// Only the rows actually inserted are returned.
    pub async fn insert_credits(
        conn: &mut PgConnection,
        credits: &[NewCredit],
    ) -> Result<Vec<LedgerTransaction>> {
        if credits.is_empty() {
            return Ok(Vec::new());
        }

        let owners: Vec<i64> = credits.iter().map(|c| c.owner_id as i64).collect();
        let numbers: Vec<String> = credits.iter().map(|c| c.order_number.clone()).collect();
        let amounts: Vec<i64> = credits.iter().map(|c| c.amount).collect();

        let rows = sqlx::query(
            r#"
            INSERT INTO ledger_transactions (owner_id, order_number, credit_amount, debit_amount, processed_at)
            SELECT d.owner_id, d.order_number, d.amount, 0, NOW()
            FROM UNNEST($1::bigint[], $2::text[], $3::bigint[]) AS d(owner_id, order_number, amount)
            ON CONFLICT (order_number) WHERE credit_amount > 0 DO NOTHING
            RETURNING owner_id, order_number, credit_amount, debit_amount, processed_at
            "#,
        )
        .bind(&owners)
        .bind(&numbers)
        .bind(&amounts)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to insert credits")?;

        Ok(rows.iter().map(Self::map_row).collect())
    }

    /// 잔고 조회
    /// Sum the owner's ledger
    pub async fn get_balance(&self, owner_id: u64) -> Result<Balance> {
        let row = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(credit_amount), 0)::BIGINT AS credits,
                COALESCE(SUM(debit_amount), 0)::BIGINT AS debits
            FROM ledger_transactions
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id as i64)
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch balance")?;

        let credits: i64 = row.get("credits");
        let debits: i64 = row.get("debits");

        Ok(Balance {
            current: credits - debits,
            withdrawn: debits,
        })
    }

    /// 잔고 확인 후 출금 기록 (원자적)
    /// Check-and-insert a debit under a row lock on the owner.
    ///
    /// 같은 사용자의 동시 출금은 `users` 행 잠금으로 직렬화됩니다.
    /// 다른 사용자의 출금은 병렬로 진행됩니다.
    pub async fn withdraw(&self, owner_id: u64, order_number: &str, amount: i64) -> Result<DebitOutcome> {
        let mut tx = self.pool.begin().await
            .context("Failed to begin withdrawal transaction")?;

        let owner = sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(owner_id as i64)
            .fetch_optional(&mut *tx)
            .await
            .context("Failed to lock owner")?;

        if owner.is_none() {
            return Ok(DebitOutcome::UnknownOwner);
        }

        // 참조 번호 중복이 잔고 부족보다 우선
        let used = sqlx::query(
            "SELECT 1 FROM ledger_transactions WHERE order_number = $1 AND debit_amount > 0",
        )
        .bind(order_number)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to check withdrawal reference")?;

        if used.is_some() {
            return Ok(DebitOutcome::Duplicate);
        }

        let current: i64 = sqlx::query(
            r#"
            SELECT COALESCE(SUM(credit_amount) - SUM(debit_amount), 0)::BIGINT AS current
            FROM ledger_transactions
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id as i64)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to compute balance")?
        .get("current");

        if current < amount {
            return Ok(DebitOutcome::Insufficient { available: current });
        }

        let row = sqlx::query(
            r#"
            INSERT INTO ledger_transactions (owner_id, order_number, credit_amount, debit_amount, processed_at)
            VALUES ($1, $2, 0, $3, NOW())
            ON CONFLICT (order_number) WHERE debit_amount > 0 DO NOTHING
            RETURNING owner_id, order_number, credit_amount, debit_amount, processed_at
            "#,
        )
        .bind(owner_id as i64)
        .bind(order_number)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to insert debit")?;

        let Some(row) = row else {
            return Ok(DebitOutcome::Duplicate);
        };

        tx.commit().await
            .context("Failed to commit withdrawal")?;

        Ok(DebitOutcome::Accepted(Self::map_row(&row)))
    }

    /// 출금 내역 (최신순)
    /// Get debits by owner, newest first
    pub async fn get_withdrawals(&self, owner_id: u64) -> Result<Vec<LedgerTransaction>> {
        let rows = sqlx::query(
            r#"
            SELECT owner_id, order_number, credit_amount, debit_amount, processed_at
            FROM ledger_transactions
            WHERE owner_id = $1 AND debit_amount > 0
            ORDER BY processed_at DESC, id DESC
            "#,
        )
        .bind(owner_id as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch withdrawals")?;

        Ok(rows.iter().map(Self::map_row).collect())
    }

    fn map_row(row: &PgRow) -> LedgerTransaction {
        LedgerTransaction {
            owner_id: row.get::<i64, _>("owner_id") as u64,
            order_number: row.get("order_number"),
            credit_amount: row.get("credit_amount"),
            debit_amount: row.get("debit_amount"),
            processed_at: row.get("processed_at"),
        }
    }
}
