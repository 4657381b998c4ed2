use sqlx::{PgConnection, PgPool, Row};
use sqlx::postgres::PgRow;
use anyhow::{Context, Result};
use chrono::Utc;
use tracing::warn;
use crate::domains::ledger::models::{Order, OrderStatus, OrderUpdate};

const ORDER_COLUMNS: &str = "owner_id, number, status, accrual, submitted_at";

pub struct OrderRepository {
    pool: PgPool,
}

impl OrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 주문 등록 (이미 있으면 기존 주문 반환)
    /// Insert a NEW order, or return the existing row for that number.
    ///
    /// # Returns
    /// * `(order, true)` - 새로 등록됨
    /// * `(order, false)` - 이미 존재 (소유자는 `order.owner_id`)
    pub async fn insert_or_get(&self, owner_id: u64, number: &str) -> Result<Option<(Order, bool)>> {
        let inserted = sqlx::query(&format!(
            r#"
            INSERT INTO orders (owner_id, number, status, accrual, submitted_at, updated_at)
            VALUES ($1, $2, 'NEW', 0, $3, $3)
            ON CONFLICT (number) DO NOTHING
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(owner_id as i64)
        .bind(number)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to insert order")?;

        if let Some(row) = inserted {
            return Ok(Self::map_row(&row).map(|order| (order, true)));
        }

        let existing = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE number = $1"
        ))
        .bind(number)
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch existing order")?;

        Ok(Self::map_row(&existing).map(|order| (order, false)))
    }

    /// 사용자의 주문 목록 (최신순)
    /// Get orders by owner, newest first
    pub async fn get_by_owner(&self, owner_id: u64) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE owner_id = $1
            ORDER BY submitted_at DESC, id DESC
            "#
        ))
        .bind(owner_id as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch orders by owner")?;

        Ok(rows.iter().filter_map(Self::map_row).collect())
    }

    /// 미처리 주문 조회 (NEW, PROCESSING)
    /// Get orders the reconciler still has to resolve, oldest first
    pub async fn get_pending(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE status IN ('NEW', 'PROCESSING')
            ORDER BY submitted_at ASC, id ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch pending orders")?;

        Ok(rows.iter().filter_map(Self::map_row).collect())
    }

    /// 상태 일괄 업데이트 (트랜잭션 내부)
    /// Apply status/accrual updates. Only forward transitions are written:
    /// NEW → PROCESSING | PROCESSED | INVALID, PROCESSING → PROCESSED | INVALID.
    pub async fn apply_updates(conn: &mut PgConnection, updates: &[OrderUpdate]) -> Result<u64> {
        if updates.is_empty() {
            return Ok(0);
        }

        let numbers: Vec<String> = updates.iter().map(|u| u.number.clone()).collect();
        let statuses: Vec<String> = updates.iter().map(|u| u.status.as_str().to_string()).collect();
        let accruals: Vec<i64> = updates.iter().map(|u| u.accrual).collect();

        let result = sqlx::query(
            r#"
            UPDATE orders AS o
            SET status = d.status, accrual = d.accrual, updated_at = NOW()
            FROM UNNEST($1::text[], $2::text[], $3::bigint[]) AS d(number, status, accrual)
            WHERE o.number = d.number
              AND (
                (o.status = 'NEW' AND d.status IN ('PROCESSING', 'PROCESSED', 'INVALID'))
                OR (o.status = 'PROCESSING' AND d.status IN ('PROCESSED', 'INVALID'))
              )
            "#,
        )
        .bind(&numbers)
        .bind(&statuses)
        .bind(&accruals)
        .execute(&mut *conn)
        .await
        .context("Failed to update order statuses")?;

        Ok(result.rows_affected())
    }

    // 알 수 없는 상태는 데이터 무결성 문제: 건너뛰고 경고만 남김
    fn map_row(row: &PgRow) -> Option<Order> {
        let number: String = row.get("number");
        let raw_status: String = row.get("status");

        let status = match raw_status.parse::<OrderStatus>() {
            Ok(status) => status,
            Err(e) => {
                warn!(order = %number, error = %e, "Skipping order with unknown status");
                return None;
            }
        };

        Some(Order {
            owner_id: row.get::<i64, _>("owner_id") as u64,
            number,
            status,
            accrual: row.get("accrual"),
            submitted_at: row.get("submitted_at"),
        })
    }
}
