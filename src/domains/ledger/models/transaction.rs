use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::shared::utils::from_minor_units;

// =====================================================
// LedgerTransaction 모델
// =====================================================
// 역할: 포인트 적립(credit) / 사용(debit) 원장 기록 (추가 전용)
//
// - credit_amount, debit_amount 중 정확히 하나만 양수
// - credit의 order_number는 전역 유일 (주문당 적립 1회)
// - debit의 order_number도 유일 (출금 참조 번호 1회 사용)
// =====================================================

/// 원장 거래 기록
/// Append-only ledger row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransaction {
    pub owner_id: u64,
    pub order_number: String,
    pub credit_amount: i64,
    pub debit_amount: i64,
    pub processed_at: DateTime<Utc>,
}

impl LedgerTransaction {
    /// 적립 거래 생성
    pub fn credit(owner_id: u64, order_number: impl Into<String>, amount: i64) -> Self {
        Self {
            owner_id,
            order_number: order_number.into(),
            credit_amount: amount,
            debit_amount: 0,
            processed_at: Utc::now(),
        }
    }

    /// 출금 거래 생성
    pub fn debit(owner_id: u64, order_number: impl Into<String>, amount: i64) -> Self {
        Self {
            owner_id,
            order_number: order_number.into(),
            credit_amount: 0,
            debit_amount: amount,
            processed_at: Utc::now(),
        }
    }

    pub fn is_credit(&self) -> bool {
        self.credit_amount > 0
    }
}

/// 리컨실러가 적립할 금액 (소유자는 저장된 주문에서 가져옴)
/// Credit to materialize for a PROCESSED order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredit {
    pub owner_id: u64,
    pub order_number: String,
    pub amount: i64,
}

/// 잔고 (원장에서 계산된 값, minor units)
/// Derived balance: `current = Σcredit - Σdebit`, `withdrawn = Σdebit`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Balance {
    pub current: i64,
    pub withdrawn: i64,
}

impl Balance {
    /// 원장 기록들로부터 잔고 계산
    pub fn from_transactions<'a>(transactions: impl IntoIterator<Item = &'a LedgerTransaction>) -> Self {
        let (credits, debits) = transactions
            .into_iter()
            .fold((0i64, 0i64), |(c, d), tx| (c + tx.credit_amount, d + tx.debit_amount));

        Self {
            current: credits - debits,
            withdrawn: debits,
        }
    }
}

// =====================================================
// 요청 / 응답 모델
// =====================================================

/// 포인트 사용 요청
/// Withdrawal request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(as = WithdrawRequest)]
pub struct WithdrawRequest {
    /// Order number the points are spent on
    /// 포인트를 사용할 주문 번호
    #[schema(example = "2377225624")]
    pub order: String,

    /// Amount to withdraw
    /// 사용할 포인트
    #[schema(value_type = String, example = "751")]
    pub sum: Decimal,
}

/// 잔고 응답
/// Balance response
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = BalanceResponse)]
pub struct BalanceResponse {
    /// Current balance
    /// 현재 잔고
    #[schema(value_type = String, example = "500.50")]
    pub current: Decimal,

    /// Total withdrawn so far
    /// 누적 사용 포인트
    #[schema(value_type = String, example = "42.00")]
    pub withdrawn: Decimal,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        Self {
            current: from_minor_units(balance.current),
            withdrawn: from_minor_units(balance.withdrawn),
        }
    }
}

/// 포인트 사용 내역 응답
/// Withdrawal history item
#[derive(Debug, Serialize, ToSchema)]
#[schema(as = WithdrawalResponse)]
pub struct WithdrawalResponse {
    #[schema(example = "2377225624")]
    pub order: String,

    #[schema(value_type = String, example = "500.00")]
    pub sum: Decimal,

    pub processed_at: DateTime<Utc>,
}

impl From<LedgerTransaction> for WithdrawalResponse {
    fn from(tx: LedgerTransaction) -> Self {
        Self {
            order: tx.order_number,
            sum: from_minor_units(tx.debit_amount),
            processed_at: tx.processed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_from_transactions() {
        let txs = vec![
            LedgerTransaction::credit(1, "12345678903", 500),
            LedgerTransaction::credit(1, "79927398713", 250),
            LedgerTransaction::debit(1, "4561261212345467", 300),
        ];

        let balance = Balance::from_transactions(&txs);
        assert_eq!(balance, Balance { current: 450, withdrawn: 300 });
        assert_eq!(Balance::from_transactions(std::iter::empty()), Balance::default());
    }

    #[test]
    fn test_balance_response_formats_two_places() {
        let response = BalanceResponse::from(Balance { current: 50050, withdrawn: 4200 });
        assert_eq!(response.current.to_string(), "500.50");
        assert_eq!(response.withdrawn.to_string(), "42.00");
    }
}
