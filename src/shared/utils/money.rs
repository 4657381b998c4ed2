// =====================================================
// 금액 변환 (Minor Units <-> Decimal)
// =====================================================
// 역할: 내부 금액은 항상 정수 minor units (1/100 포인트)
//       Decimal은 HTTP 경계와 적립 시스템 응답 파싱에서만 사용
//
// 예시:
// - 500 minor units  <-> 5.00
// - 72998 minor units <-> 729.98
// =====================================================

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// 소수점 자리수 (minor units 스케일)
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Decimal → minor units (소수점 2자리로 반올림)
/// Convert a display amount into minor units, rounding half away from zero.
///
/// Returns `None` if the value does not fit into `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    let rounded = amount.round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

/// Decimal → minor units (정확히 표현 가능한 경우만)
/// Strict conversion used for user input: more than two fractional digits is rejected.
///
/// Returns `None` if the value does not fit into `i64`.
pub fn to_minor_units_exact(amount: Decimal) -> Option<i64> {
    if amount.normalize().scale() > MINOR_UNIT_SCALE {
        return None;
    }
    amount.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}

/// minor units → Decimal (표시용)
pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, MINOR_UNIT_SCALE)
}
