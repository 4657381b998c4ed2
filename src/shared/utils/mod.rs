/// 공유 유틸리티 모듈
/// Shared Utilities Module
///
/// 역할:
/// - 주문 번호 검증 (Luhn)
/// - 금액 변환 (minor units <-> Decimal)
pub mod money;
pub mod order_number;

pub use money::*;
pub use order_number::*;
