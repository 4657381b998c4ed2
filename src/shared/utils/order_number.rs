/// 주문 번호 검증기
/// Order number validator
///
/// 역할:
/// - 주문 번호 / 출금 참조 번호 형식 검증
/// - 길이 5~16자리 숫자 + Luhn(mod 10) 체크섬
///
/// 스토리지 접근 전에 호출되어야 합니다.
/// Must be called before any storage access.

use crate::shared::errors::LedgerError;

/// 허용 최소 길이
pub const MIN_ORDER_NUMBER_LEN: usize = 5;

/// 허용 최대 길이
pub const MAX_ORDER_NUMBER_LEN: usize = 16;

/// 주문 번호 검증
/// Validate an order number (digits only, 5..=16 long, Luhn checksum)
///
/// # Returns
/// * `Ok(())` - 유효한 번호
/// * `Err(LedgerError::InvalidInput)` - 형식 또는 체크섬 오류
pub fn validate_order_number(number: &str) -> Result<(), LedgerError> {
    let len = number.len();
    if !(MIN_ORDER_NUMBER_LEN..=MAX_ORDER_NUMBER_LEN).contains(&len) {
        return Err(LedgerError::InvalidInput(format!(
            "order number must be {}-{} digits long, got {}",
            MIN_ORDER_NUMBER_LEN, MAX_ORDER_NUMBER_LEN, len
        )));
    }

    if !number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::InvalidInput(
            "order number must contain digits only".to_string(),
        ));
    }

    if !luhn_checksum_valid(number) {
        return Err(LedgerError::InvalidInput(format!(
            "order number {} fails checksum validation",
            number
        )));
    }

    Ok(())
}

/// Luhn 체크섬 계산 (입력은 숫자만 포함한다고 가정)
fn luhn_checksum_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(idx, b)| {
            let digit = u32::from(b - b'0');
            if idx % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_numbers_pass() {
        assert!(validate_order_number("12345678903").is_ok());
        assert!(validate_order_number("79927398713").is_ok());
        assert!(validate_order_number("4561261212345467").is_ok());
    }

    #[test]
    fn test_checksum_failure_rejected() {
        let err = validate_order_number("12345678901").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
    }

    #[test]
    fn test_length_bounds() {
        // 4자리: 너무 짧음 ("0000"은 체크섬은 통과)
        assert!(validate_order_number("0000").is_err());
        assert!(validate_order_number("00000").is_ok());
        // 17자리: 너무 김
        assert!(validate_order_number("00000000000000000").is_err());
    }

    #[test]
    fn test_non_digits_rejected() {
        assert!(validate_order_number("1234a678903").is_err());
        assert!(validate_order_number(" 12345678903").is_err());
        assert!(validate_order_number("").is_err());
    }
}
