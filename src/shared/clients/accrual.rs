// =====================================================
// Accrual Gateway - 외부 적립 시스템 클라이언트
// =====================================================
// 역할: 주문 번호로 외부 적립 시스템의 판정 결과를 조회
//
// 프로토콜: GET {base}/api/orders/{number}
// - 200: {"order": "...", "status": "...", "accrual": 500.0?}
// - 204 / 404: 아직 등록되지 않은 주문
// - 429: 요청 제한 (Retry-After 초, 기본 60초)
// - 연결 실패: 외부 시스템 장애
// - 타임아웃: 해당 주문만 실패
// =====================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::shared::utils::to_minor_units;

/// Retry-After 헤더가 없을 때의 대기 시간
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// 적립 시스템 판정 결과
/// Verdict reported by the accrual authority. `status` is not validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccrualVerdict {
    pub order_number: String,
    pub status: String,
    /// minor units
    pub accrual: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualLookup {
    /// 적립 시스템이 아직 모르는 주문
    NotFound,
    Verdict(AccrualVerdict),
}

/// 적립 시스템 조회 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// 연결 불가 (시스템 단위 장애 신호)
    #[error("Accrual system unavailable: {0}")]
    Unavailable(String),

    /// 응답 시간 초과 (주문 단위 실패)
    #[error("Accrual request timed out: {0}")]
    Timeout(String),

    /// 요청 제한 (HTTP 429)
    #[error("Accrual system rate limit, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// 주문 단위 실패 (예상치 못한 상태 코드, 잘못된 응답 본문)
    #[error("Accrual request failed: {0}")]
    Request(String),
}

/// 적립 시스템 게이트웨이
#[async_trait]
pub trait AccrualGateway: Send + Sync {
    async fn lookup(&self, order_number: &str) -> Result<AccrualLookup, GatewayError>;
}

#[derive(Debug, Deserialize)]
struct AccrualResponse {
    order: String,
    status: String,
    #[serde(default)]
    accrual: Option<Decimal>,
}

impl AccrualResponse {
    /// 응답 본문 → 판정 (음수 / 표현 불가능한 적립액은 주문 단위 실패)
    fn into_lookup(self) -> Result<AccrualLookup, GatewayError> {
        let accrual = match self.accrual {
            Some(amount) if amount.is_sign_negative() => {
                return Err(GatewayError::Request(format!(
                    "Negative accrual {} for order {}",
                    amount, self.order
                )));
            }
            Some(amount) => to_minor_units(amount).ok_or_else(|| {
                GatewayError::Request(format!("Accrual {} out of range for order {}", amount, self.order))
            })?,
            None => 0,
        };

        Ok(AccrualLookup::Verdict(AccrualVerdict {
            order_number: self.order,
            status: self.status,
            accrual,
        }))
    }
}

// 적립 시스템 HTTP 클라이언트
// Accrual system client over reqwest
pub struct HttpAccrualClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpAccrualClient {
    // 클라이언트 생성
    // base_url: 적립 시스템 주소 (예: "http://127.0.0.1:8081")
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let mut base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid accrual system address: {}", base_url))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http_client, base_url })
    }

    fn order_url(&self, order_number: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(&format!("api/orders/{}", order_number))
            .map_err(|e| GatewayError::Request(format!("Invalid order url: {}", e)))
    }
}

#[async_trait]
impl AccrualGateway for HttpAccrualClient {
    async fn lookup(&self, order_number: &str) -> Result<AccrualLookup, GatewayError> {
        let url = self.order_url(order_number)?;
        debug!(%url, "Requesting accrual system");

        let response = self
            .http_client
            .get(url)
            .header("User-Agent", "loyalty-ledger/1.0")
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GatewayError::Unavailable(e.to_string())
                } else if e.is_timeout() {
                    GatewayError::Timeout(e.to_string())
                } else {
                    GatewayError::Request(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::OK => {
                let body: AccrualResponse = response
                    .json()
                    .await
                    .map_err(|e| GatewayError::Request(format!("Failed to parse accrual response: {}", e)))?;

                body.into_lookup()
            }
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Ok(AccrualLookup::NotFound),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_RETRY_AFTER);
                Err(GatewayError::RateLimited { retry_after })
            }
            status => Err(GatewayError::Request(format!(
                "Accrual system returned {} for order {}",
                status, order_number
            ))),
        }
    }
}
