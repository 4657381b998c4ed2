// =====================================================
// 통합 테스트 공통 헬퍼
// =====================================================
// 목적: 모든 통합 테스트에서 공통으로 사용하는 셋업 함수와 테스트 더블 제공
//
// 사용법:
// ```rust
// mod common;
// use common::*;
//
// #[tokio::test]
// async fn test_something() {
//     let harness = setup_test();
//     harness.gateway.set(ORDER_A, processed(ORDER_A, 500));
//     // 테스트 코드...
// }
// ```
//
// 테스트 더블:
// - ScriptedGateway: 주문 번호별로 정해둔 응답을 돌려주는 적립 시스템
// - RecordingSink: 발행된 알림을 기록하는 버스 대용
// - RecordingTransport: 전달된 페이로드를 기록 (실패 주입 가능)
// =====================================================

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use parking_lot::Mutex;

use loyalty_ledger::domains::auth::services::JwtService;
use loyalty_ledger::domains::ledger::engine::{OrderReconciler, ReconcilerConfig};
use loyalty_ledger::domains::notification::models::{NotificationMessage, NotificationPayload};
use loyalty_ledger::domains::notification::services::{
    BusError, NotificationSink, RealtimeTransport, TransportError, WebSocketHub,
};
use loyalty_ledger::routes::create_router;
use loyalty_ledger::shared::clients::{AccrualGateway, AccrualLookup, AccrualVerdict, GatewayError};
use loyalty_ledger::shared::database::{LedgerStore, MemoryLedgerStore};
use loyalty_ledger::shared::services::AppState;

// 테스트용 상수 (모두 Luhn 체크섬을 통과하는 번호)
pub const ORDER_A: &str = "12345678903";
pub const ORDER_B: &str = "23772256246";
pub const ORDER_C: &str = "45612612122";
pub const ORDER_D: &str = "92789234702";
pub const WITHDRAW_REF_A: &str = "11112222333";
pub const WITHDRAW_REF_B: &str = "55556666778";
pub const BAD_CHECKSUM: &str = "12345678901";

pub const ALICE: u64 = 1;
pub const BOB: u64 = 2;

pub const TEST_SECRET: &str = "test-secret";

/// 체크 자리를 붙여 Luhn 체크섬을 통과하는 번호 생성
pub fn luhn_number(body: u64) -> String {
    let body = body.to_string();
    let sum: u32 = body
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = (b - b'0') as u32;
            if i % 2 == 0 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    format!("{}{}", body, (10 - sum % 10) % 10)
}

// =====================================================
// ScriptedGateway
// =====================================================

/// 주문 번호별 응답을 미리 정해두는 적립 시스템
/// Numbers without a script answer `NotFound`.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<HashMap<String, Result<AccrualLookup, GatewayError>>>,
    calls: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, number: &str, response: Result<AccrualLookup, GatewayError>) {
        self.responses.lock().insert(number.to_string(), response);
    }

    /// 조회 횟수
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccrualGateway for ScriptedGateway {
    async fn lookup(&self, order_number: &str) -> Result<AccrualLookup, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .get(order_number)
            .cloned()
            .unwrap_or(Ok(AccrualLookup::NotFound))
    }
}

pub fn verdict(number: &str, status: &str, accrual: i64) -> Result<AccrualLookup, GatewayError> {
    Ok(AccrualLookup::Verdict(AccrualVerdict {
        order_number: number.to_string(),
        status: status.to_string(),
        accrual,
    }))
}

pub fn processed(number: &str, accrual: i64) -> Result<AccrualLookup, GatewayError> {
    verdict(number, "PROCESSED", accrual)
}

pub fn unavailable() -> Result<AccrualLookup, GatewayError> {
    Err(GatewayError::Unavailable("connection refused".to_string()))
}

pub fn timed_out() -> Result<AccrualLookup, GatewayError> {
    Err(GatewayError::Timeout("operation timed out".to_string()))
}

/// 주문 단위 실패 (잘못된 응답 본문, 표현 불가능한 적립액 등)
pub fn request_failed(reason: &str) -> Result<AccrualLookup, GatewayError> {
    Err(GatewayError::Request(reason.to_string()))
}

pub fn rate_limited(secs: u64) -> Result<AccrualLookup, GatewayError> {
    Err(GatewayError::RateLimited {
        retry_after: Duration::from_secs(secs),
    })
}

// =====================================================
// RecordingSink
// =====================================================

/// 발행된 알림을 기록하는 NotificationSink
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<NotificationMessage>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<NotificationMessage> {
        self.messages.lock().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, batch: Vec<NotificationMessage>) -> Result<usize, BusError> {
        let published = batch.len();
        self.messages.lock().extend(batch);
        Ok(published)
    }
}

// =====================================================
// RecordingTransport
// =====================================================

/// 전달된 페이로드를 기록하는 RealtimeTransport
/// Owners listed in `fail_for` get a `TransportError::Unavailable`.
#[derive(Default)]
pub struct RecordingTransport {
    delivered: Mutex<Vec<(u64, NotificationPayload)>>,
    fail_for: Mutex<HashSet<u64>>,
}

impl RecordingTransport {
    pub fn fail_for(&self, owner_id: u64) {
        self.fail_for.lock().insert(owner_id);
    }

    pub fn delivered(&self) -> Vec<(u64, NotificationPayload)> {
        self.delivered.lock().clone()
    }
}

#[async_trait]
impl RealtimeTransport for RecordingTransport {
    async fn broadcast(&self, owner_id: u64, payload: &NotificationPayload) -> Result<usize, TransportError> {
        if self.fail_for.lock().contains(&owner_id) {
            return Err(TransportError::Unavailable(format!("session for {} is gone", owner_id)));
        }
        self.delivered.lock().push((owner_id, payload.clone()));
        Ok(1)
    }
}

// =====================================================
// Harness
// =====================================================

/// 리컨실러 테스트 묶음
pub struct Harness {
    pub store: Arc<MemoryLedgerStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub sink: Arc<RecordingSink>,
    pub reconciler: Arc<OrderReconciler>,
}

/// 테스트 전 초기화 (메모리 저장소 + 스크립트 게이트웨이)
pub fn setup_test() -> Harness {
    setup_with_config(ReconcilerConfig::new(Duration::from_secs(1), 2))
}

pub fn setup_with_config(config: ReconcilerConfig) -> Harness {
    let store = Arc::new(MemoryLedgerStore::new());
    let gateway = Arc::new(ScriptedGateway::new());
    let sink = Arc::new(RecordingSink::default());

    let reconciler = Arc::new(OrderReconciler::new(
        store.clone(),
        gateway.clone(),
        sink.clone(),
        config,
    ));

    Harness {
        store,
        gateway,
        sink,
        reconciler,
    }
}

/// 주문을 PROCESSED로 만들고 적립까지 반영 (잔고 준비용)
pub async fn seed_credit(store: &MemoryLedgerStore, owner_id: u64, number: &str, amount: i64) {
    use loyalty_ledger::domains::ledger::models::{NewCredit, OrderStatus, OrderUpdate};

    store.add_order(owner_id, number).await.expect("Failed to add order");
    store
        .commit_reconciliation(
            &[OrderUpdate {
                number: number.to_string(),
                status: OrderStatus::Processed,
                accrual: amount,
            }],
            &[NewCredit {
                owner_id,
                order_number: number.to_string(),
                amount,
            }],
        )
        .await
        .expect("Failed to seed credit");
}

/// HTTP 테스트용 라우터 (메모리 저장소)
pub fn test_app() -> (Router, Arc<MemoryLedgerStore>) {
    let store = Arc::new(MemoryLedgerStore::new());
    let hub = Arc::new(WebSocketHub::new(16));
    let app_state = AppState::new(store.clone(), JwtService::new(TEST_SECRET, 1), hub);

    (create_router().with_state(app_state), store)
}
