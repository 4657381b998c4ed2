// =====================================================
// 주문 정산 통합 테스트
// =====================================================
// 리컨실러 + 메모리 저장소 + 스크립트 게이트웨이
// =====================================================

mod common;
use common::*;

use std::time::Duration;

use loyalty_ledger::domains::ledger::engine::{ReconcileError, ReconcilerConfig};
use loyalty_ledger::domains::ledger::models::{Balance, OrderStatus};
use loyalty_ledger::shared::database::LedgerStore;
use loyalty_ledger::shared::errors::LedgerError;
use tokio_util::sync::CancellationToken;

/// 테스트: PROCESSED 판정 → 적립 1건, 알림 1건, 잔고 반영
#[tokio::test]
async fn test_processed_order_is_credited_once() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();
    harness.gateway.set(ORDER_A, processed(ORDER_A, 500));

    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.pending, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.credited, 1);
    assert_eq!(report.notified, 1);

    let order = harness.store.order(ORDER_A).unwrap();
    assert_eq!(order.status, OrderStatus::Processed);
    assert_eq!(order.accrual, 500);

    let messages = harness.sink.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].owner_id, ALICE);
    assert_eq!(messages[0].credit_amount, 500);
    assert_eq!(messages[0].text(), "You get 5.00 bonuses for order 12345678903");

    assert_eq!(
        harness.store.balance(ALICE).await.unwrap(),
        Balance { current: 500, withdrawn: 0 }
    );
}

/// 테스트: 반복 실행해도 이중 적립 없음
///
/// PROCESSED가 된 주문은 더 이상 조회 대상이 아니어야 합니다.
#[tokio::test]
async fn test_repeated_ticks_never_double_credit() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();
    harness.gateway.set(ORDER_A, processed(ORDER_A, 500));

    for _ in 0..3 {
        harness.reconciler.reconcile_once().await.unwrap();
    }

    assert_eq!(harness.gateway.calls(), 1);
    assert_eq!(harness.sink.messages().len(), 1);
    assert_eq!(
        harness.store.ledger().iter().filter(|tx| tx.is_credit()).count(),
        1
    );
    assert_eq!(harness.store.balance(ALICE).await.unwrap().current, 500);
}

/// 테스트: NEW → PROCESSING → PROCESSED 순서로 진행
#[tokio::test]
async fn test_processing_order_is_polled_again() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();

    // PROCESSING 단계에서 보고된 accrual은 무시
    harness.gateway.set(ORDER_A, verdict(ORDER_A, "PROCESSING", 900));
    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.credited, 0);
    assert_eq!(harness.store.order(ORDER_A).unwrap().status, OrderStatus::Processing);
    assert_eq!(harness.store.order(ORDER_A).unwrap().accrual, 0);

    // 같은 상태가 다시 오면 업데이트 없음
    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped_invalid, 1);

    harness.gateway.set(ORDER_A, processed(ORDER_A, 72998));
    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.credited, 1);
    assert_eq!(harness.store.balance(ALICE).await.unwrap().current, 72998);
}

/// 테스트: INVALID 판정 → 종료 상태, 적립 없음
#[tokio::test]
async fn test_invalid_order_is_terminal_without_credit() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();
    harness.gateway.set(ORDER_A, verdict(ORDER_A, "INVALID", 0));

    harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(harness.store.order(ORDER_A).unwrap().status, OrderStatus::Invalid);

    // 종료 상태 주문은 다시 조회하지 않음
    harness.gateway.set(ORDER_A, processed(ORDER_A, 500));
    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.pending, 0);
    assert_eq!(harness.gateway.calls(), 1);
    assert_eq!(harness.store.order(ORDER_A).unwrap().status, OrderStatus::Invalid);
    assert!(harness.store.ledger().is_empty());
}

/// 테스트: 알 수 없는 상태 → 해당 판정만 제외, 주문은 NEW 유지
#[tokio::test]
async fn test_unknown_status_is_skipped() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();
    harness.store.add_order(BOB, ORDER_B).await.unwrap();
    harness.gateway.set(ORDER_A, verdict(ORDER_A, "REGISTERED", 0));
    harness.gateway.set(ORDER_B, processed(ORDER_B, 300));

    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.credited, 1);

    assert_eq!(harness.store.order(ORDER_A).unwrap().status, OrderStatus::New);
    assert_eq!(harness.store.order(ORDER_B).unwrap().status, OrderStatus::Processed);
}

/// 테스트: 적립 시스템이 모르는 주문 → 변화 없음
#[tokio::test]
async fn test_not_found_is_a_no_op() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();

    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.not_found, 1);
    assert_eq!(report.updated, 0);
    assert_eq!(harness.store.order(ORDER_A).unwrap().status, OrderStatus::New);
    assert!(harness.sink.messages().is_empty());
}

/// 테스트: 적립은 주문 소유자에게만
#[tokio::test]
async fn test_credit_goes_to_order_owner() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();
    harness.store.add_order(BOB, ORDER_B).await.unwrap();
    harness.gateway.set(ORDER_A, processed(ORDER_A, 100));
    harness.gateway.set(ORDER_B, processed(ORDER_B, 250));

    harness.reconciler.reconcile_once().await.unwrap();

    assert_eq!(harness.store.balance(ALICE).await.unwrap().current, 100);
    assert_eq!(harness.store.balance(BOB).await.unwrap().current, 250);

    let mut owners: Vec<u64> = harness.sink.messages().iter().map(|m| m.owner_id).collect();
    owners.sort();
    assert_eq!(owners, vec![ALICE, BOB]);
}

/// 테스트: 틱의 모든 조회가 Unavailable → 틱 중단, 아무것도 커밋하지 않음
///
/// 복구 후 다음 틱에서 정상 반영되어야 합니다.
#[tokio::test]
async fn test_gateway_outage_commits_nothing() {
    let harness = setup_test();
    for number in [ORDER_A, ORDER_B, ORDER_C] {
        harness.store.add_order(ALICE, number).await.unwrap();
        harness.gateway.set(number, unavailable());
    }

    let result = harness.reconciler.reconcile_once().await;
    assert!(matches!(result, Err(ReconcileError::GatewayUnavailable(_))));
    assert_eq!(harness.gateway.calls(), 3);

    for number in [ORDER_A, ORDER_B, ORDER_C] {
        assert_eq!(harness.store.order(number).unwrap().status, OrderStatus::New);
    }
    assert!(harness.store.ledger().is_empty());
    assert!(harness.sink.messages().is_empty());

    for number in [ORDER_A, ORDER_B, ORDER_C] {
        harness.gateway.set(number, processed(number, 100));
    }
    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.credited, 3);
}

/// 테스트: 일부 주문만 조회 실패 → 나머지는 정상 반영
#[tokio::test]
async fn test_single_lookup_failure_is_skipped() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();
    harness.store.add_order(ALICE, ORDER_B).await.unwrap();
    harness.gateway.set(ORDER_A, unavailable());
    harness.gateway.set(ORDER_B, processed(ORDER_B, 400));

    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.failed_lookups, 1);
    assert_eq!(report.credited, 1);
    assert_eq!(harness.store.order(ORDER_A).unwrap().status, OrderStatus::New);
}

/// 테스트: 마지막 묶음에 혼자 남은 주문이 연결 실패해도 앞 묶음의 판정은 반영
///
/// 주문 3건, 동시 조회 2건: 세 번째 주문이 혼자 두 번째 묶음에 들어갑니다.
/// 여러 틱 동안 실패가 계속되어도 다른 주문의 적립은 막히지 않아야 합니다.
#[tokio::test]
async fn test_unreachable_last_order_does_not_block_others() {
    let harness = setup_test();
    for number in [ORDER_A, ORDER_B, ORDER_C] {
        harness.store.add_order(ALICE, number).await.unwrap();
    }
    harness.gateway.set(ORDER_A, processed(ORDER_A, 100));
    harness.gateway.set(ORDER_B, processed(ORDER_B, 100));
    harness.gateway.set(ORDER_C, unavailable());

    let first = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(first.credited, 2);
    assert_eq!(first.failed_lookups, 1);

    for _ in 0..2 {
        let report = harness.reconciler.reconcile_once().await.unwrap();
        assert_eq!(report.pending, 1);
        assert_eq!(report.failed_lookups, 1);
        assert_eq!(report.credited, 0);
    }

    assert_eq!(harness.store.order(ORDER_A).unwrap().status, OrderStatus::Processed);
    assert_eq!(harness.store.order(ORDER_B).unwrap().status, OrderStatus::Processed);
    assert_eq!(harness.store.order(ORDER_C).unwrap().status, OrderStatus::New);
    assert_eq!(harness.store.ledger().len(), 2);
    assert_eq!(harness.sink.messages().len(), 2);
}

/// 테스트: 계속 실패하는 주문의 위치 / 묶음 크기 / 실패 종류와 무관하게
/// 나머지 주문은 정확히 한 번 적립
#[tokio::test]
async fn test_persistent_failure_at_any_chunk_position() {
    let numbers = [ORDER_A, ORDER_B, ORDER_C];
    let failures = [
        unavailable(),
        timed_out(),
        request_failed("Accrual 1e28 out of range"),
    ];

    for concurrency in 1..=3 {
        for failing in 0..numbers.len() {
            for failure in &failures {
                let case = format!("concurrency {}, failing #{}, {:?}", concurrency, failing, failure);
                let harness = setup_with_config(ReconcilerConfig::new(Duration::from_secs(1), concurrency));

                for (i, number) in numbers.iter().enumerate() {
                    harness.store.add_order(ALICE, number).await.unwrap();
                    let response = if i == failing { failure.clone() } else { processed(number, 100) };
                    harness.gateway.set(number, response);
                }

                for tick in 0..3 {
                    let report = harness.reconciler.reconcile_once().await;
                    let report = report.unwrap_or_else(|e| panic!("{} tick {}: {}", case, tick, e));
                    assert_eq!(report.failed_lookups, 1, "{} tick {}", case, tick);
                }

                for (i, number) in numbers.iter().enumerate() {
                    let expected = if i == failing { OrderStatus::New } else { OrderStatus::Processed };
                    assert_eq!(harness.store.order(number).unwrap().status, expected, "{}", case);
                }
                assert_eq!(harness.store.ledger().len(), 2, "{}", case);
                assert_eq!(harness.sink.messages().len(), 2, "{}", case);
            }
        }
    }
}

/// 테스트: 실패하던 주문이 복구되면 다음 틱에서 한 번만 적립
#[tokio::test]
async fn test_recovered_order_is_credited_once() {
    let harness = setup_test();
    for number in [ORDER_A, ORDER_B, ORDER_C] {
        harness.store.add_order(ALICE, number).await.unwrap();
        harness.gateway.set(number, processed(number, 100));
    }
    harness.gateway.set(ORDER_B, timed_out());

    harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(harness.store.order(ORDER_B).unwrap().status, OrderStatus::New);

    harness.gateway.set(ORDER_B, processed(ORDER_B, 250));
    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.pending, 1);
    assert_eq!(report.credited, 1);

    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.pending, 0);

    assert_eq!(
        harness.store.balance(ALICE).await.unwrap(),
        Balance { current: 450, withdrawn: 0 }
    );
}

/// 테스트: 429 → 모은 판정은 커밋, 이후 조회 중단, 다음 틱은 건너뜀
#[tokio::test]
async fn test_rate_limit_commits_gathered_and_pauses() {
    let harness = setup_test();
    for number in [ORDER_A, ORDER_B, ORDER_C] {
        harness.store.add_order(ALICE, number).await.unwrap();
    }
    harness.gateway.set(ORDER_A, processed(ORDER_A, 100));
    harness.gateway.set(ORDER_B, rate_limited(60));
    harness.gateway.set(ORDER_C, processed(ORDER_C, 100));

    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert!(report.rate_limited);
    assert_eq!(report.credited, 1);
    // C는 두 번째 묶음이라 조회하지 않음
    assert_eq!(harness.gateway.calls(), 2);
    assert_eq!(harness.store.order(ORDER_A).unwrap().status, OrderStatus::Processed);
    assert_eq!(harness.store.order(ORDER_C).unwrap().status, OrderStatus::New);

    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert!(report.paused);
    assert_eq!(harness.gateway.calls(), 2);
}

/// 테스트: 저장소 장애 → 틱 실패, 조회하지 않음
#[tokio::test]
async fn test_store_outage_fails_tick() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();
    harness.gateway.set(ORDER_A, processed(ORDER_A, 500));
    harness.store.set_unavailable(true);

    let result = harness.reconciler.reconcile_once().await;
    assert!(matches!(
        result,
        Err(ReconcileError::Store(LedgerError::Unavailable(_)))
    ));
    assert_eq!(harness.gateway.calls(), 0);

    // 복구 후 다음 틱에서 정상 처리
    harness.store.set_unavailable(false);
    let report = harness.reconciler.reconcile_once().await.unwrap();
    assert_eq!(report.credited, 1);
}

/// 테스트: 주기 실행 루프가 적립을 반영하고 취소되면 종료
#[tokio::test]
async fn test_run_loop_stops_on_cancel() {
    let harness = setup_test();
    harness.store.add_order(ALICE, ORDER_A).await.unwrap();
    harness.gateway.set(ORDER_A, processed(ORDER_A, 500));

    let cancel = CancellationToken::new();
    let handle = harness.reconciler.clone().spawn(cancel.clone());

    // 첫 틱은 즉시 실행됨
    tokio::time::timeout(Duration::from_secs(5), async {
        while harness.sink.messages().is_empty() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("Reconciler did not credit the order in time");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("Reconciler did not stop after cancellation")
        .unwrap();

    assert_eq!(harness.store.balance(ALICE).await.unwrap().current, 500);
}
