// =====================================================
// OrderReconciler - 주문 정산기
// =====================================================
// 역할: 주기적으로 미처리 주문을 적립 시스템에 조회하고
//       상태 변경과 적립을 원장에 반영
//
// 한 틱의 처리 순서:
// 1. 미처리 주문 조회 (NEW, PROCESSING)
// 2. 적립 시스템 조회 (lookup_concurrency 단위로 동시 실행)
// 3. 판정 검증 (알 수 없는 상태, 역행하는 전이는 제외)
// 4. 상태 업데이트 + 적립을 하나의 트랜잭션으로 커밋
// 5. 실제로 등록된 적립마다 알림 발행 (실패해도 틱은 성공)
//
// 장애 처리:
// - 주문 단위 조회 실패 (타임아웃 포함): 해당 주문만 건너뜀
// - 연결 실패 (Unavailable): 해당 주문만 건너뜀
// - 틱의 모든 조회가 Unavailable: 틱 중단, 아무것도 커밋하지 않음
// - 429 (RateLimited): 이후 조회 중단, 모은 판정은 커밋, retry_after 동안 틱 건너뜀
// - 저장소 실패: 틱 실패, 다음 틱에서 재시도
// =====================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domains::ledger::engine::config::ReconcilerConfig;
use crate::domains::ledger::models::{NewCredit, Order, OrderStatus, OrderUpdate};
use crate::domains::notification::models::NotificationMessage;
use crate::domains::notification::services::NotificationSink;
use crate::shared::clients::{AccrualGateway, AccrualLookup, AccrualVerdict, GatewayError};
use crate::shared::database::LedgerStore;
use crate::shared::errors::LedgerError;

/// 틱 실패 원인
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Ledger store failure: {0}")]
    Store(#[from] LedgerError),

    /// 적립 시스템 전체 장애 (아무것도 커밋하지 않음)
    #[error("Accrual system unavailable: {0}")]
    GatewayUnavailable(String),
}

/// 한 틱의 처리 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// 조회 대상 주문 수
    pub pending: usize,
    pub looked_up: usize,
    pub not_found: usize,
    /// 주문 단위 조회 실패
    pub failed_lookups: usize,
    /// 알 수 없는 상태 / 역행 전이 / 다른 주문 번호로 인해 제외된 판정
    pub skipped_invalid: usize,
    /// 커밋한 상태 업데이트 수
    pub updated: usize,
    /// 실제로 등록된 적립 수
    pub credited: usize,
    /// 버스에 발행된 알림 수
    pub notified: usize,
    /// 이번 틱에서 429를 받음
    pub rate_limited: bool,
    /// 이전 429로 인해 이번 틱을 건너뜀
    pub paused: bool,
}

/// 주문 정산기
pub struct OrderReconciler {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn AccrualGateway>,
    notifications: Arc<dyn NotificationSink>,
    config: ReconcilerConfig,
    /// 429 이후 조회를 재개할 시각
    paused_until: Mutex<Option<Instant>>,
}

impl OrderReconciler {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn AccrualGateway>,
        notifications: Arc<dyn NotificationSink>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            notifications,
            config,
            paused_until: Mutex::new(None),
        }
    }

    pub fn config(&self) -> ReconcilerConfig {
        self.config
    }

    /// 정산 한 번 실행
    /// Run a single reconciliation pass.
    ///
    /// A commit that has started always runs to completion; callers cancel
    /// only between passes.
    pub async fn reconcile_once(&self) -> Result<ReconcileReport, ReconcileError> {
        let mut report = ReconcileReport::default();

        if self.is_paused() {
            report.paused = true;
            return Ok(report);
        }

        let pending = self.store.pending_orders().await?;
        report.pending = pending.len();
        if pending.is_empty() {
            return Ok(report);
        }

        let mut updates = Vec::new();
        let mut credits = Vec::new();

        // 이번 틱에서 연결 실패한 조회 수
        let mut unreachable = 0usize;
        let mut outage_reason: Option<String> = None;

        for chunk in pending.chunks(self.config.lookup_concurrency) {
            let results = join_all(chunk.iter().map(|order| self.gateway.lookup(&order.number))).await;
            report.looked_up += results.len();

            let mut retry_after: Option<Duration> = None;
            for (order, result) in chunk.iter().zip(results) {
                match result {
                    Ok(AccrualLookup::NotFound) => report.not_found += 1,
                    Ok(AccrualLookup::Verdict(verdict)) => {
                        match Self::evaluate(order, verdict) {
                            Some((update, credit)) => {
                                updates.push(update);
                                credits.extend(credit);
                            }
                            None => report.skipped_invalid += 1,
                        }
                    }
                    Err(GatewayError::RateLimited { retry_after: wait }) => {
                        retry_after = Some(retry_after.map_or(wait, |current| current.max(wait)));
                    }
                    Err(GatewayError::Unavailable(reason)) => {
                        unreachable += 1;
                        report.failed_lookups += 1;
                        warn!(order = %order.number, error = %reason, "Accrual system unreachable, skipping order");
                        outage_reason = Some(reason);
                    }
                    Err(e) => {
                        report.failed_lookups += 1;
                        warn!(order = %order.number, error = %e, "Accrual lookup failed, skipping order");
                    }
                }
            }

            if let Some(wait) = retry_after {
                report.rate_limited = true;
                *self.paused_until.lock() = Some(Instant::now() + wait);
                warn!(retry_after_secs = wait.as_secs(), "Accrual system rate limit reached, pausing lookups");
                break;
            }
        }

        // 모든 조회가 연결 실패일 때만 전체 장애로 판단
        if unreachable == report.looked_up {
            let reason = outage_reason.unwrap_or_default();
            warn!(error = %reason, looked_up = report.looked_up, "Accrual system unreachable, aborting reconciliation");
            return Err(ReconcileError::GatewayUnavailable(reason));
        }

        let inserted = self.store.commit_reconciliation(&updates, &credits).await?;
        report.updated = updates.len();
        report.credited = inserted.len();

        let messages: Vec<NotificationMessage> = inserted
            .iter()
            .map(|tx| NotificationMessage {
                owner_id: tx.owner_id,
                order_number: tx.order_number.clone(),
                credit_amount: tx.credit_amount,
            })
            .collect();

        if !messages.is_empty() {
            match self.notifications.publish(messages) {
                Ok(published) => report.notified = published,
                Err(e) => warn!(error = %e, "Failed to publish accrual notifications"),
            }
        }

        Ok(report)
    }

    /// 판정 검증 → 상태 업데이트 (+ 적립)
    ///
    /// None: 판정을 이번 틱에서 제외
    fn evaluate(order: &Order, verdict: AccrualVerdict) -> Option<(OrderUpdate, Option<NewCredit>)> {
        if verdict.order_number != order.number {
            warn!(order = %order.number, reported = %verdict.order_number, "Accrual verdict for a different order");
            return None;
        }

        let status = match verdict.status.parse::<OrderStatus>() {
            Ok(status) => status,
            Err(e) => {
                warn!(order = %order.number, error = %e, "Dropping accrual verdict with unknown status");
                return None;
            }
        };

        if !order.status.can_transition_to(status) {
            debug!(order = %order.number, from = %order.status, to = %status, "No forward transition");
            return None;
        }

        let accrual = if status == OrderStatus::Processed { verdict.accrual } else { 0 };
        let credit = (accrual > 0).then(|| NewCredit {
            owner_id: order.owner_id,
            order_number: order.number.clone(),
            amount: accrual,
        });

        Some((
            OrderUpdate {
                number: order.number.clone(),
                status,
                accrual,
            },
            credit,
        ))
    }

    fn is_paused(&self) -> bool {
        let mut paused_until = self.paused_until.lock();
        match *paused_until {
            Some(until) if Instant::now() < until => true,
            Some(_) => {
                *paused_until = None;
                false
            }
            None => false,
        }
    }

    /// 주기 실행 루프
    /// Tick until cancelled. Cancellation is observed only between ticks.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = self.config.interval.as_secs(),
            lookup_concurrency = self.config.lookup_concurrency,
            "Order reconciler started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            match self.reconcile_once().await {
                Ok(report) if report.updated > 0 || report.credited > 0 => {
                    info!(
                        updated = report.updated,
                        credited = report.credited,
                        notified = report.notified,
                        "Reconciliation tick committed"
                    );
                }
                Ok(report) => debug!(pending = report.pending, paused = report.paused, "Reconciliation tick idle"),
                Err(e) => warn!(error = %e, "Reconciliation tick failed, retrying next tick"),
            }
        }

        info!("Order reconciler stopped");
    }

    /// 백그라운드 태스크로 시작
    pub fn spawn(self: Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
