// =====================================================
// NotificationPipeline - 알림 워커 풀
// =====================================================
// 역할: 버스에서 알림을 꺼내 실시간 전송 계층으로 전달
//
// 처리 흐름:
// 1. 워커 N개가 같은 구독자를 공유 (메시지 1개 → 워커 1개)
// 2. 메시지 → NotificationPayload 변환
// 3. RealtimeTransport::broadcast (실패 시 로그만 남기고 버림)
//
// 종료: 취소 토큰이 켜지면 현재 메시지까지 처리하고 종료
// =====================================================

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domains::notification::models::NotificationPayload;
use crate::domains::notification::services::bus::BusSubscriber;
use crate::domains::notification::services::hub::RealtimeTransport;

/// 워커별 처리 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub delivered: u64,
    pub failed: u64,
}

impl WorkerStats {
    pub fn total(stats: &[WorkerStats]) -> WorkerStats {
        stats.iter().fold(WorkerStats::default(), |acc, s| WorkerStats {
            delivered: acc.delivered + s.delivered,
            failed: acc.failed + s.failed,
        })
    }
}

pub struct NotificationPipeline;

impl NotificationPipeline {
    /// 워커 시작
    ///
    /// # Arguments
    /// * `subscriber` - 버스 구독자 (워커들이 공유)
    /// * `transport` - 실시간 전송 계층
    /// * `workers` - 워커 수 (최소 1)
    /// * `cancel` - 종료 토큰
    pub fn spawn(
        subscriber: BusSubscriber,
        transport: Arc<dyn RealtimeTransport>,
        workers: usize,
        cancel: CancellationToken,
    ) -> NotificationWorkers {
        let workers = workers.max(1);
        info!(topic = subscriber.topic(), workers, "Starting notification workers");

        let handles = (0..workers)
            .map(|worker_id| {
                let subscriber = subscriber.clone();
                let transport = transport.clone();
                let cancel = cancel.clone();
                tokio::spawn(run_worker(worker_id, subscriber, transport, cancel))
            })
            .collect();

        NotificationWorkers { handles }
    }
}

async fn run_worker(
    worker_id: usize,
    subscriber: BusSubscriber,
    transport: Arc<dyn RealtimeTransport>,
    cancel: CancellationToken,
) -> WorkerStats {
    let mut stats = WorkerStats::default();

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => break,
            message = subscriber.recv() => message,
        };

        // 버스가 닫히고 비었음
        let Some(message) = message else { break };

        let payload = NotificationPayload::from(&message);
        match transport.broadcast(message.owner_id, &payload).await {
            Ok(sessions) => {
                stats.delivered += 1;
                debug!(worker_id, owner_id = message.owner_id, order = %message.order_number, sessions, "Notification delivered");
            }
            Err(e) => {
                stats.failed += 1;
                warn!(worker_id, owner_id = message.owner_id, order = %message.order_number, error = %e, "Notification dropped");
            }
        }
    }

    debug!(worker_id, delivered = stats.delivered, failed = stats.failed, "Notification worker stopped");
    stats
}

/// 실행 중인 워커 핸들
pub struct NotificationWorkers {
    handles: Vec<JoinHandle<WorkerStats>>,
}

impl NotificationWorkers {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 모든 워커 종료 대기 (취소 토큰을 먼저 켜야 함)
    /// A worker that panicked contributes no stats.
    pub async fn join(self) -> Vec<WorkerStats> {
        let mut stats = Vec::with_capacity(self.handles.len());
        for handle in self.handles {
            match handle.await {
                Ok(worker_stats) => stats.push(worker_stats),
                Err(e) => warn!(error = %e, "Notification worker failed"),
            }
        }
        stats
    }
}
