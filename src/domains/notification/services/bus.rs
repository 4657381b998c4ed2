// =====================================================
// NotificationBus - 적립 알림 버스
// =====================================================
// 역할: 리컨실러(생산자)와 알림 워커(소비자)를 분리
//
// - 토픽 이름을 가진 bounded mpsc 채널
// - publish는 절대 블로킹하지 않음: 가득 차면 초과분을 버리고 Overflow 보고
// - 구독자들은 하나의 수신자를 공유 (경쟁 소비자: 메시지 1개 → 워커 1개)
// =====================================================

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::sync::mpsc::error::TrySendError;

use crate::domains::notification::models::NotificationMessage;

/// 버스 발행 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// 버스가 가득 차서 일부 메시지를 버림
    #[error("Notification bus full, dropped {dropped} message(s)")]
    Overflow { dropped: usize },

    /// 버스가 닫힘
    #[error("Notification bus closed")]
    Closed,
}

/// 알림 발행 인터페이스 (리컨실러가 사용)
/// Producer side of the notification bus
pub trait NotificationSink: Send + Sync {
    /// 배치 발행. 성공 시 발행된 메시지 수 반환.
    fn publish(&self, batch: Vec<NotificationMessage>) -> Result<usize, BusError>;
}

type SharedReceiver = Arc<Mutex<mpsc::Receiver<NotificationMessage>>>;

/// 토픽 기반 알림 버스
pub struct NotificationBus {
    topic: String,
    tx: mpsc::Sender<NotificationMessage>,
    rx: SharedReceiver,
}

impl NotificationBus {
    /// 생성자
    ///
    /// # Arguments
    /// * `topic` - 토픽 이름 (로그용)
    /// * `capacity` - 버퍼 크기 (1 이상)
    pub fn new(topic: impl Into<String>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));

        Self {
            topic: topic.into(),
            tx,
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 소비자 그룹 멤버 생성
    pub fn subscriber(&self) -> BusSubscriber {
        BusSubscriber {
            topic: self.topic.clone(),
            rx: self.rx.clone(),
        }
    }

    /// 버스 닫기 (이후 publish는 Closed)
    /// Buffered messages can still be received after closing.
    pub async fn close(&self) {
        self.rx.lock().await.close();
    }
}

impl NotificationSink for NotificationBus {
    fn publish(&self, batch: Vec<NotificationMessage>) -> Result<usize, BusError> {
        let mut published = 0;
        let mut dropped = 0;

        for message in batch {
            match self.tx.try_send(message) {
                Ok(()) => published += 1,
                Err(TrySendError::Full(_)) => dropped += 1,
                Err(TrySendError::Closed(_)) => return Err(BusError::Closed),
            }
        }

        if dropped > 0 {
            return Err(BusError::Overflow { dropped });
        }
        Ok(published)
    }
}

/// 버스 구독자 (경쟁 소비자)
#[derive(Clone)]
pub struct BusSubscriber {
    topic: String,
    rx: SharedReceiver,
}

impl BusSubscriber {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// 다음 메시지 수신. 버스가 닫히고 비어 있으면 None.
    ///
    /// 취소해도 메시지가 유실되지 않음 (select! 안에서 사용 가능).
    pub async fn recv(&self) -> Option<NotificationMessage> {
        self.rx.lock().await.recv().await
    }
}
