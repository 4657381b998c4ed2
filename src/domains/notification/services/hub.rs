// =====================================================
// WebSocketHub - 사용자별 실시간 알림 방(room)
// =====================================================
// 역할: 사용자 ID마다 broadcast 채널 하나
//
// - subscribe: 세션 연결 시 방에 참여 (없으면 생성)
// - release: 세션 종료 후 호출, 마지막 세션이면 방 제거
// - broadcast: 방이 없으면 아무에게도 전달되지 않음 (에러 아님)
// =====================================================

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};

use crate::domains::notification::models::NotificationPayload;

/// 실시간 전송 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to encode payload: {0}")]
    Encode(String),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

/// 실시간 전송 인터페이스
/// Realtime fan-out to a user's live sessions
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    /// 사용자에게 페이로드 전달. 전달된 세션 수 반환.
    async fn broadcast(&self, owner_id: u64, payload: &NotificationPayload) -> Result<usize, TransportError>;
}

/// 사용자별 방을 관리하는 WebSocket 허브
pub struct WebSocketHub {
    rooms: RwLock<HashMap<u64, broadcast::Sender<String>>>,
    room_capacity: usize,
}

impl WebSocketHub {
    /// 생성자
    ///
    /// # Arguments
    /// * `room_capacity` - 방마다 버퍼링할 메시지 수 (느린 세션은 오래된 메시지를 놓침)
    pub fn new(room_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            room_capacity: room_capacity.max(1),
        }
    }

    /// 사용자 방 참여
    pub async fn subscribe(&self, owner_id: u64) -> broadcast::Receiver<String> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(owner_id)
            .or_insert_with(|| broadcast::channel(self.room_capacity).0)
            .subscribe()
    }

    /// 세션 종료 처리 (수신자를 먼저 drop한 뒤 호출)
    pub async fn release(&self, owner_id: u64) {
        let mut rooms = self.rooms.write().await;
        if rooms.get(&owner_id).is_some_and(|room| room.receiver_count() == 0) {
            rooms.remove(&owner_id);
        }
    }

    /// 활성 방 수
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl RealtimeTransport for WebSocketHub {
    async fn broadcast(&self, owner_id: u64, payload: &NotificationPayload) -> Result<usize, TransportError> {
        let json = serde_json::to_string(payload).map_err(|e| TransportError::Encode(e.to_string()))?;

        let rooms = self.rooms.read().await;
        let Some(room) = rooms.get(&owner_id) else {
            return Ok(0);
        };

        // 수신자가 모두 떠난 직후라면 send는 실패: 전달 대상 없음
        Ok(room.send(json).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::notification::models::NotificationMessage;

    fn payload() -> NotificationPayload {
        NotificationPayload::from(&NotificationMessage {
            owner_id: 1,
            order_number: "12345678903".to_string(),
            credit_amount: 500,
        })
    }

    #[tokio::test]
    async fn test_only_owner_room_receives() {
        let hub = WebSocketHub::new(16);
        let mut alice = hub.subscribe(1).await;
        let mut bob = hub.subscribe(2).await;

        assert_eq!(hub.broadcast(1, &payload()).await, Ok(1));

        let text = alice.recv().await.unwrap();
        assert!(text.contains("You get 5.00 bonuses for order 12345678903"));
        assert!(bob.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_no_room_is_not_an_error() {
        let hub = WebSocketHub::new(16);
        assert_eq!(hub.broadcast(42, &payload()).await, Ok(0));
    }

    #[tokio::test]
    async fn test_room_removed_after_last_session() {
        let hub = WebSocketHub::new(16);
        let first = hub.subscribe(1).await;
        let second = hub.subscribe(1).await;

        drop(first);
        hub.release(1).await;
        assert_eq!(hub.room_count().await, 1);

        drop(second);
        hub.release(1).await;
        assert_eq!(hub.room_count().await, 0);
    }
}
