use serde::{Deserialize, Serialize};

use crate::shared::utils::from_minor_units;

/// 적립 알림 메시지 (버스 스키마)
/// Notification emitted once per committed credit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub owner_id: u64,
    pub order_number: String,
    pub credit_amount: i64,
}

impl NotificationMessage {
    /// 사용자에게 표시되는 문구
    pub fn text(&self) -> String {
        format!(
            "You get {} bonuses for order {}",
            from_minor_units(self.credit_amount),
            self.order_number
        )
    }
}

/// 실시간 전송용 페이로드 (WebSocket JSON)
/// Payload pushed to realtime sessions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// 이벤트 이름 ("new_notification")
    pub event: String,
    pub order: String,
    pub accrual: String,
    pub message: String,
}

impl From<&NotificationMessage> for NotificationPayload {
    fn from(msg: &NotificationMessage) -> Self {
        Self {
            event: "new_notification".to_string(),
            order: msg.order_number.clone(),
            accrual: from_minor_units(msg.credit_amount).to_string(),
            message: msg.text(),
        }
    }
}
