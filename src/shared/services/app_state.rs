use std::sync::Arc;

use crate::domains::auth::services::{AuthState, JwtService};
use crate::domains::ledger::services::LedgerState;
use crate::domains::notification::services::WebSocketHub;
use crate::shared::database::LedgerStore;

/// Application state (combines all domain states)
/// 애플리케이션 상태 (모든 도메인 상태를 조합)
///
/// 각 도메인의 State를 조합하여 전체 애플리케이션 상태를 관리.
/// 모든 협력 객체는 생성 시 주입됨 (전역 상태 없음).
#[derive(Clone)]
pub struct AppState {
    pub auth_state: AuthState,
    pub ledger_state: LedgerState,
    /// 실시간 알림 허브 (WebSocket 세션이 방에 참여)
    pub hub: Arc<WebSocketHub>,
}

impl AppState {
    /// 모든 도메인 State를 초기화하고 조합
    pub fn new(store: Arc<dyn LedgerStore>, jwt_service: JwtService, hub: Arc<WebSocketHub>) -> Self {
        Self {
            auth_state: AuthState::new(store.clone(), jwt_service),
            ledger_state: LedgerState::new(store),
            hub,
        }
    }
}
