use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domains::notification::services::WebSocketHub;
use crate::shared::middleware::auth::AuthenticatedUser;
use crate::shared::services::AppState;

/// 실시간 알림 WebSocket 핸들러
/// Join the caller's notification room.
///
/// 인증: `Authorization: Bearer <token>` 또는 `?token=<token>`
#[utoipa::path(
    get,
    path = "/api/user/notifications/ws",
    params(
        ("token" = Option<String>, Query, description = "Access token for clients that cannot set headers")
    ),
    responses(
        (status = 101, description = "Switching to WebSocket; receives new_notification events"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("BearerAuth" = [])
    ),
    tag = "Notifications"
)]
pub async fn notifications_ws(
    State(app_state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    ws: WebSocketUpgrade,
) -> Response {
    let hub = app_state.hub.clone();
    let user_id = authenticated_user.user_id;
    ws.on_upgrade(move |socket| handle_session(socket, hub, user_id))
}

/// WebSocket 세션 처리
///
/// 처리 흐름:
/// 1. 사용자 방 참여
/// 2. 방 메시지를 클라이언트로 전송 (송신 태스크)
/// 3. 클라이언트 종료 감지 (수신 태스크)
/// 4. 둘 중 하나가 끝나면 세션 종료, 방 정리
async fn handle_session(socket: WebSocket, hub: Arc<WebSocketHub>, user_id: u64) {
    let session_id = Uuid::new_v4();
    let mut rx = hub.subscribe(user_id).await;
    debug!(%session_id, user_id, "Notification session opened");

    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%session_id, user_id, skipped, "Notification session lagging, messages skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    // 둘 중 하나가 종료되면 전체 종료 (방 정리 전에 수신자가 drop되어야 함)
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => {
            send_task.abort();
            let _ = send_task.await;
        }
    };

    hub.release(user_id).await;
    debug!(%session_id, user_id, "Notification session closed");
}
