use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::http::{HeaderValue, Method};
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::decompression::RequestDecompressionLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn, Level};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use loyalty_ledger::domains::auth::models::*;
use loyalty_ledger::domains::auth::services::JwtService;
use loyalty_ledger::domains::ledger::engine::{OrderReconciler, ReconcilerConfig};
use loyalty_ledger::domains::ledger::models::*;
use loyalty_ledger::domains::notification::services::{
    NotificationBus, NotificationPipeline, WebSocketHub, WorkerStats,
};
use loyalty_ledger::routes::create_router;
use loyalty_ledger::shared::clients::HttpAccrualClient;
use loyalty_ledger::shared::config::AppConfig;
use loyalty_ledger::shared::database::{Database, LedgerStore, PgLedgerStore};
use loyalty_ledger::shared::services::AppState;

// OpenAPI 스키마 정의: Swagger 문서 자동 생성
#[derive(OpenApi)]
#[openapi(
    paths(
        loyalty_ledger::domains::auth::handlers::auth_handler::register,
        loyalty_ledger::domains::auth::handlers::auth_handler::login,
        loyalty_ledger::domains::ledger::handlers::order_handler::upload_order,
        loyalty_ledger::domains::ledger::handlers::order_handler::get_orders,
        loyalty_ledger::domains::ledger::handlers::balance_handler::get_balance,
        loyalty_ledger::domains::ledger::handlers::balance_handler::withdraw,
        loyalty_ledger::domains::ledger::handlers::balance_handler::get_withdrawals,
        loyalty_ledger::domains::notification::handlers::ws_handler::notifications_ws
    ),
    components(schemas(
        CredentialsRequest,
        TokenResponse,
        OrderStatus,
        OrderResponse,
        BalanceResponse,
        WithdrawRequest,
        WithdrawalResponse
    )),
    modifiers(
        &SecurityAddon
    ),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Orders", description = "Order upload and accrual status"),
        (name = "Balance", description = "Balance and withdrawals"),
        (name = "Notifications", description = "Realtime accrual notifications")
    ),
    info(
        title = "Loyalty Ledger API",
        description = "Loyalty points ledger with accrual reconciliation",
        version = "1.0.0"
    )
)]
struct ApiDoc;

// Security scheme 정의: Swagger UI에서 "Authorize" 버튼 추가
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "BearerAuth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

/// 방마다 버퍼링할 알림 수
const ROOM_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env.local이 있으면 환경 변수로 반영 (없으면 무시)
    let _ = dotenvy::from_filename(".env.local");

    let config = AppConfig::parse();
    init_tracing(&config.log_level);
    config.validate().context("Invalid configuration")?;

    // DB 연결 + 마이그레이션
    let db = Database::new(&config.database_uri).await?;
    db.initialize().await?;

    // 협력 객체 생성 (모두 명시적으로 주입)
    let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(db));
    let gateway = Arc::new(HttpAccrualClient::new(
        &config.accrual_system_address,
        config.accrual_timeout(),
    )?);
    let bus = Arc::new(NotificationBus::new(
        config.notification_topic.clone(),
        config.notification_bus_capacity,
    ));
    let hub = Arc::new(WebSocketHub::new(ROOM_CAPACITY));
    let jwt_service = JwtService::new(&config.secret_key, config.token_ttl_hours);

    // 백그라운드 작업: 알림 워커 → 리컨실러 순으로 시작
    let shutdown = CancellationToken::new();
    let pipeline_cancel = shutdown.child_token();
    let reconciler_cancel = shutdown.child_token();

    let workers = NotificationPipeline::spawn(
        bus.subscriber(),
        hub.clone(),
        config.notifier_workers,
        pipeline_cancel.clone(),
    );

    let reconciler = Arc::new(OrderReconciler::new(
        store.clone(),
        gateway,
        bus.clone(),
        ReconcilerConfig::from(&config),
    ));
    let reconciler_handle = reconciler.spawn(reconciler_cancel.clone());

    // HTTP 서버
    let app_state = AppState::new(store, jwt_service, hub);

    let app = Router::new()
        .merge(create_router())
        .merge(SwaggerUi::new("/api").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(RequestDecompressionLayer::new())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors(&config.cors_origin)?)
        .with_state(app_state);

    let listener = TcpListener::bind(&config.run_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.run_address))?;

    info!("Server running on http://{}", config.run_address);
    info!("Swagger UI available at http://{}/api", config.run_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server crashed")?;

    // 종료 순서: 리컨실러 (진행 중인 커밋 완료) → 알림 워커
    info!("Shutting down background workers");
    reconciler_cancel.cancel();
    if let Err(e) = reconciler_handle.await {
        warn!(error = %e, "Reconciler task failed");
    }

    pipeline_cancel.cancel();
    match tokio::time::timeout(config.shutdown_grace(), workers.join()).await {
        Ok(stats) => {
            let total = WorkerStats::total(&stats);
            info!(delivered = total.delivered, failed = total.failed, "Notification workers stopped");
        }
        Err(_) => warn!("Notification workers did not stop within the grace period"),
    }
    bus.close().await;
    shutdown.cancel();

    Ok(())
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();
}

// CORS 설정
fn cors(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin = origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
            axum::http::header::ACCEPT,
            axum::http::header::CONTENT_ENCODING,
        ])
        .expose_headers([axum::http::header::AUTHORIZATION])
        .allow_credentials(true))
}

// SIGINT / SIGTERM 대기
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
