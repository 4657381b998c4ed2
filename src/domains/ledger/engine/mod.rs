// =====================================================
// 주문 정산 엔진
// Order Reconciliation Engine
// =====================================================
// 구조:
// - config: 틱 간격, 동시 조회 수
// - reconciler: 미처리 주문 조회 → 판정 검증 → 상태/적립 반영 → 알림 발행
// =====================================================

pub mod config;
pub mod reconciler;

pub use config::ReconcilerConfig;
pub use reconciler::{OrderReconciler, ReconcileError, ReconcileReport};
