// =====================================================
// ReconcilerConfig - 리컨실러 설정
// =====================================================
// - interval: 틱 간격 (최소 1초, 밀린 틱은 건너뜀)
// - lookup_concurrency: 틱당 동시에 진행하는 적립 시스템 조회 수
// =====================================================

use std::time::Duration;

use crate::shared::config::AppConfig;

/// 리컨실러 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcilerConfig {
    pub interval: Duration,
    pub lookup_concurrency: usize,
}

impl ReconcilerConfig {
    /// 최소 틱 간격
    pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(interval: Duration, lookup_concurrency: usize) -> Self {
        Self {
            interval: interval.max(Self::MIN_INTERVAL),
            lookup_concurrency: lookup_concurrency.max(1),
        }
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 4)
    }
}

impl From<&AppConfig> for ReconcilerConfig {
    fn from(config: &AppConfig) -> Self {
        Self::new(config.status_check_interval(), config.lookup_concurrency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_are_clamped() {
        let config = ReconcilerConfig::new(Duration::from_millis(10), 0);
        assert_eq!(config.interval, ReconcilerConfig::MIN_INTERVAL);
        assert_eq!(config.lookup_concurrency, 1);
    }
}
