//! 限速实现
//!
//! 生产实现按固定间隔休眠；`NoDelayThrottle` 供测试使用，只计数不等待。

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ThrottleConfig;
use crate::domain::repository::Throttle;

/// 固定间隔限速器
#[derive(Debug)]
pub struct FixedDelayThrottle {
    media_delay: Duration,
    step_delay: Duration,
}

impl FixedDelayThrottle {
    pub fn new(media_delay: Duration, step_delay: Duration) -> Self {
        Self {
            media_delay,
            step_delay,
        }
    }

    pub fn from_config(cfg: &ThrottleConfig) -> Self {
        Self::new(
            Duration::from_millis(cfg.media_delay_ms),
            Duration::from_millis(cfg.step_delay_ms),
        )
    }
}

#[async_trait]
impl Throttle for FixedDelayThrottle {
    async fn after_media(&self) {
        tokio::time::sleep(self.media_delay).await;
    }

    async fn between_steps(&self) {
        tokio::time::sleep(self.step_delay).await;
    }
}

/// 零延迟限速器（测试用），记录调用次数
#[derive(Debug, Default)]
pub struct NoDelayThrottle {
    pub media_waits: AtomicU64,
    pub step_waits: AtomicU64,
}

impl NoDelayThrottle {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Throttle for NoDelayThrottle {
    async fn after_media(&self) {
        self.media_waits.fetch_add(1, Ordering::Relaxed);
    }

    async fn between_steps(&self) {
        self.step_waits.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_config() {
        let throttle = FixedDelayThrottle::from_config(&ThrottleConfig::default());
        assert_eq!(throttle.media_delay, Duration::from_secs(8));
        assert_eq!(throttle.step_delay, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn no_delay_throttle_counts_waits() {
        let throttle = NoDelayThrottle::new();
        throttle.after_media().await;
        throttle.between_steps().await;
        throttle.between_steps().await;
        assert_eq!(throttle.media_waits.load(Ordering::Relaxed), 1);
        assert_eq!(throttle.step_waits.load(Ordering::Relaxed), 2);
    }
}
