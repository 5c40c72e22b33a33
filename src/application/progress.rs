//! 进度汇报
//!
//! 整个迁移过程只维护一条进度消息。编辑频率受墙钟下限约束，
//! 避免引擎被自己的 edit 调用限速。

use std::time::Duration;

use tokio::time::Instant;

const BAR_CELLS: u64 = 20;

/// 渲染 20 格定宽进度条
pub fn render_bar(done: u64, total: u64) -> String {
    let filled = if total == 0 {
        BAR_CELLS
    } else {
        BAR_CELLS * done / total
    };
    let mut bar = String::new();
    for _ in 0..filled {
        bar.push('█');
    }
    for _ in filled..BAR_CELLS {
        bar.push('▒');
    }
    bar
}

/// 完整的进度消息文本
pub fn render_progress(done: u64, total: u64) -> String {
    format!("Progress: {} {}/{}", render_bar(done, total), done, total)
}

/// 墙钟下限闸门：距上次放行不足 `floor` 时拒绝更新
#[derive(Debug)]
pub struct ProgressGate {
    floor: Duration,
    last_update: Instant,
}

impl ProgressGate {
    pub fn new(floor: Duration) -> Self {
        Self {
            floor,
            last_update: Instant::now(),
        }
    }

    /// 是否放行本次更新；放行时刷新时间戳
    pub fn should_update(&mut self) -> bool {
        if self.last_update.elapsed() >= self.floor {
            self.last_update = Instant::now();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_is_fixed_width_and_proportional() {
        assert_eq!(render_bar(0, 10), "▒".repeat(20));
        assert_eq!(render_bar(10, 10), "█".repeat(20));
        assert_eq!(render_bar(5, 10), format!("{}{}", "█".repeat(10), "▒".repeat(10)));
        assert_eq!(render_bar(0, 10).chars().count(), 20);
    }

    #[test]
    fn progress_text_includes_counts() {
        assert_eq!(
            render_progress(3, 4),
            format!("Progress: {} 3/4", render_bar(3, 4))
        );
    }

    #[test]
    fn gate_suppresses_updates_within_floor() {
        let mut gate = ProgressGate::new(Duration::from_secs(10));
        assert!(!gate.should_update());
        assert!(!gate.should_update());
    }

    #[test]
    fn zero_floor_always_updates() {
        let mut gate = ProgressGate::new(Duration::ZERO);
        assert!(gate.should_update());
        assert!(gate.should_update());
    }
}
