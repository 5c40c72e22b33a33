//! 日志初始化模块
//!
//! 优先使用环境变量 RUST_LOG，未设置时退回配置文件中的日志级别。

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// 从配置初始化日志系统
pub fn init_tracing_from_config(logging_config: Option<&LoggingConfig>) {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let level_str = logging_config.map(|c| c.level.as_str()).unwrap_or("info");
            EnvFilter::new(level_str)
        }
    };

    let with_target = logging_config.map(|c| c.with_target).unwrap_or(true);

    let _ = fmt::Subscriber::builder()
        .with_target(with_target)
        .with_env_filter(env_filter)
        .try_init();
}
