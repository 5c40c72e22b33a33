//! 服务配置模块
//!
//! 配置加载顺序：TOML 配置文件 -> 环境变量覆盖 -> 默认值兜底。
//! 配置通过进程级 `OnceLock` 暴露，加载一次全局可见。

use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::warn;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 应用配置根
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub server: ServerConfig,
    pub throttle: ThrottleConfig,
    pub logging: LoggingConfig,
    pub spool: SpoolConfig,
}

/// Bot API 接入配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Bot token，通常通过环境变量 BOT_TOKEN 注入
    pub token: String,
    /// Bot API 基础地址
    pub api_base: String,
    /// getUpdates 长轮询超时（秒）
    pub poll_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            poll_timeout_secs: 30,
        }
    }
}

/// 存活探针 HTTP 服务配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 限速配置
///
/// 媒体重发后的长延迟为经验值，用于规避平台 flood 限制。
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// 视频/文档重发后的延迟（毫秒）
    pub media_delay_ms: u64,
    /// 每步之间的基础延迟（毫秒）
    pub step_delay_ms: u64,
    /// 进度消息编辑的最小间隔（秒）
    pub progress_floor_secs: u64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            media_delay_ms: 8_000,
            step_delay_ms: 100,
            progress_floor_secs: 10,
        }
    }
}

/// 日志配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_target: true,
        }
    }
}

/// 临时文件暂存目录配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SpoolConfig {
    pub dir: String,
}

impl Default for SpoolConfig {
    fn default() -> Self {
        Self {
            dir: "./data/spool".to_string(),
        }
    }
}

impl AppConfig {
    /// 确保配置有默认值
    fn ensure_defaults(&mut self) {
        if self.server.address.is_empty() {
            self.server.address = "0.0.0.0".to_string();
        }
        if self.server.port == 0 {
            self.server.port = 8080;
        }
        if self.bot.api_base.is_empty() {
            self.bot.api_base = "https://api.telegram.org".to_string();
        }
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = env::var("BOT_TOKEN") {
            if !token.is_empty() {
                self.bot.token = token;
            }
        }
        if let Ok(base) = env::var("BOT_API_BASE") {
            if !base.is_empty() {
                self.bot.api_base = base;
            }
        }
        if let Ok(port) = env::var("HEALTH_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
    }
}

/// 加载配置
pub fn load_config(path: Option<&str>) -> &'static AppConfig {
    let candidates: Vec<PathBuf> = match path {
        Some(p) => vec![PathBuf::from(p)],
        None => vec![PathBuf::from("config.toml")],
    };

    APP_CONFIG.get_or_init(|| {
        let mut cfg = load_with_fallback(&candidates);
        cfg.apply_env_overrides();
        cfg.ensure_defaults();
        cfg
    })
}

/// 使用备选方案加载配置
fn load_with_fallback(candidates: &[PathBuf]) -> AppConfig {
    for path in candidates {
        match load_config_from_file(path) {
            Ok(cfg) => return cfg,
            Err(err) => {
                warn!("failed to load config from {}: {err}", path.display());
            }
        }
    }

    warn!("no configuration source succeeded, falling back to defaults");
    AppConfig::default()
}

/// 从文件加载配置
fn load_config_from_file(path: &PathBuf) -> Result<AppConfig> {
    if !path.exists() {
        return Err(anyhow!(
            "configuration path {} does not exist",
            path.display()
        ));
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file: {}", path.display()))?;
    let cfg: AppConfig = toml::from_str(&content)
        .with_context(|| format!("invalid config format: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let mut cfg = AppConfig::default();
        cfg.ensure_defaults();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.bot.api_base, "https://api.telegram.org");
        assert_eq!(cfg.throttle.media_delay_ms, 8_000);
        assert_eq!(cfg.throttle.step_delay_ms, 100);
        assert_eq!(cfg.throttle.progress_floor_secs, 10);
    }

    #[test]
    fn parses_partial_toml() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [bot]
            token = "123:abc"

            [throttle]
            media_delay_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(cfg.bot.token, "123:abc");
        assert_eq!(cfg.throttle.media_delay_ms, 500);
        // 未指定的字段取默认值
        assert_eq!(cfg.throttle.step_delay_ms, 100);
        assert_eq!(cfg.server.port, 8080);
    }
}
