//! 应用启动器 - 负责依赖装配和服务启动

use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::spool::SpoolDir;
use crate::infrastructure::telegram::TelegramBotApi;
use crate::interface::dispatcher::Dispatcher;
use crate::interface::health;

/// 应用启动器
pub struct ApplicationBootstrap;

impl ApplicationBootstrap {
    /// 运行应用的主入口点
    pub async fn run(config: &'static AppConfig) -> Result<()> {
        if config.bot.token.is_empty() {
            bail!("bot token is not configured (set BOT_TOKEN or [bot].token)");
        }

        let api = Arc::new(TelegramBotApi::new(&config.bot.api_base, &config.bot.token)?);
        let spool = SpoolDir::new(&config.spool.dir)?;
        let dispatcher = Dispatcher::new(api, spool, config);

        // 存活探针独立于迁移状态运行
        let server_cfg = config.server.clone();
        tokio::spawn(async move {
            if let Err(err) = health::serve(&server_cfg).await {
                tracing::error!(error = %err, "health endpoint stopped");
            }
        });

        info!("channel migrator starting");

        tokio::select! {
            result = dispatcher.run() => {
                if let Err(err) = result {
                    tracing::error!(error = %err, "dispatcher stopped unexpectedly");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
            }
        }

        info!("channel migrator stopped");
        Ok(())
    }
}
