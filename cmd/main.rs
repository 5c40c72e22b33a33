use anyhow::Result;
use channel_migrator::logging::init_tracing_from_config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = channel_migrator::load_config(None);

    // 从配置初始化日志系统
    init_tracing_from_config(Some(&config.logging));

    // 创建应用并启动
    channel_migrator::ApplicationBootstrap::run(config).await
}
