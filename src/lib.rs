//! 频道迁移服务
//!
//! 把一个频道的连续消息区间迁移到另一个频道：改写标题、
//! 建立源->目标消息对应表、按规则解析章节索引。
//! 参数通过四阶段对话收集，迁移由顺序转发引擎执行。

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interface;
pub mod logging;
pub mod server;

pub use config::{AppConfig, load_config};
pub use error::{MigrateError, Result};
pub use server::ApplicationBootstrap;
