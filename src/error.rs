//! 统一异常处理模块

use thiserror::Error;

/// 迁移服务错误类型
#[derive(Debug, Error)]
pub enum MigrateError {
    /// 平台端错误（Bot API 返回 ok=false）
    #[error("Platform error: {0}")]
    Platform(String),

    /// 传输层错误（HTTP 请求失败）
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// 用户输入校验错误
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 本地文件操作错误
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrateError {
    /// 是否为平台侧的瞬时错误（单步可跳过，整体不中断）
    pub fn is_transient(&self) -> bool {
        matches!(self, MigrateError::Platform(_) | MigrateError::Transport(_))
    }
}

impl From<anyhow::Error> for MigrateError {
    fn from(err: anyhow::Error) -> Self {
        MigrateError::Platform(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
