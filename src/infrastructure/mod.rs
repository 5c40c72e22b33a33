//! 基础设施层：Bot API 适配器、限速器、临时文件暂存

pub mod spool;
pub mod telegram;
pub mod throttle;
