//! 应用层：参数收集状态机与转发引擎

pub mod dialogue;
pub mod engine;
pub mod progress;
pub mod reports;
