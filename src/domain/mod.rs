//! 领域层：链接、索引规则、标题改写、会话状态与外部端口

pub mod caption;
pub mod link;
pub mod repository;
pub mod rules;
pub mod session;
