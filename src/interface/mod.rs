//! 接口层：更新调度与存活探针

pub mod dispatcher;
pub mod health;
