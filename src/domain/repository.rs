//! 领域端口定义
//!
//! 频道客户端与限速器都是外部协作者，以 trait 形式注入，
//! 便于在测试中用内存实现替换。

use async_trait::async_trait;

use crate::error::Result;

/// 暂存副本的内容分类
///
/// 内容类型只有在取回转发副本后才可知，因此转发引擎先
/// forward-to-self 再分发。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentKind {
    Video { file_id: String },
    Document { file_id: String },
    Other,
}

/// forward-to-self 取回的暂存副本
#[derive(Clone, Debug)]
pub struct StagedMessage {
    /// 暂存上下文中的消息 ID（用于清理）
    pub message_id: i64,
    /// 原始标题（无标题时为空串）
    pub caption: String,
    pub content: ContentKind,
}

/// 频道客户端端口（平台 RPC 语义的抽象）
///
/// 所有调用都可能以平台瞬时错误失败。
#[async_trait]
pub trait ChannelClient: Send + Sync {
    /// 将源消息转发到暂存上下文并取回副本
    async fn forward_to_self(
        &self,
        staging_chat: i64,
        from_chat: i64,
        message_id: i64,
    ) -> Result<StagedMessage>;

    /// 以视频形式重发，返回目标侧消息 ID
    async fn send_video(&self, chat: i64, file_id: &str, caption: &str) -> Result<i64>;

    /// 以文档形式重发，返回目标侧消息 ID
    async fn send_document(&self, chat: i64, file_id: &str, caption: &str) -> Result<i64>;

    /// 平台原生复制（保留原始格式），返回目标侧消息 ID
    async fn copy_message(&self, chat: i64, from_chat: i64, message_id: i64) -> Result<i64>;

    async fn delete_message(&self, chat: i64, message_id: i64) -> Result<()>;

    async fn send_message(&self, chat: i64, text: &str) -> Result<i64>;

    async fn edit_message_text(&self, chat: i64, message_id: i64, text: &str) -> Result<()>;

    /// 下载一份上传的文档（规则文件）
    async fn download_document(&self, file_id: &str) -> Result<Vec<u8>>;

    /// 上传文档工件（报告文件）
    async fn upload_document(
        &self,
        chat: i64,
        payload: Vec<u8>,
        file_name: &str,
        caption: &str,
    ) -> Result<i64>;
}

pub type ChannelClientRef = std::sync::Arc<dyn ChannelClient>;

/// 限速端口
///
/// 延迟策略从引擎中剥离出来，生产实现按固定间隔休眠，
/// 测试实现不做真实等待。
#[async_trait]
pub trait Throttle: Send + Sync {
    /// 媒体（视频/文档）重发后的长延迟
    async fn after_media(&self);

    /// 每步之间的基础延迟
    async fn between_steps(&self);
}

pub type ThrottleRef = std::sync::Arc<dyn Throttle>;
