//! 频道与消息链接值对象
//!
//! 私有频道的消息链接形如 `https://t.me/c/<channelDigits>/<messageDigits>`。
//! 频道 ID 同时保留两种形态：裸数字串用于重建人类可读链接，
//! `-100` 前缀形态用于 Bot API 调用。

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MigrateError, Result};

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https://t\.me/c/(\d+)/(\d+)$").expect("link pattern"));

static CHANNEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-100(\d+)$").expect("channel pattern"));

/// 频道标识（双形态）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelId {
    raw_id: String,
}

impl ChannelId {
    /// 从 `-100<digits>` 形态解析目标频道标识
    pub fn parse(text: &str) -> Result<Self> {
        let caps = CHANNEL_RE
            .captures(text.trim())
            .ok_or_else(|| MigrateError::InvalidInput(format!("invalid channel id: {text}")))?;
        Self::from_raw(caps[1].to_string())
    }

    /// 解析时即校验 `-100` 前缀形态可装入 i64
    fn from_raw(raw_id: String) -> Result<Self> {
        format!("-100{raw_id}")
            .parse::<i64>()
            .map_err(|_| MigrateError::InvalidInput(format!("channel id out of range: {raw_id}")))?;
        Ok(Self { raw_id })
    }

    /// 链接重建用的裸数字形态
    pub fn raw_id(&self) -> &str {
        &self.raw_id
    }

    /// Bot API 调用用的 `-100` 前缀形态
    pub fn api_id(&self) -> i64 {
        format!("-100{}", self.raw_id)
            .parse()
            .expect("channel digits fit in i64")
    }

    /// 重建指定消息的人类可读链接
    pub fn message_link(&self, message_id: i64) -> String {
        format!("https://t.me/c/{}/{}", self.raw_id, message_id)
    }
}

/// 一条消息的链接（频道 + 消息 ID）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageLink {
    pub channel: ChannelId,
    pub message_id: i64,
}

impl MessageLink {
    /// 解析 `https://t.me/c/<digits>/<digits>` 形态的链接
    pub fn parse(text: &str) -> Result<Self> {
        let caps = LINK_RE
            .captures(text.trim())
            .ok_or_else(|| MigrateError::InvalidInput(format!("invalid message link: {text}")))?;
        let message_id = caps[2]
            .parse::<i64>()
            .map_err(|_| MigrateError::InvalidInput(format!("message id out of range: {text}")))?;
        Ok(Self {
            channel: ChannelId::from_raw(caps[1].to_string())?,
            message_id,
        })
    }
}

impl fmt::Display for MessageLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.channel.message_link(self.message_id))
    }
}
