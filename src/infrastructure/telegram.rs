//! Telegram Bot API 适配器
//!
//! 频道客户端端口的生产实现：JSON 方法走 `bot<token>/<method>`，
//! 文件上传走 multipart，规则文档经 `getFile` 下载。
//! 平台返回 `ok=false` 时映射为 `MigrateError::Platform`。

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::repository::{ChannelClient, ContentKind, StagedMessage};
use crate::error::{MigrateError, Result};

/// Bot API 客户端
#[derive(Clone)]
pub struct TelegramBotApi {
    http: Client,
    api_base: String,
    token: String,
}

/// Bot API 统一响应包络
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// 入站更新
#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<IncomingMessage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TgVideo {
    pub file_id: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TgDocument {
    pub file_id: String,
    pub file_name: Option<String>,
}

/// 入站/转发结果消息（只取本服务关心的字段）
#[derive(Clone, Debug, Deserialize)]
pub struct IncomingMessage {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub video: Option<TgVideo>,
    pub document: Option<TgDocument>,
}

/// copyMessage 只返回新消息 ID
#[derive(Debug, Deserialize)]
struct MessageRef {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct TgFile {
    file_path: Option<String>,
}

#[derive(Serialize)]
struct ForwardParams {
    chat_id: i64,
    from_chat_id: i64,
    message_id: i64,
    disable_notification: bool,
}

#[derive(Serialize)]
struct SendMediaParams<'a> {
    chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    video: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'a str>,
}

impl TelegramBotApi {
    pub fn new(api_base: &str, token: &str) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .build()
            .map_err(MigrateError::Transport)?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// 调用一个 JSON 方法并解包响应
    async fn call<T: DeserializeOwned>(&self, method: &str, params: &impl Serialize) -> Result<T> {
        let response = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?;
        let envelope: ApiResponse<T> = response.json().await?;
        Self::unwrap_envelope(method, envelope)
    }

    fn unwrap_envelope<T>(method: &str, envelope: ApiResponse<T>) -> Result<T> {
        if envelope.ok {
            envelope
                .result
                .ok_or_else(|| MigrateError::Platform(format!("{method}: empty result")))
        } else {
            let description = envelope
                .description
                .unwrap_or_else(|| "unknown platform error".to_string());
            Err(MigrateError::Platform(format!("{method}: {description}")))
        }
    }

    /// 长轮询拉取更新
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &serde_json::json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

#[async_trait::async_trait]
impl ChannelClient for TelegramBotApi {
    async fn forward_to_self(
        &self,
        staging_chat: i64,
        from_chat: i64,
        message_id: i64,
    ) -> Result<StagedMessage> {
        let msg: IncomingMessage = self
            .call(
                "forwardMessage",
                &ForwardParams {
                    chat_id: staging_chat,
                    from_chat_id: from_chat,
                    message_id,
                    disable_notification: true,
                },
            )
            .await?;

        let content = if let Some(video) = msg.video {
            ContentKind::Video {
                file_id: video.file_id,
            }
        } else if let Some(document) = msg.document {
            ContentKind::Document {
                file_id: document.file_id,
            }
        } else {
            ContentKind::Other
        };

        Ok(StagedMessage {
            message_id: msg.message_id,
            caption: msg.caption.unwrap_or_default(),
            content,
        })
    }

    async fn send_video(&self, chat: i64, file_id: &str, caption: &str) -> Result<i64> {
        let msg: IncomingMessage = self
            .call(
                "sendVideo",
                &SendMediaParams {
                    chat_id: chat,
                    video: Some(file_id),
                    document: None,
                    caption: (!caption.is_empty()).then_some(caption),
                    parse_mode: Some("HTML"),
                },
            )
            .await?;
        Ok(msg.message_id)
    }

    async fn send_document(&self, chat: i64, file_id: &str, caption: &str) -> Result<i64> {
        let msg: IncomingMessage = self
            .call(
                "sendDocument",
                &SendMediaParams {
                    chat_id: chat,
                    video: None,
                    document: Some(file_id),
                    caption: (!caption.is_empty()).then_some(caption),
                    parse_mode: Some("HTML"),
                },
            )
            .await?;
        Ok(msg.message_id)
    }

    async fn copy_message(&self, chat: i64, from_chat: i64, message_id: i64) -> Result<i64> {
        let copied: MessageRef = self
            .call(
                "copyMessage",
                &serde_json::json!({
                    "chat_id": chat,
                    "from_chat_id": from_chat,
                    "message_id": message_id,
                }),
            )
            .await?;
        Ok(copied.message_id)
    }

    async fn delete_message(&self, chat: i64, message_id: i64) -> Result<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                &serde_json::json!({ "chat_id": chat, "message_id": message_id }),
            )
            .await?;
        Ok(())
    }

    async fn send_message(&self, chat: i64, text: &str) -> Result<i64> {
        let msg: IncomingMessage = self
            .call(
                "sendMessage",
                &serde_json::json!({ "chat_id": chat, "text": text }),
            )
            .await?;
        Ok(msg.message_id)
    }

    async fn edit_message_text(&self, chat: i64, message_id: i64, text: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &serde_json::json!({
                    "chat_id": chat,
                    "message_id": message_id,
                    "text": text,
                }),
            )
            .await?;
        Ok(())
    }

    async fn download_document(&self, file_id: &str) -> Result<Vec<u8>> {
        let file: TgFile = self
            .call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await?;
        let file_path = file
            .file_path
            .ok_or_else(|| MigrateError::Platform("getFile: no file_path".to_string()))?;

        let url = format!("{}/file/bot{}/{}", self.api_base, self.token, file_path);
        debug!(%file_path, "downloading document");
        let bytes = self.http.get(url).send().await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn upload_document(
        &self,
        chat: i64,
        payload: Vec<u8>,
        file_name: &str,
        caption: &str,
    ) -> Result<i64> {
        let part = reqwest::multipart::Part::bytes(payload).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        let response = self
            .http
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        let envelope: ApiResponse<IncomingMessage> = response.json().await?;
        let msg = Self::unwrap_envelope("sendDocument", envelope)?;
        Ok(msg.message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_update_with_document() {
        let json = r#"{
            "update_id": 42,
            "message": {
                "message_id": 7,
                "chat": { "id": 1234 },
                "document": { "file_id": "abc", "file_name": "rules.txt" }
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.update_id, 42);
        let msg = update.message.unwrap();
        assert_eq!(msg.chat.id, 1234);
        assert_eq!(msg.document.unwrap().file_name.as_deref(), Some("rules.txt"));
        assert!(msg.video.is_none());
    }

    #[test]
    fn error_envelope_maps_to_platform_error() {
        let envelope: ApiResponse<bool> = serde_json::from_str(
            r#"{ "ok": false, "description": "Bad Request: message not found" }"#,
        )
        .unwrap();
        let err = TelegramBotApi::unwrap_envelope("forwardMessage", envelope).unwrap_err();
        assert!(matches!(err, MigrateError::Platform(_)));
        assert!(err.is_transient());
        assert!(err.to_string().contains("message not found"));
    }

    #[test]
    fn ok_envelope_unwraps_result() {
        let envelope: ApiResponse<bool> =
            serde_json::from_str(r#"{ "ok": true, "result": true }"#).unwrap();
        assert!(TelegramBotApi::unwrap_envelope("deleteMessage", envelope).unwrap());
    }
}
