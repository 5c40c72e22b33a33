//! 更新调度器
//!
//! 长轮询拉取更新，把命令与对话输入路由进状态机，执行声明式效果。
//! 规则文档在这里完成下载与暂存（获取、解析、释放都在本步骤内），
//! 状态机只看到文档内容。迁移任务以独立 tokio 任务运行。

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::application::dialogue::{self, DialogueInput, Effect};
use crate::application::engine::{EngineOptions, ForwardingEngine};
use crate::config::{AppConfig, ThrottleConfig};
use crate::domain::repository::{ChannelClient, ChannelClientRef, ThrottleRef};
use crate::domain::session::{MigrationPlan, SessionStore, SetupStage};
use crate::error::Result;
use crate::infrastructure::spool::SpoolDir;
use crate::infrastructure::telegram::{IncomingMessage, TelegramBotApi};
use crate::infrastructure::throttle::FixedDelayThrottle;

const GREETING: &str = "Hello! Use /now to start forwarding with indexing.";

/// 更新调度器
pub struct Dispatcher {
    api: Arc<TelegramBotApi>,
    sessions: SessionStore,
    spool: SpoolDir,
    throttle_cfg: ThrottleConfig,
    poll_timeout_secs: u64,
}

impl Dispatcher {
    pub fn new(api: Arc<TelegramBotApi>, spool: SpoolDir, config: &AppConfig) -> Self {
        Self {
            api,
            sessions: SessionStore::new(),
            spool,
            throttle_cfg: config.throttle.clone(),
            poll_timeout_secs: config.bot.poll_timeout_secs,
        }
    }

    /// 轮询主循环
    pub async fn run(&self) -> Result<()> {
        let mut offset: i64 = 0;
        info!("update dispatcher started");

        loop {
            match self.api.get_updates(offset, self.poll_timeout_secs).await {
                Ok(updates) => {
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        if let Some(message) = update.message {
                            self.handle_message(message).await;
                        }
                    }
                }
                Err(err) => {
                    warn!(error = %err, "getUpdates failed, backing off");
                    tokio::time::sleep(Duration::from_secs(3)).await;
                }
            }
        }
    }

    async fn handle_message(&self, message: IncomingMessage) {
        let chat_id = message.chat.id;
        let text = message.text.as_deref().unwrap_or("");
        let command = text.split_whitespace().next().unwrap_or("");

        match command {
            "/start" => {
                self.reply(chat_id, GREETING).await;
                return;
            }
            "/now" => {
                // 对话入口：创建全新会话，丢弃未完成的旧会话
                if let Some(previous) = self.sessions.get(chat_id) {
                    info!(
                        chat_id,
                        stage = ?previous.stage,
                        age_secs = (Utc::now() - previous.created_at).num_seconds(),
                        "replacing unfinished dialogue"
                    );
                }
                self.sessions.begin(chat_id);
                self.reply(chat_id, dialogue::PROMPT_START_LINK).await;
                return;
            }
            "/cancel" => {
                if let Some(session) = self.sessions.get(chat_id) {
                    let transition = dialogue::advance(session, DialogueInput::Cancel);
                    self.apply_transition(chat_id, transition).await;
                } else {
                    debug!(chat_id, "cancel outside of a dialogue, ignoring");
                }
                return;
            }
            _ => {}
        }

        // 非对话消息直接忽略
        let Some(session) = self.sessions.get(chat_id) else {
            return;
        };

        // 规则阶段的文档先落地暂存、读出内容，再交给状态机
        if session.stage == SetupStage::AwaitRules {
            if let Some(document) = &message.document {
                let file_name = document.file_name.clone().unwrap_or_default();
                if !file_name.ends_with(".txt") {
                    let transition = dialogue::advance(
                        session,
                        DialogueInput::Document {
                            file_name: &file_name,
                            content: "",
                        },
                    );
                    self.apply_transition(chat_id, transition).await;
                    return;
                }

                let content = match self
                    .fetch_rules_document(&document.file_id, message.message_id)
                    .await
                {
                    Ok(content) => content,
                    Err(err) => {
                        error!(error = %err, "failed to fetch rules document");
                        self.reply(chat_id, "Failed to process the uploaded file. Please try again.")
                            .await;
                        return;
                    }
                };

                let transition = dialogue::advance(
                    session,
                    DialogueInput::Document {
                        file_name: &file_name,
                        content: &content,
                    },
                );
                self.apply_transition(chat_id, transition).await;
                return;
            }
        }

        let transition = dialogue::advance(session, DialogueInput::Text(text));
        self.apply_transition(chat_id, transition).await;
    }

    /// 下载规则文档到暂存文件并读出内容；文件无论成败都被释放
    async fn fetch_rules_document(&self, file_id: &str, message_id: i64) -> anyhow::Result<String> {
        let payload = self.api.download_document(file_id).await?;
        let spool_file = self
            .spool
            .write(&format!("index_rules_{message_id}.txt"), &payload)
            .await?;
        let content = spool_file.read_to_string().await;
        spool_file.remove().await;
        content
    }

    async fn apply_transition(&self, chat_id: i64, transition: dialogue::Transition) {
        match transition.session {
            Some(session) => self.sessions.put(chat_id, session),
            None => self.sessions.end(chat_id),
        }

        for effect in transition.effects {
            match effect {
                Effect::Reply(text) => self.reply(chat_id, &text).await,
                Effect::StartMigration(plan) => self.spawn_migration(chat_id, plan),
            }
        }
    }

    /// 以受监督的独立任务运行迁移
    fn spawn_migration(&self, chat_id: i64, plan: MigrationPlan) {
        let client: ChannelClientRef = self.api.clone();
        let throttle: ThrottleRef = Arc::new(FixedDelayThrottle::from_config(&self.throttle_cfg));
        let options = EngineOptions {
            progress_floor: Duration::from_secs(self.throttle_cfg.progress_floor_secs),
        };
        let engine = ForwardingEngine::new(client, throttle, self.spool.clone(), options);

        tokio::spawn(async move {
            match engine.run(plan, chat_id).await {
                Ok(outcome) => {
                    info!(
                        chat_id,
                        done = outcome.done,
                        migrated = outcome.correspondences.len(),
                        "migration task finished"
                    );
                }
                Err(err) => {
                    error!(chat_id, error = %err, "migration task failed");
                }
            }
        });
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(err) = self.api.send_message(chat_id, text).await {
            warn!(chat_id, error = %err, "failed to send reply");
        }
    }
}
