//! 迁移会话领域模型
//!
//! 一次迁移的全部状态都在内存中：对话阶段、逐步收集的参数草稿、
//! 校验完成后的迁移计划。进程级会话表以操作者 chat ID 为键，
//! 对话开始时显式创建，`DONE`/`CANCELLED` 时显式销毁，不做持久化。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use super::link::ChannelId;
use super::rules::IndexRule;

/// 对话阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupStage {
    AwaitStartLink,
    AwaitEndLink,
    AwaitTarget,
    AwaitRules,
}

/// 参数草稿：对话过程中逐阶段填充
#[derive(Clone, Debug, Default)]
pub struct SessionDraft {
    pub source: Option<ChannelId>,
    pub start_id: Option<i64>,
    pub end_id: Option<i64>,
    pub target: Option<ChannelId>,
    pub rules: Vec<IndexRule>,
}

impl SessionDraft {
    /// 草稿完整时产出迁移计划
    pub fn into_plan(self) -> Option<MigrationPlan> {
        let source = self.source?;
        let start_id = self.start_id?;
        let end_id = self.end_id?;
        let target = self.target?;
        if self.rules.is_empty() || end_id < start_id {
            return None;
        }
        Some(MigrationPlan {
            source,
            start_id,
            end_id,
            target,
            rules: self.rules,
        })
    }
}

/// 校验完成的迁移计划（转发引擎的输入）
#[derive(Clone, Debug, PartialEq)]
pub struct MigrationPlan {
    pub source: ChannelId,
    /// 起止消息 ID，闭区间，`end_id >= start_id`
    pub start_id: i64,
    pub end_id: i64,
    pub target: ChannelId,
    pub rules: Vec<IndexRule>,
}

impl MigrationPlan {
    pub fn total(&self) -> u64 {
        (self.end_id - self.start_id + 1) as u64
    }
}

/// 一条源->目标消息对应关系
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Correspondence {
    pub source_link: String,
    pub target_link: String,
}

impl Correspondence {
    /// 报告文件中的行格式
    pub fn render(&self) -> String {
        format!("{} = {}", self.source_link, self.target_link)
    }
}

/// 进行中的对话会话
#[derive(Clone, Debug)]
pub struct DialogueSession {
    pub stage: SetupStage,
    pub draft: SessionDraft,
    pub created_at: DateTime<Utc>,
}

impl DialogueSession {
    pub fn new() -> Self {
        Self {
            stage: SetupStage::AwaitStartLink,
            draft: SessionDraft::default(),
            created_at: Utc::now(),
        }
    }
}

impl Default for DialogueSession {
    fn default() -> Self {
        Self::new()
    }
}

/// 进程级会话表，键为操作者 chat ID
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<i64, DialogueSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 对话入口：为操作者创建全新会话（覆盖旧会话）
    pub fn begin(&self, chat_id: i64) {
        self.inner.insert(chat_id, DialogueSession::new());
    }

    pub fn get(&self, chat_id: i64) -> Option<DialogueSession> {
        self.inner.get(&chat_id).map(|entry| entry.clone())
    }

    pub fn put(&self, chat_id: i64, session: DialogueSession) {
        self.inner.insert(chat_id, session);
    }

    /// 终态（DONE/CANCELLED）：显式销毁会话
    pub fn end(&self, chat_id: i64) {
        self.inner.remove(&chat_id);
    }

    pub fn contains(&self, chat_id: i64) -> bool {
        self.inner.contains_key(&chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::link::MessageLink;

    fn draft_with_range(start: i64, end: i64) -> SessionDraft {
        let link = MessageLink::parse("https://t.me/c/123456789/1").unwrap();
        SessionDraft {
            source: Some(link.channel),
            start_id: Some(start),
            end_id: Some(end),
            target: Some(ChannelId::parse("-1009876543210").unwrap()),
            rules: vec![IndexRule::new("k", "t")],
        }
    }

    #[test]
    fn complete_draft_becomes_plan() {
        let plan = draft_with_range(10, 12).into_plan().unwrap();
        assert_eq!(plan.total(), 3);
        assert_eq!(plan.source.api_id(), -100123456789);
    }

    #[test]
    fn single_message_range_is_valid() {
        let plan = draft_with_range(5, 5).into_plan().unwrap();
        assert_eq!(plan.total(), 1);
    }

    #[test]
    fn incomplete_or_inverted_draft_yields_no_plan() {
        assert!(SessionDraft::default().into_plan().is_none());
        assert!(draft_with_range(10, 9).into_plan().is_none());

        let mut no_rules = draft_with_range(1, 2);
        no_rules.rules.clear();
        assert!(no_rules.into_plan().is_none());
    }

    #[test]
    fn session_records_creation_time() {
        let before = Utc::now();
        let session = DialogueSession::new();
        assert!(session.created_at >= before);
        assert!((Utc::now() - session.created_at).num_seconds() >= 0);
    }

    #[test]
    fn session_store_lifecycle() {
        let store = SessionStore::new();
        assert!(!store.contains(7));

        store.begin(7);
        assert!(store.contains(7));
        assert_eq!(store.get(7).unwrap().stage, SetupStage::AwaitStartLink);

        store.end(7);
        assert!(!store.contains(7));
    }
}
