//! 参数收集状态机
//!
//! 严格串行的四阶段对话，逐步填充会话草稿。转移函数是纯函数：
//! `(会话, 输入) -> (新会话, 效果)`，效果以声明方式描述（回复文本、
//! 启动迁移），由调度器统一执行，状态机本身不触网。
//!
//! 任何校验失败都以重新提示收场，对话只会因显式取消或成功完成而终止。

use crate::domain::link::{ChannelId, MessageLink};
use crate::domain::rules::parse_rules;
use crate::domain::session::{DialogueSession, MigrationPlan, SetupStage};

/// 对话输入
#[derive(Debug)]
pub enum DialogueInput<'a> {
    /// 自由文本（非命令）
    Text(&'a str),
    /// 已下载的规则文档内容
    Document { file_name: &'a str, content: &'a str },
    /// 显式取消信号（/cancel）
    Cancel,
}

/// 声明式效果，由调度器执行
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    Reply(String),
    StartMigration(MigrationPlan),
}

/// 转移结果：`session` 为 None 表示对话进入终态
#[derive(Debug)]
pub struct Transition {
    pub session: Option<DialogueSession>,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn stay(session: DialogueSession, reply: impl Into<String>) -> Self {
        Self {
            session: Some(session),
            effects: vec![Effect::Reply(reply.into())],
        }
    }

    fn terminal(effects: Vec<Effect>) -> Self {
        Self {
            session: None,
            effects,
        }
    }
}

pub const PROMPT_START_LINK: &str =
    "Send the starting message link (e.g., https://t.me/c/123456789/2)";
pub const PROMPT_END_LINK: &str = "Send the ending message link.";
pub const PROMPT_TARGET: &str = "Send the target channel ID (e.g., -1001234567890)";
pub const PROMPT_RULES: &str = "Please upload a .txt file containing index rules, one per line in this format:\n\
     Ch - 01 : Mole Concept >> chapterId\n\
     Homework Discussion >> chapterId\n\
     PYQ Practice Sheet || Only PDF >> ChapterId\n\
     Mind Maps || Only PDF >> chapterId";

/// 执行一次状态转移
pub fn advance(mut session: DialogueSession, input: DialogueInput<'_>) -> Transition {
    if matches!(input, DialogueInput::Cancel) {
        return Transition::terminal(vec![Effect::Reply("Cancelled.".to_string())]);
    }

    match session.stage {
        SetupStage::AwaitStartLink => {
            let DialogueInput::Text(text) = input else {
                return Transition::stay(session, "Invalid link format. Try again.");
            };
            match MessageLink::parse(text) {
                Ok(link) => {
                    session.draft.source = Some(link.channel);
                    session.draft.start_id = Some(link.message_id);
                    session.stage = SetupStage::AwaitEndLink;
                    Transition::stay(session, PROMPT_END_LINK)
                }
                Err(_) => Transition::stay(session, "Invalid link format. Try again."),
            }
        }

        SetupStage::AwaitEndLink => {
            let DialogueInput::Text(text) = input else {
                return Transition::stay(session, "Invalid link or different channel.");
            };
            let link = match MessageLink::parse(text) {
                Ok(link) => link,
                Err(_) => {
                    return Transition::stay(session, "Invalid link or different channel.");
                }
            };
            // 结束链接必须指向与起始链接相同的频道
            if session.draft.source.as_ref() != Some(&link.channel) {
                return Transition::stay(session, "Invalid link or different channel.");
            }
            if Some(link.message_id) < session.draft.start_id {
                return Transition::stay(session, "End ID must be >= Start ID.");
            }
            session.draft.end_id = Some(link.message_id);
            session.stage = SetupStage::AwaitTarget;
            Transition::stay(session, PROMPT_TARGET)
        }

        SetupStage::AwaitTarget => {
            let DialogueInput::Text(text) = input else {
                return Transition::stay(session, "Invalid channel ID.");
            };
            match ChannelId::parse(text) {
                Ok(target) => {
                    session.draft.target = Some(target);
                    session.stage = SetupStage::AwaitRules;
                    Transition::stay(session, PROMPT_RULES)
                }
                Err(_) => Transition::stay(session, "Invalid channel ID."),
            }
        }

        SetupStage::AwaitRules => {
            let DialogueInput::Document { file_name, content } = input else {
                return Transition::stay(
                    session,
                    "Please upload a valid .txt file containing index rules.",
                );
            };
            if !file_name.ends_with(".txt") {
                return Transition::stay(
                    session,
                    "Please upload a valid .txt file containing index rules.",
                );
            }
            let rules = parse_rules(content);
            if rules.is_empty() {
                return Transition::stay(
                    session,
                    "No valid rules found in the file. Please upload a valid .txt file.",
                );
            }
            session.draft.rules = rules;
            match session.draft.into_plan() {
                Some(plan) => Transition::terminal(vec![
                    Effect::Reply(
                        "Index rules processed successfully. Starting forwarding with indexing..."
                            .to_string(),
                    ),
                    Effect::StartMigration(plan),
                ]),
                // 草稿不完整说明阶段顺序被破坏，重新开始对话
                None => Transition::terminal(vec![Effect::Reply(
                    "Session is incomplete, please start over with /now.".to_string(),
                )]),
            }
        }
    }
}
