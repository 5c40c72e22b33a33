//! 转发与索引引擎
//!
//! 拿到完整迁移计划后，按 ID 升序逐条迁移：forward-to-self 取暂存副本、
//! 改写标题、按内容类型重发、登记对应关系、解析索引规则。单步失败只记
//! 日志并跳过，循环始终走到 `end_id`，结束后固定产出两个报告工件。
//!
//! 引擎是单个协作式任务，循环内不存在并发；对应关系与规则解析的顺序
//! 因此是确定的。

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::application::progress::{ProgressGate, render_progress};
use crate::application::reports::{
    INDEX_CAPTION, INDEX_FILE_NAME, MAPPING_CAPTION, MAPPING_FILE_NAME, render_index_results,
    render_mapping,
};
use crate::domain::repository::{ChannelClientRef, ContentKind, ThrottleRef};
use crate::domain::session::{Correspondence, MigrationPlan};
use crate::domain::{caption, rules::IndexRule};
use crate::error::Result;
use crate::infrastructure::spool::SpoolDir;

/// 引擎可调参数
#[derive(Clone, Debug)]
pub struct EngineOptions {
    /// 进度消息编辑的最小墙钟间隔
    pub progress_floor: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            progress_floor: Duration::from_secs(10),
        }
    }
}

/// 一次迁移运行的汇总结果
#[derive(Debug)]
pub struct MigrationOutcome {
    pub total: u64,
    /// 已处理步数（含失败步）
    pub done: u64,
    pub correspondences: Vec<Correspondence>,
    pub rules: Vec<IndexRule>,
}

/// 转发引擎
pub struct ForwardingEngine {
    client: ChannelClientRef,
    throttle: ThrottleRef,
    spool: SpoolDir,
    options: EngineOptions,
}

/// 单步成功后的观测值
struct StepOutcome {
    staged_message_id: i64,
    original_caption: String,
    new_message_id: i64,
}

impl ForwardingEngine {
    pub fn new(
        client: ChannelClientRef,
        throttle: ThrottleRef,
        spool: SpoolDir,
        options: EngineOptions,
    ) -> Self {
        Self {
            client,
            throttle,
            spool,
            options,
        }
    }

    /// 执行一次完整迁移
    ///
    /// `operator_chat` 既是进度消息的归属，也充当 forward-to-self 的
    /// 暂存上下文。
    pub async fn run(&self, mut plan: MigrationPlan, operator_chat: i64) -> Result<MigrationOutcome> {
        let total = plan.total();
        let mut done: u64 = 0;
        let mut correspondences: Vec<Correspondence> = Vec::new();

        info!(
            source = plan.source.api_id(),
            target = plan.target.api_id(),
            start_id = plan.start_id,
            end_id = plan.end_id,
            total,
            rules = plan.rules.len(),
            "starting migration run"
        );

        let progress_message_id = self.client.send_message(operator_chat, "Starting...").await?;
        let mut gate = ProgressGate::new(self.options.progress_floor);

        for current_id in plan.start_id..=plan.end_id {
            match self.step(&plan, operator_chat, current_id).await {
                Ok(outcome) => {
                    correspondences.push(Correspondence {
                        source_link: plan.source.message_link(current_id),
                        target_link: plan.target.message_link(outcome.new_message_id),
                    });

                    // 用原始标题解析索引规则；一条消息可命中多条规则
                    for rule in plan.rules.iter_mut() {
                        if rule.try_resolve(&outcome.original_caption, outcome.new_message_id) {
                            debug!(
                                keyword = %rule.keyword,
                                new_message_id = outcome.new_message_id,
                                "index rule resolved"
                            );
                        }
                    }

                    self.throttle.between_steps().await;

                    // 暂存副本只为内容分类而存在，用完即删
                    if let Err(err) = self
                        .client
                        .delete_message(operator_chat, outcome.staged_message_id)
                        .await
                    {
                        warn!(message_id = current_id, error = %err, "failed to delete staging copy");
                    }
                }
                Err(err) => {
                    // 失败的消息不留对应关系、不解析规则，但计入进度
                    warn!(message_id = current_id, error = %err, "migration step failed");
                }
            }

            done += 1;

            if gate.should_update() {
                if let Err(err) = self
                    .client
                    .edit_message_text(
                        operator_chat,
                        progress_message_id,
                        &render_progress(done, total),
                    )
                    .await
                {
                    debug!(error = %err, "progress update failed");
                }
            }
        }

        // 收尾时无条件把进度条推到终值
        if let Err(err) = self
            .client
            .edit_message_text(
                operator_chat,
                progress_message_id,
                &render_progress(done, total),
            )
            .await
        {
            debug!(error = %err, "final progress update failed");
        }

        self.finalize(&plan, operator_chat, &correspondences).await;

        info!(
            done,
            total,
            migrated = correspondences.len(),
            "migration run finished"
        );

        Ok(MigrationOutcome {
            total,
            done,
            correspondences,
            rules: plan.rules,
        })
    }

    /// 迁移单条消息
    async fn step(
        &self,
        plan: &MigrationPlan,
        operator_chat: i64,
        current_id: i64,
    ) -> Result<StepOutcome> {
        let staged = self
            .client
            .forward_to_self(operator_chat, plan.source.api_id(), current_id)
            .await?;

        let transformed = caption::strip_chapter_tag(&staged.caption);
        let formatted = caption::format_caption(&transformed);

        let new_message_id = match &staged.content {
            ContentKind::Video { file_id } => {
                let id = self
                    .client
                    .send_video(plan.target.api_id(), file_id, &formatted)
                    .await?;
                self.throttle.after_media().await;
                id
            }
            ContentKind::Document { file_id } => {
                let id = self
                    .client
                    .send_document(plan.target.api_id(), file_id, &formatted)
                    .await?;
                self.throttle.after_media().await;
                id
            }
            // 其余内容走平台原生复制，保留原始格式
            ContentKind::Other => {
                self.client
                    .copy_message(plan.target.api_id(), plan.source.api_id(), current_id)
                    .await?
            }
        };

        Ok(StepOutcome {
            staged_message_id: staged.message_id,
            original_caption: staged.caption,
            new_message_id,
        })
    }

    /// 产出两个报告工件；任一工件失败只影响自身
    async fn finalize(
        &self,
        plan: &MigrationPlan,
        operator_chat: i64,
        correspondences: &[Correspondence],
    ) {
        let mapping = render_mapping(correspondences);
        if let Err(err) = self
            .upload_artifact(operator_chat, MAPPING_FILE_NAME, MAPPING_CAPTION, &mapping)
            .await
        {
            warn!(error = %err, "failed to upload message id mapping");
            self.notify(operator_chat, "Failed to upload message ID mapping file.")
                .await;
        }

        let index_results = render_index_results(&plan.rules, &plan.target);
        if let Err(err) = self
            .upload_artifact(operator_chat, INDEX_FILE_NAME, INDEX_CAPTION, &index_results)
            .await
        {
            warn!(error = %err, "failed to upload index results");
            self.notify(operator_chat, "Failed to upload index results file.")
                .await;
        }
    }

    /// 经由暂存文件上传一个文本工件（获取与释放都在本步骤内完成）
    async fn upload_artifact(
        &self,
        chat: i64,
        file_name: &str,
        caption: &str,
        content: &str,
    ) -> anyhow::Result<()> {
        // 暂存目录被所有迁移任务共用，落盘名带上操作者 chat 以免并发运行互相覆盖
        let spool_name = format!("{chat}_{file_name}");
        let spool_file = self.spool.write(&spool_name, content.as_bytes()).await?;
        let payload = spool_file.read().await;
        let result = match payload {
            Ok(payload) => self
                .client
                .upload_document(chat, payload, file_name, caption)
                .await
                .map(|_| ())
                .map_err(anyhow::Error::from),
            Err(err) => Err(err),
        };
        spool_file.remove().await;
        result
    }

    async fn notify(&self, chat: i64, text: &str) {
        if let Err(err) = self.client.send_message(chat, text).await {
            warn!(error = %err, "failed to notify operator");
        }
    }
}
