//! 文件处理流程 - 流程层
//!
//! 核心职责：定义"一个文件"的完整导入流程
//!
//! 流程顺序：
//! 1. 解析文件 → 按批大小切分
//! 2. 逐批提交（失败按重试策略退避重试）
//! 3. 任一批重试耗尽 → 文件失败，剩余批次不再提交

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::{BatchEndpoint, ProcessBatchRequest, ProcessBatchResponse};
use crate::config::ImportConfig;
use crate::infrastructure::Sleeper;
use crate::models::{chunk_rows, ImportFile, RowDecoder};
use crate::services::RetryPolicy;
use crate::workflow::file_ctx::FileCtx;

/// 文件处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// 所有批次都已被端点接受
    Completed { rows: u64, warnings: Vec<String> },
    /// 解析失败或某一批重试耗尽
    Failed {
        rows_before_failure: u64,
        message: String,
        warnings: Vec<String>,
    },
}

/// 文件处理流程
///
/// - 只处理单个文件
/// - 不持有会话状态，进度通过回调交给编排层
pub struct FileFlow {
    endpoint: Arc<dyn BatchEndpoint>,
    decoder: Arc<dyn RowDecoder>,
    sleeper: Arc<dyn Sleeper>,
    batch_size: usize,
    retry_policy: RetryPolicy,
}

impl FileFlow {
    pub fn new(
        endpoint: Arc<dyn BatchEndpoint>,
        decoder: Arc<dyn RowDecoder>,
        sleeper: Arc<dyn Sleeper>,
        config: &ImportConfig,
    ) -> Self {
        Self {
            endpoint,
            decoder,
            sleeper,
            batch_size: config.batch_size.max(1),
            retry_policy: config.retry_policy.clone(),
        }
    }

    /// 导入一个文件
    ///
    /// # 参数
    /// - `file`: 已通过校验的文件
    /// - `ctx`: 文件上下文
    /// - `on_progress`: 每完成一批回调 `(已完成批数, 总批数)`，解析完成后先回调一次 `(0, 总批数)`
    pub async fn run<F>(&self, file: &ImportFile, ctx: &FileCtx, mut on_progress: F) -> FileOutcome
    where
        F: FnMut(usize, usize),
    {
        // ========== 步骤 1: 解析 ==========
        let rows = match self.decoder.decode(file).await {
            Ok(rows) => rows,
            Err(e) => {
                error!("{} ❌ 解析失败: {}", ctx, e);
                return FileOutcome::Failed {
                    rows_before_failure: 0,
                    message: e.to_string(),
                    warnings: Vec::new(),
                };
            }
        };

        let total_rows = rows.len();
        let batches = chunk_rows(rows, self.batch_size);
        let batch_count = batches.len();
        info!(
            "{} 解析出 {} 条记录，分 {} 批提交",
            ctx, total_rows, batch_count
        );
        on_progress(0, batch_count);

        // ========== 步骤 2: 逐批提交 ==========
        let mut processed: u64 = 0;
        let mut warnings = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            let batch_no = index + 1;
            let label = format!("{} 第 {}/{} 批", ctx, batch_no, batch_count);

            let request = ProcessBatchRequest {
                session_id: &ctx.session_id,
                year: ctx.year,
                rows: batch,
                is_global_dataset: ctx.is_global_dataset,
            };
            let endpoint = &self.endpoint;
            let request = &request;

            let result = self
                .retry_policy
                .run(self.sleeper.as_ref(), &label, move |_attempt| async move {
                    endpoint
                        .process_batch(request)
                        .await
                        .and_then(ProcessBatchResponse::into_result)
                })
                .await;

            match result {
                Ok(response) => {
                    if !response.errors.is_empty() {
                        warn!("{} 端点返回警告: {}", label, response.errors.join("; "));
                        warnings.extend(
                            response
                                .errors
                                .iter()
                                .map(|e| format!("第 {} 批: {}", batch_no, e)),
                        );
                    }
                    processed += response.processed_row_count;
                    on_progress(batch_no, batch_count);
                }
                Err(exhausted) => {
                    error!("{} ❌ 重试耗尽: {}", label, exhausted);
                    return FileOutcome::Failed {
                        rows_before_failure: processed,
                        message: format!("第 {} 批提交失败: {}", batch_no, exhausted.last_error),
                        warnings,
                    };
                }
            }
        }

        info!("{} ✓ 全部 {} 批提交成功，共 {} 行", ctx, batch_count, processed);
        FileOutcome::Completed {
            rows: processed,
            warnings,
        }
    }
}
