//! 顺序导入编排器 - 编排层
//!
//! ## 职责
//!
//! 持有一次导入会话，按顺序逐个文件导入，维护状态机与进度，
//! 所有文件结束后调用端点汇总。
//!
//! ## 状态机
//!
//! ```text
//! Idle ──process_files──▶ Processing ──汇总成功──▶ Completed
//!                              │
//!                              └──────汇总失败──▶ Error
//! Completed / Error ──reset_import──▶ Idle
//! ```
//!
//! ## 设计特点
//!
//! - **显式构造**：端点、解析器、等待器都由调用方注入，没有全局单例
//! - **唯一修改者**：会话只在 `&mut self` 下修改，观察者只拿快照
//! - **严格顺序**：任何时刻最多一个远程调用在进行
//! - **部分失败**：单个文件失败只记录在文件状态中，不中断会话

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clients::{BatchEndpoint, FinishSessionRequest, FinishSessionResponse};
use crate::config::ImportConfig;
use crate::error::ImportError;
use crate::infrastructure::{Sleeper, TokioSleeper};
use crate::models::{ImportFile, ImportSession, ImportSnapshot, ImportStatus, RowDecoder};
use crate::workflow::{FileCtx, FileFlow, FileOutcome};

/// 顺序导入编排器
pub struct ImportOrchestrator {
    endpoint: Arc<dyn BatchEndpoint>,
    flow: FileFlow,
    sleeper: Arc<dyn Sleeper>,
    config: ImportConfig,
    session: ImportSession,
    subscribers: Vec<mpsc::UnboundedSender<ImportSnapshot>>,
}

impl ImportOrchestrator {
    /// 使用真实定时器创建编排器
    pub fn new(
        endpoint: Arc<dyn BatchEndpoint>,
        decoder: Arc<dyn RowDecoder>,
        config: ImportConfig,
    ) -> Self {
        Self::with_sleeper(endpoint, decoder, Arc::new(TokioSleeper), config)
    }

    /// 注入自定义等待器（测试中用来消除真实等待）
    pub fn with_sleeper(
        endpoint: Arc<dyn BatchEndpoint>,
        decoder: Arc<dyn RowDecoder>,
        sleeper: Arc<dyn Sleeper>,
        config: ImportConfig,
    ) -> Self {
        let flow = FileFlow::new(endpoint.clone(), decoder, sleeper.clone(), &config);
        Self {
            endpoint,
            flow,
            sleeper,
            config,
            session: ImportSession::default(),
            subscribers: Vec::new(),
        }
    }

    /// 订阅会话快照
    ///
    /// 订阅时立即收到当前快照，之后每次状态变化按顺序收到一份，不丢失
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ImportSnapshot> {
        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(self.session.clone()).is_ok() {
            self.subscribers.push(tx);
        }
        rx
    }

    /// 关闭所有订阅
    ///
    /// 已发出的快照仍可被接收端读完，之后接收端收到 `None`
    pub fn unsubscribe_all(&mut self) {
        self.subscribers.clear();
    }

    /// 当前会话快照
    pub fn snapshot(&self) -> ImportSnapshot {
        self.session.clone()
    }

    pub fn status(&self) -> ImportStatus {
        self.session.status
    }

    /// 顺序导入一组已通过校验的文件
    ///
    /// # 参数
    /// - `files`: 按导入顺序排列的文件
    /// - `year`: 目标财年
    ///
    /// # 返回
    /// 会话终态快照（Completed 或 Error）。只有会话未处于 Idle 或没有文件时返回错误，
    /// 此时会话状态不变。
    pub async fn process_files(
        &mut self,
        files: Vec<ImportFile>,
        year: i32,
    ) -> Result<ImportSnapshot, ImportError> {
        if self.session.status != ImportStatus::Idle {
            return Err(ImportError::SessionNotIdle {
                status: self.session.status.to_string(),
            });
        }
        if files.is_empty() {
            return Err(ImportError::NoFiles);
        }

        // ========== Idle → Processing ==========
        let session_id = Uuid::new_v4().to_string();
        self.session.begin(
            session_id.clone(),
            year,
            self.config.is_global_dataset,
            files.iter().map(|f| f.name.clone()),
        );
        log_session_start(
            &session_id,
            year,
            files.len(),
            self.config.retry_policy.max_attempts(),
        );
        publish(&mut self.subscribers, &self.session);

        // ========== 逐个文件处理 ==========
        let total = files.len();
        for (index, file) in files.iter().enumerate() {
            log_file_start(index + 1, total, file);
            self.session.mark_file_processing(index);
            publish(&mut self.subscribers, &self.session);

            let ctx = FileCtx::new(
                session_id.clone(),
                year,
                self.config.is_global_dataset,
                index + 1,
                file.name.clone(),
            );

            let session = &mut self.session;
            let subscribers = &mut self.subscribers;
            let outcome = self
                .flow
                .run(file, &ctx, |done, count| {
                    session.set_batch_progress(index, done, count);
                    publish(subscribers, session);
                })
                .await;

            match outcome {
                FileOutcome::Completed { rows, warnings } => {
                    info!("{} ✅ 导入完成: {} 行", ctx, rows);
                    self.session.mark_file_completed(index, rows, warnings);
                }
                FileOutcome::Failed {
                    rows_before_failure,
                    message,
                    warnings,
                } => {
                    warn!("{} ⚠️ 导入失败，继续下一个文件: {}", ctx, message);
                    self.session
                        .mark_file_failed(index, rows_before_failure, message, warnings);
                }
            }
            publish(&mut self.subscribers, &self.session);

            if index + 1 < total {
                self.sleeper.sleep(self.config.delay_between_files).await;
            }
        }

        // ========== 汇总 ==========
        info!("📤 所有文件已处理，正在请求服务端汇总...");
        let request = FinishSessionRequest {
            session_id: &session_id,
            year,
            is_global_dataset: self.config.is_global_dataset,
        };
        let finished = self
            .endpoint
            .finish_session(&request)
            .await
            .and_then(FinishSessionResponse::into_result);

        match finished {
            Ok(response) => {
                self.session.complete(response.summary);
                log_session_complete(&self.session);
            }
            Err(e) => {
                let err = ImportError::SessionFinalization(e.to_string());
                error!("❌ {}", err);
                self.session.fail(err.to_string());
            }
        }
        publish(&mut self.subscribers, &self.session);

        Ok(self.snapshot())
    }

    /// 重置会话
    ///
    /// 只在终态下生效，重置后与新建的编排器无法区分
    pub fn reset_import(&mut self) {
        if !self.session.status.is_terminal() {
            return;
        }
        info!("🔄 重置导入会话");
        self.session = ImportSession::default();
        publish(&mut self.subscribers, &self.session);
    }
}

/// 向所有订阅者发送快照，顺带清理已关闭的订阅
fn publish(subscribers: &mut Vec<mpsc::UnboundedSender<ImportSnapshot>>, session: &ImportSession) {
    subscribers.retain(|tx| tx.send(session.clone()).is_ok());
}

// ========== 日志辅助函数 ==========

fn log_session_start(session_id: &str, year: i32, total: usize, max_attempts: u32) {
    info!("{}", "=".repeat(60));
    info!("📦 开始导入会话 {}", session_id);
    info!(
        "📅 财年: {} | 文件数: {} | 每批最多尝试 {} 次",
        year, total, max_attempts
    );
    info!("{}", "=".repeat(60));
}

fn log_file_start(file_index: usize, total: usize, file: &ImportFile) {
    info!("\n[文件 {}] {}", file_index, "─".repeat(30));
    info!(
        "[文件 {}] 处理第 {}/{} 个文件: {} ({} 字节)",
        file_index, file_index, total, file.name, file.size_bytes
    );
}

fn log_session_complete(session: &ImportSession) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 会话完成: 成功 {}/{} 个文件，共 {} 行",
        session.completed_files(),
        session.files.len(),
        session.total_processed_rows
    );
    if !session.errors.is_empty() {
        warn!("⚠️ {} 个文件导入失败", session.errors.len());
    }
    info!("{}", "─".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{ProcessBatchRequest, ProcessBatchResponse};
    use crate::error::{DecodeError, EndpointError};
    use crate::infrastructure::RecordingSleeper;
    use crate::models::ShareholderRow;
    use crate::services::RetryPolicy;
    use async_trait::async_trait;
    use std::time::Duration;

    struct AlwaysOk;

    #[async_trait]
    impl BatchEndpoint for AlwaysOk {
        async fn process_batch(
            &self,
            request: &ProcessBatchRequest<'_>,
        ) -> Result<ProcessBatchResponse, EndpointError> {
            Ok(ProcessBatchResponse {
                success: true,
                processed_row_count: request.rows.len() as u64,
                errors: vec![],
            })
        }

        async fn finish_session(
            &self,
            _request: &FinishSessionRequest<'_>,
        ) -> Result<FinishSessionResponse, EndpointError> {
            Ok(FinishSessionResponse {
                success: true,
                summary: serde_json::json!({"ok": true}),
                error: None,
            })
        }
    }

    struct ThreeRows;

    #[async_trait]
    impl RowDecoder for ThreeRows {
        async fn decode(&self, _file: &ImportFile) -> Result<Vec<ShareholderRow>, DecodeError> {
            Ok((1..=3).map(ShareholderRow::new).collect())
        }
    }

    fn orchestrator(sleeper: Arc<RecordingSleeper>) -> ImportOrchestrator {
        ImportOrchestrator::with_sleeper(
            Arc::new(AlwaysOk),
            Arc::new(ThreeRows),
            sleeper,
            ImportConfig {
                batch_size: 2,
                retry_policy: RetryPolicy::new(3, Duration::from_millis(200)),
                delay_between_files: Duration::from_millis(200),
                is_global_dataset: false,
            },
        )
    }

    fn files(n: usize) -> Vec<ImportFile> {
        (0..n)
            .map(|i| ImportFile::new(format!("f{}.xml", i), format!("/tmp/f{}.xml", i), 1))
            .collect()
    }

    #[tokio::test]
    async fn test_rejects_empty_file_list() {
        let mut orch = orchestrator(Arc::new(RecordingSleeper::default()));
        let err = orch.process_files(Vec::new(), 2024).await.unwrap_err();
        assert!(matches!(err, ImportError::NoFiles));
        assert_eq!(orch.status(), ImportStatus::Idle);
    }

    #[tokio::test]
    async fn test_terminal_session_requires_reset() {
        let mut orch = orchestrator(Arc::new(RecordingSleeper::default()));
        orch.process_files(files(1), 2024).await.unwrap();
        assert_eq!(orch.status(), ImportStatus::Completed);

        let err = orch.process_files(files(1), 2024).await.unwrap_err();
        assert!(matches!(err, ImportError::SessionNotIdle { .. }));
        assert_eq!(orch.status(), ImportStatus::Completed);

        orch.reset_import();
        assert!(orch.process_files(files(1), 2025).await.is_ok());
    }

    #[tokio::test]
    async fn test_inter_file_delay_only_between_files() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let mut orch = orchestrator(sleeper.clone());
        orch.process_files(files(3), 2024).await.unwrap();

        // 没有重试，只有两次文件间隔
        assert_eq!(
            sleeper.recorded(),
            vec![Duration::from_millis(200), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn test_subscribe_receives_current_snapshot_first() {
        let mut orch = orchestrator(Arc::new(RecordingSleeper::default()));
        let mut rx = orch.subscribe();
        let first = rx.try_recv().unwrap();
        assert_eq!(first, ImportSession::default());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_is_pruned() {
        let mut orch = orchestrator(Arc::new(RecordingSleeper::default()));
        let rx = orch.subscribe();
        drop(rx);
        orch.process_files(files(1), 2024).await.unwrap();
        assert!(orch.subscribers.is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_all_lets_receiver_drain_and_end() {
        let mut orch = orchestrator(Arc::new(RecordingSleeper::default()));
        let mut rx = orch.subscribe();
        orch.process_files(files(2), 2024).await.unwrap();
        orch.unsubscribe_all();

        let mut last = None;
        while let Some(snapshot) = rx.recv().await {
            last = Some(snapshot);
        }
        assert_eq!(last.map(|s| s.status), Some(ImportStatus::Completed));
    }

    #[tokio::test]
    async fn test_reset_on_idle_is_noop() {
        let mut orch = orchestrator(Arc::new(RecordingSleeper::default()));
        let mut rx = orch.subscribe();
        let _ = rx.try_recv();
        orch.reset_import();
        assert!(rx.try_recv().is_err());
    }
}
