//! 导入应用 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责一次目录导入的完整过程。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、创建端点客户端、解析器和编排器
//! 2. **扫描目录**：列出导入目录中的候选文件
//! 3. **文件校验**：不合格的文件在导入前被剔除
//! 4. **顺序导入**：委托 `ImportOrchestrator` 处理所有通过校验的文件
//! 5. **进度输出**：后台任务订阅快照并打印进度
//! 6. **全局统计**：输出会话最终结果

use crate::clients::HttpBatchEndpoint;
use crate::config::Config;
use crate::models::{scan_import_folder, ImportSnapshot, ImportStatus, XmlRowDecoder};
use crate::orchestrator::import_orchestrator::ImportOrchestrator;
use crate::services::{FileValidator, ImportLogWriter};
use crate::utils::logging::{
    init_log_file, log_files_loaded, log_rejected_files, log_startup, print_final_stats,
};
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    validator: FileValidator,
    log_writer: ImportLogWriter,
    orchestrator: ImportOrchestrator,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;

        // 初始化日志文件
        init_log_file(&config.output_log_file)?;

        log_startup(&config);

        let endpoint = HttpBatchEndpoint::new(&config)?;
        let decoder = XmlRowDecoder::new(config.record_tag.clone());
        let orchestrator =
            ImportOrchestrator::new(Arc::new(endpoint), Arc::new(decoder), config.import_config());

        Ok(Self {
            validator: FileValidator::from_config(&config),
            log_writer: ImportLogWriter::with_path(config.output_log_file.clone()),
            config,
            orchestrator,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&mut self) -> Result<Option<ImportSnapshot>> {
        info!("\n📁 正在扫描待导入的文件...");
        let candidates = scan_import_folder(&self.config.import_folder).await?;

        let report = self.validator.validate_batch(candidates);
        log_rejected_files(&report.rejected);
        self.log_writer.write_rejected(&report.rejected)?;

        if report.admitted.is_empty() {
            warn!("⚠️ 没有找到可导入的文件，程序结束");
            return Ok(None);
        }
        log_files_loaded(report.admitted.len(), self.config.batch_size);

        // 上一次 run 留下的终态会话
        self.orchestrator.reset_import();

        // 后台打印进度
        let progress_task = tokio::spawn(log_progress(
            self.orchestrator.subscribe(),
            self.config.verbose_logging,
        ));

        let result = self
            .orchestrator
            .process_files(report.admitted, self.config.fiscal_year)
            .await;

        // 关闭订阅后进度任务读完剩余快照自行结束
        self.orchestrator.unsubscribe_all();
        progress_task.await?;
        let snapshot = result?;

        self.log_writer
            .write_session(&snapshot, report.rejected.len())?;
        print_final_stats(&snapshot, report.rejected.len(), &self.config.output_log_file);

        Ok(Some(snapshot))
    }
}

/// 打印进度变化
async fn log_progress(mut rx: mpsc::UnboundedReceiver<ImportSnapshot>, verbose: bool) {
    let mut last_progress = None;
    while let Some(snapshot) = rx.recv().await {
        match snapshot.status {
            ImportStatus::Idle => continue,
            ImportStatus::Completed | ImportStatus::Error => {
                info!(
                    "🏁 会话结束 ({}) | 进度 {}% | 已导入 {} 行",
                    snapshot.status, snapshot.progress, snapshot.total_processed_rows
                );
                continue;
            }
            ImportStatus::Processing => {}
        }
        if verbose || last_progress != Some(snapshot.progress) {
            info!(
                "⏳ 进度 {}% | 已导入 {} 行",
                snapshot.progress, snapshot.total_processed_rows
            );
            last_progress = Some(snapshot.progress);
        }
    }
}
