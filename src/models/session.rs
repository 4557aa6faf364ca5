//! 导入会话状态
//!
//! 会话只由编排器修改，观察者拿到的是克隆出的快照

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// 会话整体状态
///
/// 只允许 Idle → Processing → {Completed | Error}，终态只能通过重置离开
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    #[default]
    Idle,
    Processing,
    Completed,
    Error,
}

impl ImportStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Error)
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImportStatus::Idle => "idle",
            ImportStatus::Processing => "processing",
            ImportStatus::Completed => "completed",
            ImportStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// 单个文件的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Pending,
    Processing,
    Completed,
    Error,
}

impl FileState {
    pub fn is_terminal(self) -> bool {
        matches!(self, FileState::Completed | FileState::Error)
    }
}

/// 会话中一个文件的记录
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    pub file_name: String,
    pub status: FileState,
    /// 已被端点确认的行数
    pub row_count: Option<u64>,
    pub error: Option<String>,
    /// 端点在成功应答中附带的逐行提示
    pub warnings: Vec<String>,
    pub batch_count: usize,
    pub batches_completed: usize,
}

impl FileStatus {
    pub fn pending(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: FileState::Pending,
            row_count: None,
            error: None,
            warnings: Vec::new(),
            batch_count: 0,
            batches_completed: 0,
        }
    }

    /// 文件内批次完成比例，0.0 ..= 1.0
    fn batch_fraction(&self) -> f64 {
        if self.batch_count == 0 {
            0.0
        } else {
            self.batches_completed as f64 / self.batch_count as f64
        }
    }
}

/// 一次批量导入
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub session_id: Option<String>,
    pub year: Option<i32>,
    pub is_global_dataset: bool,
    pub files: Vec<FileStatus>,
    pub status: ImportStatus,
    /// 整体进度百分比，仅在 Completed 时为 100
    pub progress: u8,
    pub current_file_index: Option<usize>,
    pub total_processed_rows: u64,
    /// 会话级错误（只有汇总失败时设置）
    pub error_message: Option<String>,
    /// 文件级错误，每个失败文件一条
    pub errors: Vec<String>,
    pub summary: Option<serde_json::Value>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// 发布给观察者的快照
pub type ImportSnapshot = ImportSession;

impl ImportSession {
    /// Idle → Processing，所有文件置为 Pending
    pub(crate) fn begin(
        &mut self,
        session_id: String,
        year: i32,
        is_global_dataset: bool,
        file_names: impl IntoIterator<Item = String>,
    ) {
        *self = ImportSession {
            session_id: Some(session_id),
            year: Some(year),
            is_global_dataset,
            files: file_names.into_iter().map(FileStatus::pending).collect(),
            status: ImportStatus::Processing,
            started_at: Some(Utc::now()),
            ..ImportSession::default()
        };
    }

    pub(crate) fn mark_file_processing(&mut self, index: usize) {
        self.current_file_index = Some(index);
        if let Some(file) = self.files.get_mut(index) {
            file.status = FileState::Processing;
        }
        self.recompute_progress();
    }

    pub(crate) fn set_batch_progress(&mut self, index: usize, completed: usize, total: usize) {
        if let Some(file) = self.files.get_mut(index) {
            file.batch_count = total;
            file.batches_completed = completed.min(total);
        }
        self.recompute_progress();
    }

    pub(crate) fn mark_file_completed(&mut self, index: usize, rows: u64, warnings: Vec<String>) {
        if let Some(file) = self.files.get_mut(index) {
            file.status = FileState::Completed;
            file.row_count = Some(rows);
            file.warnings = warnings;
            file.batches_completed = file.batch_count;
        }
        self.total_processed_rows += rows;
        self.recompute_progress();
    }

    pub(crate) fn mark_file_failed(
        &mut self,
        index: usize,
        rows_before_failure: u64,
        message: String,
        warnings: Vec<String>,
    ) {
        if let Some(file) = self.files.get_mut(index) {
            file.status = FileState::Error;
            file.row_count = Some(rows_before_failure);
            file.warnings = warnings;
            self.errors.push(format!("{}: {}", file.file_name, message));
            file.error = Some(message);
        }
        self.recompute_progress();
    }

    /// Processing → Completed
    pub(crate) fn complete(&mut self, summary: serde_json::Value) {
        self.status = ImportStatus::Completed;
        self.current_file_index = None;
        self.summary = Some(summary);
        self.progress = 100;
        self.finished_at = Some(Utc::now());
    }

    /// Processing → Error
    pub(crate) fn fail(&mut self, message: String) {
        self.status = ImportStatus::Error;
        self.current_file_index = None;
        self.error_message = Some(message);
        self.finished_at = Some(Utc::now());
    }

    pub fn completed_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileState::Completed)
            .count()
    }

    pub fn failed_files(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.status == FileState::Error)
            .count()
    }

    /// 进度 = (已结束文件数 + 当前文件批次完成比例) / 文件总数
    ///
    /// 处理中最多到 99，并且只增不减
    fn recompute_progress(&mut self) {
        if self.status != ImportStatus::Processing || self.files.is_empty() {
            return;
        }

        let terminal = self.files.iter().filter(|f| f.status.is_terminal()).count() as f64;
        let current = self
            .files
            .iter()
            .find(|f| f.status == FileState::Processing)
            .map(FileStatus::batch_fraction)
            .unwrap_or(0.0);

        let raw = (100.0 * (terminal + current) / self.files.len() as f64).floor();
        let capped = raw.clamp(0.0, 99.0) as u8;
        self.progress = self.progress.max(capped);
    }
}
