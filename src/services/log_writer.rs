//! 导入日志写入服务 - 业务能力层
//!
//! 只负责"把导入结果追加到日志文件"能力，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use tracing::debug;

use crate::error::ValidationError;
use crate::models::{FileState, ImportSnapshot};

/// 导入日志写入服务
///
/// 职责：
/// - 记录未通过校验的文件
/// - 记录会话终态：每个文件的结果、端点警告、汇总统计
/// - 只追加，不覆盖 `init_log_file` 写入的文件头
pub struct ImportLogWriter {
    log_file_path: String,
}

impl ImportLogWriter {
    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    /// 写入未通过校验的文件
    pub fn write_rejected(&self, rejected: &[ValidationError]) -> Result<()> {
        let lines: Vec<String> = rejected
            .iter()
            .map(|e| format!("🚫 未通过校验 {}: {}", e.file_name(), e))
            .collect();
        self.append(&lines)
    }

    /// 写入会话终态
    ///
    /// # 参数
    /// - `snapshot`: 会话终态快照
    /// - `rejected`: 校验未通过的文件数
    pub fn write_session(&self, snapshot: &ImportSnapshot, rejected: usize) -> Result<()> {
        let mut lines = vec![format!(
            "📦 会话 {} | 财年 {} | 状态 {}",
            snapshot.session_id.as_deref().unwrap_or("-"),
            snapshot
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "-".to_string()),
            snapshot.status
        )];

        for file in &snapshot.files {
            match file.status {
                FileState::Completed => lines.push(format!(
                    "✅ {} - {} 行",
                    file.file_name,
                    file.row_count.unwrap_or_default()
                )),
                FileState::Error => lines.push(format!(
                    "❌ {} - {}",
                    file.file_name,
                    file.error.as_deref().unwrap_or_default()
                )),
                other => lines.push(format!("… {} - {:?}", file.file_name, other)),
            }
            for warning in &file.warnings {
                lines.push(format!("⚠️ {} - {}", file.file_name, warning));
            }
        }

        lines.push(format!(
            "📊 成功 {}/{} | 失败 {} | 未通过校验 {} | 导入行数 {}",
            snapshot.completed_files(),
            snapshot.files.len(),
            snapshot.failed_files(),
            rejected,
            snapshot.total_processed_rows
        ));
        if let Some(message) = &snapshot.error_message {
            lines.push(format!("🛑 会话错误: {}", message));
        }

        self.append(&lines)
    }

    fn append(&self, lines: &[String]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        debug!("写入日志 {}: {} 行", self.log_file_path, lines.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)?;

        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        for line in lines {
            writeln!(file, "[{}] {}", timestamp, line)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImportSession;
    use tempfile::TempDir;

    #[test]
    fn test_write_session_appends_after_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import_log.txt");
        std::fs::write(&path, "header\n").unwrap();

        let mut session = ImportSession::default();
        session.begin(
            "s-1".to_string(),
            2024,
            false,
            vec!["a.xml".to_string(), "b.xml".to_string()],
        );
        session.mark_file_processing(0);
        session.mark_file_completed(0, 10, vec!["第 1 批: row 2: bad date".to_string()]);
        session.mark_file_processing(1);
        session.mark_file_failed(1, 0, "第 1 批提交失败: 503".to_string(), Vec::new());
        session.complete(serde_json::json!({}));

        let writer = ImportLogWriter::with_path(path.to_string_lossy());
        writer.write_session(&session, 1).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("header\n"));
        assert!(content.contains("会话 s-1 | 财年 2024 | 状态 completed"));
        assert!(content.contains("✅ a.xml - 10 行"));
        assert!(content.contains("⚠️ a.xml - 第 1 批: row 2: bad date"));
        assert!(content.contains("❌ b.xml - 第 1 批提交失败: 503"));
        assert!(content.contains("成功 1/2 | 失败 1 | 未通过校验 1 | 导入行数 10"));
    }

    #[test]
    fn test_write_rejected_lists_each_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import_log.txt");

        let writer = ImportLogWriter::with_path(path.to_string_lossy());
        writer
            .write_rejected(&[ValidationError::InvalidFileType {
                file_name: "notes.txt".to_string(),
                expected: ".xml".to_string(),
            }])
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("🚫 未通过校验 notes.txt"));
    }

    #[test]
    fn test_nothing_rejected_creates_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("import_log.txt");

        ImportLogWriter::with_path(path.to_string_lossy())
            .write_rejected(&[])
            .unwrap();
        assert!(!path.exists());
    }
}
