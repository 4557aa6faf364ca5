//! 文件校验服务 - 业务能力层
//!
//! 只负责"这个文件能不能进入导入"，不读取内容、不修改文件

use crate::config::Config;
use crate::error::ValidationError;
use crate::models::ImportFile;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 一批候选文件的校验结果
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// 通过校验的文件，保持原有顺序
    pub admitted: Vec<ImportFile>,
    pub rejected: Vec<ValidationError>,
}

/// 文件校验服务
pub struct FileValidator {
    max_file_size_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl FileValidator {
    pub fn new(max_file_size_bytes: u64, allowed_extensions: &[String]) -> Self {
        Self {
            max_file_size_bytes,
            allowed_extensions: allowed_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_file_size_bytes, &config.allowed_extensions)
    }

    /// 校验单个文件
    ///
    /// 依次检查扩展名、可读性、大小
    pub fn validate(&self, path: &Path) -> Result<ImportFile, ValidationError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidFileType {
                file_name,
                expected: self.expected_extensions(),
            });
        }

        let metadata = path.metadata().map_err(|e| ValidationError::UnreadableFile {
            file_name: file_name.clone(),
            reason: e.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(ValidationError::UnreadableFile {
                file_name,
                reason: "不是普通文件".to_string(),
            });
        }

        if metadata.len() > self.max_file_size_bytes {
            return Err(ValidationError::FileTooLarge {
                file_name,
                size: metadata.len(),
                max: self.max_file_size_bytes,
            });
        }

        File::open(path).map_err(|e| ValidationError::UnreadableFile {
            file_name: file_name.clone(),
            reason: e.to_string(),
        })?;

        debug!("✓ 文件通过校验: {} ({} 字节)", file_name, metadata.len());
        Ok(ImportFile::new(file_name, path, metadata.len()))
    }

    /// 校验一批文件，不合格的文件不影响其他文件
    pub fn validate_batch<I, P>(&self, paths: I) -> ValidationReport
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut report = ValidationReport::default();

        for path in paths {
            let path = path.into();
            match self.validate(&path) {
                Ok(file) => report.admitted.push(file),
                Err(e) => {
                    warn!("⚠️ 文件未通过校验: {}", e);
                    report.rejected.push(e);
                }
            }
        }

        report
    }

    fn expected_extensions(&self) -> String {
        self.allowed_extensions
            .iter()
            .map(|e| format!(".{}", e))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
