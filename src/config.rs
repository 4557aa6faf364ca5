use crate::error::ConfigError;
use crate::services::retry_policy::RetryPolicy;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 待导入的 XML 文件存放目录
    pub import_folder: String,
    /// 目标财年
    pub fiscal_year: i32,
    /// 是否写入全局数据集
    pub is_global_dataset: bool,
    /// 每批提交的行数
    pub batch_size: usize,
    /// 每批最大尝试次数
    pub max_retries: u32,
    /// 文件间固定间隔，同时也是重试退避的基准（毫秒）
    pub delay_between_batches_ms: u64,
    /// 单个文件大小上限（字节）
    pub max_file_size_bytes: u64,
    /// 允许的文件扩展名（不区分大小写）
    pub allowed_extensions: Vec<String>,
    /// XML 中表示一条股东记录的元素名
    pub record_tag: String,
    // --- 批处理端点配置 ---
    pub endpoint_base_url: String,
    pub endpoint_token: Option<String>,
    /// 单次请求超时（秒），不设置则不限时
    pub request_timeout_secs: Option<u64>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            import_folder: "import_xml".to_string(),
            fiscal_year: 2024,
            is_global_dataset: false,
            batch_size: 8000,
            max_retries: 3,
            delay_between_batches_ms: 200,
            max_file_size_bytes: 100 * 1024 * 1024,
            allowed_extensions: vec!["xml".to_string()],
            record_tag: "Shareholder".to_string(),
            endpoint_base_url: "http://localhost:54321/functions/v1/shareholder-import".to_string(),
            endpoint_token: None,
            request_timeout_secs: None,
            verbose_logging: false,
            output_log_file: "import_log.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            import_folder: std::env::var("IMPORT_FOLDER").unwrap_or(default.import_folder),
            fiscal_year: std::env::var("FISCAL_YEAR").ok().and_then(|v| v.parse().ok()).unwrap_or(default.fiscal_year),
            is_global_dataset: std::env::var("IS_GLOBAL_DATASET").ok().and_then(|v| v.parse().ok()).unwrap_or(default.is_global_dataset),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(default.batch_size),
            max_retries: std::env::var("MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_retries),
            delay_between_batches_ms: std::env::var("DELAY_BETWEEN_BATCHES_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.delay_between_batches_ms),
            max_file_size_bytes: std::env::var("MAX_FILE_SIZE_BYTES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_file_size_bytes),
            allowed_extensions: std::env::var("ALLOWED_EXTENSIONS")
                .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or(default.allowed_extensions),
            record_tag: std::env::var("RECORD_TAG").unwrap_or(default.record_tag),
            endpoint_base_url: std::env::var("ENDPOINT_BASE_URL").unwrap_or(default.endpoint_base_url),
            endpoint_token: std::env::var("ENDPOINT_TOKEN").ok().or(default.endpoint_token),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).or(default.request_timeout_secs),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 从 TOML 文件加载配置，缺省字段取默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size 必须大于 0".to_string()));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries 必须大于 0".to_string()));
        }
        if self.max_file_size_bytes == 0 {
            return Err(ConfigError::Invalid("max_file_size_bytes 必须大于 0".to_string()));
        }
        if self.allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid("allowed_extensions 不能为空".to_string()));
        }
        Ok(())
    }

    /// 编排器使用的导入参数
    pub fn import_config(&self) -> ImportConfig {
        ImportConfig {
            batch_size: self.batch_size,
            retry_policy: RetryPolicy::new(
                self.max_retries,
                Duration::from_millis(self.delay_between_batches_ms),
            ),
            delay_between_files: Duration::from_millis(self.delay_between_batches_ms),
            is_global_dataset: self.is_global_dataset,
        }
    }
}

/// 导入编排参数
#[derive(Clone, Debug)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub retry_policy: RetryPolicy,
    pub delay_between_files: Duration,
    pub is_global_dataset: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Config::default().import_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_matches_observed_values() {
        let config = Config::default();
        assert_eq!(config.batch_size, 8000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.delay_between_batches_ms, 200);
        assert_eq!(config.max_file_size_bytes, 104_857_600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file_partial() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = 500").unwrap();
        writeln!(file, "fiscal_year = 2023").unwrap();
        writeln!(file, "endpoint_token = \"secret\"").unwrap();

        let config = Config::from_toml_file(file.path()).unwrap();
        assert_eq!(config.batch_size, 500);
        assert_eq!(config.fiscal_year, 2023);
        assert_eq!(config.endpoint_token.as_deref(), Some("secret"));
        // 未出现的字段保持默认
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.record_tag, "Shareholder");
    }

    #[test]
    fn test_from_toml_file_rejects_zero_batch_size() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "batch_size = 0").unwrap();

        let err = Config::from_toml_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = Config::from_toml_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_import_config_derivation() {
        let config = Config {
            max_retries: 5,
            delay_between_batches_ms: 50,
            ..Config::default()
        };
        let import = config.import_config();
        assert_eq!(import.retry_policy.max_attempts(), 5);
        assert_eq!(import.delay_between_files, Duration::from_millis(50));
        assert_eq!(import.retry_policy.delay_for(3), Duration::from_millis(200));
    }
}
