use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 文件校验错误
    #[error("文件校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 批处理端点错误
    #[error("端点错误: {0}")]
    Endpoint(#[from] EndpointError),
    /// 文件解析错误
    #[error("解析错误: {0}")]
    Decode(#[from] DecodeError),
    /// 导入会话错误
    #[error("导入错误: {0}")]
    Import(#[from] ImportError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 文件校验错误，在选择文件时即刻返回，不会进入导入流程
#[derive(Debug, Error)]
pub enum ValidationError {
    /// 文件超过大小上限
    #[error("文件过大 ({file_name}): {size} 字节，上限 {max} 字节")]
    FileTooLarge {
        file_name: String,
        size: u64,
        max: u64,
    },
    /// 扩展名不在允许列表中
    #[error("文件类型不支持 ({file_name}): 期望 {expected}")]
    InvalidFileType { file_name: String, expected: String },
    /// 无法读取文件
    #[error("无法读取文件 ({file_name}): {reason}")]
    UnreadableFile { file_name: String, reason: String },
}

impl ValidationError {
    pub fn file_name(&self) -> &str {
        match self {
            ValidationError::FileTooLarge { file_name, .. }
            | ValidationError::InvalidFileType { file_name, .. }
            | ValidationError::UnreadableFile { file_name, .. } => file_name,
        }
    }
}

/// 批处理端点调用错误
///
/// 单批提交时出现的这类错误都视为瞬时错误，交给重试策略处理
#[derive(Debug, Error)]
pub enum EndpointError {
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {message}")]
    Transport { endpoint: String, message: String },
    /// 非 2xx 响应
    #[error("端点返回状态码 {status} ({endpoint}): {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 响应体无法解析
    #[error("响应解析失败 ({endpoint}): {message}")]
    Decode { endpoint: String, message: String },
    /// 端点明确返回 success = false
    #[error("端点拒绝请求 ({endpoint}): {message}")]
    Rejected { endpoint: String, message: String },
}

/// 文件解析错误
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("读取文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("文件不是有效的 UTF-8 ({path})")]
    InvalidUtf8 { path: String },
    /// XML 结构不完整或语法错误，整个文件不产生任何记录
    #[error("XML 格式错误 ({path}): {source}")]
    Malformed {
        path: String,
        #[source]
        source: XmlSyntaxError,
    },
}

/// XML 语法错误
#[derive(Debug, Error)]
#[error("第 {position} 字节附近: {message}")]
pub struct XmlSyntaxError {
    pub position: u64,
    pub message: String,
}

/// 导入会话错误
///
/// 单个文件失败不会以错误形式返回，只记录在文件状态中
#[derive(Debug, Error)]
pub enum ImportError {
    /// 会话不处于空闲状态，需先重置
    #[error("当前会话状态为 {status}，请先重置后再导入")]
    SessionNotIdle { status: String },
    /// 没有可导入的文件
    #[error("没有可导入的文件")]
    NoFiles,
    /// 汇总调用失败，整个会话失败
    #[error("会话汇总失败: {0}")]
    SessionFinalization(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件失败 ({path}): {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("配置文件解析失败 ({path}): {message}")]
    Parse { path: String, message: String },
    #[error("配置取值无效: {0}")]
    Invalid(String),
}

// ========== 便捷构造函数 ==========

impl EndpointError {
    /// 创建网络请求失败错误
    pub fn transport(endpoint: impl Into<String>, source: impl std::fmt::Display) -> Self {
        EndpointError::Transport {
            endpoint: endpoint.into(),
            message: source.to_string(),
        }
    }

    /// 创建端点拒绝错误
    pub fn rejected(endpoint: impl Into<String>, errors: &[String]) -> Self {
        let message = if errors.is_empty() {
            "success = false".to_string()
        } else {
            errors.join("; ")
        };
        EndpointError::Rejected {
            endpoint: endpoint.into(),
            message,
        }
    }
}
