//! 文件处理上下文
//!
//! 封装"我正在为哪个会话导入第几个文件"这一信息

use std::fmt::Display;

/// 文件处理上下文
#[derive(Debug, Clone)]
pub struct FileCtx {
    pub session_id: String,

    /// 目标财年
    pub year: i32,

    pub is_global_dataset: bool,

    /// 文件在会话中的索引（从1开始，仅用于日志显示）
    pub file_index: usize,

    pub file_name: String,
}

impl FileCtx {
    /// 创建新的文件上下文
    pub fn new(
        session_id: String,
        year: i32,
        is_global_dataset: bool,
        file_index: usize,
        file_name: String,
    ) -> Self {
        Self {
            session_id,
            year,
            is_global_dataset,
            file_index,
            file_name,
        }
    }
}

impl Display for FileCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[会话 {} 文件#{} {} 财年#{}]",
            self.session_id, self.file_index, self.file_name, self.year
        )
    }
}
