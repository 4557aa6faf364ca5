use anyhow::Result;
/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use std::fs;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::ValidationError;
use crate::models::{FileState, ImportSnapshot, ImportStatus};

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n股东名册导入日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 顺序批量导入模式");
    info!("📂 导入目录: {}", config.import_folder);
    info!(
        "📊 每批 {} 行 | 最多尝试 {} 次 | 间隔 {}ms",
        config.batch_size, config.max_retries, config.delay_between_batches_ms
    );
    info!("{}", "=".repeat(60));
}

/// 记录文件加载信息
///
/// # 参数
/// - `total`: 通过校验的文件数
/// - `batch_size`: 每批行数
pub fn log_files_loaded(total: usize, batch_size: usize) {
    info!("✓ 找到 {} 个待导入的文件", total);
    info!("📋 将逐个文件导入，每批 {} 行", batch_size);
    info!("💡 上一个文件结束后再开始下一个\n");
}

/// 记录未通过校验的文件
pub fn log_rejected_files(rejected: &[ValidationError]) {
    for err in rejected {
        warn!("⚠️ 跳过 {}: {}", err.file_name(), err);
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `snapshot`: 会话终态
/// - `rejected`: 校验未通过的文件数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(snapshot: &ImportSnapshot, rejected: usize, log_file_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 导入完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for file in &snapshot.files {
        match file.status {
            FileState::Completed => info!(
                "✅ {} - {} 行",
                file.file_name,
                file.row_count.unwrap_or_default()
            ),
            FileState::Error => warn!(
                "❌ {} - {}",
                file.file_name,
                truncate_text(file.error.as_deref().unwrap_or_default(), 80)
            ),
            other => warn!("… {} - {:?}", file.file_name, other),
        }
    }
    info!("✅ 成功: {}/{}", snapshot.completed_files(), snapshot.files.len());
    info!("❌ 失败: {}", snapshot.failed_files());
    info!("🚫 未通过校验: {}", rejected);
    info!("📈 导入行数: {}", snapshot.total_processed_rows);
    match snapshot.status {
        ImportStatus::Completed => info!("🏁 会话状态: 已完成"),
        _ => warn!(
            "🛑 会话状态: {} ({})",
            snapshot.status,
            snapshot.error_message.as_deref().unwrap_or("未知错误")
        ),
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
