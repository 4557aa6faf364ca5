//! # Shareholder Import
//!
//! 把股东名册 XML 文件按批顺序导入远程批处理端点的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 与业务无关的底层能力
//! - `Sleeper` - 可替换的等待能力，测试中不真正等待
//!
//! ### ② 业务能力层（Services / Clients / Models）
//! - `services/` - 文件校验 `FileValidator`、重试策略 `RetryPolicy`
//! - `clients/` - 批处理端点 `BatchEndpoint` 及其 HTTP 实现
//! - `models/` - 记录、会话状态、XML 解析
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个文件"的完整导入流程
//! - `FileCtx` - 上下文封装（session_id + file_index）
//! - `FileFlow` - 流程编排（decode → chunk → submit with retry）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/import_orchestrator` - 会话状态机，顺序处理所有文件
//! - `orchestrator/app` - 扫描目录、校验文件、打印统计
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{BatchEndpoint, HttpBatchEndpoint};
pub use config::{Config, ImportConfig};
pub use error::{AppError, ImportError};
pub use infrastructure::{Sleeper, TokioSleeper};
pub use models::{ImportFile, ImportSnapshot, ImportStatus, RowDecoder, ShareholderRow, XmlRowDecoder};
pub use orchestrator::{App, ImportOrchestrator};
pub use services::{FileValidator, RetryPolicy};
pub use workflow::{FileCtx, FileFlow, FileOutcome};
