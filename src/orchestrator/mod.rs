//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责导入会话的调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 目录导入应用
//! - 管理应用生命周期（初始化、运行）
//! - 扫描并校验候选文件
//! - 订阅快照输出进度
//! - 输出全局统计信息
//!
//! ### `import_orchestrator` - 顺序导入编排器
//! - 持有会话状态机
//! - 逐个文件委托 `FileFlow`
//! - 文件间固定间隔
//! - 调用端点汇总
//!
//! ## 层次关系
//!
//! ```text
//! app (处理 目录 → Vec<ImportFile>)
//!     ↓
//! import_orchestrator (处理 Vec<ImportFile>)
//!     ↓
//! workflow::FileFlow (处理单个文件)
//!     ↓
//! services / clients (能力层：校验 / 重试 / 端点)
//!     ↓
//! infrastructure (基础设施：Sleeper)
//! ```

pub mod app;
pub mod import_orchestrator;

// 重新导出主要类型
pub use app::App;
pub use import_orchestrator::ImportOrchestrator;
