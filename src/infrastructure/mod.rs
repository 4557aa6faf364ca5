//! 基础设施层
//!
//! 持有与业务无关的底层能力（等待/时钟）

pub mod sleeper;

pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};
