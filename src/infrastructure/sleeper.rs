//! 等待器 - 基础设施层
//!
//! 把"等待一段时间"抽象成能力，编排层和重试策略只依赖这个 trait

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// 等待能力
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// 基于 tokio 定时器的真实等待
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 只记录等待时长、立即返回
///
/// 用于测试和演练，保证结果确定且不真正等待
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    durations: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// 按调用顺序返回所有等待时长
    pub fn recorded(&self) -> Vec<Duration> {
        self.durations
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut durations) = self.durations.lock() {
            durations.push(duration);
        }
    }
}
