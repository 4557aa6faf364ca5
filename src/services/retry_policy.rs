//! 重试策略 - 业务能力层
//!
//! 只负责"失败后等多久、最多试几次"，等待由注入的 Sleeper 完成，
//! 测试中可以替换为不真正等待的实现

use crate::infrastructure::Sleeper;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// 重试耗尽
#[derive(Debug, Error)]
#[error("已尝试 {attempts} 次仍失败: {last_error}")]
pub struct RetryExhausted<E: std::error::Error + 'static> {
    pub attempts: u32,
    #[source]
    pub last_error: E,
}

/// 指数退避重试策略
///
/// 第 n 次失败后等待 `base_delay * 2^(n-1)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` 为 0 时按 1 次处理
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时长
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// 执行操作，失败时按策略退避重试
    ///
    /// # 参数
    /// - `sleeper`: 等待实现
    /// - `label`: 日志中显示的操作名
    /// - `op`: 每次调用产生一个新的 Future
    ///
    /// # 返回
    /// 第一次成功的结果，或最后一次错误
    pub async fn run<T, E, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        label: &str,
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        E: std::error::Error + Display + 'static,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    warn!("{} 失败 (尝试 {}/{})，不再重试: {}", label, attempt, self.max_attempts, e);
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        "{} 失败 (尝试 {}/{})，等待 {}ms 后重试: {}",
                        label,
                        attempt,
                        self.max_attempts,
                        delay.as_millis(),
                        e
                    );
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
