//! 集成测试共用的假端点与解析器
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use shareholder_import::clients::{
    BatchEndpoint, FinishSessionRequest, FinishSessionResponse, ProcessBatchRequest,
    ProcessBatchResponse,
};
use shareholder_import::error::{DecodeError, EndpointError};
use shareholder_import::models::{ImportFile, RowDecoder, ShareholderRow};
use shareholder_import::services::RetryPolicy;
use shareholder_import::ImportConfig;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// 按调用序号（从 1 开始）决定成败的端点
#[derive(Default)]
pub struct ScriptedEndpoint {
    failing_calls: HashSet<usize>,
    finish_fails: bool,
    warnings: Vec<String>,
    calls: Mutex<Vec<usize>>,
    submitted: Mutex<Vec<ShareholderRow>>,
    finish_calls: Mutex<usize>,
}

impl ScriptedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_calls(mut self, calls: impl IntoIterator<Item = usize>) -> Self {
        self.failing_calls = calls.into_iter().collect();
        self
    }

    pub fn finish_fails(mut self) -> Self {
        self.finish_fails = true;
        self
    }

    /// 每次成功应答都附带这些 errors[]
    pub fn with_warnings(mut self, warnings: &[&str]) -> Self {
        self.warnings = warnings.iter().map(|w| w.to_string()).collect();
        self
    }

    /// 被端点接受的所有记录，按提交顺序
    pub fn submitted_rows(&self) -> Vec<ShareholderRow> {
        self.submitted.lock().unwrap().clone()
    }

    /// 每次 processBatch 调用的行数，按调用顺序
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.calls.lock().unwrap().clone()
    }

    pub fn finish_calls(&self) -> usize {
        *self.finish_calls.lock().unwrap()
    }
}

#[async_trait]
impl BatchEndpoint for ScriptedEndpoint {
    async fn process_batch(
        &self,
        request: &ProcessBatchRequest<'_>,
    ) -> Result<ProcessBatchResponse, EndpointError> {
        let call_no = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.rows.len());
            calls.len()
        };
        if self.failing_calls.contains(&call_no) {
            return Err(EndpointError::Status {
                endpoint: "processBatch".to_string(),
                status: 503,
                body: format!("call {} unavailable", call_no),
            });
        }
        self.submitted
            .lock()
            .unwrap()
            .extend(request.rows.iter().cloned());
        Ok(ProcessBatchResponse {
            success: true,
            processed_row_count: request.rows.len() as u64,
            errors: self.warnings.clone(),
        })
    }

    async fn finish_session(
        &self,
        request: &FinishSessionRequest<'_>,
    ) -> Result<FinishSessionResponse, EndpointError> {
        *self.finish_calls.lock().unwrap() += 1;
        if self.finish_fails {
            return Err(EndpointError::transport("finishSession", "connection reset"));
        }
        Ok(FinishSessionResponse {
            success: true,
            summary: json!({ "sessionId": request.session_id, "year": request.year }),
            error: None,
        })
    }
}

/// 按文件名返回固定行数的解析器
pub struct RowCountDecoder {
    rows: HashMap<String, usize>,
}

impl RowCountDecoder {
    pub fn new(files: &[(&str, usize)]) -> Self {
        Self {
            rows: files.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
        }
    }
}

#[async_trait]
impl RowDecoder for RowCountDecoder {
    async fn decode(&self, file: &ImportFile) -> Result<Vec<ShareholderRow>, DecodeError> {
        let count = self.rows.get(&file.name).copied().unwrap_or(0);
        Ok((1..=count)
            .map(|n| ShareholderRow::new(n).with_field("Name", format!("holder {}", n)))
            .collect())
    }
}

pub fn import_config(batch_size: usize) -> ImportConfig {
    ImportConfig {
        batch_size,
        retry_policy: RetryPolicy::new(3, Duration::from_millis(200)),
        delay_between_files: Duration::from_millis(200),
        is_global_dataset: false,
    }
}

pub fn import_files(files: &[(&str, usize)]) -> Vec<ImportFile> {
    files
        .iter()
        .map(|(name, _)| ImportFile::new(*name, format!("/tmp/{}", name), 1024))
        .collect()
}
