//! 批处理端点接口
//!
//! 端点负责持久化每一批记录，并在会话结束时做服务端汇总。
//! 编排器只依赖这个 trait，不关心端点背后的实现。

use crate::error::EndpointError;
use crate::models::ShareholderRow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const PROCESS_BATCH: &str = "processBatch";
pub const FINISH_SESSION: &str = "finishSession";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBatchRequest<'a> {
    pub session_id: &'a str,
    pub year: i32,
    pub rows: &'a [ShareholderRow],
    pub is_global_dataset: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessBatchResponse {
    pub success: bool,
    #[serde(default)]
    pub processed_row_count: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishSessionRequest<'a> {
    pub session_id: &'a str,
    pub year: i32,
    pub is_global_dataset: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishSessionResponse {
    pub success: bool,
    /// 汇总结果，格式由端点决定
    #[serde(default)]
    pub summary: JsonValue,
    #[serde(default)]
    pub error: Option<String>,
}

/// 批处理端点
///
/// 重试同一批数据时，端点需要保证不会重复计入（由端点实现保证）
#[async_trait]
pub trait BatchEndpoint: Send + Sync {
    /// 提交一批记录
    async fn process_batch(
        &self,
        request: &ProcessBatchRequest<'_>,
    ) -> Result<ProcessBatchResponse, EndpointError>;

    /// 结束会话并触发服务端汇总
    async fn finish_session(
        &self,
        request: &FinishSessionRequest<'_>,
    ) -> Result<FinishSessionResponse, EndpointError>;
}

impl ProcessBatchResponse {
    /// `success = false` 转为错误，交给重试策略
    pub fn into_result(self) -> Result<Self, EndpointError> {
        if self.success {
            Ok(self)
        } else {
            Err(EndpointError::rejected(PROCESS_BATCH, &self.errors))
        }
    }
}

impl FinishSessionResponse {
    pub fn into_result(self) -> Result<Self, EndpointError> {
        if self.success {
            Ok(self)
        } else {
            let errors: Vec<String> = self.error.into_iter().collect();
            Err(EndpointError::rejected(FINISH_SESSION, &errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_process_batch_request_wire_format() {
        let rows = vec![ShareholderRow::new(1).with_field("OrgNumber", "912345678")];
        let request = ProcessBatchRequest {
            session_id: "abc",
            year: 2024,
            rows: &rows,
            is_global_dataset: true,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "sessionId": "abc",
                "year": 2024,
                "rows": [{"rowNumber": 1, "OrgNumber": "912345678"}],
                "isGlobalDataset": true
            })
        );
    }

    #[test]
    fn test_process_batch_response_defaults() {
        let response: ProcessBatchResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(response.success);
        assert_eq!(response.processed_row_count, 0);
        assert!(response.errors.is_empty());
    }

    #[test]
    fn test_rejected_batch_becomes_error() {
        let response: ProcessBatchResponse = serde_json::from_value(json!({
            "success": false,
            "processedRowCount": 0,
            "errors": ["duplicate key"]
        }))
        .unwrap();

        let err = response.into_result().unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }

    #[test]
    fn test_finish_response_failure_message() {
        let response = FinishSessionResponse {
            success: false,
            summary: JsonValue::Null,
            error: Some("aggregation timed out".to_string()),
        };
        let err = response.into_result().unwrap_err();
        assert!(err.to_string().contains("aggregation timed out"));
        assert!(err.to_string().contains(FINISH_SESSION));
    }
}
