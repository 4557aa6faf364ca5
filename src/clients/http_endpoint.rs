/// HTTP 批处理端点客户端
///
/// 以 JSON POST 调用 `{base_url}/processBatch` 和 `{base_url}/finishSession`
use crate::clients::batch_endpoint::{
    BatchEndpoint, FinishSessionRequest, FinishSessionResponse, ProcessBatchRequest,
    ProcessBatchResponse, FINISH_SESSION, PROCESS_BATCH,
};
use crate::config::Config;
use crate::error::EndpointError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// HTTP 端点客户端
pub struct HttpBatchEndpoint {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBatchEndpoint {
    /// 创建新的端点客户端
    pub fn new(config: &Config) -> Result<Self, EndpointError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| EndpointError::transport(&config.endpoint_base_url, e))?;

        Ok(Self {
            client,
            base_url: config.endpoint_base_url.trim_end_matches('/').to_string(),
            token: config.endpoint_token.clone(),
        })
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }

    /// 发送 POST 请求并解析 JSON 响应
    async fn post<Req, Resp>(&self, operation: &str, body: &Req) -> Result<Resp, EndpointError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.url(operation);
        debug!("POST {}", url);

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EndpointError::transport(operation, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| EndpointError::transport(operation, e))?;

        if !status.is_success() {
            return Err(EndpointError::Status {
                endpoint: operation.to_string(),
                status: status.as_u16(),
                body: crate::utils::logging::truncate_text(&text, 200),
            });
        }

        serde_json::from_str(&text).map_err(|e| EndpointError::Decode {
            endpoint: operation.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl BatchEndpoint for HttpBatchEndpoint {
    async fn process_batch(
        &self,
        request: &ProcessBatchRequest<'_>,
    ) -> Result<ProcessBatchResponse, EndpointError> {
        self.post(PROCESS_BATCH, request).await
    }

    async fn finish_session(
        &self,
        request: &FinishSessionRequest<'_>,
    ) -> Result<FinishSessionResponse, EndpointError> {
        self.post(FINISH_SESSION, request).await
    }
}
