pub mod batch_endpoint;
pub mod http_endpoint;

pub use batch_endpoint::{
    BatchEndpoint, FinishSessionRequest, FinishSessionResponse, ProcessBatchRequest,
    ProcessBatchResponse,
};
pub use http_endpoint::HttpBatchEndpoint;
