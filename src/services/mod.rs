pub mod file_validator;
pub mod log_writer;
pub mod retry_policy;

pub use file_validator::{FileValidator, ValidationReport};
pub use log_writer::ImportLogWriter;
pub use retry_policy::{RetryExhausted, RetryPolicy};
