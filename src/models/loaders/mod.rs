pub mod xml_loader;

use crate::error::DecodeError;
use crate::models::row::ShareholderRow;
use crate::models::ImportFile;
use async_trait::async_trait;

pub use xml_loader::{scan_import_folder, XmlRowDecoder};

/// 把一个已准入的文件解析为有序的记录列表
#[async_trait]
pub trait RowDecoder: Send + Sync {
    async fn decode(&self, file: &ImportFile) -> Result<Vec<ShareholderRow>, DecodeError>;
}
