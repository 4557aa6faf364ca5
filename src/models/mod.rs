pub mod loaders;
pub mod row;
pub mod session;

use std::path::PathBuf;

pub use loaders::{scan_import_folder, RowDecoder, XmlRowDecoder};
pub use row::{chunk_rows, ShareholderRow};
pub use session::{FileState, FileStatus, ImportSession, ImportSnapshot, ImportStatus};

/// 通过校验、可以导入的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl ImportFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            size_bytes,
        }
    }
}
