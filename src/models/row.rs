use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 一条股东登记记录
///
/// 序列化为扁平 JSON 对象：`rowNumber` 加上所有字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareholderRow {
    /// 在源文件中的行号（从 1 开始）
    #[serde(rename = "rowNumber")]
    pub row_number: usize,

    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl ShareholderRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// 按批大小切分记录，保持原有顺序
pub fn chunk_rows(rows: Vec<ShareholderRow>, batch_size: usize) -> Vec<Vec<ShareholderRow>> {
    let batch_size = batch_size.max(1);
    let mut batches = Vec::with_capacity(rows.len().div_ceil(batch_size));
    let mut current = Vec::with_capacity(batch_size.min(rows.len()));

    for row in rows {
        current.push(row);
        if current.len() == batch_size {
            batches.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        batches.push(current);
    }

    batches
}
