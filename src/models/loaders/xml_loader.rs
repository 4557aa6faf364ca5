use crate::error::{DecodeError, XmlSyntaxError};
use crate::models::loaders::RowDecoder;
use crate::models::row::ShareholderRow;
use crate::models::ImportFile;
use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs;

static XML_ENTITIES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "amp" => "&",
    "lt" => "<",
    "gt" => ">",
    "quot" => "\"",
    "apos" => "'",
    "nbsp" => "\u{a0}",
};

/// 股东登记 XML 解析器
///
/// 每个 `<record_tag>` 元素是一行；其中的叶子元素 `<Name>值</Name>` 和
/// 记录元素上的属性都会成为字段。嵌套结构被展开，同名叶子以后出现的为准。
/// 注释、处理指令不产生数据，CDATA 按原文并入字段值。
pub struct XmlRowDecoder {
    record_tag: String,
}

/// 解析过程中尚未闭合的元素
struct OpenElement {
    name: String,
    text: String,
    has_children: bool,
}

impl XmlRowDecoder {
    pub fn new(record_tag: impl Into<String>) -> Self {
        Self {
            record_tag: record_tag.into(),
        }
    }

    /// 从 XML 文本中解析出所有记录
    ///
    /// 文档不完整或标签不匹配时返回错误，不会返回部分结果
    pub fn parse_str(&self, xml: &str) -> Result<Vec<ShareholderRow>, XmlSyntaxError> {
        let mut reader = Reader::from_str(xml);
        let mut open: Vec<OpenElement> = Vec::new();
        let mut rows = Vec::new();
        // (记录元素所在深度, 正在填充的行)
        let mut current: Option<(usize, ShareholderRow)> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| syntax_error(&reader, e))?;

            match event {
                Event::Start(start) => {
                    let name = element_name(&reader, &start)?;
                    if let Some(parent) = open.last_mut() {
                        parent.has_children = true;
                    }
                    if current.is_none() && name == self.record_tag {
                        let row = record_row(&reader, &start, rows.len() + 1)?;
                        current = Some((open.len(), row));
                    }
                    open.push(OpenElement {
                        name,
                        text: String::new(),
                        has_children: false,
                    });
                }
                Event::Empty(start) => {
                    let name = element_name(&reader, &start)?;
                    if let Some(parent) = open.last_mut() {
                        parent.has_children = true;
                    }
                    match current.as_mut() {
                        Some((_, row)) => {
                            row.fields.insert(name, String::new());
                        }
                        None if name == self.record_tag => {
                            rows.push(record_row(&reader, &start, rows.len() + 1)?);
                        }
                        None => {}
                    }
                }
                Event::Text(text) => {
                    if let (Some(_), Some(element)) = (&current, open.last_mut()) {
                        let value = text
                            .unescape_with(resolve_entity)
                            .map_err(|e| syntax_error(&reader, e))?;
                        element.text.push_str(&value);
                    }
                }
                Event::CData(cdata) => {
                    if let (Some(_), Some(element)) = (&current, open.last_mut()) {
                        let value = reader
                            .decoder()
                            .decode(&cdata)
                            .map_err(|e| syntax_error(&reader, e))?;
                        element.text.push_str(&value);
                    }
                }
                Event::End(end) => {
                    let name = reader
                        .decoder()
                        .decode(end.name().as_ref())
                        .map_err(|e| syntax_error(&reader, e))?
                        .into_owned();
                    let element = open.pop().ok_or_else(|| {
                        syntax_error(&reader, format!("多余的结束标签 </{}>", name))
                    })?;
                    if element.name != name {
                        return Err(syntax_error(
                            &reader,
                            format!("结束标签 </{}> 与 <{}> 不匹配", name, element.name),
                        ));
                    }

                    match current.take() {
                        Some((depth, row)) if depth == open.len() => rows.push(row),
                        Some((depth, mut row)) => {
                            // 只有叶子元素成为字段
                            if !element.has_children {
                                row.fields
                                    .insert(element.name, element.text.trim().to_string());
                            }
                            current = Some((depth, row));
                        }
                        None => {}
                    }
                }
                Event::Eof => break,
                // 声明、注释、处理指令、DOCTYPE
                _ => {}
            }
        }

        if let Some(element) = open.last() {
            return Err(syntax_error(
                &reader,
                format!("元素 <{}> 未闭合", element.name),
            ));
        }
        Ok(rows)
    }
}

fn resolve_entity(name: &str) -> Option<&'static str> {
    XML_ENTITIES.get(name).copied()
}

fn syntax_error<R>(reader: &Reader<R>, message: impl Display) -> XmlSyntaxError {
    XmlSyntaxError {
        position: reader.buffer_position() as u64,
        message: message.to_string(),
    }
}

fn element_name<R>(reader: &Reader<R>, start: &BytesStart) -> Result<String, XmlSyntaxError> {
    reader
        .decoder()
        .decode(start.name().as_ref())
        .map(|name| name.into_owned())
        .map_err(|e| syntax_error(reader, e))
}

/// 记录元素上的属性作为初始字段
fn record_row<R>(
    reader: &Reader<R>,
    start: &BytesStart,
    row_number: usize,
) -> Result<ShareholderRow, XmlSyntaxError> {
    let mut row = ShareholderRow::new(row_number);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| syntax_error(reader, e))?;
        let key = reader
            .decoder()
            .decode(attr.key.as_ref())
            .map_err(|e| syntax_error(reader, e))?
            .into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value_with(resolve_entity)
            .map_err(|e| syntax_error(reader, e))?;
        row.fields.insert(key, value.into_owned());
    }
    Ok(row)
}

#[async_trait]
impl RowDecoder for XmlRowDecoder {
    async fn decode(&self, file: &ImportFile) -> Result<Vec<ShareholderRow>, DecodeError> {
        let bytes = fs::read(&file.path).await.map_err(|e| DecodeError::Read {
            path: file.path.display().to_string(),
            source: e,
        })?;
        let xml = String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 {
            path: file.path.display().to_string(),
        })?;

        let rows = self
            .parse_str(&xml)
            .map_err(|source| DecodeError::Malformed {
                path: file.path.display().to_string(),
                source,
            })?;
        tracing::debug!("{} 解析出 {} 条记录", file.name, rows.len());
        Ok(rows)
    }
}

/// 列出目录中的所有文件（按文件名排序），交给校验器筛选
pub async fn scan_import_folder(folder_path: &str) -> anyhow::Result<Vec<PathBuf>> {
    let folder = Path::new(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(folder)
        .await
        .map_err(|e| anyhow::anyhow!("无法读取文件夹 {}: {}", folder_path, e))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}
