use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use thiserror::Error;

/// 转换过程中可能发生的错误。
///
/// 行级错误（`InvalidYrcLine`、`InvalidTime`）只在出错的那一行内部使用，
/// 解析器会记录日志并跳过该行；格式级错误（`NoTimedLines`）由单个输出格式抛出，
/// 调用方把它降级为“该字段缺失”。
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("无效的 YRC 行格式 (行 {line_num}): {message}")]
    InvalidYrcLine { line_num: usize, message: String },
    #[error("无效的时间格式: {0}")]
    InvalidTime(String),
    #[error("解析错误: {0}")]
    ParseInt(#[from] std::num::ParseIntError),
    #[error("未找到可用的逐字歌词行，无法生成 {format}")]
    NoTimedLines { format: OutputFormat },
    #[error("生成 XML 错误: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
    #[error("UTF-8 转换错误: {0}")]
    FromUtf8(#[from] std::string::FromUtf8Error),
    #[error("格式错误: {0}")]
    Format(#[from] fmt::Error),
}

/// 三种输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum OutputFormat {
    #[strum(serialize = "LRC")]
    Lrc,
    #[strum(serialize = "ESLRC")]
    Eslrc,
    #[strum(serialize = "TTML")]
    Ttml,
}

/// 一个逐字音节。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordInfo {
    pub text: String,
    pub start_ms: u64,
    /// 文本非空白时至少为 1
    pub duration_ms: u64,
}

impl WordInfo {
    pub fn end_ms(&self) -> u64 {
        self.start_ms.saturating_add(self.duration_ms)
    }
}

/// 一行逐字歌词。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    pub words: Vec<WordInfo>,
    /// 行头部声明的开始时间
    pub start_ms: u64,
    /// 行头部声明的结束时间 (开始时间 + 行时长)
    pub end_ms: u64,
}

impl LineInfo {
    /// 实际内容的结束时间：有音节时取最后一个音节的结束时间，否则取行头部的结束时间。
    pub fn content_end_ms(&self) -> u64 {
        self.words.last().map_or(self.end_ms, WordInfo::end_ms)
    }
}

/// 一个时间上连续的段落，对应 TTML 中的 `<div>`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivInfo<'a> {
    pub start_ms: u64,
    pub end_ms: u64,
    pub lines: Vec<&'a LineInfo>,
}

/// 翻译或罗马音 LRC 中带时间戳的一行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaLine {
    pub time_ms: u64,
    pub text: String,
}

/// LRC 头部元数据标签。声明顺序即输出顺序。
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, AsRefStr, EnumString, EnumIter,
)]
pub enum MetadataKey {
    #[strum(serialize = "ti")]
    Title,
    #[strum(serialize = "ar")]
    Artist,
    #[strum(serialize = "al")]
    Album,
    #[strum(serialize = "by")]
    Author,
    #[strum(serialize = "offset")]
    Offset,
    #[strum(serialize = "kana")]
    Kana,
    #[strum(serialize = "re")]
    Editor,
    #[strum(serialize = "ve")]
    Version,
}

/// 罗马音来源。上游通常给出 YRC 格式的罗马音，也兼容逐行的 LRC 格式。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RomanizationSource {
    Yrc(Vec<LineInfo>),
    Lrc(Vec<MetaLine>),
}

impl RomanizationSource {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Yrc(lines) => lines.is_empty(),
            Self::Lrc(lines) => lines.is_empty(),
        }
    }
}

impl Default for RomanizationSource {
    fn default() -> Self {
        Self::Yrc(Vec::new())
    }
}

/// 一次转换请求的输入。所有字段都可缺省。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LyricSources {
    pub lrc: Option<String>,
    pub yrc: Option<String>,
    /// LRC 格式的翻译
    pub translation: Option<String>,
    /// YRC（或 LRC）格式的罗马音
    pub romanization: Option<String>,
    pub song: Option<String>,
    pub singer: Option<String>,
    pub album: Option<String>,
}

/// 一次转换请求的输出。转换失败的格式保持为 `None`。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedLyrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub singer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// 合并了翻译的 LRC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lrc: Option<String>,
    /// 逐字增强 LRC
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eslrc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttml: Option<String>,
}

impl ConvertedLyrics {
    pub fn get(&self, format: OutputFormat) -> Option<&str> {
        match format {
            OutputFormat::Lrc => self.lrc.as_deref(),
            OutputFormat::Eslrc => self.eslrc.as_deref(),
            OutputFormat::Ttml => self.ttml.as_deref(),
        }
    }
}
