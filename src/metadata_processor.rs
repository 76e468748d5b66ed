use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use strum::IntoEnumIterator;

use crate::types::MetadataKey;

static LRC_METADATA_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(ti|ar|al|by|offset|kana|re|ve):(.*)\]$")
        .expect("未能编译 LRC_METADATA_TAG_REGEX")
});

/// `MetadataStore` 保存从 LRC 头部解析出的元数据标签。
/// 同一个键出现多次时，保留最后一次出现的值。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataStore {
    data: HashMap<MetadataKey, String>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 LRC 文本中提取 `[key:value]` 形式的元数据标签，其他行一律忽略。
    pub fn parse_lrc_metadata(content: &str) -> Self {
        let mut store = Self::new();
        for line in content.lines() {
            let Some(caps) = LRC_METADATA_TAG_REGEX.captures(line) else {
                continue;
            };
            let key_str = caps.get(1).map_or("", |m| m.as_str()).trim();
            let value = caps.get(2).map_or("", |m| m.as_str()).trim();
            if let Ok(key) = MetadataKey::from_str(key_str) {
                store.set(key, value);
            }
        }
        log::debug!("[Metadata] 解析到 {} 个元数据标签", store.len());
        store
    }

    pub fn set(&mut self, key: MetadataKey, value: impl Into<String>) {
        self.data.insert(key, value.into());
    }

    pub fn get(&self, key: MetadataKey) -> Option<&str> {
        self.data.get(&key).map(String::as_str)
    }

    /// 取非空的值，空字符串视为缺失。
    pub fn get_non_empty(&self, key: MetadataKey) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 按固定顺序生成 LRC 头部标签，`skip` 中的键不输出。
    pub fn to_lrc_tags(&self, skip: &[MetadataKey]) -> String {
        let mut output = String::new();
        for key in MetadataKey::iter() {
            if skip.contains(&key) {
                continue;
            }
            if let Some(value) = self.data.get(&key) {
                // 写入 String 不会失败
                let _ = writeln!(output, "[{key}:{value}]");
            }
        }
        output
    }
}
