use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{ConvertError, MetaLine};
use crate::utils::{is_metadata_line, parse_lrc_time_parts};

static LRC_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(\d{2}):(\d{2})\.(\d{2,3})\](.*)$").expect("未能编译 LRC_LINE_REGEX")
});

/// 需要从翻译 / 罗马音中剔除的水印行。
///
/// 一行文本只要包含任意一个子串就会被丢弃。默认列表来自配置文件。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatermarkFilter {
    denylist: Vec<String>,
}

impl WatermarkFilter {
    pub fn new<I, S>(denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            denylist: denylist
                .into_iter()
                .map(Into::into)
                .filter(|s: &String| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_watermark(&self, text: &str) -> bool {
        self.denylist.iter().any(|needle| text.contains(needle.as_str()))
    }

    pub fn denylist(&self) -> &[String] {
        &self.denylist
    }
}

/// 解析一行 `[mm:ss.xx]文本`，返回时间（毫秒）与未经处理的文本部分。
///
/// 不匹配时间戳格式的行返回 `Ok(None)`。
pub fn parse_timed_line(line: &str) -> Result<Option<(u64, &str)>, ConvertError> {
    let Some(caps) = LRC_LINE_REGEX.captures(line) else {
        return Ok(None);
    };
    let time_ms = parse_lrc_time_parts(&caps[1], &caps[2], &caps[3])?;
    let text = caps.get(4).map_or("", |m| m.as_str());
    Ok(Some((time_ms, text)))
}

/// 将翻译或罗马音 LRC 解析为按时间升序排列的行列表。
///
/// 空行、元数据行、纯 `//` 行以及水印行都会被跳过；时间相同的行保留原有顺序。
pub fn parse_lrc_timeline(content: &str, filter: &WatermarkFilter) -> Vec<MetaLine> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let mut timed_lines: Vec<MetaLine> = Vec::new();
    for (line_num, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || is_metadata_line(line) {
            continue;
        }

        let (time_ms, raw_text) = match parse_timed_line(line) {
            Ok(Some(parsed)) => parsed,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("[LRC 处理] 行 {}: 时间戳解析失败: {e}", line_num + 1);
                continue;
            }
        };

        let text = raw_text.trim();
        if text.is_empty() || text == "//" || filter.is_watermark(text) {
            continue;
        }

        timed_lines.push(MetaLine {
            time_ms,
            text: text.to_string(),
        });
    }

    // sort_by_key 是稳定排序
    timed_lines.sort_by_key(|line| line.time_ms);
    timed_lines
}
