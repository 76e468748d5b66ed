use once_cell::sync::Lazy;
use regex::Regex;

use crate::logger::Diagnostics;
use crate::types::{ConvertError, LineInfo, WordInfo};
use crate::utils::is_metadata_line;

static YRC_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[(?P<start>\d+),(?P<duration>\d+)\](?P<content>.*)$")
        .expect("未能编译 YRC_LINE_REGEX")
});

static YRC_WORD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<text>.*?)\((?P<start>\d+),(?P<duration>\d+)\)")
        .expect("未能编译 YRC_WORD_REGEX")
});

fn checked_end_ms(start_ms: u64, duration_ms: u64, line_num: usize) -> Result<u64, ConvertError> {
    start_ms
        .checked_add(duration_ms)
        .ok_or_else(|| ConvertError::InvalidYrcLine {
            line_num,
            message: format!("时间戳溢出: 开始 {start_ms}, 时长 {duration_ms}"),
        })
}

/// 解析一行 `[开始,时长]文本(开始,时长)文本(开始,时长)...`。
///
/// 时长为 0 的音节：文本非空白时修正为 1ms，否则丢弃。
/// 一个音节都没匹配到但内容非空时，把整行内容当作一个音节；
/// 匹配到了音节但全部被丢弃时，返回的行没有音节。
/// 行或音节的结束时间超出 `u64` 范围时整行报错。
pub fn parse_yrc_line(
    line_str: &str,
    line_num: usize,
    diag: Diagnostics,
) -> Result<LineInfo, ConvertError> {
    let caps = YRC_LINE_REGEX
        .captures(line_str)
        .ok_or_else(|| ConvertError::InvalidYrcLine {
            line_num,
            message: "行首缺少行时间戳标记 [start,duration]".to_string(),
        })?;

    let line_start_ms: u64 = caps["start"].parse()?;
    let line_duration_ms: u64 = caps["duration"].parse()?;
    let line_end_ms = checked_end_ms(line_start_ms, line_duration_ms, line_num)?;
    let content = caps.name("content").map_or("", |m| m.as_str());

    let mut words: Vec<WordInfo> = Vec::new();
    let mut matched_any = false;
    for word_caps in YRC_WORD_REGEX.captures_iter(content) {
        matched_any = true;
        let text = word_caps.name("text").map_or("", |m| m.as_str());
        let start_ms: u64 = word_caps["start"].parse()?;
        let mut duration_ms: u64 = word_caps["duration"].parse()?;

        if duration_ms == 0 {
            if text.trim().is_empty() {
                continue;
            }
            duration_ms = 1;
            crate::verbose_debug!(
                diag,
                "[YRC 处理] 行 {line_num}: 音节 '{text}' (开始 {start_ms}) 时长为 0，修正为 1ms"
            );
        }

        checked_end_ms(start_ms, duration_ms, line_num)?;
        words.push(WordInfo {
            text: text.to_string(),
            start_ms,
            duration_ms,
        });
    }

    if !matched_any && !content.is_empty() {
        crate::verbose_debug!(
            diag,
            "[YRC 处理] 行 {line_num}: 未找到音节时间戳，整行 '{content}' 作为一个音节"
        );
        let duration_ms = line_duration_ms.max(1);
        checked_end_ms(line_start_ms, duration_ms, line_num)?;
        words.push(WordInfo {
            text: content.to_string(),
            start_ms: line_start_ms,
            duration_ms,
        });
    }

    Ok(LineInfo {
        words,
        start_ms: line_start_ms,
        end_ms: line_end_ms,
    })
}

/// 解析整段 YRC 文本。
///
/// 格式错误的行只记录日志并跳过；修正后没有任何音节的行不会出现在结果中。
pub fn parse_yrc(yrc_content: &str, diag: Diagnostics) -> Vec<LineInfo> {
    let mut parsed_lines: Vec<LineInfo> = Vec::new();

    for (i, raw_line) in yrc_content.lines().enumerate() {
        let line_num = i + 1;
        let line = raw_line.trim();
        if !line.starts_with('[') || is_metadata_line(line) {
            continue;
        }

        match parse_yrc_line(line, line_num, diag) {
            Ok(parsed) if !parsed.words.is_empty() => parsed_lines.push(parsed),
            Ok(_) => {
                crate::verbose_debug!(diag, "[YRC 处理] 行 {line_num}: 没有有效音节，已跳过");
            }
            Err(e) => {
                log::warn!("[YRC 处理] 解析 YRC 行失败: {e}, 行内容: '{line}'");
            }
        }
    }

    parsed_lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, start_ms: u64, duration_ms: u64) -> WordInfo {
        WordInfo {
            text: text.to_string(),
            start_ms,
            duration_ms,
        }
    }

    #[test]
    fn test_parse_yrc_line_words() {
        let line = parse_yrc_line(
            "[1000,2000]Hi(1000,500)there(1600,400)",
            1,
            Diagnostics::default(),
        )
        .unwrap();
        assert_eq!(line.start_ms, 1000);
        assert_eq!(line.end_ms, 3000);
        assert_eq!(line.words, vec![word("Hi", 1000, 500), word("there", 1600, 400)]);
        assert_eq!(line.content_end_ms(), 2000);
    }

    #[test]
    fn test_zero_duration_correction() {
        let line = parse_yrc_line(
            "[0,1000]a(0,0) (100,0)b(200,300)",
            1,
            Diagnostics::new(true),
        )
        .unwrap();
        assert_eq!(line.words, vec![word("a", 0, 1), word("b", 200, 300)]);
    }

    #[test]
    fn test_whole_line_fallback() {
        let line =
            parse_yrc_line("[5000,0]纯音乐，请欣赏", 1, Diagnostics::default()).unwrap();
        assert_eq!(line.words, vec![word("纯音乐，请欣赏", 5000, 1)]);

        let line = parse_yrc_line("[5000,3000]no timing", 1, Diagnostics::default()).unwrap();
        assert_eq!(line.words, vec![word("no timing", 5000, 3000)]);
    }

    #[test]
    fn test_invalid_header_is_line_error() {
        let err = parse_yrc_line("[abc]oops", 7, Diagnostics::default()).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidYrcLine { line_num: 7, .. }));
    }

    #[test]
    fn test_overflowing_times_are_line_errors() {
        for line in [
            "[18446744073709551615,1]x",
            "[0,1000]x(18446744073709551615,5)",
            "[18446744073709551615,0]整行",
            "[0,1000]x(99999999999999999999,5)",
        ] {
            let err = parse_yrc_line(line, 3, Diagnostics::default()).unwrap_err();
            assert!(
                matches!(err, ConvertError::InvalidYrcLine { line_num: 3, .. })
                    || matches!(err, ConvertError::ParseInt(_)),
                "{line}: {err}"
            );
        }

        let line = parse_yrc_line("[18446744073709551614,1]x(0,1)", 1, Diagnostics::default())
            .unwrap();
        assert_eq!(line.end_ms, u64::MAX);
    }

    #[test]
    fn test_parse_yrc_skips_overflowing_lines() {
        let content = "[18446744073709551615,1]x
[1000,500]a(1000,500)";
        let lines = parse_yrc(content, Diagnostics::default());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].start_ms, 1000);
    }

    #[test]
    fn test_parse_yrc_skips_bad_and_empty_lines() {
        let content = "[ti:Song]\n\
                       {\"t\":0,\"c\":[]}\n\
                       [1000,500]a(1000,500)\n\
                       [broken]x\n\
                       [2000,500]\n\
                       [3000,500] (3000,0)\n\
                       [4000,500]b(4000,500)";
        let lines = parse_yrc(content, Diagnostics::default());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].start_ms, 1000);
        assert_eq!(lines[1].start_ms, 4000);
    }
}
