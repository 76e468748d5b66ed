use std::fmt::Write as FmtWrite;

use crate::logger::Diagnostics;
use crate::lrc_parser::{WatermarkFilter, parse_lrc_timeline, parse_timed_line};
use crate::lyrics_merger::find_closest_line;
use crate::metadata_processor::MetadataStore;
use crate::types::{ConvertError, LineInfo, MetaLine, MetadataKey, OutputFormat};
use crate::utils::{format_enhanced_lrc_time_ms, format_lrc_time_ms, is_metadata_line};

/// 把翻译合并进原始 LRC：每一行歌词之后紧跟一行时间戳相同的译文。
///
/// 翻译为空时原样返回输入。否则逐行输出去掉首尾空白后的非空行，
/// 元数据行和无法解析时间戳的行只输出本身，不查找翻译。
pub fn merge_lrc_with_translation(
    original_lrc: &str,
    translation_lrc: &str,
    filter: &WatermarkFilter,
    max_drift_ms: u64,
    diag: Diagnostics,
) -> Result<String, ConvertError> {
    if translation_lrc.trim().is_empty() {
        return Ok(original_lrc.to_string());
    }

    let translations = parse_lrc_timeline(translation_lrc, filter);
    let mut result = String::with_capacity(original_lrc.len() + translation_lrc.len());
    let mut merged_count = 0usize;

    for raw_line in original_lrc.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        writeln!(result, "{line}")?;

        if is_metadata_line(line) {
            continue;
        }

        let time_ms = match parse_timed_line(line) {
            Ok(Some((time_ms, _))) => time_ms,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("[LRC 合并] 跳过时间戳无效的行 '{line}': {e}");
                continue;
            }
        };

        if let Some(trans_text) = find_closest_line(time_ms, &translations, max_drift_ms) {
            writeln!(result, "{}{trans_text}", format_lrc_time_ms(time_ms))?;
            merged_count += 1;
        }
    }

    crate::verbose_debug!(
        diag,
        "[LRC 合并] 共合并 {merged_count} 行翻译 (翻译行数 {})",
        translations.len()
    );
    Ok(result)
}

/// 生成逐字增强 LRC。
///
/// 每行格式为 `[行开始]<音节开始>音节...<最后音节结束>`；
/// 存在翻译时，在其后输出一行时间戳相同的译文。元数据中的 `kana` 不输出。
pub fn generate_enhanced_lrc(
    lines: &[LineInfo],
    metadata: &MetadataStore,
    translations: &[MetaLine],
    max_drift_ms: u64,
) -> Result<String, ConvertError> {
    if lines.is_empty() {
        return Err(ConvertError::NoTimedLines {
            format: OutputFormat::Eslrc,
        });
    }

    let mut result = metadata.to_lrc_tags(&[MetadataKey::Kana]);
    let has_translation = !translations.is_empty();

    for line in lines {
        let Some(last_word) = line.words.last() else {
            continue;
        };

        let line_timestamp = format_lrc_time_ms(line.start_ms);
        result.push_str(&line_timestamp);
        for word in &line.words {
            result.push_str(&format_enhanced_lrc_time_ms(word.start_ms));
            result.push_str(&word.text);
        }
        result.push_str(&format_enhanced_lrc_time_ms(last_word.end_ms()));
        result.push('\n');

        if has_translation
            && let Some(translation) = find_closest_line(line.start_ms, translations, max_drift_ms)
        {
            writeln!(result, "{line_timestamp}{translation}")?;
        }
    }

    Ok(result)
}
