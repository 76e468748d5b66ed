//! 主歌词与翻译 / 罗马音之间的时间对齐，以及段落划分和总时长估算。

use crate::types::{DivInfo, LineInfo, MetaLine, RomanizationSource};

pub const TRANSLATION_MAX_DRIFT_MS: u64 = 500;
pub const ROMANIZATION_MAX_DRIFT_MS: u64 = 100;
pub const PARAGRAPH_GAP_MS: u64 = 1000;
pub const TRAILING_PAD_MS: u64 = 1000;

/// 在翻译行中查找与 `time_ms` 最接近的一行。
///
/// 时间差必须严格小于 `max_drift_ms`；时间差相同时取靠前的一行。
/// 调用方传入的列表不一定有序，所以这里做完整的线性扫描。
pub fn find_closest_line(time_ms: u64, lines: &[MetaLine], max_drift_ms: u64) -> Option<&str> {
    let mut best: Option<&MetaLine> = None;
    let mut min_diff = max_drift_ms;

    for line in lines {
        let diff = line.time_ms.abs_diff(time_ms);
        if diff < min_diff {
            min_diff = diff;
            best = Some(line);
        }
    }

    best.map(|line| line.text.as_str())
}

/// 按原有顺序返回第一条开始时间与 `time_ms` 相差不超过 `max_drift_ms` 的罗马音行。
///
/// 注意这里取的是“第一条在范围内的”，不是“最接近的”，与翻译匹配不同。
pub fn match_romanization_line(
    time_ms: u64,
    lines: &[LineInfo],
    max_drift_ms: u64,
) -> Option<&LineInfo> {
    lines
        .iter()
        .find(|line| line.start_ms.abs_diff(time_ms) <= max_drift_ms)
}

/// `match_romanization_line` 的 LRC 版本。
pub fn match_romanization_meta_line(
    time_ms: u64,
    lines: &[MetaLine],
    max_drift_ms: u64,
) -> Option<&MetaLine> {
    lines
        .iter()
        .find(|line| line.time_ms.abs_diff(time_ms) <= max_drift_ms)
}

/// 取出与某一主歌词行对应的罗马音文本。
///
/// YRC 来源会把所有非空白音节原样拼接，再整体去掉首尾空白；结果为空时返回 `None`。
pub fn romanization_text(
    time_ms: u64,
    source: &RomanizationSource,
    max_drift_ms: u64,
) -> Option<String> {
    let text = match source {
        RomanizationSource::Yrc(lines) => {
            let line = match_romanization_line(time_ms, lines, max_drift_ms)?;
            line.words
                .iter()
                .filter(|word| !word.text.trim().is_empty())
                .map(|word| word.text.as_str())
                .collect::<String>()
        }
        RomanizationSource::Lrc(lines) => {
            match_romanization_meta_line(time_ms, lines, max_drift_ms)?
                .text
                .clone()
        }
    };

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn close_div<'a>(start_ms: u64, lines: Vec<&'a LineInfo>) -> DivInfo<'a> {
    let end_ms = lines.last().map_or(start_ms, |line| line.content_end_ms());
    DivInfo {
        start_ms,
        end_ms,
        lines,
    }
}

/// 按时间间隔把歌词行划分为段落。
///
/// 当前行的开始时间与上一行实际内容结束时间之差大于 `max_gap_ms` 时开启新段落。
pub fn group_lines_into_divs(lines: &[LineInfo], max_gap_ms: u64) -> Vec<DivInfo<'_>> {
    let Some((first, rest)) = lines.split_first() else {
        return Vec::new();
    };

    let mut divs: Vec<DivInfo<'_>> = Vec::new();
    let mut current_start = first.start_ms;
    let mut current_lines: Vec<&LineInfo> = vec![first];
    let mut prev_line = first;

    for line in rest {
        let gap = line.start_ms.saturating_sub(prev_line.content_end_ms());
        if gap > max_gap_ms {
            divs.push(close_div(current_start, std::mem::take(&mut current_lines)));
            current_start = line.start_ms;
        }
        current_lines.push(line);
        prev_line = line;
    }

    divs.push(close_div(current_start, current_lines));
    divs
}

/// 估算歌曲时长：所有行实际内容结束时间的最大值加上 `trailing_pad_ms`，没有歌词行时为 0。
pub fn calculate_song_duration(lines: &[LineInfo], trailing_pad_ms: u64) -> u64 {
    lines
        .iter()
        .map(LineInfo::content_end_ms)
        .max()
        .map_or(0, |max_end| max_end.saturating_add(trailing_pad_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WordInfo;

    fn meta(time_ms: u64, text: &str) -> MetaLine {
        MetaLine {
            time_ms,
            text: text.to_string(),
        }
    }

    fn line(start_ms: u64, words: &[(&str, u64, u64)]) -> LineInfo {
        let words: Vec<WordInfo> = words
            .iter()
            .map(|&(text, start, dur)| WordInfo {
                text: text.to_string(),
                start_ms: start,
                duration_ms: dur,
            })
            .collect();
        let end_ms = words.last().map_or(start_ms, WordInfo::end_ms);
        LineInfo {
            words,
            start_ms,
            end_ms,
        }
    }

    #[test]
    fn test_translation_threshold_is_strict() {
        let lines = vec![meta(10_000, "译文")];
        assert_eq!(
            find_closest_line(10_499, &lines, TRANSLATION_MAX_DRIFT_MS),
            Some("译文")
        );
        assert_eq!(find_closest_line(10_500, &lines, TRANSLATION_MAX_DRIFT_MS), None);
        assert_eq!(find_closest_line(10_501, &lines, TRANSLATION_MAX_DRIFT_MS), None);
        assert_eq!(
            find_closest_line(9_501, &lines, TRANSLATION_MAX_DRIFT_MS),
            Some("译文")
        );
    }

    #[test]
    fn test_translation_picks_nearest_even_when_unsorted() {
        let lines = vec![meta(1_300, "far"), meta(1_050, "near"), meta(950, "tie")];
        assert_eq!(
            find_closest_line(1_000, &lines, TRANSLATION_MAX_DRIFT_MS),
            Some("near")
        );
        assert_eq!(find_closest_line(1_000, &[], TRANSLATION_MAX_DRIFT_MS), None);
    }

    #[test]
    fn test_romanization_first_in_range_wins() {
        let romaji = vec![
            line(900, &[("first", 900, 100)]),
            line(1_000, &[("exact", 1_000, 100)]),
        ];
        let matched = match_romanization_line(1_000, &romaji, ROMANIZATION_MAX_DRIFT_MS).unwrap();
        assert_eq!(matched.words[0].text, "first");
        assert!(match_romanization_line(1_101, &romaji[1..], ROMANIZATION_MAX_DRIFT_MS).is_none());
        assert!(match_romanization_line(1_100, &romaji[1..], ROMANIZATION_MAX_DRIFT_MS).is_some());
    }

    #[test]
    fn test_romanization_text_concatenation() {
        let source = RomanizationSource::Yrc(vec![line(
            2_000,
            &[("ko", 2_000, 100), (" ", 2_100, 10), ("no ", 2_110, 100), ("michi", 2_210, 100)],
        )]);
        assert_eq!(
            romanization_text(2_050, &source, ROMANIZATION_MAX_DRIFT_MS).as_deref(),
            Some("kono michi")
        );

        let blank = RomanizationSource::Yrc(vec![line(2_000, &[("  ", 2_000, 100)])]);
        assert_eq!(romanization_text(2_000, &blank, ROMANIZATION_MAX_DRIFT_MS), None);

        let lrc = RomanizationSource::Lrc(vec![meta(2_000, "kono michi")]);
        assert_eq!(
            romanization_text(2_100, &lrc, ROMANIZATION_MAX_DRIFT_MS).as_deref(),
            Some("kono michi")
        );
        assert_eq!(romanization_text(2_101, &lrc, ROMANIZATION_MAX_DRIFT_MS), None);
    }

    #[test]
    fn test_group_lines_gap_boundary() {
        // 相邻两行之间的间隔依次为 900、1000、1001
        let lines = vec![
            line(0, &[("a", 0, 1_000)]),
            line(1_900, &[("b", 1_900, 1_000)]),
            line(3_900, &[("c", 3_900, 1_000)]),
            line(5_901, &[("d", 5_901, 1_000)]),
        ];
        let divs = group_lines_into_divs(&lines, PARAGRAPH_GAP_MS);
        assert_eq!(divs.len(), 2);
        assert_eq!(divs[0].lines.len(), 3);
        assert_eq!((divs[0].start_ms, divs[0].end_ms), (0, 4_900));
        assert_eq!(divs[1].lines.len(), 1);
        assert_eq!((divs[1].start_ms, divs[1].end_ms), (5_901, 6_901));
    }

    #[test]
    fn test_group_uses_content_end_not_header_end() {
        let mut first = line(0, &[("a", 0, 500)]);
        first.end_ms = 5_000;
        let lines = vec![first, line(2_000, &[("b", 2_000, 500)])];
        assert_eq!(group_lines_into_divs(&lines, PARAGRAPH_GAP_MS).len(), 2);
    }

    #[test]
    fn test_group_single_and_empty() {
        assert!(group_lines_into_divs(&[], PARAGRAPH_GAP_MS).is_empty());
        let lines = vec![line(100, &[("a", 100, 200)])];
        let divs = group_lines_into_divs(&lines, PARAGRAPH_GAP_MS);
        assert_eq!(divs.len(), 1);
        assert_eq!((divs[0].start_ms, divs[0].end_ms), (100, 300));
    }

    #[test]
    fn test_calculate_song_duration() {
        assert_eq!(calculate_song_duration(&[], TRAILING_PAD_MS), 0);
        let lines = vec![
            line(0, &[("a", 0, 9_000)]),
            line(5_000, &[("b", 5_000, 1_000)]),
        ];
        assert_eq!(calculate_song_duration(&lines, TRAILING_PAD_MS), 10_000);
    }

    #[test]
    fn test_duration_and_grouping_near_u64_max() {
        let lines = vec![
            line(0, &[("a", 0, 1_000)]),
            line(u64::MAX - 10, &[("b", u64::MAX - 10, 5)]),
        ];
        assert_eq!(calculate_song_duration(&lines, TRAILING_PAD_MS), u64::MAX);
        let divs = group_lines_into_divs(&lines, PARAGRAPH_GAP_MS);
        assert_eq!(divs.len(), 2);
        assert_eq!(divs[1].end_ms, u64::MAX - 5);
    }
}
