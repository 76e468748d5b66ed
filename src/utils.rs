//! 时间编解码与若干共用的小工具。

use crate::types::ConvertError;

const METADATA_LINE_PREFIXES: [&str; 8] = [
    "[ti:", "[ar:", "[al:", "[by:", "[offset:", "[kana:", "[re:", "[ve:",
];

/// 判断一行是否是 LRC 元数据标签行 (只检查前缀)。
pub fn is_metadata_line(line: &str) -> bool {
    METADATA_LINE_PREFIXES
        .iter()
        .any(|prefix| line.starts_with(prefix))
}

/// 将 LRC 时间戳的三个部分解析为毫秒。
///
/// 小数部分为 2 位时视为厘秒（乘以 10），为 3 位时视为毫秒。
pub fn parse_lrc_time_parts(
    minutes_str: &str,
    seconds_str: &str,
    fraction_str: &str,
) -> Result<u64, ConvertError> {
    let minutes: u64 = minutes_str.parse()?;
    let seconds: u64 = seconds_str.parse()?;
    let milliseconds: u64 = match fraction_str.len() {
        2 => fraction_str.parse::<u64>()? * 10,
        3 => fraction_str.parse()?,
        _ => {
            return Err(ConvertError::InvalidTime(format!(
                "小数部分长度无效: '{fraction_str}'"
            )));
        }
    };
    Ok((minutes * 60 + seconds) * 1000 + milliseconds)
}

fn split_lrc_time(ms: u64) -> (u64, u64, u64) {
    let total_seconds = ms / 1000;
    (total_seconds / 60, total_seconds % 60, (ms % 1000) / 10)
}

/// 毫秒 -> `[mm:ss.xx]`
pub fn format_lrc_time_ms(ms: u64) -> String {
    let (minutes, seconds, centis) = split_lrc_time(ms);
    format!("[{minutes:02}:{seconds:02}.{centis:02}]")
}

/// 毫秒 -> `<mm:ss.xx>`，增强 LRC 中标记每个音节的开始。
pub fn format_enhanced_lrc_time_ms(ms: u64) -> String {
    let (minutes, seconds, centis) = split_lrc_time(ms);
    format!("<{minutes:02}:{seconds:02}.{centis:02}>")
}

/// 毫秒 -> TTML 时间。
///
/// # 示例
/// - `61001`   -> `"01:01.001"`
/// - `3661001` -> `"01:01:01.001"`
pub fn format_ttml_time(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let millis = ms % 1000;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
    } else {
        format!("{minutes:02}:{seconds:02}.{millis:03}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lrc_time_parts() {
        assert_eq!(parse_lrc_time_parts("01", "02", "34").unwrap(), 62_340);
        assert_eq!(parse_lrc_time_parts("01", "02", "345").unwrap(), 62_345);
        assert!(matches!(
            parse_lrc_time_parts("01", "02", "3"),
            Err(ConvertError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_lrc_time_is_stable_after_one_round() {
        for (m, s, f) in [("00", "00", "00"), ("03", "59", "99"), ("12", "07", "505")] {
            let first = parse_lrc_time_parts(m, s, f).unwrap();
            let encoded = format_lrc_time_ms(first);
            let inner = &encoded[1..encoded.len() - 1];
            let (mm, rest) = inner.split_once(':').unwrap();
            let (ss, frac) = rest.split_once('.').unwrap();
            let second = parse_lrc_time_parts(mm, ss, frac).unwrap();
            assert_eq!(format_lrc_time_ms(second), encoded);
            if f.len() == 2 {
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn test_format_lrc_time_keeps_large_minutes() {
        assert_eq!(format_lrc_time_ms(1_000), "[00:01.00]");
        assert_eq!(format_lrc_time_ms(1_609), "[00:01.60]");
        assert_eq!(format_lrc_time_ms(6_000_000), "[100:00.00]");
        assert_eq!(format_enhanced_lrc_time_ms(2_000), "<00:02.00>");
    }

    #[test]
    fn test_format_ttml_time() {
        assert_eq!(format_ttml_time(0), "00:00.000");
        assert_eq!(format_ttml_time(7_123), "00:07.123");
        assert_eq!(format_ttml_time(310_100), "05:10.100");
        assert_eq!(format_ttml_time(3_723_456), "01:02:03.456");
    }

    #[test]
    fn test_is_metadata_line() {
        assert!(is_metadata_line("[ti:Song]"));
        assert!(is_metadata_line("[offset:0]"));
        assert!(!is_metadata_line("[00:01.00]ti:"));
        assert!(!is_metadata_line("[length:03:00]"));
    }
}
