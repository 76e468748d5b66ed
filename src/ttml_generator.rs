use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesText, Event};

use crate::buffer_pool::BufferPool;
use crate::logger::Diagnostics;
use crate::lyrics_merger::{
    PARAGRAPH_GAP_MS, ROMANIZATION_MAX_DRIFT_MS, TRAILING_PAD_MS, TRANSLATION_MAX_DRIFT_MS,
    calculate_song_duration, find_closest_line, group_lines_into_divs, romanization_text,
};
use crate::types::{ConvertError, DivInfo, LineInfo, MetaLine, OutputFormat, RomanizationSource};
use crate::utils::format_ttml_time;

const TTML_NAMESPACE: &str = "http://www.w3.org/ns/ttml";
const TTML_METADATA_NAMESPACE: &str = "http://www.w3.org/ns/ttml#metadata";
const ITUNES_NAMESPACE: &str = "http://music.apple.com/lyric-ttml-internal";
const AGENT_ID: &str = "v1";

/// TTML 生成参数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtmlOptions {
    pub translation_max_drift_ms: u64,
    pub romanization_max_drift_ms: u64,
    pub paragraph_gap_ms: u64,
    pub trailing_pad_ms: u64,
    /// 翻译 span 的 `xml:lang`，为空时不输出该属性
    pub translation_language: String,
}

impl Default for TtmlOptions {
    fn default() -> Self {
        Self {
            translation_max_drift_ms: TRANSLATION_MAX_DRIFT_MS,
            romanization_max_drift_ms: ROMANIZATION_MAX_DRIFT_MS,
            paragraph_gap_ms: PARAGRAPH_GAP_MS,
            trailing_pad_ms: TRAILING_PAD_MS,
            translation_language: "zh-CN".to_string(),
        }
    }
}

/// 一次 TTML 生成所需的全部输入。
pub struct TtmlSources<'a> {
    pub lines: &'a [LineInfo],
    pub translations: &'a [MetaLine],
    pub romanization: &'a RomanizationSource,
}

fn write_text_span<W: io::Write>(
    writer: &mut Writer<W>,
    attributes: &[(&str, &str)],
    text: &str,
) -> io::Result<()> {
    writer
        .create_element("span")
        .with_attributes(attributes.iter().copied())
        .write_text_content(BytesText::from_escaped(partial_escape(text)))?;
    Ok(())
}

fn write_line<W: io::Write>(
    writer: &mut Writer<W>,
    line: &LineInfo,
    key: usize,
    sources: &TtmlSources<'_>,
    options: &TtmlOptions,
) -> io::Result<()> {
    let begin = format_ttml_time(line.start_ms);
    let end = format_ttml_time(line.content_end_ms());
    let key_str = format!("L{key}");

    writer
        .create_element("p")
        .with_attribute(("begin", begin.as_str()))
        .with_attribute(("end", end.as_str()))
        .with_attribute(("ttm:agent", AGENT_ID))
        .with_attribute(("itunes:key", key_str.as_str()))
        .write_inner_content(|p_writer| -> io::Result<()> {
            for word in &line.words {
                let word_begin = format_ttml_time(word.start_ms);
                let word_end = format_ttml_time(word.end_ms());
                write_text_span(
                    p_writer,
                    &[("begin", word_begin.as_str()), ("end", word_end.as_str())],
                    &word.text,
                )?;
            }

            if let Some(translation) = find_closest_line(
                line.start_ms,
                sources.translations,
                options.translation_max_drift_ms,
            ) {
                if options.translation_language.is_empty() {
                    write_text_span(p_writer, &[("ttm:role", "x-translation")], translation)?;
                } else {
                    write_text_span(
                        p_writer,
                        &[
                            ("ttm:role", "x-translation"),
                            ("xml:lang", options.translation_language.as_str()),
                        ],
                        translation,
                    )?;
                }
            }

            if let Some(roman) = romanization_text(
                line.start_ms,
                sources.romanization,
                options.romanization_max_drift_ms,
            ) {
                write_text_span(p_writer, &[("ttm:role", "x-roman")], &roman)?;
            }

            Ok(())
        })?;
    Ok(())
}

fn write_div<W: io::Write>(
    writer: &mut Writer<W>,
    div: &DivInfo<'_>,
    key_counter: &mut usize,
    sources: &TtmlSources<'_>,
    options: &TtmlOptions,
) -> io::Result<()> {
    let begin = format_ttml_time(div.start_ms);
    let end = format_ttml_time(div.end_ms);

    writer
        .create_element("div")
        .with_attribute(("begin", begin.as_str()))
        .with_attribute(("end", end.as_str()))
        .write_inner_content(|div_writer| -> io::Result<()> {
            for line in &div.lines {
                write_line(div_writer, line, *key_counter, sources, options)?;
                *key_counter += 1;
            }
            Ok(())
        })?;
    Ok(())
}

/// 生成逐字 TTML。
///
/// 歌词行按时间间隔分为若干 `<div>`，每行一个 `<p>`，`itunes:key` 在整个文档内从 `L1` 递增。
/// 没有任何可用的歌词行时返回 `ConvertError::NoTimedLines`。
pub fn generate_ttml(
    sources: &TtmlSources<'_>,
    options: &TtmlOptions,
    pool: &BufferPool,
    diag: Diagnostics,
) -> Result<String, ConvertError> {
    if sources.lines.is_empty() {
        return Err(ConvertError::NoTimedLines {
            format: OutputFormat::Ttml,
        });
    }

    let divs = group_lines_into_divs(sources.lines, options.paragraph_gap_ms);
    let song_duration = format_ttml_time(calculate_song_duration(
        sources.lines,
        options.trailing_pad_ms,
    ));
    crate::verbose_debug!(
        diag,
        "[TTML 生成] {} 行歌词分为 {} 个段落，总时长 {song_duration}",
        sources.lines.len(),
        divs.len()
    );

    let mut buffer = pool.acquire();
    {
        let mut writer = Writer::new_with_indent(&mut *buffer, b' ', 4);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let mut key_counter = 1usize;
        writer
            .create_element("tt")
            .with_attribute(("xmlns", TTML_NAMESPACE))
            .with_attribute(("xmlns:ttm", TTML_METADATA_NAMESPACE))
            .with_attribute(("xmlns:itunes", ITUNES_NAMESPACE))
            .with_attribute(("itunes:timing", "Word"))
            .write_inner_content(|tt_writer| -> io::Result<()> {
                tt_writer
                    .create_element("head")
                    .write_inner_content(|head_writer| -> io::Result<()> {
                        head_writer.create_element("metadata").write_inner_content(
                            |meta_writer| -> io::Result<()> {
                                meta_writer
                                    .create_element("ttm:agent")
                                    .with_attribute(("type", "person"))
                                    .with_attribute(("xml:id", AGENT_ID))
                                    .write_empty()?;
                                Ok(())
                            },
                        )?;
                        Ok(())
                    })?;

                tt_writer
                    .create_element("body")
                    .with_attribute(("dur", song_duration.as_str()))
                    .write_inner_content(|body_writer| -> io::Result<()> {
                        for (div_idx, div) in divs.iter().enumerate() {
                            // 段落之间空一行
                            if div_idx > 0 {
                                body_writer.get_mut().write_all(b"\n")?;
                            }
                            write_div(body_writer, div, &mut key_counter, sources, options)?;
                        }
                        Ok(())
                    })?;
                Ok(())
            })?;
    }
    buffer.push(b'\n');

    Ok(buffer.to_utf8_string()?)
}
