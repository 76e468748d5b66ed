//! 转换入口：把一次请求的原始歌词文本转换为三种输出格式。

use crate::app_settings::ConversionSettings;
use crate::buffer_pool::BufferPool;
use crate::logger::Diagnostics;
use crate::lrc_generator::{generate_enhanced_lrc, merge_lrc_with_translation};
use crate::lrc_parser::{WatermarkFilter, parse_lrc_timeline};
use crate::metadata_processor::MetadataStore;
use crate::ttml_generator::{TtmlOptions, TtmlSources, generate_ttml};
use crate::types::{
    ConvertError, ConvertedLyrics, LyricSources, MetadataKey, OutputFormat, RomanizationSource,
};
use crate::yrc_parser::parse_yrc;

/// 构造 `LyricConverter` 的参数。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterOptions {
    pub ttml: TtmlOptions,
    pub watermark_filter: WatermarkFilter,
    pub diagnostics: Diagnostics,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self::from_settings(&ConversionSettings::default(), false)
    }
}

impl ConverterOptions {
    pub fn from_settings(settings: &ConversionSettings, verbose: bool) -> Self {
        Self {
            ttml: TtmlOptions {
                translation_max_drift_ms: settings.translation_max_drift_ms,
                romanization_max_drift_ms: settings.romanization_max_drift_ms,
                paragraph_gap_ms: settings.paragraph_gap_ms,
                trailing_pad_ms: settings.trailing_pad_ms,
                translation_language: settings.translation_language.clone(),
            },
            watermark_filter: WatermarkFilter::new(settings.watermark_denylist.iter().cloned()),
            diagnostics: Diagnostics::new(verbose),
        }
    }
}

/// 无状态的歌词转换器，可在多个线程间共享。
///
/// 唯一的共享数据是 TTML 输出缓冲池，它不保存任何与请求相关的内容。
#[derive(Debug, Default)]
pub struct LyricConverter {
    options: ConverterOptions,
    pool: BufferPool,
}

fn non_blank(text: Option<&String>) -> Option<&str> {
    text.map(String::as_str).filter(|s| !s.trim().is_empty())
}

impl LyricConverter {
    pub fn new(options: ConverterOptions) -> Self {
        Self {
            options,
            pool: BufferPool::default(),
        }
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// 合并翻译后的 LRC。翻译为空时原样返回。
    pub fn convert_lrc(&self, lrc: &str, translation: &str) -> Result<String, ConvertError> {
        merge_lrc_with_translation(
            lrc,
            translation,
            &self.options.watermark_filter,
            self.options.ttml.translation_max_drift_ms,
            self.options.diagnostics,
        )
    }

    /// 由 YRC 生成逐字增强 LRC，元数据取自原始 LRC。
    pub fn convert_eslrc(
        &self,
        yrc: &str,
        lrc: &str,
        translation: &str,
    ) -> Result<String, ConvertError> {
        let diag = self.options.diagnostics;
        let lines = parse_yrc(yrc, diag);
        let metadata = MetadataStore::parse_lrc_metadata(lrc);
        let translations = parse_lrc_timeline(translation, &self.options.watermark_filter);
        generate_enhanced_lrc(
            &lines,
            &metadata,
            &translations,
            self.options.ttml.translation_max_drift_ms,
        )
    }

    /// 解析罗马音。先按 YRC 解析，没有得到任何行时再按 LRC 解析。
    pub fn parse_romanization(&self, romanization: &str) -> RomanizationSource {
        let yrc_lines = parse_yrc(romanization, self.options.diagnostics);
        if !yrc_lines.is_empty() {
            return RomanizationSource::Yrc(yrc_lines);
        }
        let lrc_lines = parse_lrc_timeline(romanization, &self.options.watermark_filter);
        if lrc_lines.is_empty() {
            RomanizationSource::default()
        } else {
            RomanizationSource::Lrc(lrc_lines)
        }
    }

    /// 由 YRC 生成带翻译与罗马音的 TTML。
    pub fn convert_ttml(
        &self,
        yrc: &str,
        translation: &str,
        romanization: &str,
    ) -> Result<String, ConvertError> {
        let diag = self.options.diagnostics;
        let lines = parse_yrc(yrc, diag);
        let translations = parse_lrc_timeline(translation, &self.options.watermark_filter);
        let romanization = self.parse_romanization(romanization);
        let sources = TtmlSources {
            lines: &lines,
            translations: &translations,
            romanization: &romanization,
        };
        generate_ttml(&sources, &self.options.ttml, &self.pool, diag)
    }

    /// 转换一次请求的所有输出。
    ///
    /// 三种格式互相独立：某一种失败只会记录日志并让对应字段为 `None`。
    /// 歌名、歌手、专辑缺失时从 LRC 元数据 (`ti` / `ar` / `al`) 中补全。
    pub fn convert(&self, sources: &LyricSources) -> ConvertedLyrics {
        // 只含空白的 LRC 也原样输出
        let lrc = sources.lrc.as_deref().filter(|s| !s.is_empty());
        let yrc = non_blank(sources.yrc.as_ref());
        let translation = non_blank(sources.translation.as_ref()).unwrap_or("");
        let romanization = non_blank(sources.romanization.as_ref()).unwrap_or("");

        let metadata = MetadataStore::parse_lrc_metadata(lrc.unwrap_or(""));
        let pick = |given: &Option<String>, key: MetadataKey| -> Option<String> {
            non_blank(given.as_ref())
                .or_else(|| metadata.get_non_empty(key))
                .map(str::to_string)
        };

        let mut output = ConvertedLyrics {
            song: pick(&sources.song, MetadataKey::Title),
            singer: pick(&sources.singer, MetadataKey::Artist),
            album: pick(&sources.album, MetadataKey::Album),
            ..Default::default()
        };

        if let Some(lrc) = lrc {
            output.lrc = self.finish(OutputFormat::Lrc, self.convert_lrc(lrc, translation));
        }

        if let Some(yrc) = yrc {
            output.ttml = self.finish(
                OutputFormat::Ttml,
                self.convert_ttml(yrc, translation, romanization),
            );
            output.eslrc = self.finish(
                OutputFormat::Eslrc,
                self.convert_eslrc(yrc, lrc.unwrap_or(""), translation),
            );
        }

        output
    }

    fn finish(
        &self,
        format: OutputFormat,
        result: Result<String, ConvertError>,
    ) -> Option<String> {
        match result {
            Ok(text) => {
                log::info!("[Converter] {format} 转换完成 ({} 字节)", text.len());
                Some(text)
            }
            Err(e) => {
                log::error!("[Converter] {format} 转换失败: {e}");
                None
            }
        }
    }
}
