//! 歌词格式转换核心：解析 LRC / YRC，生成合并翻译的 LRC、逐字增强 LRC 与 TTML。

pub mod app_settings;
pub mod buffer_pool;
pub mod converter;
pub mod logger;
pub mod lrc_generator;
pub mod lrc_parser;
pub mod lyrics_merger;
pub mod metadata_processor;
pub mod ttml_generator;
pub mod types;
pub mod utils;
pub mod yrc_parser;

pub use converter::{ConverterOptions, LyricConverter};
pub use types::{ConvertError, ConvertedLyrics, LyricSources, OutputFormat};
