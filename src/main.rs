use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use lyric_api::app_settings::AppSettings;
use lyric_api::{ConverterOptions, LyricConverter, LyricSources, OutputFormat, logger};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CliFormat {
    /// 全部结果，JSON 格式
    Json,
    /// 合并翻译后的 LRC
    Lrc,
    /// 逐字增强 LRC
    Eslrc,
    Ttml,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(level: CliLogLevel) -> Self {
        match level {
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "lyric_api")]
#[command(version)]
#[command(about = "将 LRC / YRC 歌词转换为合并翻译的 LRC、逐字增强 LRC 与 TTML")]
struct CommandLineOptions {
    /// 原始 LRC 文件
    #[arg(long, value_name = "FILE")]
    lrc: Option<PathBuf>,

    /// 逐字 YRC 文件
    #[arg(long, value_name = "FILE")]
    yrc: Option<PathBuf>,

    /// LRC 格式的翻译文件
    #[arg(long, value_name = "FILE")]
    translation: Option<PathBuf>,

    /// YRC 或 LRC 格式的罗马音文件
    #[arg(long, value_name = "FILE")]
    romanization: Option<PathBuf>,

    #[arg(long)]
    song: Option<String>,

    #[arg(long)]
    singer: Option<String>,

    #[arg(long)]
    album: Option<String>,

    /// 输出格式
    #[arg(short, long, value_enum, default_value = "json")]
    format: CliFormat,

    /// 配置文件路径，缺省时使用系统配置目录下的 lyric_api.ini
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// 输出详细的转换调试信息
    #[arg(short, long, env = "LYRIC_API_VERBOSE")]
    verbose: bool,

    /// 控制台日志级别
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

fn read_optional(path: Option<&Path>) -> io::Result<Option<String>> {
    path.map(fs::read_to_string).transpose()
}

fn load_settings(config: Option<&Path>) -> AppSettings {
    match config {
        Some(path) => AppSettings::load_from_path(path).unwrap_or_else(|e| {
            eprintln!("加载配置文件 {path:?} 失败: {e}。将使用默认配置。");
            AppSettings::default()
        }),
        None => AppSettings::load(),
    }
}

fn read_sources(options: &CommandLineOptions) -> io::Result<LyricSources> {
    Ok(LyricSources {
        lrc: read_optional(options.lrc.as_deref())?,
        yrc: read_optional(options.yrc.as_deref())?,
        translation: read_optional(options.translation.as_deref())?,
        romanization: read_optional(options.romanization.as_deref())?,
        song: options.song.clone(),
        singer: options.singer.clone(),
        album: options.album.clone(),
    })
}

fn main() -> ExitCode {
    let options = CommandLineOptions::parse();

    let mut settings = load_settings(options.config.as_deref());
    // 兼容旧的 DEBUG=true 开关
    let debug_env = std::env::var("DEBUG").is_ok_and(|v| v == "true");
    settings.log_settings.verbose |= options.verbose || debug_env;
    if let Some(level) = options.log_level {
        settings.log_settings.console_log_level = level.into();
    }
    logger::init_logger(&settings.log_settings);

    let sources = match read_sources(&options) {
        Ok(sources) => sources,
        Err(e) => {
            log::error!("读取输入文件失败: {e}");
            return ExitCode::FAILURE;
        }
    };

    let converter = LyricConverter::new(ConverterOptions::from_settings(
        &settings.conversion,
        settings.log_settings.verbose,
    ));
    let converted = converter.convert(&sources);

    let format = match options.format {
        CliFormat::Json => {
            return match serde_json::to_string_pretty(&converted) {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    log::error!("序列化结果失败: {e}");
                    ExitCode::FAILURE
                }
            };
        }
        CliFormat::Lrc => OutputFormat::Lrc,
        CliFormat::Eslrc => OutputFormat::Eslrc,
        CliFormat::Ttml => OutputFormat::Ttml,
    };

    match converted.get(format) {
        Some(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        None => {
            log::error!("未能生成 {format} 格式的歌词");
            ExitCode::FAILURE
        }
    }
}
