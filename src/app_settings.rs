use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use directories::ProjectDirs;
use ini::Ini;
use log::LevelFilter;
use thiserror::Error;

const LOGGING_SECTION: &str = "Logging";
const CONVERSION_SECTION: &str = "Conversion";
// 在 INI 中把多个值拼接成一个字符串时使用的分隔符
const MULTI_VALUE_DELIMITER: &str = ";;;";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("INI 解析错误: {0}")]
    Ini(#[from] ini::Error),
    #[error("IO 错误: {0}")]
    Io(#[from] io::Error),
    #[error("无法确定配置文件路径")]
    NoConfigDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub enable_file_log: bool,
    pub file_log_level: LevelFilter,
    pub console_log_level: LevelFilter,
    /// 输出逐音节修正、逐行匹配等详细调试信息
    pub verbose: bool,
    pub log_file_path: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            enable_file_log: false,
            file_log_level: LevelFilter::Info,
            console_log_level: LevelFilter::Info,
            verbose: false,
            log_file_path: None,
        }
    }
}

/// 转换参数。默认值与上游歌词接口的行为一致。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSettings {
    /// 翻译匹配允许的最大时间差 (严格小于)
    pub translation_max_drift_ms: u64,
    /// 罗马音匹配允许的最大时间差 (小于等于)
    pub romanization_max_drift_ms: u64,
    /// 相邻两行间隔超过该值时切分段落
    pub paragraph_gap_ms: u64,
    /// 歌曲总时长在最后一个音节结束后追加的时长
    pub trailing_pad_ms: u64,
    /// TTML 翻译 span 的 xml:lang
    pub translation_language: String,
    /// 翻译 / 罗马音中需要剔除的水印子串
    pub watermark_denylist: Vec<String>,
}

impl Default for ConversionSettings {
    fn default() -> Self {
        ConversionSettings {
            translation_max_drift_ms: 500,
            romanization_max_drift_ms: 100,
            paragraph_gap_ms: 1000,
            trailing_pad_ms: 1000,
            translation_language: "zh-CN".to_string(),
            watermark_denylist: vec!["QQ音乐".to_string(), "制作".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppSettings {
    pub log_settings: LogSettings,
    pub conversion: ConversionSettings,
}

fn read_parsed<T: FromStr>(section: Option<&ini::Properties>, key: &str, default: T) -> T {
    match section.and_then(|s| s.get(key)) {
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            log::warn!("配置项 {key} 的值 '{raw}' 无效，使用默认值。");
            default
        }),
        None => default,
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        if let Some(proj_dirs) = ProjectDirs::from("com", "LyricApi", "LyricApi") {
            Some(proj_dirs.config_dir().join("lyric_api.ini"))
        } else {
            log::error!("无法获取项目配置目录路径。");
            None
        }
    }

    /// 从默认位置加载配置。文件不存在时写入一份默认配置；任何失败都退回默认值。
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            log::warn!("无法确定配置文件路径。将使用运行时默认配置。");
            return AppSettings::default();
        };

        if !path.exists() {
            log::info!("配置文件 {path:?} 未找到。将创建并使用默认配置。");
            let default_settings = AppSettings::default();
            if let Err(e) = default_settings.save_to_path(&path) {
                log::error!("无法保存初始默认配置文件到 {path:?}: {e}");
            }
            return default_settings;
        }

        match Self::load_from_path(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("加载配置文件 {path:?} 失败: {e}。将使用默认配置。");
                AppSettings::default()
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        let conf = Ini::load_from_file(path)?;
        let defaults = AppSettings::default();

        let log_section = conf.section(Some(LOGGING_SECTION));
        let log_settings = LogSettings {
            enable_file_log: read_parsed(
                log_section,
                "EnableFileLog",
                defaults.log_settings.enable_file_log,
            ),
            file_log_level: read_parsed(
                log_section,
                "FileLogLevel",
                defaults.log_settings.file_log_level,
            ),
            console_log_level: read_parsed(
                log_section,
                "ConsoleLogLevel",
                defaults.log_settings.console_log_level,
            ),
            verbose: read_parsed(log_section, "Verbose", defaults.log_settings.verbose),
            log_file_path: log_section
                .and_then(|s| s.get("LogFilePath"))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        };

        let conv_section = conf.section(Some(CONVERSION_SECTION));
        let conv_defaults = defaults.conversion;
        let conversion = ConversionSettings {
            translation_max_drift_ms: read_parsed(
                conv_section,
                "TranslationMaxDriftMs",
                conv_defaults.translation_max_drift_ms,
            ),
            romanization_max_drift_ms: read_parsed(
                conv_section,
                "RomanizationMaxDriftMs",
                conv_defaults.romanization_max_drift_ms,
            ),
            paragraph_gap_ms: read_parsed(
                conv_section,
                "ParagraphGapMs",
                conv_defaults.paragraph_gap_ms,
            ),
            trailing_pad_ms: read_parsed(
                conv_section,
                "TrailingPadMs",
                conv_defaults.trailing_pad_ms,
            ),
            translation_language: conv_section
                .and_then(|s| s.get("TranslationLanguage"))
                .map(|s| s.trim().to_string())
                .unwrap_or(conv_defaults.translation_language),
            watermark_denylist: conv_section
                .and_then(|s| s.get("WatermarkDenylist"))
                .map(|s| {
                    s.split(MULTI_VALUE_DELIMITER)
                        .map(str::trim)
                        .filter(|v| !v.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or(conv_defaults.watermark_denylist),
        };

        log::info!("从 {path:?} 加载配置成功。");
        Ok(AppSettings {
            log_settings,
            conversion,
        })
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::config_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut conf = Ini::new();
        let log = &self.log_settings;
        conf.with_section(Some(LOGGING_SECTION))
            .set("EnableFileLog", log.enable_file_log.to_string())
            .set("FileLogLevel", log.file_log_level.to_string())
            .set("ConsoleLogLevel", log.console_log_level.to_string())
            .set("Verbose", log.verbose.to_string())
            .set(
                "LogFilePath",
                log.log_file_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );

        let conv = &self.conversion;
        conf.with_section(Some(CONVERSION_SECTION))
            .set(
                "TranslationMaxDriftMs",
                conv.translation_max_drift_ms.to_string(),
            )
            .set(
                "RomanizationMaxDriftMs",
                conv.romanization_max_drift_ms.to_string(),
            )
            .set("ParagraphGapMs", conv.paragraph_gap_ms.to_string())
            .set("TrailingPadMs", conv.trailing_pad_ms.to_string())
            .set("TranslationLanguage", conv.translation_language.clone())
            .set(
                "WatermarkDenylist",
                conv.watermark_denylist.join(MULTI_VALUE_DELIMITER),
            );

        conf.write_to_file(path)?;
        log::info!("配置已保存到 {path:?}");
        Ok(())
    }
}
