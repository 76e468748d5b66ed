use std::path::{Path, PathBuf};

use chrono::Local;
use directories::ProjectDirs;
use fern::Dispatch;
use log::LevelFilter;

use crate::app_settings::LogSettings;

/// 转换组件使用的诊断开关，在构造时注入。
///
/// 普通的 info / warn / error 日志总会经过 `log` 门面；
/// 只有 `verbose` 打开时才输出逐音节、逐行匹配这类高频调试信息。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    verbose: bool,
}

impl Diagnostics {
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub const fn is_verbose(self) -> bool {
        self.verbose
    }
}

/// 仅在 `Diagnostics` 打开详细模式时输出 debug 日志。
#[macro_export]
macro_rules! verbose_debug {
    ($diag:expr, $($arg:tt)+) => {
        if $diag.is_verbose() {
            log::debug!($($arg)+)
        }
    };
}

/// 日志文件的默认路径：系统数据目录下的 `lyric_api.log`，取不到时退回当前目录。
pub fn default_log_file_path() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "LyricApi", "LyricApi") {
        proj_dirs.data_local_dir().join("lyric_api.log")
    } else {
        let fallback = PathBuf::from("lyric_api.log");
        eprintln!("无法获取项目日志目录，将尝试在当前目录创建日志: {fallback:?}");
        fallback
    }
}

fn open_log_file(path: &Path) -> Result<std::fs::File, std::io::Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    fern::log_file(path)
}

/// 在进程启动时初始化全局日志。控制台输出到 stderr，文件日志可选。
pub fn init_logger(settings: &LogSettings) {
    let console_level = if settings.verbose {
        LevelFilter::Debug.max(settings.console_log_level)
    } else {
        settings.console_log_level
    };

    let console_dispatch = Dispatch::new()
        .level(console_level)
        .chain(std::io::stderr());

    let mut root_dispatch = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
                record.level(),
                message
            ))
        })
        .chain(console_dispatch);

    if settings.enable_file_log {
        let log_file_path = settings
            .log_file_path
            .clone()
            .unwrap_or_else(default_log_file_path);
        match open_log_file(&log_file_path) {
            Ok(log_file) => {
                root_dispatch =
                    root_dispatch.chain(Dispatch::new().level(settings.file_log_level).chain(log_file));
            }
            Err(e) => {
                eprintln!("无法打开日志文件 {log_file_path:?}: {e}。文件日志将被禁用。");
            }
        }
    }

    if let Err(e) = root_dispatch.apply() {
        eprintln!("日志记录器初始化失败: {e}");
    } else {
        log::debug!("日志记录器已初始化。");
    }
}
