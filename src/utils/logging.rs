use crate::utils::app_paths::AppPaths;
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Targets emitted by this crate
const CRATE_TARGETS: [&str; 3] = ["funifier_lottery", "funifier_api", "decoder"];

/// Path of the log file of this run, once logging is initialized
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Level for stderr output from the number of `-v` flags
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Filter directives: dependencies stay at `warn`, this crate logs at `level`
pub fn filter_directives(level: &str) -> String {
    let mut directives = vec!["warn".to_string()];
    directives.extend(CRATE_TARGETS.iter().map(|t| format!("{}={}", t, level)));
    directives.join(",")
}

/// Initialize tracing with a stderr layer and a per-run log file.
///
/// `RUST_LOG` overrides the stderr level. The file always records debug
/// output of this crate. Returns the log file path when one could be opened.
pub fn init_tracing(verbosity: u8) -> Option<PathBuf> {
    let stderr_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level_for_verbosity(verbosity))));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .without_time()
        .compact()
        .with_filter(stderr_filter);

    let log_file = AppPaths::log_dir()
        .ok()
        .and_then(|dir| open_log_file(&dir).ok());

    let (file_layer, log_path) = match log_file {
        Some((file, path)) => {
            let layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_timer(LocalTime::rfc_3339())
                .with_filter(EnvFilter::new(filter_directives("debug")));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    let initialized = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if let (true, Some(path)) = (initialized, &log_path) {
        LOG_PATH.set(path.clone()).ok();
        tracing::debug!("Logging to {}", path.display());
    }
    log_path
}

/// Log file of the current run
pub fn log_path() -> Option<&'static Path> {
    LOG_PATH.get().map(PathBuf::as_path)
}

/// Create a timestamped log file and point `latest.log` at it
fn open_log_file(log_dir: &Path) -> std::io::Result<(File, PathBuf)> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = log_dir.join(format!("funifier-lottery_{}.log", timestamp));

    let latest_path = log_dir.join("latest.log");

    #[cfg(unix)]
    {
        let _ = std::fs::remove_file(&latest_path);
        let _ = std::os::unix::fs::symlink(&log_path, &latest_path);
    }

    #[cfg(windows)]
    {
        let pointer_content = format!("Current log file: {}\n", log_path.display());
        let _ = std::fs::write(&latest_path, pointer_content);
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    Ok((file, log_path))
}
