use std::any::Any;
use std::path::Path;

pub const LOG_FILE_BASENAME: &str = "taskboard";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 100 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 30;
pub const LOG_ENV_VAR: &str = "TASKBOARD_LOG";

/// Log files live next to data.json/settings.json.
pub fn log_directory(app_data_dir: &Path) -> &Path {
    app_data_dir
}

/// Picks the logger spec: `TASKBOARD_LOG`, then `RUST_LOG`, then the build default.
pub fn log_spec(own: Option<String>, rust_log: Option<String>) -> String {
    let default_spec = if cfg!(debug_assertions) {
        "warn,taskboard=debug"
    } else {
        "warn,taskboard=info"
    };
    own.filter(|value| !value.trim().is_empty())
        .or_else(|| rust_log.filter(|value| !value.trim().is_empty()))
        .unwrap_or_else(|| default_spec.to_string())
}

/// Extracts the message of a panic payload, if it is a string.
pub fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return message;
    }
    payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .unwrap_or("<non-string panic payload>")
}

#[cfg(feature = "app")]
fn log_file(app_data_dir: &Path) -> flexi_logger::FileSpec {
    flexi_logger::FileSpec::default()
        .directory(log_directory(app_data_dir))
        .basename(LOG_FILE_BASENAME)
        .suffix(LOG_FILE_SUFFIX)
}

/// Debug builds mirror info and above to stdout.
#[cfg(feature = "app")]
fn stdout_mirror() -> flexi_logger::Duplicate {
    if cfg!(debug_assertions) {
        flexi_logger::Duplicate::Info
    } else {
        flexi_logger::Duplicate::None
    }
}

/// Starts the rotating file logger in `app_data_dir` and installs the panic hook.
#[cfg(feature = "app")]
pub fn init_logging(app_data_dir: &Path) -> Result<(), flexi_logger::FlexiLoggerError> {
    use flexi_logger::{detailed_format, Cleanup, Criterion, Logger, Naming, WriteMode};

    std::fs::create_dir_all(app_data_dir)?;
    let spec = log_spec(
        std::env::var(LOG_ENV_VAR).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let rotation = Criterion::Size(LOG_ROTATE_SIZE_BYTES);

    Logger::try_with_str(&spec)?
        .log_to_file(log_file(app_data_dir))
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            rotation,
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stdout(stdout_mirror())
        .start()?;

    install_panic_hook();
    log::info!(
        "taskboard logging started spec={spec} dir={}",
        log_directory(app_data_dir).display()
    );
    Ok(())
}

#[cfg(feature = "app")]
fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &std::panic::PanicHookInfo<'_>| {
        let location = info
            .location()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<unknown>".to_string());
        log::error!(
            "panic at {location}: {}\n{}",
            panic_message(info.payload()),
            std::backtrace::Backtrace::force_capture()
        );
        previous(info);
    }));
}
