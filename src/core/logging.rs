//! Logging backend configuration
//!
//! flexi_logger-based logging with selectable text, colored text, and JSON
//! formats, optional file duplication, and runtime log-level changes.

// Global handle so the level can be reconfigured after startup
static LOGGER_HANDLE: std::sync::OnceLock<std::sync::Mutex<flexi_logger::LoggerHandle>> =
    std::sync::OnceLock::new();

pub fn init_logging(
    log_level: Option<&str>,
    log_format: Option<&str>,
    log_file: Option<&str>,
    color_enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use flexi_logger::{FileSpec, Logger};

    let level_str = log_level.unwrap_or("info");
    let format_type = log_format.unwrap_or("text");

    let mut logger = Logger::try_with_str(level_str)?;

    logger = match (format_type, color_enabled) {
        ("json", _) => logger.format(json_format),
        (_, true) => logger.format(color_format),
        (_, false) => logger.format(plain_format),
    };

    if let Some(file_path) = log_file {
        let file_spec = FileSpec::try_from(std::path::Path::new(file_path))?;
        logger = logger.log_to_file(file_spec).duplicate_to_stdout(
            flexi_logger::Duplicate::All,
        );
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(std::sync::Mutex::new(handle));

    Ok(())
}

/// Change the active log level at runtime
///
/// Only the level can change after initialisation; format and file output are
/// fixed once the logger has started.
pub fn reconfigure_log_level(log_level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let handle_mutex = LOGGER_HANDLE
        .get()
        .ok_or("Logger not initialised. Call init_logging first.")?;
    let mut handle = handle_mutex
        .lock()
        .map_err(|_| "Could not acquire logger handle lock")?;
    handle.parse_and_push_temp_spec(log_level)?;
    Ok(())
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

// Format: "YYYY-MM-DD HH:mm:ss.fff INF message (supervisor/worker.rs:42)"
fn plain_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args(),
        format_target_as_path(record.target(), record.line())
    )
}

fn color_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    let level_colored = match record.level() {
        log::Level::Error => "ERR".red().bold(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Info => "INF".green(),
        log::Level::Debug => "DBG".blue(),
        log::Level::Trace => "TRC".magenta(),
    };

    write!(
        w,
        "{} {} {} ({})",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        level_colored,
        record.args(),
        format_target_as_path(record.target(), record.line()).dimmed()
    )
}

fn json_format(
    w: &mut dyn std::io::Write,
    now: &mut flexi_logger::DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use serde_json::{json, to_string};

    let json_obj = json!({
        "timestamp": now.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "level": level_abbr(record.level()),
        "message": record.args().to_string(),
        "target": format_target_as_path(record.target(), record.line()),
    });

    match to_string(&json_obj) {
        Ok(json_string) => w.write_all(json_string.as_bytes()),
        Err(_) => w.write_all(b"{\"error\":\"Failed to serialize log message\"}"),
    }
}

// Convert graphswap::supervisor::worker -> supervisor/worker.rs:42
fn format_target_as_path(target: &str, line: Option<u32>) -> String {
    let path_like = if let Some(without_prefix) = target.strip_prefix("graphswap::") {
        without_prefix.replace("::", "/") + ".rs"
    } else {
        target.replace("::", "/")
    };

    match line {
        Some(line_num) => format!("{path_like}:{line_num}"),
        None => path_like,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_formatted_as_source_path() {
        assert_eq!(
            format_target_as_path("graphswap::supervisor::worker", Some(42)),
            "supervisor/worker.rs:42"
        );
        assert_eq!(
            format_target_as_path("graphswap::health", None),
            "health.rs"
        );
        // External targets keep their crate prefix
        assert_eq!(
            format_target_as_path("reqwest::connect", Some(7)),
            "reqwest/connect:7"
        );
    }

    #[test]
    fn test_plain_format_structure() {
        let mut buffer = Vec::new();
        let mut now = flexi_logger::DeferredNow::new();

        let record = log::Record::builder()
            .level(log::Level::Info)
            .target("test_target")
            .args(format_args!("alias switched"))
            .build();

        plain_format(&mut buffer, &mut now, &record).expect("format should succeed");
        let output = String::from_utf8(buffer).expect("output should be valid UTF-8");

        assert!(output.contains("INF alias switched"), "got: {output}");
        assert!(output.contains("(test_target"), "got: {output}");
    }

    #[test]
    fn test_json_format_is_compact_object() {
        let mut buffer = Vec::new();
        let mut now = flexi_logger::DeferredNow::new();

        let record = log::Record::builder()
            .level(log::Level::Warn)
            .target("graphswap::queue")
            .args(format_args!("queue closed"))
            .build();

        json_format(&mut buffer, &mut now, &record).expect("format should succeed");
        let parsed: serde_json::Value =
            serde_json::from_slice(&buffer).expect("output should be valid JSON");

        assert_eq!(parsed["level"], "WRN");
        assert_eq!(parsed["message"], "queue closed");
        assert_eq!(parsed["target"], "queue.rs");
    }
}
