use std::{fmt, fs::OpenOptions, io::Write, path::PathBuf, sync::RwLock};

use anyhow::Result;
use once_cell::sync::Lazy;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

const LOG_FILE: &str = "describo.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
        })
    }
}

/**
 * \brief Where request and provider events go. Errors reach stderr even when the file log is off.
 */
#[derive(Debug, Clone)]
struct Sink {
    file_enabled: bool,
    dir: PathBuf,
}

impl Default for Sink {
    fn default() -> Self {
        Self {
            file_enabled: false,
            dir: PathBuf::from("logs"),
        }
    }
}

impl Sink {
    fn append(&self, line: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(LOG_FILE))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

static SINK: Lazy<RwLock<Sink>> = Lazy::new(|| RwLock::new(Sink::default()));

fn current_sink() -> Sink {
    SINK.read().map(|s| s.clone()).unwrap_or_default()
}

fn update_sink(f: impl FnOnce(&mut Sink)) {
    if let Ok(mut sink) = SINK.write() {
        f(&mut sink);
    }
}

pub fn set_enabled(enabled: bool) {
    update_sink(|s| s.file_enabled = enabled);
}

pub fn is_enabled() -> bool {
    current_sink().file_enabled
}

/** \brief Directory holding `describo.log`; `logs` unless changed. */
pub fn set_log_dir(dir: impl Into<PathBuf>) {
    let dir = dir.into();
    update_sink(|s| s.dir = dir);
}

/**
 * \brief `<rfc3339> [LEVEL] category - message`
 */
pub fn format_line(at: OffsetDateTime, level: Level, category: &str, message: &str) -> String {
    let stamp = at
        .format(&Rfc3339)
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!("{} [{}] {} - {}", stamp, level, category, message)
}

pub fn record(level: Level, category: &str, message: &str) {
    if level == Level::Error {
        eprintln!("[{}] {} - {}", level, category, message);
    }
    let sink = current_sink();
    if !sink.file_enabled {
        return;
    }
    let line = format_line(OffsetDateTime::now_utc(), level, category, message);
    if let Err(err) = sink.append(&line) {
        eprintln!("telemetry write failed: {}", err);
    }
}

pub fn log_event(category: &str, message: &str) {
    record(Level::Info, category, message);
}

pub fn log_error(category: &str, message: &str) {
    record(Level::Error, category, message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_format_line_layout() {
        let line = format_line(
            datetime!(2024-05-01 12:30:00 UTC),
            Level::Error,
            "router",
            "boom",
        );
        assert_eq!(line, "2024-05-01T12:30:00Z [ERROR] router - boom");
    }

    #[test]
    fn test_sink_appends_lines() {
        let dir = std::env::temp_dir().join(format!("describo-telemetry-{}", std::process::id()));
        let sink = Sink {
            file_enabled: true,
            dir: dir.clone(),
        };
        sink.append("first").expect("append");
        sink.append("second").expect("append");

        let content = std::fs::read_to_string(dir.join(LOG_FILE)).expect("read log");
        std::fs::remove_dir_all(&dir).ok();
        assert_eq!(content, "first\nsecond\n");
    }
}
