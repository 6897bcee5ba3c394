//! Run logging: a deduplicating event log file, or `env_logger` on stderr.

use crate::config::LogConfig;
use crate::error::PipelineError;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Mutex;

/// Where deduplicated records end up.
enum Sink {
    Writer(Box<dyn Write + Send>),
    Stderr(env_logger::Logger),
}

impl Sink {
    fn emit(&mut self, record: &Record) -> io::Result<()> {
        match self {
            Sink::Writer(out) => writeln!(
                out,
                "{} [{}] {}: {}",
                timestamp(),
                record.level(),
                record.target(),
                record.args()
            ),
            Sink::Stderr(logger) => {
                logger.log(record);
                Ok(())
            }
        }
    }

    fn accepts(&self, metadata: &Metadata) -> bool {
        match self {
            Sink::Writer(_) => true,
            Sink::Stderr(logger) => logger.enabled(metadata),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Writer(out) => out.flush(),
            Sink::Stderr(logger) => {
                logger.flush();
                Ok(())
            }
        }
    }
}

struct State {
    sink: Sink,
    last: Option<String>,
    repeats: usize,
}

impl State {
    fn write_repeats(&mut self) -> io::Result<()> {
        if self.repeats == 0 {
            return Ok(());
        }
        let count = std::mem::take(&mut self.repeats);
        self.sink.emit(
            &Record::builder()
                .level(Level::Info)
                .target("galley")
                .args(format_args!("(previous message repeated {} times)", count))
                .build(),
        )
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

/// Timestamped, leveled log lines. Consecutive identical messages collapse
/// into one line followed by a repeat count, whichever sink receives them.
pub struct EventLog {
    level: LevelFilter,
    state: Mutex<State>,
}

impl EventLog {
    fn with_sink(sink: Sink, level: LevelFilter) -> Self {
        Self {
            level,
            state: Mutex::new(State {
                sink,
                last: None,
                repeats: 0,
            }),
        }
    }

    pub fn new(out: Box<dyn Write + Send>, level: LevelFilter) -> Self {
        Self::with_sink(Sink::Writer(out), level)
    }

    /// Appends to `path`, creating it when needed.
    pub fn to_file(path: &std::path::Path, level: LevelFilter) -> Result<Self, PipelineError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(Box::new(file), level))
    }

    /// Forwards to an `env_logger` logger, which keeps its own filters and format.
    pub fn wrapping(logger: env_logger::Logger) -> Self {
        let level = logger.filter();
        Self::with_sink(Sink::Stderr(logger), level)
    }

    /// `env_logger` on stderr, filtered by `RUST_LOG` or else `default_filter`.
    pub fn to_stderr(default_filter: &str) -> Self {
        let logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
            .format(|buf, record| writeln!(buf, "{} [{}] {}", timestamp(), record.level(), record.args()))
            .build();
        Self::wrapping(logger)
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }
}

impl Log for EventLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
            && self
                .state
                .lock()
                .map(|state| state.sink.accepts(metadata))
                .unwrap_or(false)
    }

    fn log(&self, record: &Record) {
        if record.level() > self.level {
            return;
        }
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if !state.sink.accepts(record.metadata()) {
            return;
        }
        let message = format!("[{}] {}: {}", record.level(), record.target(), record.args());
        if state.last.as_deref() == Some(message.as_str()) {
            state.repeats += 1;
            return;
        }
        // A failing log sink has nowhere to report to.
        let _ = state.write_repeats();
        let _ = state.sink.emit(record);
        state.last = Some(message);
    }

    fn flush(&self) {
        if let Ok(mut state) = self.state.lock() {
            let _ = state.write_repeats();
            let _ = state.sink.flush();
        }
    }
}

/// Installs the global logger for a run.
pub fn init(config: &LogConfig) -> Result<(), PipelineError> {
    let level = LevelFilter::from_str(&config.level)
        .map_err(|_| PipelineError::Config(format!("Unknown log level '{}'", config.level)))?;

    let logger = match &config.file {
        Some(path) => EventLog::to_file(path, level)?,
        None => EventLog::to_stderr(config.level.as_str()),
    };
    let max = logger.level();
    log::set_boxed_logger(Box::new(logger))
        .map_err(|e| PipelineError::Config(format!("Logger already installed: {}", e)))?;
    log::set_max_level(max);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn emit(logger: &EventLog, level: Level, message: &str) {
        logger.log(
            &Record::builder()
                .level(level)
                .target("galley")
                .args(format_args!("{}", message))
                .build(),
        );
    }

    #[test]
    fn collapses_consecutive_duplicates() {
        let buf = SharedBuf::default();
        let logger = EventLog::new(Box::new(buf.clone()), LevelFilter::Info);
        emit(&logger, Level::Warn, "Could not merge");
        emit(&logger, Level::Warn, "Could not merge");
        emit(&logger, Level::Warn, "Could not merge");
        emit(&logger, Level::Info, "Done");
        emit(&logger, Level::Debug, "hidden");
        logger.flush();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("[WARN] galley: Could not merge"));
        assert!(lines[1].contains("repeated 2 times"));
        assert!(lines[2].ends_with("Done"));
    }

    #[test]
    fn collapses_duplicates_before_env_logger() {
        let buf = SharedBuf::default();
        let inner = env_logger::Builder::new()
            .filter_level(LevelFilter::Info)
            .target(env_logger::Target::Pipe(Box::new(buf.clone())))
            .format(|out, record| writeln!(out, "[{}] {}", record.level(), record.args()))
            .build();
        let logger = EventLog::wrapping(inner);
        assert_eq!(logger.level(), LevelFilter::Info);
        for _ in 0..5 {
            emit(&logger, Level::Warn, "Flow stalled");
        }
        emit(&logger, Level::Info, "Done");
        emit(&logger, Level::Debug, "hidden");
        logger.flush();

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec!["[WARN] Flow stalled", "[INFO] (previous message repeated 4 times)", "[INFO] Done"]);
    }

    #[test]
    fn appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let logger = EventLog::to_file(&path, LevelFilter::Debug).unwrap();
        emit(&logger, Level::Error, "Flow stalled");
        logger.flush();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[ERROR] galley: Flow stalled"));
    }
}
