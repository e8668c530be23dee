//! Per-item records, counters and the final summary.
//!
//! A single [`Reporter`] is shared by every batch worker. One mutex guards
//! the success/failure counters, the console streams and the optional log
//! file, so a record is emitted and counted atomically.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytesize::ByteSize;
use chrono::Local;
use yansi::{Color, Paint};

/// Console behavior for a [`Reporter`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReporterConfig {
    /// Suppress all console output (counters and log file are unaffected).
    pub quiet: bool,
    /// Print removal/keep records to the console, not just the log file.
    pub verbose: bool,
    /// Colorize console output.
    pub color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Out,
    Err,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tally {
    None,
    Success,
    Failure,
}

struct State {
    success: usize,
    failure: usize,
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    log: Option<Box<dyn Write + Send>>,
}

/// Thread-safe sink for per-item records.
pub struct Reporter {
    config: ReporterConfig,
    state: Mutex<State>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (success, failure) = self.counts();
        f.debug_struct("Reporter")
            .field("config", &self.config)
            .field("success", &success)
            .field("failure", &failure)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    /// Reporter writing to stdout/stderr.
    #[must_use]
    pub fn new(config: ReporterConfig) -> Self {
        Self::with_writers(config, Box::new(io::stdout()), Box::new(io::stderr()))
    }

    /// Reporter writing to the given console streams.
    #[must_use]
    pub fn with_writers(
        config: ReporterConfig,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            config,
            state: Mutex::new(State {
                success: 0,
                failure: 0,
                out,
                err,
                log: None,
            }),
        }
    }

    /// Mirror every record, timestamped, to `log`.
    #[must_use]
    pub fn with_log(self, log: Box<dyn Write + Send>) -> Self {
        self.lock().log = Some(log);
        self
    }

    /// The console configuration.
    #[must_use]
    pub fn config(&self) -> ReporterConfig {
        self.config
    }

    /// `[ OK ] <name>`, counted as a success.
    pub fn success(&self, name: &str) {
        self.emit(
            Channel::Out,
            Color::Green,
            &format!("[ OK ] {name}"),
            true,
            Tally::Success,
        );
    }

    /// `[FAIL] <name> - <message>`, counted as a failure.
    pub fn failure(&self, name: &str, message: &str) {
        self.emit(
            Channel::Err,
            Color::Red,
            &format!("[FAIL] {name} - {message}"),
            true,
            Tally::Failure,
        );
    }

    /// A removal/keep record: always logged, printed only in verbose mode.
    pub fn record(&self, line: &str) {
        self.emit(
            Channel::Out,
            Color::Yellow,
            line,
            self.config.verbose,
            Tally::None,
        );
    }

    /// `[WARN] <message>`.
    pub fn warn(&self, message: &str) {
        self.emit(
            Channel::Out,
            Color::Yellow,
            &format!("[WARN] {message}"),
            true,
            Tally::None,
        );
    }

    /// `[WARN] The <what> is so big: <name>: <n> bytes (<human size>)`.
    pub fn warn_size(&self, what: &str, name: &str, size: u64) {
        self.warn(&format!(
            "The {what} is so big: {name}: {} bytes ({})",
            group_thousands(size),
            ByteSize::b(size)
        ));
    }

    /// Plain line on stdout and in the log.
    pub fn info(&self, line: &str) {
        self.emit(Channel::Out, Color::Primary, line, true, Tally::None);
    }

    /// Write a line to the log file only.
    pub fn log_only(&self, line: &str) {
        self.emit(Channel::Out, Color::Primary, line, false, Tally::None);
    }

    /// Current `(success, failure)` counters.
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.success, state.failure)
    }

    /// Print the final `SUCCESS/FAIL/COST` line and flush every stream.
    pub fn summary(&self, elapsed: Duration) {
        let (success, failure) = self.counts();
        let line = format_summary(success, failure, elapsed);
        self.emit(Channel::Out, Color::Primary, "", true, Tally::None);
        self.emit(Channel::Out, Color::Primary, &line, true, Tally::None);
        self.flush();
    }

    /// Flush console and log streams.
    pub fn flush(&self) {
        let mut state = self.lock();
        let _ = state.out.flush();
        let _ = state.err.flush();
        if let Some(log) = state.log.as_mut() {
            let _ = log.flush();
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // a worker that panicked mid-record leaves the counters usable
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit(&self, channel: Channel, color: Color, line: &str, console: bool, tally: Tally) {
        let mut state = self.lock();
        match tally {
            Tally::Success => state.success += 1,
            Tally::Failure => state.failure += 1,
            Tally::None => {}
        }

        if console && !self.config.quiet {
            let rendered = if self.config.color && color != Color::Primary {
                line.fg(color).to_string()
            } else {
                line.to_string()
            };
            let stream = match channel {
                Channel::Out => &mut state.out,
                Channel::Err => &mut state.err,
            };
            let _ = writeln!(stream, "{rendered}");
        }

        if let Some(log) = state.log.as_mut() {
            let _ = writeln!(
                log,
                "{} {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.6f"),
                line
            );
        }
    }
}

/// `SUCCESS: <n>    FAIL: <n>    COST: <seconds>s`
#[must_use]
pub fn format_summary(success: usize, failure: usize, elapsed: Duration) -> String {
    format!(
        "SUCCESS: {}    FAIL: {}    COST: {:.3}s",
        group_thousands(success as u64),
        group_thousands(failure as u64),
        elapsed.as_secs_f64()
    )
}

/// `1234567` as `1,234,567`.
#[must_use]
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// In-memory writer that can be cloned and read back, for capturing output.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded.
    #[must_use]
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
