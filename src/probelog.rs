//! Per-test log files.
//!
//! Every check writes a `<logdir>/<probe>[-<rsmhost>]-<check>.log` file
//! with `PID:YYYYMMDD:HHMMSS.mmm LEVEL: <text>` lines. Fan-out workers
//! log into private in-memory buffers which the orchestrator appends to
//! the main log verbatim once the worker is done, so interleaved output
//! never happens.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Info,
}

impl Level {
    fn prefix(self) -> &'static str {
        match self {
            Level::Error => "Error",
            Level::Warning => "Warning",
            Level::Info => "Debug",
        }
    }
}

enum Sink {
    File(File),
    Buffer(Vec<u8>),
}

impl Sink {
    fn write_all(&mut self, bytes: &[u8]) {
        match self {
            Sink::File(file) => {
                let _ = file.write_all(bytes);
            }
            Sink::Buffer(buf) => buf.extend_from_slice(bytes),
        }
    }
}

/// Cheaply cloneable handle to one test's log stream.
#[derive(Clone)]
pub struct TestLog {
    sink: Arc<Mutex<Sink>>,
}

impl TestLog {
    /// Open (append) the log file for one (probe, rsmhost, check) tuple.
    pub fn open(
        logdir: &Path,
        probe: &str,
        rsmhost: Option<&str>,
        check: &str,
    ) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(Self::file_path(logdir, probe, rsmhost, check))?;

        Ok(Self {
            sink: Arc::new(Mutex::new(Sink::File(file))),
        })
    }

    pub fn file_path(logdir: &Path, probe: &str, rsmhost: Option<&str>, check: &str) -> PathBuf {
        let name = match rsmhost {
            Some(rsmhost) => format!("{}-{}-{}.log", probe, rsmhost, check),
            None => format!("{}-{}.log", probe, check),
        };

        logdir.join(name)
    }

    /// An in-memory log, used by fan-out workers and tests.
    pub fn buffer() -> Self {
        Self {
            sink: Arc::new(Mutex::new(Sink::Buffer(Vec::new()))),
        }
    }

    pub fn log(&self, level: Level, text: &str) {
        let now = Local::now();
        let line = format!(
            "{:6}:{}.{:03} {}: {}\n",
            std::process::id(),
            now.format("%Y%m%d:%H%M%S"),
            now.timestamp_subsec_millis(),
            level.prefix(),
            text
        );

        self.sink.lock().write_all(line.as_bytes());
    }

    pub fn err(&self, text: impl AsRef<str>) {
        self.log(Level::Error, text.as_ref());
    }

    pub fn warn(&self, text: impl AsRef<str>) {
        self.log(Level::Warning, text.as_ref());
    }

    pub fn info(&self, text: impl AsRef<str>) {
        self.log(Level::Info, text.as_ref());
    }

    /// Append preformatted text as-is, used to merge worker buffers.
    pub fn dump(&self, text: &str) {
        self.sink.lock().write_all(text.as_bytes());
    }

    /// Drain a buffer-backed log. Returns empty text for file-backed logs.
    pub fn take(&self) -> String {
        let mut sink = self.sink.lock();
        match &mut *sink {
            Sink::Buffer(buf) => String::from_utf8_lossy(&std::mem::take(buf)).into_owned(),
            Sink::File(_) => String::new(),
        }
    }

    pub fn start_test(&self) {
        self.info("START TEST");
    }

    pub fn end_test(&self) {
        self.info("END TEST");
    }
}
