//! Operator-facing output.
//!
//! Everything meant for the human at the console (echo lines, command replies,
//! errors) goes through a [`ConsoleWriter`]. Diagnostics go to `tracing` on
//! stderr instead, so stdout stays readable.

use parking_lot::Mutex;
use std::io::Write;

/// Line-oriented console sink. Shared by the console and every monitor.
pub trait ConsoleWriter: Send + Sync {
    fn line(&self, line: &str);
}

/// Writes to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutWriter;

impl ConsoleWriter for StdoutWriter {
    fn line(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout is not worth crashing a monitor over.
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

/// Collects lines in memory.
#[derive(Debug, Default)]
pub struct BufferWriter {
    lines: Mutex<Vec<String>>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Lines containing every one of `needles`.
    pub fn matching(&self, needles: &[&str]) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|line| needles.iter().all(|n| line.contains(n)))
            .cloned()
            .collect()
    }
}

impl ConsoleWriter for BufferWriter {
    fn line(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
