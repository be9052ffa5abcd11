//! Output sink handed to command handlers.
//!
//! A [`Terminal`] is the process-wide output device. Each invocation writes
//! through its own [`TerminalWriter`], which buffers the invocation's output
//! and commits it to the terminal in one locked write, so output from
//! concurrent invocations is never interleaved.

use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::Result;

/// Shared handle to the attached output device.
#[derive(Clone)]
pub struct Terminal {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Terminal {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Acquire a writer scoped to one invocation.
    pub fn writer(&self) -> TerminalWriter {
        TerminalWriter {
            terminal: self.clone(),
            buffer: Vec::new(),
        }
    }

    fn commit(&self, content: &[u8]) -> io::Result<()> {
        let mut out = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if !content.is_empty() {
            out.write_all(content)?;
        }
        out.flush()
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::stdout()
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal").finish_non_exhaustive()
    }
}

/// Per-invocation writer onto a [`Terminal`].
///
/// Writes are buffered until [`flush`](TerminalWriter::flush). Whatever is
/// still buffered when the writer is dropped is committed then.
pub struct TerminalWriter {
    terminal: Terminal,
    buffer: Vec<u8>,
}

impl TerminalWriter {
    pub fn print(&mut self, content: &str) {
        self.buffer.extend_from_slice(content.as_bytes());
    }

    pub fn println(&mut self, line: &str) {
        self.print(line);
        self.print("\n");
    }

    pub fn print_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.buffer, value)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(())
    }

    /// Commit buffered output to the terminal and flush it.
    pub fn flush(&mut self) -> io::Result<()> {
        let content = std::mem::take(&mut self.buffer);
        self.terminal.commit(&content)
    }
}

impl Write for TerminalWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        TerminalWriter::flush(self)
    }
}

impl Drop for TerminalWriter {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            if let Err(e) = TerminalWriter::flush(self) {
                tracing::warn!("Failed to flush terminal output: {}", e);
            }
        }
    }
}
