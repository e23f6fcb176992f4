//! Interactive shell I/O.
//!
//! [`Wire`] is the byte pipe under a shell: the SSH channel in production,
//! a scripted device in tests. [`Shell`] writes command lines and reads
//! until a prompt pattern shows up at the end of the output.

mod buffer;

use std::future::Future;
use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use tokio::time::{Instant, timeout_at};

pub use buffer::{DEFAULT_WINDOW, OutputBuffer};

use crate::error::{Error, Result, Stage};

/// Byte-level access to an interactive shell.
pub trait Wire: Send {
    /// Write bytes to the shell's stdin.
    fn send(&mut self, bytes: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Next chunk of output, or `None` once the shell has ended.
    fn recv(&mut self) -> impl Future<Output = Option<Vec<u8>>> + Send;

    /// Close the shell and whatever carries it.
    fn finish(&mut self) -> impl Future<Output = ()> + Send;
}

/// Line-oriented view of a [`Wire`].
pub struct Shell<W> {
    wire: W,
    buffer: OutputBuffer,
    timeout: Duration,
}

impl<W: Wire> Shell<W> {
    /// `timeout` bounds each [`read_until`](Self::read_until) call.
    pub fn new(wire: W, timeout: Duration) -> Self {
        Self {
            wire,
            buffer: OutputBuffer::default(),
            timeout,
        }
    }

    /// Send `line` followed by a newline.
    pub async fn write_line(&mut self, line: &str) -> Result<()> {
        trace!("> {}", line);
        self.send_line(line).await
    }

    /// Like [`write_line`](Self::write_line), without logging the text.
    pub async fn write_hidden(&mut self, line: &str) -> Result<()> {
        trace!("> ********");
        self.send_line(line).await
    }

    async fn send_line(&mut self, line: &str) -> Result<()> {
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        self.wire.send(&bytes).await
    }

    /// Read until the output ends with `pattern`, then return everything
    /// read, prompt included.
    pub async fn read_until(&mut self, pattern: &Regex) -> Result<String> {
        let deadline = Instant::now() + self.timeout;

        while !self.buffer.ends_with(pattern) {
            let chunk = timeout_at(deadline, self.wire.recv())
                .await
                .map_err(|_| Error::Timeout {
                    stage: Stage::Prompt,
                    after: self.timeout,
                })?
                .ok_or(Error::Closed)?;
            self.buffer.push(&chunk);
        }

        let text = self.buffer.take();
        trace!("< {} bytes", text.len());
        Ok(text)
    }

    /// Close the underlying wire.
    pub async fn close(mut self) {
        self.wire.finish().await;
    }
}

/// Last line of `text`, trimmed.
pub fn last_line(text: &str) -> &str {
    text.rsplit('\n').next().unwrap_or(text).trim()
}
