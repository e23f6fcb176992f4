//! Terminal output accumulated between prompts.

use memchr::memrchr;
use regex::bytes::Regex;
use vte::{Parser, Perform};

/// Bytes searched from the end of the buffer when looking for a prompt.
pub const DEFAULT_WINDOW: usize = 1000;

/// Keeps what a terminal would print and drops everything else.
///
/// Escape sequences are swallowed, carriage returns and other control
/// bytes are dropped, and only newline and tab survive.
#[derive(Default)]
struct Printed(Vec<u8>);

impl Perform for Printed {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.0.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\t') {
            self.0.push(byte);
        }
    }
}

/// Printable shell output with tail-only prompt matching.
///
/// The terminal parser lives as long as the buffer, so an escape sequence
/// or a multi-byte character split across two reads is decoded the same
/// as if it had arrived in one piece.
pub struct OutputBuffer {
    parser: Parser,
    printed: Printed,
    window: usize,
}

impl OutputBuffer {
    pub fn new(window: usize) -> Self {
        Self {
            parser: Parser::new(),
            printed: Printed::default(),
            window,
        }
    }

    /// Feed raw bytes read from the channel.
    pub fn push(&mut self, chunk: &[u8]) {
        self.parser.advance(&mut self.printed, chunk);
    }

    /// Whether the buffer ends with a match of `pattern`, ignoring
    /// trailing whitespace.
    ///
    /// Only the last `window` bytes are searched, so a prompt-shaped line
    /// in the middle of a long config never counts.
    pub fn ends_with(&self, pattern: &Regex) -> bool {
        let tail = self.tail();
        pattern
            .find_iter(tail)
            .last()
            .is_some_and(|m| tail[m.end()..].iter().all(u8::is_ascii_whitespace))
    }

    /// Text after the last newline.
    pub fn last_line(&self) -> &[u8] {
        let text = &self.printed.0;
        match memrchr(b'\n', text) {
            Some(pos) => &text[pos + 1..],
            None => text,
        }
    }

    /// Hand over everything printed so far and start empty.
    pub fn take(&mut self) -> String {
        let bytes = std::mem::take(&mut self.printed.0);
        String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }

    pub fn len(&self) -> usize {
        self.printed.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.printed.0.is_empty()
    }

    fn tail(&self) -> &[u8] {
        let text = &self.printed.0;
        &text[text.len().saturating_sub(self.window)..]
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
