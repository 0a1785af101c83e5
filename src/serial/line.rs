//! Newline-delimited line reader.
//!
//! Wire format: ASCII text terminated by `\n`, `\r\n` or `\r`.
//!
//! The reader accumulates incoming bytes into a fixed buffer and yields
//! complete lines.  A single UART read may return part of a line, or
//! several lines concatenated; bytes are pushed one at a time so neither
//! case loses data.  A line longer than [`MAX_LINE_LEN`] is reported once
//! and the rest of it is discarded up to the next terminator.

/// Longest accepted line, terminator excluded.
pub const MAX_LINE_LEN: usize = 256;

/// What a pushed byte completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent<'a> {
    /// A complete, non-empty line with surrounding whitespace trimmed.
    Line(&'a str),
    /// The current line exceeded [`MAX_LINE_LEN`] and is being dropped.
    Overflow,
    /// The completed line was not valid UTF-8.
    InvalidUtf8,
}

/// Reader state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReaderState {
    /// Collecting bytes of the current line.
    Collecting,
    /// The buffer holds a line returned by the previous push.
    Complete,
    /// Dropping an overlong line until its terminator.
    Discarding,
}

/// Streaming line decoder.
pub struct LineReader {
    state: ReaderState,
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    pub fn new() -> Self {
        Self {
            state: ReaderState::Collecting,
            buf: heapless::Vec::new(),
        }
    }

    /// Push one received byte.
    ///
    /// The returned line borrows the internal buffer and is valid until the
    /// next call to `push`.
    pub fn push(&mut self, byte: u8) -> Option<LineEvent<'_>> {
        if self.state == ReaderState::Complete {
            self.buf.clear();
            self.state = ReaderState::Collecting;
        }

        let terminator = byte == b'\n' || byte == b'\r';

        match self.state {
            ReaderState::Discarding => {
                if terminator {
                    self.state = ReaderState::Collecting;
                }
                None
            }

            ReaderState::Collecting if terminator => {
                if self.buf.is_empty() {
                    // Second half of CRLF, or a blank line.
                    return None;
                }
                self.state = ReaderState::Complete;
                Some(match core::str::from_utf8(&self.buf) {
                    Ok(text) => {
                        let text = text.trim();
                        if text.is_empty() {
                            return None;
                        }
                        LineEvent::Line(text)
                    }
                    Err(_) => LineEvent::InvalidUtf8,
                })
            }

            ReaderState::Collecting => {
                if self.buf.push(byte).is_err() {
                    self.buf.clear();
                    self.state = ReaderState::Discarding;
                    return Some(LineEvent::Overflow);
                }
                None
            }

            ReaderState::Complete => None,
        }
    }

    /// Drop any partial line (e.g. after a UART error).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.state = ReaderState::Collecting;
    }
}
