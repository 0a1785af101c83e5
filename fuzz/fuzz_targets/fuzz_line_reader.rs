//! Fuzz target: `LineReader::push`
//!
//! Drives arbitrary byte sequences into the host line reader and asserts
//! that it never panics and never yields an empty, untrimmed or oversized
//! line.
//!
//! cargo fuzz run fuzz_line_reader

#![no_main]

use libfuzzer_sys::fuzz_target;
use sortrouter::serial::line::{LineEvent, LineReader, MAX_LINE_LEN};

fuzz_target!(|data: &[u8]| {
    let mut reader = LineReader::new();

    for &byte in data {
        if let Some(LineEvent::Line(line)) = reader.push(byte) {
            assert!(!line.is_empty(), "reader must not yield blank lines");
            assert!(line.len() <= MAX_LINE_LEN, "line exceeds MAX_LINE_LEN");
            assert_eq!(line, line.trim());
        }
    }

    // After a reset the reader must accept bytes cleanly again.
    reader.reset();
    for &byte in data {
        let _ = reader.push(byte);
    }
});
