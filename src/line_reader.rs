//! Incremental line reader for the external text stream.
//!
//! Bytes accumulate in a fixed-capacity buffer. Every `\n` completes a line.
//! A record that fills the whole buffer without a separator is dropped, and
//! the reader then skips the rest of that record up to its `\n` so no
//! truncated tail ever surfaces as a line of its own.

use std::fmt;
use std::io::{self, Read};

/// Capacity of the line buffer, and so the longest line that can be shown.
pub const LINE_CAPACITY: usize = 128;

/// One complete line, without its `\n`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Line(Vec<u8>);

impl Line {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&[u8]> for Line {
    fn from(bytes: &[u8]) -> Self {
        Line(bytes.to_vec())
    }
}

impl From<&str> for Line {
    fn from(text: &str) -> Self {
        Line(text.as_bytes().to_vec())
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Bounded accumulator that splits a byte stream into lines.
#[derive(Debug)]
pub struct LineReader {
    buf: Vec<u8>,
    /// Bytes of unterminated input held at the front of `buf`
    linerem: usize,
    /// Inside an over-length record whose `\n` has not arrived yet
    discarding: bool,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

impl LineReader {
    pub fn new() -> Self {
        Self::with_capacity(LINE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1)],
            linerem: 0,
            discarding: false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Length of the unterminated input currently held.
    pub fn linerem(&self) -> usize {
        self.linerem
    }

    /// The unterminated input currently held.
    pub fn pending(&self) -> &[u8] {
        &self.buf[..self.linerem]
    }

    pub fn is_discarding(&self) -> bool {
        self.discarding
    }

    /// Forget any unterminated input, e.g. when its producer went away.
    pub fn clear(&mut self) {
        if self.linerem > 0 {
            log::debug!("Dropping {} bytes of unterminated input", self.linerem);
        }
        self.linerem = 0;
        self.discarding = false;
    }

    /// Feed a chunk and return the lines it completes, oldest first.
    ///
    /// Bytes beyond the free capacity are not stored. When they belong to a
    /// record that just overflowed, they are still scanned for its `\n` so the
    /// record after it is read normally.
    pub fn ingest(&mut self, chunk: &[u8]) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut rest = chunk;
        while !rest.is_empty() {
            let skip = skip_discarded(&mut self.discarding, rest);
            rest = &rest[skip..];
            if rest.is_empty() {
                break;
            }

            let free = self.capacity() - self.linerem;
            let stored = rest.len().min(free);
            self.buf[self.linerem..self.linerem + stored].copy_from_slice(&rest[..stored]);
            self.linerem += stored;
            lines.extend(self.split_lines());

            rest = &rest[stored..];
            if !rest.is_empty() && !self.discarding {
                log::debug!("Line buffer full, {} bytes not stored", rest.len());
                break;
            }
        }
        lines
    }

    /// Read once from `reader` into the free capacity and return the lines
    /// that completes. `Ok(None)` means end of stream.
    ///
    /// Never reads more than fits, so a live stream loses nothing.
    pub fn fill_from<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
    ) -> io::Result<Option<Vec<Line>>> {
        let start = self.linerem;
        let read = reader.read(&mut self.buf[start..])?;
        if read == 0 {
            return Ok(None);
        }

        let end = start + read;
        let skip = skip_discarded(&mut self.discarding, &self.buf[start..end]);
        self.buf.copy_within(start + skip..end, start);
        self.linerem = end - skip;
        Ok(Some(self.split_lines()))
    }

    fn split_lines(&mut self) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut consumed = 0;
        while let Some(pos) = self.buf[consumed..self.linerem]
            .iter()
            .position(|&b| b == b'\n')
        {
            lines.push(Line::from(&self.buf[consumed..consumed + pos]));
            consumed += pos + 1;
        }

        if consumed == 0 && self.linerem == self.capacity() {
            log::warn!("Dropping line longer than {} bytes", self.capacity());
            self.linerem = 0;
            self.discarding = true;
        } else if consumed > 0 {
            self.buf.copy_within(consumed..self.linerem, 0);
            self.linerem -= consumed;
        }

        debug_assert!(self.linerem < self.capacity());
        lines
    }
}

/// Length of the prefix of `bytes` that belongs to a dropped record.
fn skip_discarded(discarding: &mut bool, bytes: &[u8]) -> usize {
    if !*discarding {
        return 0;
    }
    match bytes.iter().position(|&b| b == b'\n') {
        Some(pos) => {
            *discarding = false;
            log::debug!("Resynchronized after over-length line");
            pos + 1
        }
        None => bytes.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| String::from_utf8_lossy(l.as_bytes()).into_owned())
            .collect()
    }

    #[test]
    fn test_line_split_across_chunks() {
        let mut reader = LineReader::new();
        let lines = reader.ingest(b"12:00:01 PM\n12:0");
        assert_eq!(texts(&lines), vec!["12:00:01 PM"]);
        assert_eq!(reader.pending(), b"12:0");

        let lines = reader.ingest(b"0:02 PM\n");
        assert_eq!(texts(&lines), vec!["12:00:02 PM"]);
        assert_eq!(reader.linerem(), 0);
    }

    #[test]
    fn test_overflow_discards_buffer() {
        let mut reader = LineReader::new();
        let lines = reader.ingest(&[b'x'; 200]);
        assert!(lines.is_empty());
        assert_eq!(reader.linerem(), 0);
        assert!(reader.is_discarding());
    }

    #[test]
    fn test_overflow_tail_is_skipped() {
        let mut reader = LineReader::new();
        reader.ingest(&[b'x'; 128]);
        let lines = reader.ingest(b"xxxx tail\nnext\n");
        assert_eq!(texts(&lines), vec!["next"]);
        assert!(!reader.is_discarding());
    }

    #[test]
    fn test_overflow_ending_in_unstored_bytes_resynchronizes() {
        let mut reader = LineReader::new();
        let mut chunk = vec![b'x'; 199];
        chunk.push(b'\n');
        assert!(reader.ingest(&chunk).is_empty());
        assert_eq!(reader.linerem(), 0);
        assert!(!reader.is_discarding());

        let lines = reader.ingest(b"12:00:02 PM\n");
        assert_eq!(texts(&lines), vec!["12:00:02 PM"]);
    }

    #[test]
    fn test_overflow_keeps_records_after_it_in_same_chunk() {
        let mut reader = LineReader::with_capacity(8);
        let lines = reader.ingest(b"far too long\nok\nnext");
        assert_eq!(texts(&lines), vec!["ok"]);
        assert_eq!(reader.pending(), b"next");
        assert!(!reader.is_discarding());
    }

    #[test]
    fn test_discarding_spans_chunks() {
        let mut reader = LineReader::with_capacity(4);
        assert!(reader.ingest(b"abcd").is_empty());
        assert!(reader.ingest(b"efgh").is_empty());
        assert!(reader.is_discarding());
        assert_eq!(texts(&reader.ingest(b"i\nok\n")), vec!["ok"]);
    }

    #[test]
    fn test_empty_chunk_changes_nothing() {
        let mut reader = LineReader::new();
        reader.ingest(b"part");
        assert!(reader.ingest(b"").is_empty());
        assert_eq!(reader.pending(), b"part");
    }

    #[test]
    fn test_clear_resets_state() {
        let mut reader = LineReader::with_capacity(4);
        reader.ingest(b"abcd");
        reader.ingest(b"xy");
        reader.clear();
        assert!(!reader.is_discarding());
        assert_eq!(texts(&reader.ingest(b"ok\n")), vec!["ok"]);
    }

    #[test]
    fn test_newline_only_yields_empty_line() {
        let mut reader = LineReader::new();
        let lines = reader.ingest(b"\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_empty());
    }

    #[test]
    fn test_exact_capacity_chunk_drains() {
        let mut reader = LineReader::new();
        let mut chunk = vec![b'a'; 127];
        chunk.push(b'\n');
        let lines = reader.ingest(&chunk);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 127);
        assert_eq!(reader.linerem(), 0);
    }

    #[test]
    fn test_batch_keeps_order() {
        let mut reader = LineReader::new();
        let lines = reader.ingest(b"a\nb\nc\nd");
        assert_eq!(texts(&lines), vec!["a", "b", "c"]);
        assert_eq!(reader.pending(), b"d");
    }

    #[test]
    fn test_excess_beyond_capacity_is_not_stored() {
        let mut reader = LineReader::with_capacity(8);
        reader.ingest(b"abc");
        let lines = reader.ingest(b"de\nfghijk\n");
        // Only "de\nfg" fits next to "abc"
        assert_eq!(texts(&lines), vec!["abcde"]);
        assert_eq!(reader.pending(), b"fg");
    }

    #[test]
    fn test_linerem_never_exceeds_capacity() {
        let mut reader = LineReader::with_capacity(16);
        for i in 0..200u32 {
            let chunk: Vec<u8> = (0..(i % 23))
                .map(|j| if (i + j) % 7 == 0 { b'\n' } else { b'.' })
                .collect();
            reader.ingest(&chunk);
            assert!(reader.linerem() <= reader.capacity());
        }
    }

    #[test]
    fn test_fill_from_reads_only_free_space() {
        let mut reader = LineReader::with_capacity(8);
        let mut input: &[u8] = b"one\ntwo!\nthree\n";

        let first = reader.fill_from(&mut input).unwrap().unwrap();
        assert_eq!(texts(&first), vec!["one"]);
        assert_eq!(reader.pending(), b"two!");

        let mut all = texts(&first);
        while let Some(lines) = reader.fill_from(&mut input).unwrap() {
            all.extend(texts(&lines));
        }
        assert_eq!(all, vec!["one", "two!", "three"]);
        assert_eq!(reader.linerem(), 0);
    }

    #[test]
    fn test_fill_from_skips_overlong_record() {
        let mut reader = LineReader::with_capacity(4);
        let mut input: &[u8] = b"toolong\nok\n";
        let mut all = Vec::new();
        while let Some(lines) = reader.fill_from(&mut input).unwrap() {
            all.extend(texts(&lines));
        }
        assert_eq!(all, vec!["ok"]);
    }
}
