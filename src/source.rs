//! Line-buffered input with one-line pushback.
//!
//! Dump streams interleave line-oriented headers with raw binary bodies, so
//! the reader must support both line reads and exact-length byte reads over
//! the same buffered stream, plus a single line of pushback for the places
//! where the grammar is recognized one line too late.

use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};

use tracing::trace;

use crate::{DumpError, Result};

/// A byte reader with line buffering, a one-line pushback slot, and a line
/// counter used for diagnostics.
pub struct LineBufferedSource<R> {
    reader: BufReader<R>,
    pushback: Option<Vec<u8>>,
    linenumber: u64,
}

impl<R: Read> LineBufferedSource<R> {
    /// Wraps `source` in a new line-buffered reader.
    pub fn new(source: R) -> Self {
        LineBufferedSource {
            reader: BufReader::new(source),
            pushback: None,
            linenumber: 0,
        }
    }

    /// The 1-origin number of the last line read.
    pub fn line_number(&self) -> u64 {
        self.linenumber
    }

    /// Reads the next line including its terminator.
    ///
    /// Returns the pushback slot contents if a line was pushed back. Returns
    /// an empty buffer at end of stream.
    pub fn readline(&mut self) -> Result<Vec<u8>> {
        if let Some(line) = self.pushback.take() {
            trace!(line = ?String::from_utf8_lossy(&line), "readline: popping pushback");
            return Ok(line);
        }
        let mut line = Vec::new();
        let n = self.reader.read_until(b'\n', &mut line)?;
        if n > 0 {
            self.linenumber += 1;
        }
        Ok(line)
    }

    /// Reads a line and requires it to begin with `prefix`.
    pub fn require(&mut self, prefix: &[u8]) -> Result<Vec<u8>> {
        let line = self.readline()?;
        if !line.starts_with(prefix) {
            return Err(DumpError::parse(
                self.linenumber,
                format!(
                    "required prefix {:?} not seen",
                    String::from_utf8_lossy(prefix)
                ),
            ));
        }
        Ok(line)
    }

    /// Reads exactly `n` raw bytes, bypassing line handling.
    ///
    /// Used for property values and content bodies, which may be binary.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        if self.pushback.is_some() {
            return Err(DumpError::parse(
                self.linenumber,
                "line buffer unexpectedly nonempty before raw read",
            ));
        }
        let mut buf = vec![0u8; n];
        self.reader.read_exact(&mut buf)?;
        self.linenumber += buf.iter().filter(|&&b| b == b'\n').count() as u64;
        Ok(buf)
    }

    /// Reads the next line into the pushback slot and returns a view of it.
    ///
    /// Calling `peek` while a line is already buffered is a programming
    /// error in the caller's read discipline.
    pub fn peek(&mut self) -> Result<&[u8]> {
        if self.pushback.is_some() {
            return Err(DumpError::parse(
                self.linenumber,
                "peek with a line already buffered",
            ));
        }
        let mut line = Vec::new();
        let n = self.reader.read_until(b'\n', &mut line)?;
        if n > 0 {
            self.linenumber += 1;
        }
        self.pushback = Some(line);
        Ok(self.pushback.as_deref().unwrap_or(&[]))
    }

    /// Places one previously read line into the pushback slot.
    pub fn push(&mut self, line: Vec<u8>) {
        debug_assert!(self.pushback.is_none(), "pushback slot already occupied");
        trace!(line = ?String::from_utf8_lossy(&line), "pushing line back");
        self.pushback = Some(line);
    }

    /// Returns and clears the pushback slot.
    pub fn flush(&mut self) -> Vec<u8> {
        self.pushback.take().unwrap_or_default()
    }

    /// Whether a pushed-back line is ready to go.
    pub fn has_line_buffered(&self) -> bool {
        self.pushback.as_ref().is_some_and(|l| !l.is_empty())
    }

    /// A view of the pushback slot without clearing it.
    pub fn buffered(&self) -> Option<&[u8]> {
        self.pushback.as_deref()
    }
}

impl<R: Read + Seek> LineBufferedSource<R> {
    /// Repositions the underlying reader to the beginning of the stream.
    ///
    /// Only available for seekable sources; the two-pass `reduce` command
    /// is the sole caller.
    pub fn rewind(&mut self) -> Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        self.pushback = None;
        self.linenumber = 0;
        Ok(())
    }
}
