//! Chunked line reader over a live source.

use std::io;

use tracing::debug;

use crate::source::LiveSource;

/// Default number of bytes requested per read.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Result of one read from a [`ChunkReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Complete lines, in stream order, without their terminators.
    /// Empty when the read produced bytes but no terminator.
    Lines(Vec<String>),
    /// The source produced nothing this time but is still alive.
    Idle,
    /// The source produced nothing and is no longer alive.
    EndOfStream,
}

/// Reads bounded blocks from a [`LiveSource`] and reassembles lines split
/// across block boundaries.
#[derive(Debug)]
pub struct ChunkReader<S> {
    source: S,
    buf: Vec<u8>,
    /// Bytes after the last terminator seen so far.
    pending: Vec<u8>,
}

impl<S: LiveSource> ChunkReader<S> {
    /// Create a reader requesting at most `chunk_size` bytes per read.
    pub fn new(source: S, chunk_size: usize) -> Self {
        Self {
            source,
            buf: vec![0; chunk_size.max(1)],
            pending: Vec::new(),
        }
    }

    /// Read the next block and return the lines it completed.
    pub fn next_chunk(&mut self) -> io::Result<Chunk> {
        let n = self.source.read_bytes(&mut self.buf)?;
        if n == 0 {
            if self.source.is_alive() {
                return Ok(Chunk::Idle);
            }
            return Ok(Chunk::EndOfStream);
        }

        let scanned = self.pending.len();
        self.pending.extend_from_slice(&self.buf[..n]);
        let lines = self.take_complete_lines(scanned);
        debug!(bytes = n, lines = lines.len(), pending = self.pending.len(), "Read chunk");
        Ok(Chunk::Lines(lines))
    }

    /// Split off every terminated line, keeping the unterminated tail.
    ///
    /// The first `scanned` bytes of `pending` hold no terminator, so only
    /// the bytes after them are searched.
    fn take_complete_lines(&mut self, scanned: usize) -> Vec<String> {
        let Some(offset) = self.pending[scanned..].iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };
        let last_newline = scanned + offset;

        let tail = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, tail);

        // Decode per line so a multi-byte character split across reads
        // is reassembled before decoding.
        complete[..last_newline]
            .split(|&b| b == b'\n')
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Bytes read but not yet terminated by a newline.
    pub fn pending_bytes(&self) -> &[u8] {
        &self.pending
    }

    /// Returns the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the underlying source mutably.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
