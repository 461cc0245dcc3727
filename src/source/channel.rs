//! Channel-based live source.
//!
//! Receives byte blocks through a bounded tokio channel. Useful when bytes
//! are pushed from elsewhere (a network client, another task, a test)
//! rather than polled from a file.

use std::io;

use tokio::sync::mpsc;

use super::LiveSource;

/// Default number of byte blocks buffered between producer and source.
const DEFAULT_CAPACITY: usize = 64;

/// A source fed through a bounded channel of byte blocks.
///
/// The source is alive until every sender has been dropped and the
/// buffered bytes have been consumed, or until it is terminated.
///
/// # Example
///
/// ```
/// use tailspeed::{ChannelSource, LiveSource};
///
/// let (tx, mut source) = ChannelSource::create("test feed");
/// tx.try_send(b"[2024-01-01 00:00:00] tick\n".to_vec()).unwrap();
///
/// let mut buf = [0u8; 64];
/// let n = source.read_bytes(&mut buf).unwrap();
/// assert_eq!(n, 27);
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<Vec<u8>>,
    description: String,
    /// Remainder of a block larger than the caller's buffer
    pending: Vec<u8>,
    disconnected: bool,
    terminated: bool,
}

impl ChannelSource {
    /// Create a new channel source around an existing receiver.
    pub fn new(receiver: mpsc::Receiver<Vec<u8>>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            pending: Vec::new(),
            disconnected: false,
            terminated: false,
        }
    }

    /// Create a channel pair with the default capacity.
    ///
    /// Returns (sender, source); dropping every sender ends the stream.
    pub fn create(source_description: &str) -> (mpsc::Sender<Vec<u8>>, Self) {
        Self::with_capacity(source_description, DEFAULT_CAPACITY)
    }

    /// Create a channel pair buffering at most `capacity` blocks.
    pub fn with_capacity(source_description: &str, capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx, source_description))
    }
}

impl LiveSource for ChannelSource {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.terminated {
            return Ok(0);
        }

        if self.pending.is_empty() {
            match self.receiver.try_recv() {
                Ok(bytes) => self.pending = bytes,
                Err(mpsc::error::TryRecvError::Empty) => return Ok(0),
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    return Ok(0);
                }
            }
        }

        let n = buf.len().min(self.pending.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }

    fn is_alive(&self) -> bool {
        !self.terminated && !(self.disconnected && self.pending.is_empty())
    }

    fn terminate(&mut self) {
        self.terminated = true;
        self.pending.clear();
        self.receiver.close();
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_source_read() {
        let (tx, mut source) = ChannelSource::create("test");
        let mut buf = [0u8; 16];

        // Nothing sent yet: empty read, still alive
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 0);
        assert!(source.is_alive());

        tx.try_send(b"hello\n".to_vec()).unwrap();
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 6);
        assert_eq!(&buf[..6], b"hello\n");
        assert_eq!(source.description(), "channel: test");
    }

    #[test]
    fn test_channel_source_splits_large_blocks() {
        let (tx, mut source) = ChannelSource::create("test");
        tx.try_send(b"0123456789".to_vec()).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"0123");
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"4567");
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"89");
    }

    #[test]
    fn test_channel_source_ends_after_drain() {
        let (tx, mut source) = ChannelSource::create("test");
        tx.try_send(b"last\n".to_vec()).unwrap();
        drop(tx);

        let mut buf = [0u8; 16];
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 5);
        assert!(source.is_alive());
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 0);
        assert!(!source.is_alive());
    }

    #[test]
    fn test_channel_source_terminate() {
        let (tx, mut source) = ChannelSource::create("test");
        tx.try_send(b"dropped\n".to_vec()).unwrap();
        source.terminate();

        let mut buf = [0u8; 16];
        assert!(!source.is_alive());
        assert_eq!(source.read_bytes(&mut buf).unwrap(), 0);
        assert!(tx.try_send(b"more".to_vec()).is_err());
    }
}
