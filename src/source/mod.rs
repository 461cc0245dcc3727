//! Live byte sources the monitor can follow.
//!
//! This module provides a trait-based abstraction over a continuously
//! growing byte stream (a tailed file, stdin, a socket, or an in-memory
//! channel) so the monitor never has to spawn an external follower.

mod channel;
mod file;
mod stream;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;
use std::io;

/// Trait for reading raw bytes from a live, growing source.
///
/// # Example
///
/// ```no_run
/// use tailspeed::{FileSource, LiveSource};
///
/// let mut source = FileSource::open("logs/data-collection.log")?;
/// let mut buf = [0u8; 4096];
/// if source.is_alive() {
///     let n = source.read_bytes(&mut buf)?;
///     println!("read {} new bytes", n);
/// }
/// # Ok::<(), std::io::Error>(())
/// ```
pub trait LiveSource: Send + Debug {
    /// Read whatever bytes are available into `buf`.
    ///
    /// Returns `Ok(0)` when nothing is available right now. That is not
    /// end of stream; callers must consult [`LiveSource::is_alive`].
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Whether the source may still produce bytes.
    fn is_alive(&self) -> bool;

    /// Forcefully terminate the source. Idempotent.
    fn terminate(&mut self);

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

impl<S: LiveSource + ?Sized> LiveSource for Box<S> {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_bytes(buf)
    }

    fn is_alive(&self) -> bool {
        (**self).is_alive()
    }

    fn terminate(&mut self) {
        (**self).terminate()
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}
