//! Stream-based live source.
//!
//! Follows an async byte stream such as stdin, a pipe or a TCP
//! connection. A background task reads blocks and hands them to an
//! internal [`ChannelSource`].

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ChannelSource, LiveSource};

/// Size of the blocks forwarded by the reader task.
const READ_BLOCK: usize = 4096;

/// Blocks buffered between the reader task and the monitor.
const CHANNEL_CAPACITY: usize = 16;

/// A source backed by an async reader running on the tokio runtime.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use tailspeed::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"[2024-01-01 00:00:00] tick\n";
/// let source = StreamSource::spawn(Cursor::new(data.to_vec()), "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    inner: ChannelSource,
    description: String,
    task: JoinHandle<()>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl StreamSource {
    /// Spawn a background task reading from `reader`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();
        let desc = description.to_string();

        let task = tokio::spawn(async move {
            let mut reader = reader;
            let mut buf = vec![0u8; READ_BLOCK];

            loop {
                match reader.read(&mut buf).await {
                    Ok(0) => {
                        debug!(source = %desc, "Stream reached EOF");
                        break;
                    }
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).await.is_err() {
                            // Source dropped or terminated
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(source = %desc, error = %e, "Stream read failed");
                        *error_handle.lock() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            inner: ChannelSource::new(rx, description),
            description: format!("stream: {}", description),
            task,
            last_error,
        }
    }

    /// Get the last read error, if the stream ended because of one.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }
}

impl LiveSource for StreamSource {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read_bytes(buf)
    }

    fn is_alive(&self) -> bool {
        self.inner.is_alive()
    }

    fn terminate(&mut self) {
        self.task.abort();
        self.inner.terminate();
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl Drop for StreamSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}
