//! File-based live source.
//!
//! Follows a growing log file the way `tail -n 0 -f` does.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::LiveSource;

/// A source that follows appended bytes of a file on disk.
///
/// The source tracks its read position and compares it against the file
/// length on every read, so a file truncated in place is picked up again
/// from the start instead of being silently ignored.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    file: Option<File>,
    position: u64,
}

impl FileSource {
    /// Open `path` positioned at its current end. Only bytes appended
    /// afterwards are observed.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let mut source = Self::open_from_start(path)?;
        if let Some(file) = source.file.as_mut() {
            source.position = file.seek(SeekFrom::End(0))?;
        }
        debug!(path = %source.path.display(), position = source.position, "Following file");
        Ok(source)
    }

    /// Open `path` positioned at its beginning, so existing content is
    /// read before appended content.
    pub fn open_from_start<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let description = format!("file: {}", path.display());
        Ok(Self {
            path,
            description,
            file: Some(file),
            position: 0,
        })
    }

    /// Returns the path being followed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next read.
    pub fn position(&self) -> u64 {
        self.position
    }
}

impl LiveSource for FileSource {
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };

        let len = file.metadata()?.len();
        if len < self.position {
            warn!(
                path = %self.path.display(),
                previous = self.position,
                current = len,
                "File truncated, following from start"
            );
            self.position = file.seek(SeekFrom::Start(0))?;
        }

        let n = file.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn is_alive(&self) -> bool {
        self.file.is_some()
    }

    fn terminate(&mut self) {
        if self.file.take().is_some() {
            debug!(path = %self.path.display(), "File source terminated");
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn read_all(source: &mut FileSource) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 8];
        loop {
            let n = source.read_bytes(&mut buf).unwrap();
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn test_file_source_new() {
        let file = NamedTempFile::new().unwrap();
        let source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.path(), file.path());
        assert_eq!(source.description(), format!("file: {}", file.path().display()));
        assert!(source.is_alive());
    }

    #[test]
    fn test_file_source_skips_existing_content() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "old line").unwrap();
        file.flush().unwrap();

        let mut source = FileSource::open(file.path()).unwrap();
        assert_eq!(source.position(), 9);
        assert!(read_all(&mut source).is_empty());

        writeln!(file, "new line").unwrap();
        file.flush().unwrap();
        assert_eq!(read_all(&mut source), b"new line\n");
    }

    #[test]
    fn test_file_source_from_start_reads_existing_content() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "old line").unwrap();
        file.flush().unwrap();

        let mut source = FileSource::open_from_start(file.path()).unwrap();
        assert_eq!(read_all(&mut source), b"old line\n");
    }

    #[test]
    fn test_file_source_follows_truncation() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a fairly long first line").unwrap();
        file.flush().unwrap();

        let mut source = FileSource::open(file.path()).unwrap();

        file.as_file().set_len(0).unwrap();
        file.rewind().unwrap();
        writeln!(file, "short").unwrap();
        file.flush().unwrap();

        assert_eq!(read_all(&mut source), b"short\n");
    }

    #[test]
    fn test_file_source_terminate() {
        let mut file = NamedTempFile::new().unwrap();
        let mut source = FileSource::open(file.path()).unwrap();
        source.terminate();
        assert!(!source.is_alive());

        writeln!(file, "ignored").unwrap();
        file.flush().unwrap();
        assert!(read_all(&mut source).is_empty());

        // Idempotent
        source.terminate();
        assert!(!source.is_alive());
    }

    #[test]
    fn test_file_source_missing_file() {
        let err = FileSource::open("/nonexistent/path/app.log").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
