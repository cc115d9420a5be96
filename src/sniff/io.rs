//! Bounded I/O utilities for safe report reading.
//!
//! Reports are parsed end to end, so the only protection against a hostile
//! or mislabelled multi-gigabyte file is a hard ceiling on what we open.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Default ceiling for a report we are willing to parse (256MB).
pub const DEFAULT_MAX_REPORT_SIZE: u64 = 256 * 1024 * 1024;

/// Resource limits for I/O operations.
#[derive(Debug, Clone)]
pub struct IOLimits {
    pub max_read_bytes: u64,
    pub max_file_size: u64,
}

impl IOLimits {
    /// Limits that let a whole file up to `size` bytes be read.
    pub fn whole_file(size: u64) -> Self {
        Self {
            max_read_bytes: size,
            max_file_size: size,
        }
    }
}

impl Default for IOLimits {
    fn default() -> Self {
        Self::whole_file(DEFAULT_MAX_REPORT_SIZE)
    }
}

/// A bounded reader that limits the amount of data read.
pub struct BoundedReader<R> {
    inner: R,
    bytes_read: u64,
    limit: u64,
    truncated: bool,
}

impl<R: Read> BoundedReader<R> {
    pub fn new(reader: R, limit: u64) -> Self {
        Self {
            inner: reader,
            bytes_read: 0,
            limit,
            truncated: false,
        }
    }

    /// True once the limit cut off data the inner reader still had.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<R: Read> Read for BoundedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.bytes_read >= self.limit {
            if !self.truncated {
                let mut extra = [0u8; 1];
                if self.inner.read(&mut extra)? > 0 {
                    self.truncated = true;
                    warn!(
                        "BoundedReader limit reached after reading {} bytes",
                        self.bytes_read
                    );
                }
            }
            return Ok(0); // EOF
        }

        let remaining = self.limit - self.bytes_read;
        let max_to_read = std::cmp::min(buf.len() as u64, remaining) as usize;
        let n = self.inner.read(&mut buf[..max_to_read])?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

/// Safe file reader with resource limits.
pub struct SafeFileReader {
    file: File,
    limits: IOLimits,
}

impl SafeFileReader {
    /// Open a file with safety limits.
    pub fn open<P: AsRef<Path>>(path: P, limits: IOLimits) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();

        debug!(
            "Opened {:?}: {} bytes, limits: max_file={}, max_read={}",
            path, size, limits.max_file_size, limits.max_read_bytes
        );

        if size > limits.max_file_size {
            warn!(
                "File too large: {} bytes (limit: {})",
                size, limits.max_file_size
            );
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "File too large: {} bytes (limit: {})",
                    size, limits.max_file_size
                ),
            ));
        }

        Ok(Self { file, limits })
    }

    /// Turn the file into a buffered stream that stops at the read limit.
    pub fn into_buffered(self) -> BufReader<BoundedReader<File>> {
        BufReader::new(BoundedReader::new(self.file, self.limits.max_read_bytes))
    }
}

/// Utility functions for safe I/O operations.
pub struct IOUtils;

impl IOUtils {
    /// Check if a path exists and is a regular file.
    pub fn is_regular_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .metadata()
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Get file size without opening it.
    pub fn file_size<P: AsRef<Path>>(path: P) -> io::Result<u64> {
        let metadata = std::fs::metadata(path)?;
        Ok(metadata.len())
    }
}
