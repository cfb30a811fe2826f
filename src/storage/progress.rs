//! Progress logging for long blob reads.

use std::io::{self, Read};
use std::time::{Duration, Instant};

use tracing::info;

/// Minimum interval between two progress lines
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// Reader wrapper that logs how much of a blob of known size has been read
pub struct ProgressReader<R> {
    inner: R,
    message: &'static str,
    key: String,
    total: u64,
    read: u64,
    last_log: Option<Instant>,
}

impl<R: Read> ProgressReader<R> {
    /// Wrap `inner`, a stream over `total` bytes stored under `key`
    pub fn new(inner: R, message: &'static str, key: impl Into<String>, total: u64) -> Self {
        Self {
            inner,
            message,
            key: key.into(),
            total,
            read: 0,
            last_log: None,
        }
    }

    /// Bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    fn percent(&self) -> u64 {
        if self.total == 0 {
            100
        } else {
            self.read.saturating_mul(100) / self.total
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let due = self
            .last_log
            .map_or(true, |at| at.elapsed() >= PROGRESS_INTERVAL);
        if due {
            self.last_log = Some(Instant::now());
            info!(
                file = %self.key,
                current = self.read,
                total = self.total,
                percent = self.percent(),
                "{}",
                self.message
            );
        }
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        Ok(n)
    }
}

impl<R> Drop for ProgressReader<R> {
    fn drop(&mut self) {
        info!(file = %self.key, current = self.read, total = self.total, "Closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_bytes() {
        let data = vec![7u8; 1000];
        let mut reader = ProgressReader::new(&data[..], "Reading", "blob", 1000);
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
        assert_eq!(reader.bytes_read(), 1000);
        assert_eq!(reader.percent(), 100);
    }

    #[test]
    fn test_unknown_size() {
        let reader = ProgressReader::new(&[][..], "Reading", "empty", 0);
        assert_eq!(reader.percent(), 100);
    }
}
