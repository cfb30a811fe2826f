//! Blob store implementations.
//!
//! Compiled circuit artifacts live under keys of the form
//! `<circuitFilename>.<vk|pk|ccs>`. Two stores are provided:
//! - FileStore: one file per key inside a root directory
//! - InMemoryStore: ephemeral storage for tests and tools

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::progress::ProgressReader;
use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Byte stream returned by [`BlobStore::reader`]
pub type BlobReader = Box<dyn Read + Send>;

/// Byte sink returned by [`BlobStore::writer`]
pub type BlobWriter = Box<dyn Write + Send>;

/// Key-addressed byte-stream storage
pub trait BlobStore: Send + Sync {
    /// Open a stream over the blob stored under `key`
    fn reader(&self, key: &str) -> Result<BlobReader>;

    /// Open a sink that replaces the blob stored under `key`.
    ///
    /// The blob is complete once the writer is flushed and dropped.
    fn writer(&self, key: &str) -> Result<BlobWriter>;
}

/// Blob key for an artifact of a circuit variant
pub fn artifact_key(filename: &str, suffix: &str) -> String {
    format!("{}.{}", filename, suffix)
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Filesystem store; keys are file names inside `root`
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            root: path.as_ref().to_path_buf(),
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

impl BlobStore for FileStore {
    fn reader(&self, key: &str) -> Result<BlobReader> {
        let path = self.path(key);
        let file = File::open(&path)
            .map_err(|e| Error::Storage(format!("Failed to open {}: {}", path.display(), e)))?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);
        debug!(key, size, "Opened blob");
        Ok(Box::new(ProgressReader::new(
            BufReader::new(file),
            "Reading circuit",
            key,
            size,
        )))
    }

    fn writer(&self, key: &str) -> Result<BlobWriter> {
        fs::create_dir_all(&self.root).map_err(|e| {
            Error::Storage(format!("Failed to create {}: {}", self.root.display(), e))
        })?;
        let path = self.path(key);
        let file = File::create(&path)
            .map_err(|e| Error::Storage(format!("Failed to create {}: {}", path.display(), e)))?;
        Ok(Box::new(BufWriter::new(file)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

type Blobs = Arc<RwLock<HashMap<String, Vec<u8>>>>;

/// In-memory store (for testing and ephemeral use)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    blobs: Blobs,
    reads: RwLock<HashMap<String, usize>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`
    pub fn insert(&self, key: impl Into<String>, value: Vec<u8>) -> Result<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        blobs.insert(key.into(), value);
        Ok(())
    }

    /// Copy of the blob stored under `key`
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        Ok(blobs.get(key).cloned())
    }

    /// Remove the blob stored under `key`
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
        Ok(blobs.remove(key).is_some())
    }

    /// Number of readers opened for `key`
    pub fn read_count(&self, key: &str) -> usize {
        self.reads
            .read()
            .map(|reads| reads.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of stored blobs
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for InMemoryStore {
    fn reader(&self, key: &str) -> Result<BlobReader> {
        {
            let mut reads = self
                .reads
                .write()
                .map_err(|e| Error::Internal(format!("Lock error: {}", e)))?;
            *reads.entry(key.to_string()).or_insert(0) += 1;
        }
        let blob = self
            .get(key)?
            .ok_or_else(|| Error::Storage(format!("Blob not found: {}", key)))?;
        Ok(Box::new(Cursor::new(blob)))
    }

    fn writer(&self, key: &str) -> Result<BlobWriter> {
        Ok(Box::new(MemoryWriter {
            key: key.to_string(),
            buf: Vec::new(),
            blobs: Arc::clone(&self.blobs),
        }))
    }
}

/// Buffers writes and publishes the blob on flush and on drop
struct MemoryWriter {
    key: String,
    buf: Vec<u8>,
    blobs: Blobs,
}

impl MemoryWriter {
    fn publish(&self) -> std::io::Result<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
        blobs.insert(self.key.clone(), self.buf.clone());
        Ok(())
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.publish()
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        if let Err(e) = self.publish() {
            warn!(key = %self.key, error = %e, "Failed to publish blob on drop");
        }
    }
}
