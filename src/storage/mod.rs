//! Blob storage for compiled circuit artifacts.
//!
//! ## Backends
//!
//! - **FileStore**: one file per key under the circuit path
//! - **InMemoryStore**: ephemeral storage for tests and tools
//!
//! File-store readers are wrapped in a [`ProgressReader`] so multi-gigabyte
//! proving keys report progress while they stream in.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keyspace_recovery::storage::{artifact_key, BlobStore, FileStore};
//!
//! let store = FileStore::new("compiled/");
//! let reader = store.reader(&artifact_key("Secp256k1Account", "vk"))?;
//! ```

pub mod backend;
pub mod progress;

pub use backend::*;
pub use progress::ProgressReader;
