//! Reading and writing compiled circuit artifacts.

use std::io::{Read, Write};

use tracing::info;

use super::backend::{Artifact, CompiledArtifacts, CompiledCircuit, ProvingBackend};
use crate::error::{Error, Result};
use crate::storage::{artifact_key, BlobStore};

/// Verifying key suffix
pub const VK_SUFFIX: &str = "vk";
/// Proving key suffix
pub const PK_SUFFIX: &str = "pk";
/// Constraint system suffix
pub const CCS_SUFFIX: &str = "ccs";

/// Read the verifying key, proving key and constraint system of a variant, in that order.
///
/// Keys stream from the store; the constraint system is buffered fully before decoding.
pub fn load_compiled(
    store: &dyn BlobStore,
    backend: &dyn ProvingBackend,
    filename: &str,
) -> Result<CompiledCircuit> {
    let vk = load_verifying_key(store, backend, filename)?;

    info!(filename, "Retrieving circuit pk");
    let pk = {
        let mut reader = store.reader(&artifact_key(filename, PK_SUFFIX))?;
        backend.read_proving_key(&mut reader)?
    };

    info!(filename, "Retrieving circuit ccs");
    let ccs = {
        let mut bytes = Vec::new();
        store
            .reader(&artifact_key(filename, CCS_SUFFIX))?
            .read_to_end(&mut bytes)?;
        backend.read_constraint_system(&bytes)?
    };

    Ok(CompiledCircuit {
        field: backend.field(),
        ccs,
        pk,
        vk,
    })
}

/// Read only the verifying key of a variant
pub fn load_verifying_key(
    store: &dyn BlobStore,
    backend: &dyn ProvingBackend,
    filename: &str,
) -> Result<Artifact> {
    info!(filename, "Retrieving circuit vk");
    let mut reader = store.reader(&artifact_key(filename, VK_SUFFIX))?;
    backend.read_verifying_key(&mut reader)
}

/// Write the three artifacts of a variant
pub fn store_compiled(
    store: &dyn BlobStore,
    filename: &str,
    artifacts: &CompiledArtifacts,
) -> Result<()> {
    for (suffix, blob) in [
        (VK_SUFFIX, &artifacts.vk),
        (PK_SUFFIX, &artifacts.pk),
        (CCS_SUFFIX, &artifacts.ccs),
    ] {
        let key = artifact_key(filename, suffix);
        let mut writer = store.writer(&key)?;
        writer
            .write_all(blob)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", key, e)))?;
        info!(key = %key, bytes = blob.len(), "Stored circuit artifact");
    }
    Ok(())
}
