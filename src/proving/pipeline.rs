//! Proof pipeline: witness, prove, self-verify, serialize.
//!
//! Backend work runs on blocking worker threads and reports back through a
//! one-shot channel. Panics raised by a backend are caught at this boundary and
//! turned into [`Error::Fault`] so one bad request cannot take the service down.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use super::backend::{Artifact, CompiledCircuit, ProofOptions, ProvingBackend};
use crate::circuits::{Assignment, CircuitMetadata, Witness};
use crate::error::{Error, Result};
use crate::fields::ScalarField;

/// Serialized proof, or why there is none
pub type ProveResult = Result<Vec<u8>>;

/// Loaded circuit, or why there is none
pub type LoadCircuitResult = Result<CompiledCircuit>;

// ═══════════════════════════════════════════════════════════════════════════════
// PROVE
// ═══════════════════════════════════════════════════════════════════════════════

/// Prove `witness` and verify the result before returning it.
///
/// When `outer` differs from `field` the proof is produced with recursion-aware
/// options so an `outer`-field circuit can verify it natively.
pub fn prove(
    backend: &dyn ProvingBackend,
    compiled: &CompiledCircuit,
    witness: &Witness,
    field: ScalarField,
    outer: ScalarField,
) -> Result<Artifact> {
    let opts = ProofOptions::new(field, outer);
    let public = witness.public_part();
    let proof = backend.prove(&compiled.ccs, &compiled.pk, witness, &opts)?;
    backend.verify(&proof, &compiled.vk, &public, &opts)?;
    Ok(proof)
}

/// Run [`prove`] on a blocking worker and deliver the serialized proof
pub fn prove_async(
    backend: Arc<dyn ProvingBackend>,
    compiled: CompiledCircuit,
    witness: Witness,
    field: ScalarField,
    outer: ScalarField,
) -> oneshot::Receiver<ProveResult> {
    spawn_blocking_result("prove", move || {
        let proof = prove(&*backend, &compiled, &witness, field, outer)?;
        backend.write_proof(&proof)
    })
}

/// Marshal `assignment`, prove it against an already loaded circuit and decode the proof
pub async fn prove_assignment<A: Assignment>(
    backend: Arc<dyn ProvingBackend>,
    metadata: &CircuitMetadata,
    compiled: &CompiledCircuit,
    assignment: &A,
    timeout: Option<Duration>,
) -> Result<Artifact> {
    let witness = catch_fault(|| Witness::from_assignment(metadata.field, assignment))?;

    info!(id = metadata.id, "Proving");
    let started = Instant::now();
    let rx = prove_async(
        Arc::clone(&backend),
        compiled.clone(),
        witness,
        metadata.field,
        metadata.outer,
    );
    info!(id = metadata.id, "Awaiting result");
    let result = await_result(rx, timeout, "proof generation").await;
    info!(
        id = metadata.id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        error = ?result.as_ref().err(),
        "Proof generation complete"
    );

    let proof = result?;
    catch_fault(|| backend.read_proof(&proof))
}

// ═══════════════════════════════════════════════════════════════════════════════
// ONE-SHOT DELIVERY
// ═══════════════════════════════════════════════════════════════════════════════

/// Run `f` on a blocking worker, catching faults, and deliver its outcome once.
///
/// The work runs to completion even if the receiver is dropped; the outcome is
/// then logged and discarded.
pub fn spawn_blocking_result<T, F>(operation: &'static str, f: F) -> oneshot::Receiver<Result<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn_blocking(move || deliver(tx, catch_fault(f), operation));
        }
        Err(e) => deliver(
            tx,
            Err(Error::Internal(format!("no async runtime for {}: {}", operation, e))),
            operation,
        ),
    }
    rx
}

/// Send `result` on a one-shot channel, logging it if nobody is waiting
pub fn deliver<T>(tx: oneshot::Sender<Result<T>>, result: Result<T>, operation: &'static str) {
    if let Err(unclaimed) = tx.send(result) {
        warn!(
            operation,
            error = ?unclaimed.err(),
            "Receiver dropped, discarding result"
        );
    }
}

/// Wait for a one-shot outcome, optionally bounded by `timeout`
pub async fn await_result<T>(
    rx: oneshot::Receiver<Result<T>>,
    timeout: Option<Duration>,
    operation: &str,
) -> Result<T> {
    let received = match timeout {
        Some(limit) => tokio::time::timeout(limit, rx)
            .await
            .map_err(|_| Error::Timeout {
                operation: operation.to_string(),
                secs: limit.as_secs(),
            })?,
        None => rx.await,
    };
    received.map_err(|_| Error::Internal(format!("{} ended without a result", operation)))?
}

// ═══════════════════════════════════════════════════════════════════════════════
// FAULT BOUNDARY
// ═══════════════════════════════════════════════════════════════════════════════

thread_local! {
    static PANIC_TRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

// Captures the backtrace where the panic is raised; by the time catch_unwind
// returns the stack has already been unwound.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let trace = Backtrace::force_capture().to_string();
            PANIC_TRACE.with(|t| *t.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// Run `f`, converting a panic into [`Error::Fault`]
pub fn catch_fault<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    install_panic_hook();
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            let trace = PANIC_TRACE
                .with(|t| t.borrow_mut().take())
                .unwrap_or_default();
            error!(%message, "Recovered from panic");
            Err(Error::Fault { message, trace })
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
