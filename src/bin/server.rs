//! Keyspace Recovery Service
//!
//! JSON-RPC server exposing `recover_proveSignature`, plus maintenance
//! subcommands for circuit artifacts.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use keyspace_recovery::circuits::metadata::{self, REGISTERED};
use keyspace_recovery::codec::VerifyingKey;
use keyspace_recovery::config::ServiceConfig;
use keyspace_recovery::proving::artifacts::store_compiled;
use keyspace_recovery::proving::{CircuitCache, NativeBackend, ProvingClient};
use keyspace_recovery::rpc::{self, hex, Recover};
use keyspace_recovery::storage::{BlobStore, FileStore};

// ═══════════════════════════════════════════════════════════════════════════════
// CLI
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Parser)]
#[command(name = "keyspace-recovery-service")]
#[command(author, version, about = "Keyspace recovery proof service", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ServiceConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the JSON-RPC server (default)
    Serve,

    /// Print a circuit's verifying key in its on-chain hex encoding
    ExportVk {
        /// Circuit family identifier
        #[arg(long)]
        circuit: String,

        /// Transaction count selecting the variant
        #[arg(long, default_value_t = 1)]
        tx_count: usize,
    },

    /// Write development (native, NOT zero-knowledge) artifacts for every circuit
    DevSetup,
}

// ═══════════════════════════════════════════════════════════════════════════════
// MAIN
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    cli.config.validate()?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&cli.config).await,
        Commands::ExportVk { circuit, tx_count } => export_vk(&cli.config, &circuit, tx_count).await,
        Commands::DevSetup => dev_setup(&cli.config),
    }
}

fn proving_client(config: &ServiceConfig) -> anyhow::Result<ProvingClient> {
    let backends = config.backend_registry()?;
    let store: Arc<dyn BlobStore> = Arc::new(FileStore::new(&config.circuit_path));
    let cache = CircuitCache::new(store, backends);
    Ok(ProvingClient::new(Arc::new(cache), config.prove_timeout()))
}

async fn serve(config: &ServiceConfig) -> anyhow::Result<()> {
    let service = Recover::new(proving_client(config)?);
    let app = rpc::router(service);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(
        version = keyspace_recovery::VERSION,
        circuit_path = %config.circuit_path.display(),
        "Starting {} on {}",
        keyspace_recovery::SERVICE_NAME,
        addr
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn export_vk(config: &ServiceConfig, circuit: &str, tx_count: usize) -> anyhow::Result<()> {
    let metadata = metadata::find(circuit).ok_or_else(|| anyhow!("Unknown circuit {}", circuit))?;
    let vk = proving_client(config)?
        .load_verifying_key(metadata, tx_count)
        .await?;
    let vk = vk
        .downcast_ref::<VerifyingKey>()
        .ok_or_else(|| anyhow!("Backend for {} does not produce PLONK keys", metadata.field))?;
    println!("{}", hex::encode_bytes(&vk.to_bytes()?));
    Ok(())
}

fn dev_setup(config: &ServiceConfig) -> anyhow::Result<()> {
    warn!("Writing native development artifacts; proofs are NOT zero-knowledge");
    let store = FileStore::new(&config.circuit_path);
    let backend = NativeBackend::new();
    for metadata in REGISTERED {
        let artifacts = backend.compile_metadata(metadata)?;
        for filename in metadata.filenames {
            store_compiled(&store, filename, &artifacts)?;
            info!(circuit = metadata.id, filename, "Circuit artifacts written");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down");
}
