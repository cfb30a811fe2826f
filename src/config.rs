//! Service configuration.
//!
//! Values come from command-line flags with `RECOVERY_SERVICE_*` environment
//! fallbacks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::proving::{BackendRegistry, NativeBackend};

/// Default RPC port
pub const DEFAULT_PORT: u16 = 8555;

/// Default directory holding compiled circuit artifacts
pub const DEFAULT_CIRCUIT_PATH: &str = "compiled/";

/// Default bound on load and prove waits, in seconds
pub const DEFAULT_PROVE_TIMEOUT_SECS: u64 = 600;

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Port 0 would bind a random port
    #[error("port must be non-zero")]
    InvalidPort,

    /// Circuit path is empty
    #[error("circuit path must not be empty")]
    EmptyCircuitPath,

    /// Circuit path exists but is not a directory
    #[error("circuit path {0} is not a directory")]
    NotADirectory(String),

    /// Only the native backend is built in and it was not enabled
    #[error(
        "no zero-knowledge proving backend is available; \
         pass --dev-backend to serve native (non zero-knowledge) proofs"
    )]
    NoProvingBackend,
}

/// Settings for the recovery service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Args)]
pub struct ServiceConfig {
    /// Port to listen on
    #[arg(long, env = "RECOVERY_SERVICE_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Path to compiled circuits
    #[arg(long, env = "RECOVERY_SERVICE_CIRCUIT_PATH", default_value = DEFAULT_CIRCUIT_PATH)]
    pub circuit_path: PathBuf,

    /// Seconds to wait for a circuit load or proof (0 waits forever)
    #[arg(
        long = "prove-timeout",
        env = "RECOVERY_SERVICE_PROVE_TIMEOUT",
        default_value_t = DEFAULT_PROVE_TIMEOUT_SECS
    )]
    pub prove_timeout_secs: u64,

    /// Register the native development backend (proofs are NOT zero-knowledge)
    #[arg(long, env = "RECOVERY_SERVICE_DEV_BACKEND")]
    #[serde(default)]
    pub dev_backend: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            circuit_path: PathBuf::from(DEFAULT_CIRCUIT_PATH),
            prove_timeout_secs: DEFAULT_PROVE_TIMEOUT_SECS,
            dev_backend: false,
        }
    }
}

impl ServiceConfig {
    /// Check the settings before starting the service
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.circuit_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyCircuitPath);
        }
        // A missing directory is fine: the first load reports it per circuit
        if self.circuit_path.exists() && !self.circuit_path.is_dir() {
            return Err(ConfigError::NotADirectory(
                self.circuit_path.display().to_string(),
            ));
        }
        if !self.dev_backend {
            return Err(ConfigError::NoProvingBackend);
        }
        Ok(())
    }

    /// Proving backends enabled by this configuration
    pub fn backend_registry(&self) -> Result<BackendRegistry, ConfigError> {
        let mut registry = BackendRegistry::new();
        if self.dev_backend {
            warn!("Using the native development backend; proofs are NOT zero-knowledge");
            registry.register(Arc::new(NativeBackend::new()));
        }
        if registry.fields().is_empty() {
            return Err(ConfigError::NoProvingBackend);
        }
        Ok(registry)
    }

    /// Wait bound for loads and proofs, `None` when disabled
    pub fn prove_timeout(&self) -> Option<Duration> {
        match self.prove_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ServiceConfig,
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 8555);
        assert_eq!(config.circuit_path, PathBuf::from("compiled/"));
        assert_eq!(config.prove_timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_flags() {
        let cli = TestCli::parse_from([
            "test",
            "--port",
            "9000",
            "--circuit-path",
            "/tmp/circuits",
            "--prove-timeout",
            "0",
            "--dev-backend",
        ]);
        assert_eq!(cli.config.port, 9000);
        assert_eq!(cli.config.circuit_path, PathBuf::from("/tmp/circuits"));
        assert_eq!(cli.config.prove_timeout(), None);
        assert!(cli.config.dev_backend);

        let cli = TestCli::parse_from(["test"]);
        assert!(!cli.config.dev_backend);
    }

    #[test]
    fn test_default_rejected_without_backend() {
        let config = ServiceConfig::default();
        assert_eq!(config.validate(), Err(ConfigError::NoProvingBackend));
        assert!(matches!(
            config.backend_registry(),
            Err(ConfigError::NoProvingBackend)
        ));
    }

    #[test]
    fn test_dev_backend_registry() {
        let config = dev_config();
        let registry = config.backend_registry().unwrap();
        assert_eq!(registry.fields(), vec![crate::fields::ScalarField::Bls12_377]);
    }

    fn dev_config() -> ServiceConfig {
        ServiceConfig {
            dev_backend: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(dev_config().validate().is_ok());

        let config = ServiceConfig {
            port: 0,
            ..dev_config()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));

        let config = ServiceConfig {
            circuit_path: PathBuf::new(),
            ..dev_config()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyCircuitPath));

        let file = tempfile::NamedTempFile::new().unwrap();
        let config = ServiceConfig {
            circuit_path: file.path().to_path_buf(),
            ..dev_config()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NotADirectory(_))));
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_value(ServiceConfig::default()).unwrap();
        assert_eq!(json["port"], 8555);
        let back: ServiceConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, ServiceConfig::default());

        // Older files without the flag stay on the safe default
        let legacy = serde_json::json!({
            "port": 1,
            "circuit_path": "c",
            "prove_timeout_secs": 5,
        });
        let back: ServiceConfig = serde_json::from_value(legacy).unwrap();
        assert!(!back.dev_backend);
    }
}
