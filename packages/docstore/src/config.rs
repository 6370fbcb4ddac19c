//! Client configuration: credential sources, initialization policy and timeouts.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{StoreError, StoreResult};

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// What `init` does when no usable connection can be established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitMode {
    /// Fall back to ambient credentials, and return the error if that fails too.
    Strict,
    /// Mark the connection degraded and keep running; every operation then fails fast.
    Permissive,
}

impl FromStr for InitMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(StoreError::invalid(format!(
                "unknown init mode {other:?} (expected \"strict\" or \"permissive\")"
            ))),
        }
    }
}

impl fmt::Display for InitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::Permissive => f.write_str("permissive"),
        }
    }
}

/// Connection credentials, read from the credential file or from the environment.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub address: String,
    pub username: String,
    pub password: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_namespace() -> String {
    "firegloss".to_string()
}

fn default_database() -> String {
    "firegloss".to_string()
}

impl Credentials {
    /// Parse a JSON credential file.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            StoreError::invalid(format!("failed to read credential file {path:?}: {e}"))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            StoreError::invalid(format!("failed to parse credential file {path:?}: {e}"))
        })
    }

    /// Ambient credentials from `SURREALDB_*` variables. Present only when `SURREALDB_ADDR` is set.
    pub fn from_env() -> Option<Self> {
        let address = std::env::var("SURREALDB_ADDR").ok()?;
        Some(Self {
            address,
            username: std::env::var("SURREALDB_USER").unwrap_or_else(|_| "root".to_string()),
            password: std::env::var("SURREALDB_PASS").unwrap_or_else(|_| "root".to_string()),
            namespace: std::env::var("SURREALDB_NS").unwrap_or_else(|_| default_namespace()),
            database: std::env::var("SURREALDB_DB").unwrap_or_else(|_| default_database()),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub credentials_path: Option<PathBuf>,
    pub ambient_credentials: Option<Credentials>,
    pub init_mode: InitMode,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(init_mode: InitMode) -> Self {
        Self {
            credentials_path: None,
            ambient_credentials: None,
            init_mode,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = Some(path.into());
        self
    }

    pub fn with_ambient_credentials(mut self, credentials: Credentials) -> Self {
        self.ambient_credentials = Some(credentials);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load from the environment. `STORE_INIT_MODE` is required; there is no default policy.
    pub fn from_env() -> StoreResult<Self> {
        let init_mode = std::env::var("STORE_INIT_MODE")
            .map_err(|_| StoreError::invalid("STORE_INIT_MODE must be set to \"strict\" or \"permissive\""))?
            .parse::<InitMode>()?;

        let credentials_path = std::env::var("STORE_CREDENTIALS_PATH")
            .or_else(|_| std::env::var("FIREBASE_CREDENTIALS_PATH"))
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        let timeout_ms = match std::env::var("STORE_TIMEOUT_MS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| StoreError::invalid(format!("STORE_TIMEOUT_MS is not a number: {raw:?}")))?,
            Err(_) => DEFAULT_TIMEOUT_MS,
        };

        Ok(Self {
            credentials_path,
            ambient_credentials: Credentials::from_env(),
            init_mode,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_init_mode_parse() {
        assert_eq!("strict".parse::<InitMode>().unwrap(), InitMode::Strict);
        assert_eq!(" Permissive ".parse::<InitMode>().unwrap(), InitMode::Permissive);
        assert!(matches!(
            "degrade".parse::<InitMode>(),
            Err(StoreError::InvalidArgument { .. })
        ));
        assert_eq!(InitMode::Permissive.to_string(), "permissive");
    }

    #[test]
    fn test_credentials_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"address": "db.internal:8000", "username": "svc", "password": "s3cret"}}"#
        )
        .unwrap();

        let creds = Credentials::from_file(file.path()).unwrap();
        assert_eq!(creds.address, "db.internal:8000");
        assert_eq!(creds.namespace, "firegloss");
        assert_eq!(creds.database, "firegloss");
        assert!(!format!("{creds:?}").contains("s3cret"));
    }

    #[test]
    fn test_malformed_credentials_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = Credentials::from_file(file.path()).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument { .. }));
    }

    #[test]
    fn test_builder_defaults() {
        let config = StoreConfig::new(InitMode::Strict)
            .with_credentials_path("/etc/firegloss/creds.json")
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(config.ambient_credentials.is_none());
        assert_eq!(
            config.credentials_path.as_deref(),
            Some(Path::new("/etc/firegloss/creds.json"))
        );
        assert_eq!(StoreConfig::new(InitMode::Permissive).timeout, Duration::from_millis(DEFAULT_TIMEOUT_MS));
    }
}
