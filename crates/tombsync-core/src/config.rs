//! Configuration for Tombsync
//!
//! A [`RelayConfig`] is built once at startup, either from a TOML file or
//! from the environment, then handed to the relay by value. Nothing reads
//! configuration from globals after that point.
//!
//! Example config:
//! ```toml
//! [server]
//! address = ":8080"
//!
//! [auth]
//! token = "Bearer s3cr3t"
//!
//! [replication]
//! dry_run = false
//! insecure = false
//!
//! [targets.site2]
//! endpoint = "https://site2.example.com:9000"
//! access_key = "minioadmin"
//! secret_key = "minioadmin"
//! insecure = true
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Environment prefixes for remote targets, suffixed with the target name
pub const ENV_REMOTE_ENDPOINT: &str = "REMOTE_ENDPOINT_";
pub const ENV_REMOTE_ACCESS: &str = "REMOTE_ACCESS_";
pub const ENV_REMOTE_SECRET: &str = "REMOTE_SECRET_";
pub const ENV_REMOTE_INSECURE: &str = "REMOTE_INSECURE_";
pub const ENV_REMOTE_REGION: &str = "REMOTE_REGION_";

pub const ENV_AUTH_TOKEN: &str = "WEBHOOK_AUTH_TOKEN";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub replication: ReplicationConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Remote sites keyed by name
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
}

impl RelayConfig {
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config {}: {}", path, e)))?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Build a config from `(name, value)` pairs shaped like the process
    /// environment.
    ///
    /// Every `REMOTE_ENDPOINT_<NAME>` declares a target `<NAME>`; its
    /// credentials come from `REMOTE_ACCESS_<NAME>` / `REMOTE_SECRET_<NAME>`.
    /// Missing credentials are left empty here and rejected when the target
    /// registry is built.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: BTreeMap<String, String> = vars.into_iter().collect();
        let mut config = Self::default();

        if let Some(addr) = vars.get("TOMBSYNC_ADDRESS") {
            config.server.address = addr.clone();
        }
        if let Some(token) = vars.get(ENV_AUTH_TOKEN) {
            config.auth.token = Some(token.clone()).filter(|t| !t.is_empty());
        }
        if let Some(v) = vars.get("TOMBSYNC_DRY_RUN") {
            config.replication.dry_run = parse_flag(v);
        }
        if let Some(v) = vars.get("TOMBSYNC_INSECURE") {
            config.replication.insecure = parse_flag(v);
        }
        if let Some(level) = vars.get("TOMBSYNC_LOG_LEVEL") {
            config.logging.level = level.clone();
        }
        if let Some(addr) = vars.get("TOMBSYNC_METRICS_ADDRESS") {
            config.metrics.listen_address = Some(addr.clone()).filter(|a| !a.is_empty());
        }

        for (key, endpoint) in &vars {
            let Some(name) = key.strip_prefix(ENV_REMOTE_ENDPOINT) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            let lookup = |prefix: &str| vars.get(&format!("{}{}", prefix, name)).cloned();

            config.targets.insert(
                name.to_string(),
                TargetConfig {
                    endpoint: endpoint.clone(),
                    access_key: lookup(ENV_REMOTE_ACCESS).unwrap_or_default(),
                    secret_key: lookup(ENV_REMOTE_SECRET).unwrap_or_default(),
                    insecure: lookup(ENV_REMOTE_INSECURE).map(|v| v == "true"),
                    region: lookup(ENV_REMOTE_REGION).filter(|r| !r.is_empty()),
                },
            );
        }

        config
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `ADDRESS:PORT`; ADDRESS can be an IP or hostname, or omitted (`:8080`)
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_address() -> String {
    crate::DEFAULT_ADDRESS.to_string()
}

fn default_max_body_bytes() -> usize {
    crate::MAX_BODY_BYTES
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Address in a form the socket layer can bind; a bare `:port` means
    /// every interface.
    pub fn bind_address(&self) -> String {
        if self.address.starts_with(':') {
            format!("0.0.0.0{}", self.address)
        } else {
            self.address.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected value of the `Authorization` header; auth is off when unset
    #[serde(default)]
    pub token: Option<String>,
}

impl AuthConfig {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplicationConfig {
    /// Log intended deletions without touching any remote
    #[serde(default)]
    pub dry_run: bool,

    /// Disable TLS verification for every remote without its own override
    #[serde(default)]
    pub insecure: bool,
}

/// Settings for the outbound object-store clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Send `x-minio-force-delete` with each delete
    #[serde(default = "default_force_delete")]
    pub force_delete: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_force_delete() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            force_delete: default_force_delete(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Where the Prometheus exporter listens; disabled when unset
    #[serde(default)]
    pub listen_address: Option<String>,
}

/// One remote site as declared in configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    pub endpoint: String,

    #[serde(default)]
    pub access_key: String,

    #[serde(default)]
    pub secret_key: String,

    /// Overrides `replication.insecure` for this site
    #[serde(default)]
    pub insecure: Option<bool>,

    #[serde(default)]
    pub region: Option<String>,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("insecure", &self.insecure)
            .field("region", &self.region)
            .finish()
    }
}
