//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `COURSECTL_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `COURSECTL_` override YAML values
//! 3. **DATABASE_URL** - Special case: switches `database` to an external database at that URL
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `COURSECTL_PROVISIONING__REQUEST_TIMEOUT=2m` sets `provisioning.request_timeout`.
//!
//! ## Example
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 3001
//! database:
//!   type: external
//!   url: postgres://coursectl@localhost/coursectl
//! providers:
//!   github:
//!     kind: github
//!     base_url: https://api.github.com
//! provisioning:
//!   request_timeout: 10m
//!   status_threshold: teacher
//! ```

use std::{collections::HashMap, time::Duration};

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;
use crate::types::GroupStatus;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "COURSECTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty file yields a server with an in-memory store and a
/// dummy provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Set from the `DATABASE_URL` environment variable; folded into `database` on load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    /// Hosting providers, keyed by the provider name courses and identities refer to
    pub providers: HashMap<String, ScmProviderConfig>,
    pub provisioning: ProvisioningConfig,
    /// Export traces over OTLP in addition to logging them
    pub enable_otel_export: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_url: None,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            providers: HashMap::from([("dummy".to_string(), ScmProviderConfig::Dummy)]),
            provisioning: ProvisioningConfig::default(),
            enable_otel_export: false,
        }
    }
}

/// Connection pool settings for the external database
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 0,
            acquire_timeout_secs: 30,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

/// Where group, user and repository records live
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// Process-local store; data is lost on restart
    #[default]
    Memory,
    /// External PostgreSQL database
    External {
        url: String,
        #[serde(default)]
        pool: PoolSettings,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Request header carrying the caller's user id
    pub user_header: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-coursectl-user".to_string(),
        }
    }
}

fn default_github_timeout() -> Duration {
    Duration::from_secs(30)
}

/// A hosting provider the server can open sessions against
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScmProviderConfig {
    Github {
        base_url: Url,
        /// Per-request HTTP timeout, independent of the provisioning deadline
        #[serde(default = "default_github_timeout", with = "humantime_serde")]
        request_timeout: Duration,
    },
    /// In-memory provider for development
    Dummy,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Deadline covering every remote call of one provisioning run
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Highest status a privileged caller may request
    pub status_threshold: GroupStatus,
    /// How many member username lookups may be in flight at once
    pub member_lookup_concurrency: usize,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(600),
            status_threshold: GroupStatus::Teacher,
            member_lookup_concurrency: 1,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        if let Some(url) = config.database_url.take() {
            let pool = match &config.database {
                DatabaseConfig::External { pool, .. } => pool.clone(),
                DatabaseConfig::Memory => PoolSettings::default(),
            };
            config.database = DatabaseConfig::External { url, pool };
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.provisioning.request_timeout.is_zero() {
            return Err(Error::InvalidArgument {
                message: "Config validation: provisioning.request_timeout must be greater than zero".to_string(),
            });
        }
        if self.provisioning.member_lookup_concurrency == 0 {
            return Err(Error::InvalidArgument {
                message: "Config validation: provisioning.member_lookup_concurrency must be at least 1".to_string(),
            });
        }
        if self.providers.is_empty() {
            return Err(Error::InvalidArgument {
                message: "Config validation: at least one hosting provider must be configured".to_string(),
            });
        }
        for (name, provider) in &self.providers {
            if let ScmProviderConfig::Github { request_timeout, .. } = provider
                && request_timeout.is_zero()
            {
                return Err(Error::InvalidArgument {
                    message: format!("Config validation: providers.{name}.request_timeout must be greater than zero"),
                });
            }
        }
        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("COURSECTL_").split("__").ignore(&["CONFIG"]))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
