//! Configuration loading and runtime context.
//!
//! Two TOML files: a plaintext config (network, contract addresses,
//! refresh tuning) and a separate secrets file carrying the signer key.
//! Both are combined into the runtime [`Ctx`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use alloy::primitives::{Address, B256};
use clap::Args;
use serde::Deserialize;
use tracing::Level;
use url::Url;

use crate::error::OrchestrationError;
use crate::session::Session;

#[derive(Args, Debug)]
pub struct Env {
    /// Path to plaintext TOML configuration file
    #[clap(long)]
    pub config: PathBuf,
    /// Path to TOML secrets file
    #[clap(long)]
    pub secrets: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// A token's address and decimal precision. Immutable, from static
/// configuration; never queried at runtime.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TokenDescriptor {
    pub address: Address,
    pub decimals: u8,
}

/// Non-secret settings deserialized from the plaintext config TOML.
#[derive(Deserialize)]
struct ConfigFile {
    chain_id: u64,
    rpc_url: Url,
    log_level: Option<LogLevel>,
    contracts: Contracts,
    refresh: Option<RefreshFile>,
}

/// The static contract address table.
#[derive(Debug, Clone, Deserialize)]
pub struct Contracts {
    /// The token paid in on subscription (e.g. USDT).
    pub payment_token: TokenDescriptor,
    /// The bond share token received on subscription.
    pub bond_token: TokenDescriptor,
    pub oracle: Address,
    pub subscription: Address,
    pub coupon: Address,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RefreshFile {
    coupon_interval_secs: Option<u64>,
    countdown_interval_secs: Option<u64>,
    max_jitter_secs: Option<u64>,
}

/// Secret credentials deserialized from the secrets TOML.
#[derive(Deserialize)]
struct Secrets {
    signer: SignerSecrets,
}

#[derive(Deserialize)]
struct SignerSecrets {
    private_key: B256,
}

/// Background refresh cadences (see [`tasks`](crate::tasks)).
#[derive(Debug, Clone, Copy)]
pub struct RefreshCtx {
    pub coupon_interval: Duration,
    pub countdown_interval: Duration,
    pub max_jitter: Duration,
}

impl Default for RefreshCtx {
    fn default() -> Self {
        Self {
            coupon_interval: Duration::from_secs(30),
            countdown_interval: Duration::from_secs(60),
            max_jitter: Duration::from_secs(5),
        }
    }
}

impl From<RefreshFile> for RefreshCtx {
    fn from(file: RefreshFile) -> Self {
        let defaults = Self::default();
        Self {
            coupon_interval: file
                .coupon_interval_secs
                .map_or(defaults.coupon_interval, Duration::from_secs),
            countdown_interval: file
                .countdown_interval_secs
                .map_or(defaults.countdown_interval, Duration::from_secs),
            max_jitter: file
                .max_jitter_secs
                .map_or(defaults.max_jitter, Duration::from_secs),
        }
    }
}

/// Combined runtime context assembled from config and secrets.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub chain_id: u64,
    pub rpc_url: Url,
    pub log_level: LogLevel,
    pub contracts: Contracts,
    pub refresh: RefreshCtx,
    pub(crate) signer_key: B256,
}

impl Env {
    pub fn into_ctx(self) -> Result<Ctx, ConfigError> {
        let config: ConfigFile = read_toml(&self.config)?;
        let secrets: Secrets = read_toml(&self.secrets)?;

        Ok(Ctx {
            chain_id: config.chain_id,
            rpc_url: config.rpc_url,
            log_level: config.log_level.unwrap_or(LogLevel::Info),
            contracts: config.contracts,
            refresh: config.refresh.map(RefreshCtx::from).unwrap_or_default(),
            signer_key: secrets.signer.private_key,
        })
    }
}

impl Ctx {
    /// Fail when the session's network is not the configured one. This
    /// is a reported precondition failure, not something to retry.
    pub fn ensure_network(&self, session: &Session) -> Result<(), OrchestrationError> {
        if session.chain_id != self.chain_id {
            return Err(OrchestrationError::NetworkMismatch {
                expected: self.chain_id,
                actual: session.chain_id,
            });
        }
        Ok(())
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
