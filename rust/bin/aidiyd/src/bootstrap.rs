//! Bootstrap: startup checks and storage initialization.

use std::ops::RangeInclusive;
use std::sync::Arc;

use aidiy_kv::{KVStore, MemoryStore, RedbStore};
use tracing::{info, warn};

use crate::config::{Backend, ServerConfig};

/// Allowed OTP lengths.
const OTP_LENGTHS: RangeInclusive<usize> = 4..=10;
/// Allowed OTP lifetimes, in seconds (up to one day).
const OTP_TTL_SECS: RangeInclusive<i64> = 1..=86_400;
/// Allowed wrong guesses per OTP.
const OTP_MAX_ATTEMPTS: RangeInclusive<u32> = 1..=100;
/// Allowed app-token lifetimes, in seconds (up to one year).
const JWT_EXPIRE_SECS: RangeInclusive<i64> = 1..=31_536_000;

fn check_range<T>(name: &str, range: &RangeInclusive<T>, value: T) -> anyhow::Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if !range.contains(&value) {
        anyhow::bail!(
            "{} must be between {} and {}, got {}.",
            name,
            range.start(),
            range.end(),
            value
        );
    }
    Ok(())
}

/// Verify server configuration is ready to serve.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.jwt.secret.is_empty() {
        anyhow::bail!(
            "JWT secret is empty in configuration.\n\
             Run `aidiyd init -c <path>` to generate one."
        );
    }
    if config.storage.backend == Backend::Redb && config.storage.data_dir.is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    check_range("otp.length", &OTP_LENGTHS, config.otp.length)?;
    check_range("otp.ttl_secs", &OTP_TTL_SECS, config.otp.ttl_secs)?;
    check_range("otp.max_attempts", &OTP_MAX_ATTEMPTS, config.otp.max_attempts)?;
    check_range("jwt.expire_secs", &JWT_EXPIRE_SECS, config.jwt.expire_secs)?;
    if config.google.client_id.is_empty() {
        warn!("google.client_id is not set; Google sign-in will reject every token");
    }
    Ok(())
}

/// Open the configured document store.
pub fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn KVStore>> {
    match config.storage.backend {
        Backend::Memory => {
            warn!("using in-memory storage; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        Backend::Redb => {
            std::fs::create_dir_all(&config.storage.data_dir)?;
            let path = config.storage.db_path();
            let store = RedbStore::open(&path)
                .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?;
            info!("KV store opened at {}", path.display());
            Ok(Arc::new(store))
        }
    }
}
