//! Server-side configuration, read from a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use aidiy_auth::service::AuthConfig;

/// Directory that bare context names resolve into.
pub const CONFIG_DIR: &str = "/etc/aidiy";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub otp: OtpConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub kid: KidConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub listen: String,
    /// Value of `Access-Control-Allow-Origin`.
    pub cors_origin: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5500".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Redb,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Redb,
            data_dir: "/var/lib/aidiy".to_string(),
        }
    }
}

impl StorageConfig {
    /// Path of the redb database file.
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("aidiy.redb")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expire_secs")]
    pub expire_secs: i64,
}

fn default_expire_secs() -> i64 {
    86400
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OtpConfig {
    pub length: usize,
    pub ttl_secs: i64,
    pub max_attempts: u32,
    pub sweep_interval_secs: u64,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            length: 6,
            ttl_secs: 300,
            max_attempts: 3,
            sweep_interval_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub client_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub sender: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: "no-reply@aidiy.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KidConfig {
    pub email_domain: String,
}

impl Default for KidConfig {
    fn default() -> Self {
        Self {
            email_domain: "aidiy.com".to_string(),
        }
    }
}

impl ServerConfig {
    /// Resolve a context name or path to a config file path.
    ///
    /// Anything containing `/` or `.` is taken as a path; a bare name maps
    /// to `/etc/aidiy/<name>.toml`.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(CONFIG_DIR).join(format!("{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Fresh config for `aidiyd init`, with a random JWT secret.
    pub fn generate(data_dir: &str) -> Self {
        let secret: String = {
            use rand::Rng;
            let mut rng = rand::thread_rng();
            (0..32).map(|_| format!("{:02x}", rng.gen::<u8>())).collect()
        };
        Self {
            server: HttpConfig::default(),
            storage: StorageConfig {
                backend: Backend::Redb,
                data_dir: data_dir.to_string(),
            },
            jwt: JwtConfig {
                secret,
                expire_secs: default_expire_secs(),
            },
            otp: OtpConfig::default(),
            google: GoogleConfig::default(),
            mail: MailConfig::default(),
            kid: KidConfig::default(),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn to_auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.jwt.secret.clone(),
            token_ttl: self.jwt.expire_secs,
            otp_length: self.otp.length,
            otp_ttl: self.otp.ttl_secs,
            otp_max_attempts: self.otp.max_attempts,
            google_client_id: self.google.client_id.clone(),
            kid_email_domain: self.kid.email_domain.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            ServerConfig::resolve_path("dev"),
            PathBuf::from("/etc/aidiy/dev.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./local.toml"),
            PathBuf::from("./local.toml")
        );
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = ServerConfig::parse("[jwt]\nsecret = \"s3cret\"\n").unwrap();
        assert_eq!(config.jwt.expire_secs, 86400);
        assert_eq!(config.server.listen, "127.0.0.1:5500");
        assert_eq!(config.storage.backend, Backend::Redb);
        assert_eq!(config.otp.length, 6);
        assert_eq!(config.otp.max_attempts, 3);
        assert_eq!(config.kid.email_domain, "aidiy.com");

        let auth = config.to_auth_config();
        assert_eq!(auth.jwt_secret, "s3cret");
        assert_eq!(auth.otp_ttl, 300);
    }

    #[test]
    fn test_missing_jwt_section_is_an_error() {
        assert!(ServerConfig::parse("[server]\nlisten = \"0.0.0.0:80\"\n").is_err());
    }

    #[test]
    fn test_memory_backend() {
        let config = ServerConfig::parse(
            "[storage]\nbackend = \"memory\"\n\n[jwt]\nsecret = \"x\"\n",
        )
        .unwrap();
        assert_eq!(config.storage.backend, Backend::Memory);
    }

    #[test]
    fn test_generate_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf/dev.toml");
        let config = ServerConfig::generate("/tmp/aidiy-data");
        assert_eq!(config.jwt.secret.len(), 64);
        config.save(&path).unwrap();

        let back = ServerConfig::load(&path).unwrap();
        assert_eq!(back.jwt.secret, config.jwt.secret);
        assert_eq!(back.storage.data_dir, "/tmp/aidiy-data");
        assert_ne!(ServerConfig::generate("x").jwt.secret, config.jwt.secret);
    }
}
