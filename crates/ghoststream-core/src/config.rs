//! Configuration module
//!
//! Everything the ingestion binary needs from its environment: the two protection
//! keys, object storage, the catalog database and the media tool paths. Loaded once
//! at startup; the pipeline itself receives explicit values and never reads the
//! environment.

use std::env;
use std::path::PathBuf;

use base64::{engine::general_purpose, Engine as _};

use crate::error::{IngestError, IngestResult};
use crate::storage_types::StorageBackend;

const DEFAULT_REGION: &str = "auto";
const DB_MAX_CONNECTIONS: u32 = 5;
const DB_TIMEOUT_SECONDS: u64 = 30;

/// Decoded key material. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    pub fn from_base64(name: &str, value: &str) -> IngestResult<Self> {
        let bytes = general_purpose::STANDARD
            .decode(value.trim())
            .map_err(|e| IngestError::Config(format!("{} must be base64: {}", name, e)))?;
        Ok(SecretKey(bytes))
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey([REDACTED; {} bytes])", self.0.len())
    }
}

#[derive(Clone, Debug)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: String,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<SecretString>,
    pub local_path: Option<PathBuf>,
}

/// Credential string that is redacted in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        SecretString(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: SecretString,
    pub max_connections: u32,
    pub timeout_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub aes_key: SecretKey,
    pub tag_hmac_key: SecretKey,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
}

impl IngestConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> IngestResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> IngestResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |names: &[&str]| {
            names
                .iter()
                .find_map(|name| get(*name))
                .ok_or_else(|| IngestError::Config(format!("{} must be set", names.join(" or "))))
        };

        let aes_key = SecretKey::from_base64("AES_KEY_B64", &require(&["AES_KEY_B64", "GS_AES_KEY_B64"])?)?;
        let tag_hmac_key = SecretKey::from_base64(
            "TAG_HMAC_KEY_B64",
            &require(&["TAG_HMAC_KEY_B64", "GS_TAG_HMAC_KEY_B64"])?,
        )?;

        let backend = match get("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::default(),
        };

        let storage = StorageConfig {
            backend,
            bucket: require(&["R2_BUCKET"])?,
            endpoint: get("R2_ENDPOINT"),
            region: get("R2_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            access_key_id: get("R2_ACCESS_KEY_ID"),
            secret_access_key: get("R2_SECRET_ACCESS_KEY").map(SecretString::new),
            local_path: get("LOCAL_STORAGE_PATH").map(PathBuf::from),
        };

        let database = DatabaseConfig {
            url: SecretString::new(require(&["DATABASE_URL", "SUPABASE_DB_URL"])?),
            max_connections: get("DB_MAX_CONNECTIONS")
                .map(|v| {
                    v.parse().map_err(|_| {
                        IngestError::Config("DB_MAX_CONNECTIONS must be a valid number".to_string())
                    })
                })
                .transpose()?
                .unwrap_or(DB_MAX_CONNECTIONS),
            timeout_seconds: get("DB_TIMEOUT_SECONDS")
                .map(|v| {
                    v.parse().map_err(|_| {
                        IngestError::Config("DB_TIMEOUT_SECONDS must be a valid number".to_string())
                    })
                })
                .transpose()?
                .unwrap_or(DB_TIMEOUT_SECONDS),
        };

        let config = IngestConfig {
            aes_key,
            tag_hmac_key,
            storage,
            database,
            ffmpeg_path: get("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe_path: get("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> IngestResult<()> {
        if !self.database.url.expose().starts_with("postgres://")
            && !self.database.url.expose().starts_with("postgresql://")
        {
            return Err(IngestError::Config(
                "DATABASE_URL must be a valid PostgreSQL connection string".to_string(),
            ));
        }

        match self.storage.backend {
            StorageBackend::S3 => {
                if self.storage.endpoint.is_none() {
                    return Err(IngestError::Config(
                        "R2_ENDPOINT must be set when using S3 storage backend".to_string(),
                    ));
                }
                if self.storage.access_key_id.is_none() || self.storage.secret_access_key.is_none()
                {
                    return Err(IngestError::Config(
                        "R2_ACCESS_KEY_ID and R2_SECRET_ACCESS_KEY must be set when using S3 storage backend".to_string(),
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_path.is_none() {
                    return Err(IngestError::Config(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_vars() -> HashMap<&'static str, String> {
        let key = general_purpose::STANDARD.encode([9u8; 32]);
        HashMap::from([
            ("AES_KEY_B64", key.clone()),
            ("TAG_HMAC_KEY_B64", key),
            ("R2_BUCKET", "ghoststream".to_string()),
            ("R2_ENDPOINT", "https://acct.r2.cloudflarestorage.com".to_string()),
            ("R2_ACCESS_KEY_ID", "id".to_string()),
            ("R2_SECRET_ACCESS_KEY", "secret".to_string()),
            ("DATABASE_URL", "postgres://localhost/ghoststream".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> IngestResult<IngestConfig> {
        IngestConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn loads_with_defaults() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.region, "auto");
        assert_eq!(config.ffmpeg_path, "ffmpeg");
        assert_eq!(config.ffprobe_path, "ffprobe");
        assert_eq!(config.aes_key.expose().len(), 32);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn accepts_prefixed_key_aliases() {
        let mut vars = base_vars();
        let key = vars.remove("AES_KEY_B64").unwrap();
        vars.insert("GS_AES_KEY_B64", key);
        let tag = vars.remove("TAG_HMAC_KEY_B64").unwrap();
        vars.insert("GS_TAG_HMAC_KEY_B64", tag);
        let db = vars.remove("DATABASE_URL").unwrap();
        vars.insert("SUPABASE_DB_URL", db);
        assert!(load(&vars).is_ok());
    }

    #[test]
    fn missing_key_names_the_variable() {
        let mut vars = base_vars();
        vars.remove("AES_KEY_B64");
        let err = load(&vars).unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        let text = err.to_string();
        assert!(text.contains("AES_KEY_B64 or GS_AES_KEY_B64"), "{}", text);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let mut vars = base_vars();
        vars.insert("DB_MAX_CONNECTIONS", "many".to_string());
        assert!(matches!(load(&vars), Err(IngestError::Config(_))));

        let mut vars = base_vars();
        vars.insert("STORAGE_BACKEND", "nfs".to_string());
        assert!(matches!(load(&vars), Err(IngestError::Config(_))));

        let mut vars = base_vars();
        vars.insert("TAG_HMAC_KEY_B64", "not base64!!".to_string());
        assert!(matches!(load(&vars), Err(IngestError::Config(_))));

        let mut vars = base_vars();
        vars.insert("DATABASE_URL", "mysql://localhost/x".to_string());
        assert!(matches!(load(&vars), Err(IngestError::Config(_))));
    }

    #[test]
    fn local_backend_needs_path_not_credentials() {
        let mut vars = base_vars();
        vars.remove("R2_ENDPOINT");
        vars.remove("R2_ACCESS_KEY_ID");
        vars.remove("R2_SECRET_ACCESS_KEY");
        vars.insert("STORAGE_BACKEND", "local".to_string());
        assert!(load(&vars).is_err());

        vars.insert("LOCAL_STORAGE_PATH", "/tmp/ghoststream".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Local);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = load(&base_vars()).unwrap();
        let text = format!("{:?}", config);
        assert!(!text.contains("secret\""));
        assert!(!text.contains("postgres://localhost"));
        assert!(text.contains("REDACTED"));
    }
}
