//! Configuration management for sealnote

use crate::crypto::{KdfHash, KdfParams, DEFAULT_KDF_ITERATIONS};
use crate::error::{Error, Result};
use crate::passphrase::MIN_PASSWORD_LENGTH;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Prefix that namespaces vault records in the store
pub const DEFAULT_KEY_PREFIX: &str = "encryptionKey_";

/// Environment variable that supplies the instance identifier
pub const INSTANCE_ID_ENV: &str = "SEALNOTE_INSTANCE_ID";

/// Key derivation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfConfig {
    /// PBKDF2 iteration count
    pub iterations: u32,

    /// HMAC hash inside PBKDF2
    pub hash: KdfHash,
}

impl KdfConfig {
    /// Validated parameters for the cipher
    pub fn params(&self) -> Result<KdfParams> {
        let iterations = NonZeroU32::new(self.iterations).ok_or_else(|| {
            Error::InvalidConfig("KDF iterations must be greater than 0".to_string())
        })?;
        Ok(KdfParams::new(iterations, self.hash))
    }
}

/// Session vault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Store key prefix for vault records
    pub key_prefix: String,

    /// Minimum length of a secret saved to the vault
    pub min_secret_length: usize,
}

/// Store backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// On-disk sled database
    Sled,

    /// Process memory, lost at exit
    Memory,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend to use
    pub backend: StoreBackend,

    /// Database path (sled backend only)
    pub path: PathBuf,
}

/// Instance identity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Identifier given inline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// File holding the identifier, written by `sealnote init`
    pub id_file: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Key derivation configuration
    #[serde(default)]
    pub kdf: KdfConfig,

    /// Vault configuration
    #[serde(default)]
    pub vault: VaultConfig,

    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Instance identity configuration
    #[serde(default)]
    pub instance: InstanceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join("sealnote")
}

impl Default for KdfConfig {
    fn default() -> Self {
        KdfConfig {
            iterations: DEFAULT_KDF_ITERATIONS,
            hash: KdfHash::Sha256,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        VaultConfig {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            min_secret_length: MIN_PASSWORD_LENGTH,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::Sled,
            path: app_dir(dirs::data_dir()).join("store.db"),
        }
    }
}

impl Default for InstanceConfig {
    fn default() -> Self {
        InstanceConfig {
            id: None,
            id_file: app_dir(dirs::config_dir()).join("instance_id"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

impl Config {
    /// Load configuration from a file (YAML or JSON), with environment
    /// variable substitution and overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = std::fs::read_to_string(path_ref)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let content = Self::substitute_env_vars(&content);

        let mut config: Config = if is_yaml(path_ref) {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse YAML config: {}", e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::Config(format!("Failed to parse JSON config: {}", e)))?
        };

        config.apply_env_overrides();
        config.validate()?;
        debug!("Loaded config from {:?}", path_ref);
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }

        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Substitute `${VAR_NAME}` patterns with environment values
    fn substitute_env_vars(content: &str) -> String {
        let re = match regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
            Ok(re) => re,
            Err(_) => return content.to_string(),
        };

        re.replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(iterations) = std::env::var("SEALNOTE_KDF_ITERATIONS") {
            if let Ok(n) = iterations.trim().parse::<u32>() {
                self.kdf.iterations = n;
            }
        }

        if let Ok(path) = std::env::var("SEALNOTE_STORE_PATH") {
            let path = path.trim();
            if !path.is_empty() {
                self.store.path = PathBuf::from(path);
            }
        }

        if let Ok(level) = std::env::var("SEALNOTE_LOG_LEVEL") {
            let level = level.trim();
            if !level.is_empty() {
                self.logging.level = level.to_string();
            }
        }

        if let Ok(id) = std::env::var(INSTANCE_ID_ENV) {
            let id = id.trim();
            if !id.is_empty() {
                self.instance.id = Some(id.to_string());
            }
        }
    }

    /// Save configuration to a file (format determined by extension)
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();

        let content = if is_yaml(path_ref) {
            serde_yaml::to_string(self)
                .map_err(|e| Error::Config(format!("Failed to serialize config to YAML: {}", e)))?
        } else {
            serde_json::to_string_pretty(self)
                .map_err(|e| Error::Config(format!("Failed to serialize config to JSON: {}", e)))?
        };

        if let Some(parent) = path_ref.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path_ref, content)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.kdf.params()?;

        if self.vault.key_prefix.is_empty() {
            return Err(Error::InvalidConfig(
                "Vault key prefix cannot be empty".to_string(),
            ));
        }

        if self.vault.min_secret_length == 0 {
            return Err(Error::InvalidConfig(
                "Minimum secret length must be greater than 0".to_string(),
            ));
        }

        if self.store.backend == StoreBackend::Sled && self.store.path.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "Store path is required for the sled backend".to_string(),
            ));
        }

        Ok(())
    }

    /// Find the instance identifier: inline/env value first, then the id file.
    ///
    /// Returns `None` when neither is present; callers must then refuse to
    /// open the vault.
    pub fn resolve_instance_id(&self) -> Result<Option<String>> {
        if let Some(id) = self.instance.id.as_deref().map(str::trim) {
            if !id.is_empty() {
                return Ok(Some(id.to_string()));
            }
        }

        match std::fs::read_to_string(&self.instance.id_file) {
            Ok(content) => {
                let id = content.trim();
                Ok((!id.is_empty()).then(|| id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Config(format!(
                "Failed to read instance id file {:?}: {}",
                self.instance.id_file, e
            ))),
        }
    }

    /// Return the existing instance identifier, or generate and persist one
    pub fn ensure_instance_id(&self) -> Result<String> {
        if let Some(id) = self.resolve_instance_id()? {
            return Ok(id);
        }
        self.write_new_instance_id()
    }

    /// Generate a fresh identifier and write it to the id file, replacing
    /// any previous one
    pub fn write_new_instance_id(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        if let Some(parent) = self.instance.id_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.instance.id_file, &id)?;

        info!("Generated instance id at {:?}", self.instance.id_file);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.store.path = dir.path().join("store.db");
        config.instance.id_file = dir.path().join("instance_id");
        config
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.kdf.iterations, DEFAULT_KDF_ITERATIONS);
        assert_eq!(config.kdf.hash, KdfHash::Sha256);
        assert_eq!(config.vault.key_prefix, "encryptionKey_");
        assert_eq!(config.vault.min_secret_length, 8);
        assert_eq!(config.store.backend, StoreBackend::Sled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let mut config = Config::default();
        config.kdf.iterations = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let mut config = Config::default();
        config.vault.key_prefix.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = config_in(&dir);
        config.kdf.iterations = 20_000;
        config.kdf.hash = KdfHash::Sha1;

        config.save(&path).unwrap();
        let loaded = Config::load(&path).unwrap();

        assert_eq!(loaded.kdf.iterations, 20_000);
        assert_eq!(loaded.kdf.hash, KdfHash::Sha1);
        assert_eq!(loaded.store.path, config.store.path);
    }

    #[test]
    fn test_yaml_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        let mut config = config_in(&dir);
        config.store.backend = StoreBackend::Memory;

        config.save(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("backend: memory"));

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.store.backend, StoreBackend::Memory);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "kdf": { "iterations": 15000 } }"#).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.kdf.iterations, 15_000);
        assert_eq!(loaded.kdf.hash, KdfHash::Sha256);
        assert_eq!(loaded.vault.key_prefix, DEFAULT_KEY_PREFIX);
    }

    #[test]
    fn test_partial_sections_use_field_defaults() {
        let dir = TempDir::new().unwrap();

        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{ "store": { "backend": "memory" } }"#).unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.store.backend, StoreBackend::Memory);
        assert_eq!(loaded.store.path, StoreConfig::default().path);

        let path = dir.path().join("vault.yaml");
        std::fs::write(&path, "vault:\n  key_prefix: k_\nkdf:\n  hash: sha1\n").unwrap();
        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.vault.key_prefix, "k_");
        assert_eq!(loaded.vault.min_secret_length, MIN_PASSWORD_LENGTH);
        assert_eq!(loaded.kdf.hash, KdfHash::Sha1);
        assert_eq!(loaded.kdf.iterations, DEFAULT_KDF_ITERATIONS);
    }

    #[test]
    fn test_env_substitution() {
        std::env::set_var("SEALNOTE_TEST_PREFIX_VALUE", "custom_");
        let content = r#"{"vault": {"key_prefix": "${SEALNOTE_TEST_PREFIX_VALUE}", "min_secret_length": 8}}"#;
        let substituted = Config::substitute_env_vars(content);

        assert!(substituted.contains("\"custom_\""));
        assert!(Config::substitute_env_vars("${SEALNOTE_TEST_UNSET_VAR}").contains("${SEALNOTE_TEST_UNSET_VAR}"));
    }

    #[test]
    fn test_instance_id_from_file() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        std::fs::write(&config.instance.id_file, "  install-42\n").unwrap();

        assert_eq!(config.resolve_instance_id().unwrap().as_deref(), Some("install-42"));
    }

    #[test]
    fn test_inline_instance_id_wins() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        std::fs::write(&config.instance.id_file, "from-file").unwrap();
        config.instance.id = Some("inline".to_string());

        assert_eq!(config.resolve_instance_id().unwrap().as_deref(), Some("inline"));
    }

    #[test]
    fn test_missing_instance_id() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        assert!(config.resolve_instance_id().unwrap().is_none());
    }

    #[test]
    fn test_new_instance_id_written_despite_override() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        std::fs::write(&config.instance.id_file, "old-id").unwrap();
        config.instance.id = Some("inline".to_string());

        let id = config.write_new_instance_id().unwrap();
        let on_disk = std::fs::read_to_string(&config.instance.id_file).unwrap();

        assert_eq!(on_disk, id);
        assert_ne!(on_disk, "old-id");
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn test_ensure_instance_id_is_stable() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let first = config.ensure_instance_id().unwrap();
        let second = config.ensure_instance_id().unwrap();

        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
