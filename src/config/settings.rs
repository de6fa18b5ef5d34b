//! TOML-based configuration for dynapi.
//!
//! Supports a config file (dynapi.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [loader]
//! enabled = true
//! provider = "worker"
//!
//! [provider.worker]
//! path = "./schema-worker"
//! driver = "postgres"
//! connection_string = "${DATABASE_URL}"
//! schema = "public"
//!
//! [generator]
//! package = "shop.entities"
//!
//! [bridge]
//! path_prefix = "/api"
//! default_page_size = 50
//! max_page_size = 500
//!
//! [raw_query]
//! policy = "select_only"
//! admin_roles = ["dba"]
//!
//! [logging]
//! filter = "dynapi=debug,info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub loader: LoaderSettings,
    pub provider: ProviderSettings,
    pub generator: GeneratorSettings,
    pub bridge: BridgeSettings,
    pub raw_query: RawQuerySettings,
    pub logging: LoggingSettings,
}

/// Which data provider feeds the loader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    File,
    Worker,
}

/// Startup loading.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Skip loading entirely when false (the repository stays empty).
    pub enabled: bool,
    pub provider: ProviderKind,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: ProviderKind::File,
        }
    }
}

/// Per-provider sections.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub file: FileSettings,
    pub worker: WorkerSettings,
}

/// `[provider.file]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FileSettings {
    /// Path to the entity metadata JSON document.
    pub path: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            path: "./entities.json".to_string(),
        }
    }
}

impl FileSettings {
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        Ok(PathBuf::from(expand_env_vars(&self.path)?))
    }
}

/// `[provider.worker]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary. Searched for when absent.
    pub path: Option<String>,

    /// Extra command-line arguments for the worker.
    pub args: Vec<String>,

    /// Database driver understood by the worker (postgres, mssql, ...).
    pub driver: String,

    /// Connection string (supports ${ENV_VAR} expansion).
    pub connection_string: String,

    /// Schema to introspect (worker default if absent).
    pub schema: Option<String>,

    /// Per-request timeout.
    pub timeout_seconds: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            driver: "postgres".to_string(),
            connection_string: String::new(),
            schema: None,
            timeout_seconds: 30,
        }
    }
}

impl WorkerSettings {
    /// Get the connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.connection_string)
    }

    /// Get the worker binary path.
    ///
    /// Uses the configured path when present, otherwise searches the usual
    /// locations next to the working directory.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        if let Some(path) = &self.path {
            return Ok(PathBuf::from(expand_env_vars(path)?));
        }

        let candidates = ["./schema-worker", "./worker/schema-worker"];
        candidates
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .ok_or_else(|| {
                SettingsError::InvalidConfig(
                    "provider.worker.path is not set and no schema-worker binary was found"
                        .to_string(),
                )
            })
    }
}

/// `[generator]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// proto3 package name.
    pub package: String,
    /// Emit descriptive comments in generated documents.
    pub include_comments: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            package: "dynapi.entities".to_string(),
            include_comments: true,
        }
    }
}

/// `[bridge]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeSettings {
    /// Path prefix in front of resource names.
    pub path_prefix: String,
    /// Page size used when a list call gives none.
    pub default_page_size: u32,
    /// Upper bound applied to requested page sizes.
    pub max_page_size: u32,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            path_prefix: "/api".to_string(),
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

/// Reference policy selected for raw queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawQueryPolicyKind {
    #[default]
    SelectOnly,
    AllowAll,
    DenyAll,
}

/// `[raw_query]`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RawQuerySettings {
    pub policy: RawQueryPolicyKind,
    /// Roles that bypass the policy.
    pub admin_roles: Vec<String>,
}

/// `[logging]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub ansi: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            ansi: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `DYNAPI_CONFIG`
    /// 2. `./dynapi.toml`
    /// 3. `~/.config/dynapi/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("DYNAPI_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("dynapi.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("dynapi").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let bridge = &self.bridge;
        if bridge.default_page_size == 0 || bridge.max_page_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "bridge page sizes must be positive".to_string(),
            ));
        }
        if bridge.default_page_size > bridge.max_page_size {
            return Err(SettingsError::InvalidConfig(format!(
                "bridge.default_page_size ({}) exceeds bridge.max_page_size ({})",
                bridge.default_page_size, bridge.max_page_size
            )));
        }
        if self.generator.package.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "generator.package must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next(); // consume '{'
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            // $VAR ends at the first non-alphanumeric/underscore
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // lone $
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
