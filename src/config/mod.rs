//! Configuration module for dynapi.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, BridgeSettings, FileSettings, GeneratorSettings, LoaderSettings,
    LoggingSettings, ProviderKind, ProviderSettings, RawQueryPolicyKind, RawQuerySettings,
    Settings, SettingsError, WorkerSettings,
};
