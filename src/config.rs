//! Command-line configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via --config or WFRESOLVE_CONFIG)
//! 3. Environment variables
//! 4. Command-line flags (applied by the caller)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use wfresolve_core::{LoadOptions, ResolverOptions, TieBreak};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Catalog source configuration.
    pub catalog: CatalogConfig,
    /// Resolver configuration.
    pub resolver: ResolverConfig,
}

impl Config {
    /// Loads configuration from `path` (or WFRESOLVE_CONFIG), then applies
    /// environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match std::env::var("WFRESOLVE_CONFIG") {
                Ok(p) => Self::from_file(p)?,
                Err(_) => Self::default(),
            },
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Applies command-line flags. A set flag wins over file and environment;
    /// an absent one leaves the configured value alone.
    pub fn apply_cli_overrides(&mut self, catalog: Option<PathBuf>, strict: bool) {
        if let Some(path) = catalog {
            self.catalog.path = Some(path);
        }
        if strict {
            self.catalog.strict = true;
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.catalog.apply_overrides(&lookup);
        self.resolver.apply_overrides(&lookup);
    }
}

/// Where the catalog document lives and how strictly to load it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to a YAML or JSON catalog document.
    pub path: Option<PathBuf>,
    /// Abort on malformed records instead of skipping them.
    pub strict: bool,
}

impl CatalogConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("WFRESOLVE_CATALOG") {
            if !path.is_empty() {
                self.path = Some(PathBuf::from(path));
            }
        }

        if let Some(strict) = lookup("WFRESOLVE_STRICT") {
            self.strict = parse_bool(&strict);
        }
    }

    /// Returns the configured catalog path.
    pub fn require_path(&self) -> Result<&Path, ConfigError> {
        self.path.as_deref().ok_or_else(|| {
            ConfigError::ValidationError(
                "no catalog configured (use --catalog, WFRESOLVE_CATALOG or catalog.path)"
                    .to_string(),
            )
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strict: self.strict,
        }
    }
}

/// Resolver defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Tie-break between candidates with equal sort order.
    pub tie_break: TieBreak,
    /// Fall back to default-flagged transitions when nothing matches.
    pub use_default_fallback: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            tie_break: TieBreak::FirstSeen,
            use_default_fallback: true,
        }
    }
}

impl ResolverConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(policy) = lookup("WFRESOLVE_TIE_BREAK") {
            match policy.parse() {
                Ok(p) => self.tie_break = p,
                Err(e) => tracing::warn!("Ignoring WFRESOLVE_TIE_BREAK: {}", e),
            }
        }

        if let Some(fallback) = lookup("WFRESOLVE_DEFAULT_FALLBACK") {
            self.use_default_fallback = parse_bool(&fallback);
        }
    }

    pub fn options(&self) -> ResolverOptions {
        ResolverOptions {
            tie_break: self.tie_break,
            use_default_fallback: self.use_default_fallback,
        }
    }
}

fn parse_bool(value: &str) -> bool {
    value == "1" || value.to_lowercase() == "true"
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, String),

    #[error("configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.catalog.path.is_none());
        assert!(!config.catalog.strict);
        assert_eq!(config.resolver.tie_break, TieBreak::FirstSeen);
        assert!(config.resolver.use_default_fallback);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "catalog:\n  path: ./workflows.yaml\n  strict: true\nresolver:\n  tie_break: lowest_state_id"
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.catalog.path, Some(PathBuf::from("./workflows.yaml")));
        assert!(config.catalog.strict);
        assert_eq!(config.resolver.tie_break, TieBreak::LowestStateId);
        // Unspecified fields keep their defaults
        assert!(config.resolver.use_default_fallback);
    }

    #[test]
    fn test_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "resolver:\n  tie_break: sideways").unwrap();

        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/wfresolve.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(..)));
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("WFRESOLVE_CATALOG", "/etc/wf/catalog.json"),
            ("WFRESOLVE_STRICT", "1"),
            ("WFRESOLVE_TIE_BREAK", "lowest-state-id"),
            ("WFRESOLVE_DEFAULT_FALLBACK", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(
            config.catalog.require_path().unwrap(),
            Path::new("/etc/wf/catalog.json")
        );
        assert!(config.catalog.load_options().strict);
        let options = config.resolver.options();
        assert_eq!(options.tie_break, TieBreak::LowestStateId);
        assert!(!options.use_default_fallback);
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = Config::default();
        config.catalog.path = Some(PathBuf::from("./from-file.yaml"));
        config.apply_overrides(|k| {
            (k == "WFRESOLVE_CATALOG").then(|| "/etc/wf/from-env.yaml".to_string())
        });

        config.apply_cli_overrides(Some(PathBuf::from("cli.json")), true);
        assert_eq!(config.catalog.require_path().unwrap(), Path::new("cli.json"));
        assert!(config.catalog.strict);
    }

    #[test]
    fn test_cli_overrides_absent() {
        let mut config = Config::default();
        config.apply_overrides(|k| match k {
            "WFRESOLVE_CATALOG" => Some("/etc/wf/from-env.yaml".to_string()),
            "WFRESOLVE_STRICT" => Some("true".to_string()),
            _ => None,
        });

        // Without --strict the configured value stays
        config.apply_cli_overrides(None, false);
        assert_eq!(
            config.catalog.require_path().unwrap(),
            Path::new("/etc/wf/from-env.yaml")
        );
        assert!(config.catalog.strict);
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::ParseError(PathBuf::from("wf.yaml"), "bad indent".to_string());
        assert_eq!(
            err.to_string(),
            "failed to parse config file 'wf.yaml': bad indent"
        );
        let err = ConfigError::ValidationError("no catalog".to_string());
        assert_eq!(err.to_string(), "configuration validation failed: no catalog");
    }

    #[test]
    fn test_invalid_tie_break_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|k| (k == "WFRESOLVE_TIE_BREAK").then(|| "random".to_string()));
        assert_eq!(config.resolver.tie_break, TieBreak::FirstSeen);
    }

    #[test]
    fn test_require_path() {
        let config = CatalogConfig::default();
        assert!(matches!(
            config.require_path(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.resolver.tie_break, config.resolver.tie_break);
    }
}
