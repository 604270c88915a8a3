//! Runtime configuration for `prism`.
//!
//! Settings resolve in three layers, each overriding the last:
//!
//! 1. built-in defaults
//! 2. `prism.toml` (from `--config`, `PRISM_CONFIG`, or the working directory)
//! 3. command-line flags
//!
//! ```toml
//! [markers]
//! start = "/* @generated hsl-fallbacks:start */"
//! end = "/* @generated hsl-fallbacks:end */"
//!
//! [audit]
//! required = ["background", "foreground", "primary", "primary-foreground"]
//! pairs = [["foreground", "background"], ["primary-foreground", "primary"]]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use prism::audit::{DEFAULT_PAIRS, DEFAULT_REQUIRED};
use prism::tokens::{GENERATED_END, GENERATED_START};
use prism::{Markers, ThemeAuditor};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::{Cli, Command};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "prism.toml";

/// Runtime configuration, independent of where each value came from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub markers: MarkerConfig,
    pub audit: AuditConfig,
}

/// Literal comments bounding the generated region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerConfig {
    pub start: String,
    pub end: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            start: GENERATED_START.to_string(),
            end: GENERATED_END.to_string(),
        }
    }
}

/// Required tokens and contrast pairings for `prism audit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    pub required: Vec<String>,
    /// `[foreground, background]` name pairs.
    pub pairs: Vec<(String, String)>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            required: DEFAULT_REQUIRED.iter().map(ToString::to_string).collect(),
            pairs: DEFAULT_PAIRS
                .iter()
                .map(|(fg, bg)| ((*fg).to_string(), (*bg).to_string()))
                .collect(),
        }
    }
}

impl Config {
    /// Resolve the configuration for a parsed command line.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly named config file is missing, if any
    /// config file cannot be read or parsed, or if the result is invalid.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => {
                let local = Path::new(CONFIG_FILE_NAME);
                if local.is_file() {
                    Self::load(local)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_flags(&cli.command);
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for
    /// this schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
        let config = Self::from_toml(&text).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        debug!(config.path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse config text. Missing sections and keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the parser error if the text is not valid for this schema.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn apply_flags(&mut self, command: &Command) {
        if let Command::Generate(args) = command {
            if let Some(start) = &args.start_marker {
                self.markers.start.clone_from(start);
            }
            if let Some(end) = &args.end_marker {
                self.markers.end.clone_from(end);
            }
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.markers.start.trim().is_empty() || self.markers.end.trim().is_empty() {
            return Err(ConfigError::EmptyMarker);
        }
        if self.markers.start == self.markers.end {
            return Err(ConfigError::IdenticalMarkers(self.markers.start.clone()));
        }
        let blank = |name: &String| name.trim().trim_start_matches("--").is_empty();
        if self.audit.required.iter().any(blank)
            || self.audit.pairs.iter().any(|(fg, bg)| blank(fg) || blank(bg))
        {
            return Err(ConfigError::EmptyTokenName);
        }
        Ok(())
    }

    pub fn markers(&self) -> Markers {
        Markers::new(self.markers.start.clone(), self.markers.end.clone())
    }

    pub fn auditor(&self) -> ThemeAuditor {
        ThemeAuditor::new(
            self.audit.required.iter().map(String::as_str),
            self.audit
                .pairs
                .iter()
                .map(|(fg, bg)| (fg.as_str(), bg.as_str())),
        )
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Config file could not be read.
    #[error("Failed to read {}: {message}", path.display())]
    Read { path: PathBuf, message: String },

    /// Config file is not valid TOML for this schema.
    #[error("Invalid config {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// A marker is empty.
    #[error("Generated region markers must not be empty")]
    EmptyMarker,

    /// Both markers are the same text.
    #[error("Start and end markers are identical: {0:?}")]
    IdenticalMarkers(String),

    /// A required token or pairing names nothing.
    #[error("Audit token names must not be empty")]
    EmptyTokenName,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_match_the_library() {
        let config = Config::default();
        assert_eq!(config.markers(), Markers::default());
        assert_eq!(config.auditor(), ThemeAuditor::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml("[audit]\nrequired = [\"--bg\"]\n").unwrap();
        assert_eq!(config.audit.required, vec!["--bg"]);
        assert_eq!(config.audit.pairs, AuditConfig::default().pairs);
        assert_eq!(config.markers, MarkerConfig::default());
        assert_eq!(config.auditor().required(), ["bg"]);
    }

    #[test]
    fn pairs_parse_as_arrays() {
        let config = Config::from_toml("[audit]\npairs = [[\"fg\", \"bg\"]]\n").unwrap();
        assert_eq!(config.audit.pairs, vec![("fg".to_string(), "bg".to_string())]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("[markers]\nbegin = \"x\"\n").is_err());
    }

    #[test]
    fn flags_override_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[markers]\nstart = \"// from file\"\nend = \"// end\"").unwrap();
        let path = file.path().to_str().unwrap();

        let config = Config::from_cli(&cli(&[
            "prism",
            "--config",
            path,
            "generate",
            "a.css",
            "--start-marker",
            "// from flag",
        ]))
        .unwrap();
        assert_eq!(config.markers.start, "// from flag");
        assert_eq!(config.markers.end, "// end");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = Config::from_cli(&cli(&[
            "prism",
            "--config",
            "/nonexistent/prism.toml",
            "vars",
            "a.css",
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn invalid_file_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "markers = 3").unwrap();
        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn validate_rejects_bad_markers() {
        let mut config = Config::default();
        config.markers.end = config.markers.start.clone();
        assert!(matches!(config.validate(), Err(ConfigError::IdenticalMarkers(_))));

        config.markers.start = "  ".into();
        assert_eq!(config.validate(), Err(ConfigError::EmptyMarker));
    }

    #[test]
    fn validate_rejects_empty_token_names() {
        let mut config = Config::default();
        config.audit.pairs.push(("--".into(), "bg".into()));
        assert_eq!(config.validate(), Err(ConfigError::EmptyTokenName));
    }
}
