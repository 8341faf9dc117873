//! Runtime configuration loaded from TOML.
//!
//! # Invariants
//! - Every field has a default; an empty file yields `HabittaConfig::default()`.
//! - Unknown keys are rejected so typos do not silently fall back.

use crate::engine::generator::DEFAULT_DAILY_CHALLENGE_COUNT;
use crate::logging::{default_log_level, normalize_level};
use crate::model::day::DayBoundary;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_FILE: &str = "habitta.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HabittaConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub log_to_stderr: bool,
    /// How instants map to calendar days.
    pub day_boundary: DayBoundary,
    pub daily_challenge_count: usize,
}

impl Default for HabittaConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            log_to_stderr: false,
            day_boundary: DayBoundary::default(),
            daily_challenge_count: DEFAULT_DAILY_CHALLENGE_COUNT,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config file: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid config `{field}`: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl HabittaConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "db_path",
                reason: "must not be empty".to_string(),
            });
        }
        if normalize_level(&self.log_level).is_none() {
            return Err(ConfigError::Invalid {
                field: "log_level",
                reason: format!(
                    "`{}` is not one of trace|debug|info|warn|error",
                    self.log_level
                ),
            });
        }
        if let Some(dir) = &self.log_dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid {
                    field: "log_dir",
                    reason: format!("`{}` is not an absolute path", dir.display()),
                });
            }
        }
        if !self.day_boundary.is_valid() {
            return Err(ConfigError::Invalid {
                field: "day_boundary",
                reason: "offset must be within 18 hours of UTC".to_string(),
            });
        }
        if self.daily_challenge_count == 0 {
            return Err(ConfigError::Invalid {
                field: "daily_challenge_count",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, HabittaConfig};
    use crate::model::day::DayBoundary;
    use std::io::Write;

    #[test]
    fn empty_document_yields_defaults() {
        let config = HabittaConfig::from_toml_str("").unwrap();
        assert_eq!(config, HabittaConfig::default());
        assert_eq!(config.daily_challenge_count, 3);
        assert_eq!(config.day_boundary, DayBoundary::Local);
    }

    #[test]
    fn parses_fixed_offset_boundary() {
        let config = HabittaConfig::from_toml_str(
            r#"
            db_path = "/tmp/habitta.db"
            log_level = "warn"
            daily_challenge_count = 5

            [day_boundary]
            mode = "fixed_offset"
            minutes = -300
            "#,
        )
        .unwrap();
        assert_eq!(config.day_boundary, DayBoundary::FixedOffset { minutes: -300 });
        assert_eq!(config.daily_challenge_count, 5);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(
            HabittaConfig::from_toml_str("colour = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            HabittaConfig::from_toml_str("daily_challenge_count = 0"),
            Err(ConfigError::Invalid {
                field: "daily_challenge_count",
                ..
            })
        ));
        assert!(matches!(
            HabittaConfig::from_toml_str("log_dir = \"relative/logs\""),
            Err(ConfigError::Invalid { field: "log_dir", .. })
        ));
        assert!(matches!(
            HabittaConfig::from_toml_str("log_level = \"loud\""),
            Err(ConfigError::Invalid { field: "log_level", .. })
        ));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "db_path = \"custom.db\"").unwrap();
        let config = HabittaConfig::load(file.path()).unwrap();
        assert_eq!(config.db_path.to_str(), Some("custom.db"));

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            HabittaConfig::load(missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
