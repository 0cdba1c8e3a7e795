//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Location of the backing files
    #[serde(default)]
    pub data: DataConfig,

    /// Query defaults
    #[serde(default)]
    pub query: QueryConfig,

    /// Log verbosity
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let files = [
            ("data.instructors", &self.data.instructors),
            ("data.textbooks", &self.data.textbooks),
            ("data.reviews", &self.data.reviews),
            ("data.lectures", &self.data.lectures),
            ("data.payments", &self.data.payments),
            ("data.users", &self.data.users),
            ("data.enrollments", &self.data.enrollments),
        ];
        for (key, value) in files {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{key} is empty")));
            }
        }
        if self.query.recent_payments == 0 {
            return Err(AppError::validation("query.recent_payments must be > 0"));
        }
        if !["trace", "debug", "info", "warn", "error", "off"]
            .contains(&self.logging.level.to_lowercase().as_str())
        {
            return Err(AppError::config(format!(
                "unknown logging.level '{}'",
                self.logging.level
            )));
        }
        Ok(())
    }
}

/// Backing file locations. File names resolve against `dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "defaults::data_dir")]
    pub dir: PathBuf,

    #[serde(default = "defaults::instructors")]
    pub instructors: String,

    #[serde(default = "defaults::textbooks")]
    pub textbooks: String,

    #[serde(default = "defaults::reviews")]
    pub reviews: String,

    /// Lecture master file
    #[serde(default = "defaults::lectures")]
    pub lectures: String,

    #[serde(default = "defaults::payments")]
    pub payments: String,

    #[serde(default = "defaults::users")]
    pub users: String,

    /// Per-enrollment schedule overrides
    #[serde(default = "defaults::enrollments")]
    pub enrollments: String,
}

impl DataConfig {
    /// Data directory rooted at `dir`, with the default file names.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    /// Resolve a file name against the data directory.
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: defaults::data_dir(),
            instructors: defaults::instructors(),
            textbooks: defaults::textbooks(),
            reviews: defaults::reviews(),
            lectures: defaults::lectures(),
            payments: defaults::payments(),
            users: defaults::users(),
            enrollments: defaults::enrollments(),
        }
    }
}

/// Query defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Size of the "recent payments" window
    #[serde(default = "defaults::recent_payments")]
    pub recent_payments: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            recent_payments: defaults::recent_payments(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `env_logger` filter level
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn instructors() -> String {
        "instructors.txt".into()
    }
    pub fn textbooks() -> String {
        "textbooks.txt".into()
    }
    pub fn reviews() -> String {
        "reviews.txt".into()
    }
    pub fn lectures() -> String {
        "lectures.txt".into()
    }
    pub fn payments() -> String {
        "payments.txt".into()
    }
    pub fn users() -> String {
        "users.txt".into()
    }
    pub fn enrollments() -> String {
        "enrollments.txt".into()
    }

    pub fn recent_payments() -> usize {
        3
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
