//! Engine configuration
//!
//! Selects the scoring policy and session seed strategy, holds the feedback
//! thresholds and the storage locations.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a layered resolution:
//! 1. An explicit path (the CLI's `--config`), if it exists
//! 2. The override in the data dir (~/.local/share/weekwise/config/weekwise.toml)
//! 3. Embedded defaults (compiled into binary)
//!
//! Every key is optional; whatever a file leaves out keeps its default.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::feedback::FeedbackThresholds;
use crate::scoring::ScoringPolicy;
use crate::session::SeedStrategy;

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/weekwise.toml");

/// Where the configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::Embedded => write!(f, "embedded defaults"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Storage locations for the record store
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    /// Wide-format history tables, loaded in order
    pub history: Vec<PathBuf>,
    /// Long-format weekly log (read on open, rewritten on submit)
    pub log: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history: vec![PathBuf::from("data/weekly_history.csv")],
            log: PathBuf::from("data/weekly_log.csv"),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub scoring: ScoringPolicy,
    pub seed: SeedStrategy,
    pub feedback: FeedbackThresholds,
    pub storage: StorageConfig,
    pub source: ConfigSource,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scoring: ScoringPolicy::default(),
            seed: SeedStrategy::default(),
            feedback: FeedbackThresholds::default(),
            storage: StorageConfig::default(),
            source: ConfigSource::Embedded,
        }
    }
}

impl Config {
    /// Load configuration (explicit path, then override, then embedded)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if path.exists() {
                return Self::from_file(path);
            }
            warn!(path = %path.display(), "Config file not found, using defaults");
        } else if let Some(path) = default_config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        parse_config(DEFAULT_CONFIG, None, ConfigSource::Embedded)
    }

    /// Load from a specific file
    ///
    /// Relative storage paths resolve against the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let base = path.parent().map(Path::to_path_buf);
        parse_config(
            &content,
            base.as_deref(),
            ConfigSource::File(path.to_path_buf()),
        )
    }

    /// Parse TOML text without touching the filesystem
    pub fn from_toml_str(content: &str) -> Result<Self> {
        parse_config(content, None, ConfigSource::Embedded)
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("weekwise").join("config").join("weekwise.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    scoring: Option<RawScoring>,
    session: Option<RawSession>,
    feedback: Option<RawFeedback>,
    storage: Option<RawStorage>,
}

#[derive(Debug, Deserialize)]
struct RawScoring {
    policy: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSession {
    seed: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFeedback {
    high_spend_threshold: Option<f64>,
    nudge_threshold: Option<f64>,
    food_income_ratio: Option<f64>,
    entertainment_limit: Option<f64>,
    technology_limit: Option<f64>,
    under_budget_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawStorage {
    history: Option<Vec<PathBuf>>,
    log: Option<PathBuf>,
}

/// Parse config from TOML content
fn parse_config(content: &str, base: Option<&Path>, source: ConfigSource) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = Config {
        source,
        ..Config::default()
    };

    if let Some(policy) = raw.scoring.and_then(|s| s.policy) {
        config.scoring = policy.parse().map_err(Error::Config)?;
    }

    if let Some(seed) = raw.session.and_then(|s| s.seed) {
        config.seed = seed.parse().map_err(Error::Config)?;
    }

    if let Some(feedback) = raw.feedback {
        let t = &mut config.feedback;
        if let Some(v) = feedback.high_spend_threshold {
            t.high_spend_threshold = v;
        }
        if let Some(v) = feedback.nudge_threshold {
            t.nudge_threshold = v;
        }
        if let Some(v) = feedback.food_income_ratio {
            t.food_income_ratio = v;
        }
        if let Some(v) = feedback.entertainment_limit {
            t.entertainment_limit = v;
        }
        if let Some(v) = feedback.technology_limit {
            t.technology_limit = v;
        }
        if let Some(v) = feedback.under_budget_ratio {
            t.under_budget_ratio = v;
        }
    }

    if let Some(storage) = raw.storage {
        if let Some(history) = storage.history {
            config.storage.history = history;
        }
        if let Some(log) = storage.log {
            config.storage.log = log;
        }
    }

    if let Some(base) = base {
        config.storage.history = config
            .storage
            .history
            .iter()
            .map(|p| resolve(base, p))
            .collect();
        config.storage.log = resolve(base, &config.storage.log);
    }

    debug!(
        source = %config.source,
        policy = config.scoring.as_str(),
        seed = config.seed.as_str(),
        "Configuration loaded"
    );
    Ok(config)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_default_config() {
        let config = parse_config(DEFAULT_CONFIG, None, ConfigSource::Embedded).unwrap();
        assert_eq!(config.scoring, ScoringPolicy::BalanceWeighted);
        assert_eq!(config.seed, SeedStrategy::Averages);
        assert_eq!(config.feedback, FeedbackThresholds::default());
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [scoring]
            policy = "aid_and_buffer_weighted"

            [feedback]
            nudge_threshold = 900.0
            "#,
        )
        .unwrap();

        assert_eq!(config.scoring, ScoringPolicy::AidAndBufferWeighted);
        assert_eq!(config.seed, SeedStrategy::Averages);
        assert_eq!(config.feedback.nudge_threshold, 900.0);
        assert_eq!(config.feedback.high_spend_threshold, 1000.0);
    }

    #[test]
    fn test_empty_config_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_policy_is_error() {
        let err = Config::from_toml_str("[scoring]\npolicy = \"vibes\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(Config::from_toml_str("[scoring").is_err());
    }

    #[test]
    fn test_file_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weekwise.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[session]\nseed = \"latest_week\"\n[storage]\nhistory = [\"a.csv\", \"/abs/b.csv\"]\nlog = \"log.csv\""
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.source, ConfigSource::File(path.clone()));
        assert_eq!(config.seed, SeedStrategy::LatestWeek);
        assert_eq!(
            config.storage.history,
            vec![dir.path().join("a.csv"), PathBuf::from("/abs/b.csv")]
        );
        assert_eq!(config.storage.log, dir.path().join("log.csv"));
    }

    #[test]
    fn test_missing_explicit_file_falls_back_to_embedded() {
        let config = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap();
        assert_eq!(config.source, ConfigSource::Embedded);
    }
}
