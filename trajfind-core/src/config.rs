use crate::error::ConfigError;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use trajfind_scanner::GraphScanner;
use trajfind_scanner::scanner::DEFAULT_MARKER_KEY;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_INTERVAL_MS: u64 = 500;
pub const DEFAULT_ROOT_PATH: &str = "hybrid.forms.validations";
pub const DEFAULT_PREFERRED_PATH: &str = ".props.taskResponse.questions";

/// One traversal configuration: where to start and which paths to try first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strategy {
    /// Dotted path to the scan root. Empty means the whole host graph.
    pub root_path: String,
    pub preferred_path_substring: String,
}

impl Strategy {
    pub fn new(root_path: impl Into<String>, preferred_path_substring: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            preferred_path_substring: preferred_path_substring.into(),
        }
    }

    /// Parse `ROOT_PATH=PREFERRED_SUBSTRING`. Either side may be empty.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let (root, preferred) = raw
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidStrategy(raw.to_string()))?;
        Ok(Self::new(root.trim(), preferred.trim()))
    }

    pub fn default_strategies() -> Vec<Strategy> {
        vec![
            Strategy::new(DEFAULT_ROOT_PATH, DEFAULT_PREFERRED_PATH),
            Strategy::new("", DEFAULT_PREFERRED_PATH),
        ]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = if self.root_path.is_empty() {
            "<root>"
        } else {
            &self.root_path
        };
        write!(f, "{} (prefer '{}')", root, self.preferred_path_substring)
    }
}

/// Log verbosity, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    None,
}

impl LogLevel {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            "none" | "off" => Some(LogLevel::None),
            _ => None,
        }
    }

    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::None => LevelFilter::OFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
    pub marker_key: String,
    pub strategies: Vec<Strategy>,
    pub log_level: LogLevel,
    /// Properties deeper than this below a strategy root are not inspected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Abort a scan once this many objects have been visited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<usize>,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval_ms: DEFAULT_INTERVAL_MS,
            marker_key: DEFAULT_MARKER_KEY.to_string(),
            strategies: Strategy::default_strategies(),
            log_level: LogLevel::Debug,
            max_depth: None,
            max_nodes: None,
        }
    }
}

impl LocatorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Scanner honoring the configured marker key and traversal limits.
    pub fn scanner(&self) -> GraphScanner {
        let mut scanner = GraphScanner::with_marker_key(self.marker_key.clone());
        if let Some(depth) = self.max_depth {
            scanner = scanner.with_max_depth(depth);
        }
        if let Some(nodes) = self.max_nodes {
            scanner = scanner.with_max_nodes(nodes);
        }
        scanner
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(self.max_attempts));
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::InvalidInterval(self.interval_ms));
        }
        if self.marker_key.is_empty() {
            return Err(ConfigError::EmptyMarkerKey);
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::NoStrategies);
        }
        Ok(())
    }
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    pub const ENV_PREFIX: &'static str = "TRAJFIND_";

    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. TOML file, when given (missing files are skipped)
    /// 3. Environment variables (`TRAJFIND_*`, `__` separates nested keys)
    pub fn load(path: Option<&Path>) -> Result<LocatorConfig, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(LocatorConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: LocatorConfig = figment
            .merge(Env::prefixed(Self::ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML string, without consulting the environment.
    pub fn load_from_str(toml: &str) -> Result<LocatorConfig, ConfigError> {
        let config: LocatorConfig = Figment::new()
            .merge(Serialized::defaults(LocatorConfig::default()))
            .merge(Toml::string(toml))
            .extract()?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = LocatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.interval(), Duration::from_millis(500));
        assert_eq!(config.marker_key, "questions");
        assert_eq!(config.strategies.len(), 2);
        assert_eq!(config.strategies[0].root_path, "hybrid.forms.validations");
        assert_eq!(config.strategies[1].root_path, "");
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = LocatorConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidMaxAttempts(0))));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = LocatorConfig {
            interval_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidInterval(0))));
    }

    #[test]
    fn test_validate_rejects_empty_marker_and_strategies() {
        let config = LocatorConfig {
            marker_key: String::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::EmptyMarkerKey)));

        let config = LocatorConfig {
            strategies: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoStrategies)));
    }

    #[test]
    fn test_strategy_parse() {
        let strategy = Strategy::parse("a.b=.questions").unwrap();
        assert_eq!(strategy, Strategy::new("a.b", ".questions"));

        let whole_graph = Strategy::parse("=.props.taskResponse.questions").unwrap();
        assert_eq!(whole_graph.root_path, "");

        assert!(matches!(
            Strategy::parse("no-separator"),
            Err(ConfigError::InvalidStrategy(_))
        ));
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(
            Strategy::new("", ".q").to_string(),
            "<root> (prefer '.q')"
        );
    }

    #[test]
    fn test_log_level_ordering_and_parse() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::None);
        assert_eq!(LogLevel::from_str("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::from_str("none"), Some(LogLevel::None));
        assert_eq!(LogLevel::from_str("verbose"), None);
        assert_eq!(LogLevel::None.as_filter(), LevelFilter::OFF);
    }

    #[test]
    fn test_load_from_toml_string() {
        let config = ConfigLoader::load_from_str(
            r#"
            max_attempts = 3
            interval_ms = 10
            log_level = "warn"
            max_depth = 12

            [[strategies]]
            root_path = "app.state"
            preferred_path_substring = ".questions"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.interval_ms, 10);
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.max_depth, Some(12));
        assert_eq!(config.max_nodes, None);
        assert_eq!(config.marker_key, "questions");
        assert_eq!(config.strategies, vec![Strategy::new("app.state", ".questions")]);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let result = ConfigLoader::load_from_str("max_attempts = 0");
        assert!(matches!(result, Err(ConfigError::InvalidMaxAttempts(0))));
    }

    #[test]
    fn test_scanner_honors_limits() {
        let config = LocatorConfig {
            marker_key: "items".to_string(),
            max_depth: Some(1),
            ..Default::default()
        };
        let doc = serde_json::json!({"items": {"deep": {"items": {}}}});
        let found = config.scanner().scan(&&doc).unwrap();

        assert_eq!(config.scanner().marker_key(), "items");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, "items");
    }

    #[test]
    fn test_load_reads_environment() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("trajfind.toml", "max_attempts = 4\ninterval_ms = 20\n")?;
            jail.set_env("TRAJFIND_INTERVAL_MS", "75");
            jail.set_env(
                "TRAJFIND_STRATEGIES",
                r#"[{root_path = "app", preferred_path_substring = ".q"}]"#,
            );

            let config = ConfigLoader::load(Some(Path::new("trajfind.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.max_attempts, 4);
            assert_eq!(config.interval_ms, 75);
            assert_eq!(config.strategies, vec![Strategy::new("app", ".q")]);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_unknown_log_level() {
        let result = ConfigLoader::load_from_str(r#"log_level = "chatty""#);
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
