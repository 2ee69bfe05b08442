// CrashSleuth - platform/config.rs
//
// Platform-specific directory resolution and config.toml loading with
// startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::analyzer::AnalysisOptions;
use crate::core::lookup::store_candidates;
use crate::core::model::Game;
use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for CrashSleuth data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/crashsleuth/ or %APPDATA%\CrashSleuth\config\)
    pub config_dir: PathBuf,

    /// Data directory.
    pub data_dir: PathBuf,

    /// Directory holding the Main/Local FormID databases.
    pub store_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();
            let store_dir = data_dir.join(constants::STORE_DIR_NAME);

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                stores = %store_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
                store_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                store_dir: fallback.join(constants::STORE_DIR_NAME),
                data_dir: fallback,
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[forensics]` section.
    pub forensics: ForensicsSection,
    /// `[discovery]` section.
    pub discovery: DiscoverySection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[forensics]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ForensicsSection {
    /// Run FormID analysis at all.
    pub enabled: Option<bool>,
    /// Look up FormID descriptions in the database.
    pub show_descriptions: Option<bool>,
    /// Extra database files, searched before the Main/Local databases.
    pub custom_store_paths: Option<Vec<String>>,
    /// Maximum number of cached lookup results.
    pub cache_capacity: Option<usize>,
}

/// `[discovery]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// Maximum directory recursion depth.
    pub max_depth: Option<usize>,
    /// Maximum crash logs analysed per directory.
    pub max_files: Option<usize>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Forensics --
    pub analysis_enabled: bool,
    pub show_descriptions: bool,
    pub custom_store_paths: Vec<PathBuf>,
    pub cache_capacity: usize,

    // -- Discovery --
    pub max_depth: usize,
    pub max_files: usize,

    // -- Logging --
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis_enabled: true,
            show_descriptions: true,
            custom_store_paths: Vec::new(),
            cache_capacity: constants::DEFAULT_LOOKUP_CACHE_CAPACITY,
            max_depth: constants::DEFAULT_MAX_DEPTH,
            max_files: constants::DEFAULT_MAX_FILES,
            log_level: None,
        }
    }
}

impl AppConfig {
    /// Analyzer options for `game`: the forensics switches plus database
    /// candidates (custom paths, then Main, then Local).
    pub fn analysis_options(&self, game: Game, paths: &PlatformPaths) -> AnalysisOptions {
        AnalysisOptions {
            enabled: self.analysis_enabled,
            show_descriptions: self.show_descriptions,
            store_candidates: store_candidates(
                game,
                Some(&paths.store_dir),
                &self.custom_store_paths,
            ),
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unparseable, returns defaults with one warning.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path.clone(),
                source,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            return (AppConfig::default(), vec![msg]);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path.clone(),
                source,
            };
            let msg = format!("{err}. Using defaults.");
            tracing::warn!("{}", msg);
            return (AppConfig::default(), vec![msg]);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    validate(raw)
}

/// Validate each field against named constants, accumulating all warnings.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Forensics --
    if let Some(enabled) = raw.forensics.enabled {
        config.analysis_enabled = enabled;
    }
    if let Some(show) = raw.forensics.show_descriptions {
        config.show_descriptions = show;
    }
    if let Some(paths) = raw.forensics.custom_store_paths {
        config.custom_store_paths = paths
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .collect();
    }
    if let Some(capacity) = raw.forensics.cache_capacity {
        if (constants::MIN_LOOKUP_CACHE_CAPACITY..=constants::MAX_LOOKUP_CACHE_CAPACITY)
            .contains(&capacity)
        {
            config.cache_capacity = capacity;
        } else {
            warnings.push(out_of_range(
                "[forensics] cache_capacity",
                capacity,
                format!(
                    "{}-{}",
                    constants::MIN_LOOKUP_CACHE_CAPACITY,
                    constants::MAX_LOOKUP_CACHE_CAPACITY
                ),
                constants::DEFAULT_LOOKUP_CACHE_CAPACITY,
            ));
        }
    }

    // -- Discovery: max_depth --
    if let Some(depth) = raw.discovery.max_depth {
        if (1..=constants::ABSOLUTE_MAX_DEPTH).contains(&depth) {
            config.max_depth = depth;
        } else {
            warnings.push(out_of_range(
                "[discovery] max_depth",
                depth,
                format!("1-{}", constants::ABSOLUTE_MAX_DEPTH),
                constants::DEFAULT_MAX_DEPTH,
            ));
        }
    }

    // -- Discovery: max_files --
    if let Some(files) = raw.discovery.max_files {
        if (1..=constants::ABSOLUTE_MAX_FILES).contains(&files) {
            config.max_files = files;
        } else {
            warnings.push(out_of_range(
                "[discovery] max_files",
                files,
                format!("1-{}", constants::ABSOLUTE_MAX_FILES),
                constants::DEFAULT_MAX_FILES,
            ));
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.to_lowercase());
        } else {
            warnings.push(out_of_range(
                "[logging] level",
                level,
                valid.join(", "),
                constants::DEFAULT_LOG_LEVEL,
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

/// Render a rejected value as a warning that names the fallback.
fn out_of_range(
    field: &str,
    value: impl std::fmt::Display,
    expected: String,
    default: impl std::fmt::Display,
) -> String {
    let err = ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    };
    format!("{err}. Using default ({default}).")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty());
        assert!(config.analysis_enabled);
        assert!(config.show_descriptions);
        assert_eq!(config.cache_capacity, constants::DEFAULT_LOOKUP_CACHE_CAPACITY);
    }

    #[test]
    fn test_valid_config_is_applied() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(constants::CONFIG_FILE_NAME),
            r#"
[forensics]
enabled = true
show_descriptions = false
custom_store_paths = ["D:/Mods/FormIDs.db", ""]
cache_capacity = 500

[discovery]
max_files = 10

[logging]
level = "DEBUG"
"#,
        )
        .unwrap();

        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert!(!config.show_descriptions);
        assert_eq!(config.custom_store_paths, vec![PathBuf::from("D:/Mods/FormIDs.db")]);
        assert_eq!(config.cache_capacity, 500);
        assert_eq!(config.max_files, 10);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_out_of_range_values_warn_and_fall_back() {
        let raw: RawConfig = toml::from_str(
            r#"
[forensics]
cache_capacity = 2
[discovery]
max_depth = 0
[logging]
level = "loud"
"#,
        )
        .unwrap();
        let (config, warnings) = validate(raw);
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("[forensics] cache_capacity' = '2'"));
        assert!(warnings[0].ends_with("Using default (10000)."));
        assert!(warnings[1].contains("Expected: 1-20"));
        assert!(warnings[2].contains("'loud'"));
        assert_eq!(config.cache_capacity, constants::DEFAULT_LOOKUP_CACHE_CAPACITY);
        assert_eq!(config.max_depth, constants::DEFAULT_MAX_DEPTH);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_unparseable_config_warns() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(constants::CONFIG_FILE_NAME), "[forensics\nenabled=").unwrap();
        let (config, warnings) = load_config(dir.path());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].starts_with("Config parse error"));
        assert!(warnings[0].ends_with("Using defaults."));
        assert!(config.analysis_enabled);
    }

    #[test]
    fn test_analysis_options_candidate_order() {
        let config = AppConfig {
            custom_store_paths: vec![PathBuf::from("/mods/custom.db")],
            show_descriptions: false,
            ..AppConfig::default()
        };
        let paths = PlatformPaths {
            config_dir: PathBuf::from("/cfg"),
            data_dir: PathBuf::from("/data"),
            store_dir: PathBuf::from("/data/databases"),
        };
        let options = config.analysis_options(Game::Fallout4, &paths);
        assert!(options.enabled);
        assert!(!options.show_descriptions);
        assert_eq!(
            options.store_candidates,
            vec![
                PathBuf::from("/mods/custom.db"),
                PathBuf::from("/data/databases/Fallout4 FormIDs Main.db"),
                PathBuf::from("/data/databases/Fallout4 FormIDs Local.db"),
            ]
        );
    }
}
