// CrashSleuth - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.
//
// Note what is NOT here: query failures inside the lookup store and text that
// does not fit a grammar never become errors. Those map to data-level signals
// (`store_available`, a missing description, an empty match list).

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all CrashSleuth operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum CrashSleuthError {
    /// A FormID lookup store could not be loaded.
    Lookup(LookupError),

    /// Crash log discovery failed.
    Discovery(DiscoveryError),

    /// Export operation failed.
    Export(ExportError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for CrashSleuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lookup(e) => write!(f, "Lookup store error: {e}"),
            Self::Discovery(e) => write!(f, "Discovery error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for CrashSleuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lookup(e) => Some(e),
            Self::Discovery(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookup store errors
// ---------------------------------------------------------------------------

/// Errors raised when a caller explicitly asks to load a FormID database.
#[derive(Debug)]
pub enum LookupError {
    /// The database file does not exist.
    NotFound { path: PathBuf },

    /// SQLite refused to open the file.
    Open {
        path: PathBuf,
        source: rusqlite::Error,
    },

    /// The file opened but does not contain the expected game table.
    InvalidStore {
        path: PathBuf,
        table: &'static str,
        source: rusqlite::Error,
    },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "FormID database '{}' does not exist", path.display())
            }
            Self::Open { path, source } => {
                write!(
                    f,
                    "Cannot open FormID database '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidStore {
                path,
                table,
                source,
            } => write!(
                f,
                "'{}' is not a valid FormID database (table '{table}'): {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LookupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } => Some(source),
            Self::InvalidStore { source, .. } => Some(source),
            Self::NotFound { .. } => None,
        }
    }
}

impl From<LookupError> for CrashSleuthError {
    fn from(e: LookupError) -> Self {
        Self::Lookup(e)
    }
}

// ---------------------------------------------------------------------------
// Discovery errors
// ---------------------------------------------------------------------------

/// Errors related to crash log discovery.
#[derive(Debug)]
pub enum DiscoveryError {
    /// The root scan path does not exist or is not accessible.
    RootNotFound { path: PathBuf },

    /// The root path is not a directory.
    NotADirectory { path: PathBuf },

    /// Walkdir traversal error (wraps individual file/dir access failures).
    Traversal {
        path: PathBuf,
        source: walkdir::Error,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { path } => {
                write!(f, "Scan path '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "Scan path '{}' is not a directory", path.display())
            }
            Self::Traversal { path, source } => {
                write!(f, "Error traversing '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for DiscoveryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Traversal { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<DiscoveryError> for CrashSleuthError {
    fn from(e: DiscoveryError) -> Self {
        Self::Discovery(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<ExportError> for CrashSleuthError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
///
/// Config problems are never fatal: `load_config` renders them into its
/// warning list and falls back to defaults.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// A game tag other than `fallout4` or `skyrim` was supplied.
    UnknownGame { tag: String },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::UnknownGame { tag } => write!(
                f,
                "Unknown game '{tag}'. Expected \"fallout4\" or \"skyrim\"."
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for CrashSleuth results.
pub type Result<T> = std::result::Result<T, CrashSleuthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_lookup_error_converts_and_keeps_source() {
        let err: CrashSleuthError = LookupError::Open {
            path: PathBuf::from("x.db"),
            source: rusqlite::Error::InvalidQuery,
        }
        .into();
        assert!(err.to_string().starts_with("Lookup store error:"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_discovery_error_converts() {
        let err: CrashSleuthError = DiscoveryError::RootNotFound {
            path: PathBuf::from("/missing/Buffout4"),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Discovery error: Scan path '/missing/Buffout4' does not exist"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_unknown_game_message_names_tag() {
        let err = ConfigError::UnknownGame {
            tag: "starfield".to_string(),
        };
        assert!(err.to_string().contains("starfield"));
        assert!(err.source().is_none());
    }
}
