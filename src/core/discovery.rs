// CrashSleuth - core/discovery.rs
//
// Crash log discovery under a directory (typically
// `Documents/My Games/Fallout4/F4SE` or the SKSE equivalent).
//
// Reads only file *metadata*; contents are read by the app layer.
// Per-entry I/O errors are non-fatal and collected as warnings.

use crate::util::constants;
use crate::util::error::DiscoveryError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};

/// Configuration for a discovery operation.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Maximum directory recursion depth.
    pub max_depth: usize,

    /// Maximum number of crash logs to return. The newest are kept.
    pub max_files: usize,

    /// Glob patterns (filename-only) a file must match to be included.
    pub include_patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: constants::DEFAULT_MAX_DEPTH,
            max_files: constants::DEFAULT_MAX_FILES,
            include_patterns: constants::DEFAULT_CRASH_LOG_PATTERNS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// A crash log found on disk.
#[derive(Debug, Clone)]
pub struct DiscoveredLog {
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
    /// Crash time encoded in the file name, when present.
    pub crashed_at: Option<NaiveDateTime>,
}

impl DiscoveredLog {
    /// Sort key: crash time from the file name, falling back to mtime.
    fn sort_time(&self) -> Option<NaiveDateTime> {
        self.crashed_at
            .or_else(|| self.modified.map(|m| m.naive_utc()))
    }
}

/// Parse the timestamp out of `crash-2024-01-15-14-30-22.log`.
pub fn crash_time_from_file_name(file_name: &str) -> Option<NaiveDateTime> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let raw = stem.strip_prefix("crash-")?;
    NaiveDateTime::parse_from_str(raw, constants::CRASH_FILE_TIMESTAMP_FORMAT).ok()
}

/// Discover crash logs under `root`, newest first.
///
/// Returns the logs and a list of non-fatal warnings. Fails only when
/// `root` is missing or not a directory.
pub fn discover_crash_logs(
    root: &Path,
    config: &DiscoveryConfig,
) -> Result<(Vec<DiscoveredLog>, Vec<String>), DiscoveryError> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(DiscoveryError::NotADirectory {
                path: root.to_path_buf(),
            })
        }
        Err(_) => {
            return Err(DiscoveryError::RootNotFound {
                path: root.to_path_buf(),
            })
        }
    }

    let max_files = config.max_files.min(constants::ABSOLUTE_MAX_FILES);
    let max_depth = config.max_depth.min(constants::ABSOLUTE_MAX_DEPTH);
    let include_pats = compile_patterns(&config.include_patterns);

    tracing::debug!(
        root = %root.display(),
        max_depth,
        max_files,
        include = ?config.include_patterns,
        "Crash log discovery starting"
    );

    let mut logs: Vec<DiscoveredLog> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for entry_result in walkdir::WalkDir::new(root)
        .max_depth(max_depth)
        .follow_links(false)
    {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                let err = DiscoveryError::Traversal {
                    path: e.path().map(Path::to_path_buf).unwrap_or_default(),
                    source: e,
                };
                tracing::debug!(warning = %err, "Discovery warning");
                warnings.push(err.to_string());
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            warnings.push(format!("Skipping '{}': non-UTF-8 filename", path.display()));
            continue;
        };

        if !include_pats.iter().any(|p| p.matches(file_name)) {
            tracing::trace!(file = file_name, "Not matched by include patterns");
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                warnings.push(format!("Cannot read metadata for '{}': {e}", path.display()));
                continue;
            }
        };

        logs.push(DiscoveredLog {
            path: path.to_path_buf(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            crashed_at: crash_time_from_file_name(file_name),
        });
    }

    // Newest first; logs with no usable time sort last.
    logs.sort_by(|a, b| b.sort_time().cmp(&a.sort_time()));

    let total_found = logs.len();
    if total_found > max_files {
        logs.truncate(max_files);
        warnings.push(format!(
            "{total_found} crash logs were found but the limit is {max_files}. \
             Only the {max_files} most recent logs are analysed."
        ));
    }

    tracing::debug!(
        total_found,
        kept = logs.len(),
        warnings = warnings.len(),
        "Crash log discovery complete"
    );

    Ok((logs, warnings))
}

/// Compile glob patterns, logging and skipping any that fail.
fn compile_patterns(patterns: &[String]) -> Vec<glob::Pattern> {
    patterns
        .iter()
        .filter_map(|p| match glob::Pattern::new(p) {
            Ok(compiled) => Some(compiled),
            Err(e) => {
                tracing::warn!(pattern = p, error = %e, "Invalid glob pattern, skipping");
                None
            }
        })
        .collect()
}
