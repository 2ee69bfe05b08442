// CrashSleuth - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "CrashSleuth";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "CrashSleuth";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Segmentation
// =============================================================================

/// Lines with an index below this value that carry no section marker are
/// classified as header lines.
pub const HEADER_LINE_THRESHOLD: usize = 20;

// =============================================================================
// Lookup store
// =============================================================================

/// Default maximum number of cached lookup results (positive and negative).
pub const DEFAULT_LOOKUP_CACHE_CAPACITY: usize = 10_000;

/// Smallest configurable cache capacity. Below this the batch-halving
/// eviction would thrash on every other insert.
pub const MIN_LOOKUP_CACHE_CAPACITY: usize = 16;

/// Hard upper bound on the cache capacity.
pub const MAX_LOOKUP_CACHE_CAPACITY: usize = 1_000_000;

/// Sub-directory of the platform data directory holding FormID databases.
pub const STORE_DIR_NAME: &str = "databases";

/// Suffix of the bundled (shipped) FormID database file name.
/// The full name is `<table> FormIDs Main.db`, e.g. `Fallout4 FormIDs Main.db`.
pub const MAIN_STORE_SUFFIX: &str = "FormIDs Main.db";

/// Suffix of the user-maintained FormID database file name.
pub const LOCAL_STORE_SUFFIX: &str = "FormIDs Local.db";

// =============================================================================
// Crash log discovery
// =============================================================================

/// Maximum directory recursion depth during crash log discovery.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Hard upper bound on max depth (prevents runaway traversal).
pub const ABSOLUTE_MAX_DEPTH: usize = 20;

/// Maximum number of crash logs returned by a single discovery.
pub const DEFAULT_MAX_FILES: usize = 200;

/// Hard upper bound on max files.
pub const ABSOLUTE_MAX_FILES: usize = 5_000;

/// File name patterns written by Buffout 4 and Crash Logger.
pub const DEFAULT_CRASH_LOG_PATTERNS: &[&str] = &["crash-*.log", "crash-*.txt"];

/// `chrono` format of the timestamp embedded in crash log file names
/// (`crash-2024-01-15-14-30-22.log`).
pub const CRASH_FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// File size in bytes at or above which crash logs are memory-mapped.
pub const DEFAULT_LARGE_FILE_THRESHOLD: u64 = 16 * 1024 * 1024; // 16 MB

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";
