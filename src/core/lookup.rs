// CrashSleuth - core/lookup.rs
//
// FormID lookup store: read-only SQLite databases keyed by game, fronted by
// a bounded in-process cache.
//
// Database layout (one table per file, named after the game):
//   CREATE TABLE "Fallout4" (id INTEGER PRIMARY KEY, plugin TEXT, formid TEXT, entry TEXT);
//   CREATE INDEX ... ON "Fallout4" (formid, plugin COLLATE NOCASE);
//
// The store is an explicit handle owned by the caller. Hosts that analyse
// several logs at once share it behind a `Mutex` (see app::scan).
//
// Failure policy: only `load` reports errors. A query that fails once a
// store is open is logged, cached as "not found", and never propagated.

use crate::core::model::{Game, LookupEntry};
use crate::util::constants;
use crate::util::error::LookupError;
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

// =============================================================================
// Cache
// =============================================================================

/// Cache key: `(game, module, record index)` exactly as queried.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    game: Game,
    module: String,
    record_index: String,
}

impl CacheKey {
    fn new(game: Game, module: &str, record_index: &str) -> Self {
        Self {
            game,
            module: module.to_string(),
            record_index: record_index.to_string(),
        }
    }
}

/// Bounded cache of lookup outcomes. `None` values are cached misses.
///
/// Eviction is batch-halving: when an insert would exceed capacity, the
/// oldest half of the entries (by first insertion) is dropped first.
/// Overwriting an existing key keeps its original position.
#[derive(Debug)]
struct FormIdCache {
    entries: HashMap<CacheKey, Option<LookupEntry>>,
    order: VecDeque<CacheKey>,
    capacity: usize,
}

impl FormIdCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&self, key: &CacheKey) -> Option<&Option<LookupEntry>> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: CacheKey, value: Option<LookupEntry>) {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return;
        }
        if self.entries.len() >= self.capacity {
            self.evict_oldest_half();
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    fn evict_oldest_half(&mut self) {
        let evict = (self.entries.len() / 2).max(1);
        for _ in 0..evict {
            if let Some(key) = self.order.pop_front() {
                self.entries.remove(&key);
            }
        }
        tracing::debug!(
            evicted = evict,
            remaining = self.entries.len(),
            "Lookup cache full, evicted oldest half"
        );
    }

    fn purge_game(&mut self, game: Game) {
        self.entries.retain(|k, _| k.game != game);
        self.order.retain(|k| k.game != game);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// Store
// =============================================================================

/// Handle over the FormID databases of one or more games.
#[derive(Debug)]
pub struct LookupStore {
    connections: HashMap<Game, Connection>,
    cache: FormIdCache,
}

impl Default for LookupStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LookupStore {
    /// Store with the default cache capacity and no open databases.
    pub fn new() -> Self {
        Self::with_cache_capacity(constants::DEFAULT_LOOKUP_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(capacity: usize) -> Self {
        Self {
            connections: HashMap::new(),
            cache: FormIdCache::new(capacity),
        }
    }

    /// Open `path` read-only as the database for `game`, replacing any
    /// database already open for that game.
    ///
    /// The file must contain the game's table with the expected columns;
    /// anything else is rejected as `LookupError::InvalidStore`. Cached
    /// results for `game` are discarded on success.
    pub fn load(&mut self, path: &Path, game: Game) -> Result<(), LookupError> {
        if !path.is_file() {
            return Err(LookupError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| LookupError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        // Preparing the real query validates the file header, the table, and
        // the column names in one step.
        conn.prepare(&lookup_sql(game))
            .map(|_| ())
            .map_err(|source| LookupError::InvalidStore {
                path: path.to_path_buf(),
                table: game.table_name(),
                source,
            })?;

        if self.connections.insert(game, conn).is_some() {
            tracing::debug!(game = %game, "Replaced previously loaded FormID database");
        }
        self.cache.purge_game(game);

        tracing::info!(game = %game, path = %path.display(), "FormID database loaded");
        Ok(())
    }

    /// Try each candidate in order and keep the first one that loads.
    ///
    /// Missing files are skipped quietly; files that exist but fail to open
    /// are logged and skipped. Returns the path that was loaded.
    pub fn load_first_available(&mut self, candidates: &[PathBuf], game: Game) -> Option<PathBuf> {
        for candidate in candidates {
            if !candidate.is_file() {
                tracing::trace!(path = %candidate.display(), "FormID database candidate absent");
                continue;
            }
            match self.load(candidate, game) {
                Ok(()) => return Some(candidate.clone()),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unusable FormID database");
                }
            }
        }
        tracing::debug!(
            game = %game,
            candidates = candidates.len(),
            "No FormID database available"
        );
        None
    }

    /// Whether a database is open for `game`.
    pub fn is_loaded(&self, game: Game) -> bool {
        self.connections.contains_key(&game)
    }

    /// Look up the entry for `record_index` in `module`.
    ///
    /// Returns `None` immediately when no database is open for `game`.
    /// Otherwise the cache is consulted first; misses go to the database and
    /// the outcome, found or not, is cached.
    pub fn lookup(&mut self, record_index: &str, module: &str, game: Game) -> Option<LookupEntry> {
        let conn = self.connections.get(&game)?;

        let key = CacheKey::new(game, module, record_index);
        if let Some(hit) = self.cache.get(&key) {
            return hit.clone();
        }

        let result = query_entry(conn, game, record_index, module);
        self.cache.insert(key, result.clone());
        result
    }

    /// Look up many `(record_index, module)` pairs at once.
    ///
    /// Returns only the pairs that resolve, mapped to their description.
    /// Cached pairs never touch the database; uncached pairs are queried and
    /// cached exactly as `lookup` would.
    pub fn lookup_batch(
        &mut self,
        queries: &[(&str, &str)],
        game: Game,
    ) -> HashMap<(String, String), String> {
        let mut found = HashMap::new();
        let Some(conn) = self.connections.get(&game) else {
            return found;
        };

        let mut queried = 0usize;
        for &(record_index, module) in queries {
            let key = CacheKey::new(game, module, record_index);
            let outcome = match self.cache.get(&key) {
                Some(hit) => hit.clone(),
                None => {
                    queried += 1;
                    let result = query_entry(conn, game, record_index, module);
                    self.cache.insert(key, result.clone());
                    result
                }
            };
            if let Some(entry) = outcome {
                found.insert(
                    (record_index.to_string(), module.to_string()),
                    entry.description,
                );
            }
        }

        tracing::debug!(
            game = %game,
            requested = queries.len(),
            queried,
            found = found.len(),
            "Batch FormID lookup"
        );
        found
    }

    /// Drop all cached results. Open databases stay open.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Close every open database and clear the cache.
    pub fn close(&mut self) {
        for (game, conn) in self.connections.drain() {
            if let Err((_, e)) = conn.close() {
                tracing::warn!(game = %game, error = %e, "Error closing FormID database");
            }
        }
        self.cache.clear();
    }

    /// Number of cached lookup outcomes (hits and misses).
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the outcome for this pair is currently cached.
    pub fn is_cached(&self, record_index: &str, module: &str, game: Game) -> bool {
        self.cache
            .get(&CacheKey::new(game, module, record_index))
            .is_some()
    }
}

fn lookup_sql(game: Game) -> String {
    // Table names come from the `Game` enum, never from input.
    format!(
        "SELECT plugin, formid, entry FROM \"{}\" \
         WHERE formid = ?1 COLLATE NOCASE AND plugin = ?2 COLLATE NOCASE LIMIT 1",
        game.table_name()
    )
}

/// Run the lookup query. Errors are logged and reported as "not found".
fn query_entry(conn: &Connection, game: Game, record_index: &str, module: &str) -> Option<LookupEntry> {
    let result = conn.prepare_cached(&lookup_sql(game)).and_then(|mut stmt| {
        stmt.query_row([record_index, module], |row| {
            Ok(LookupEntry {
                module: row.get(0)?,
                identifier_key: row.get(1)?,
                description: row.get(2)?,
            })
        })
        .optional()
    });

    match result {
        Ok(entry) => entry,
        Err(e) => {
            tracing::warn!(
                game = %game,
                record_index,
                module,
                error = %e,
                "FormID query failed; treating as not found"
            );
            None
        }
    }
}

// =============================================================================
// Store discovery
// =============================================================================

/// Candidate database paths for `game`, in search order: caller-supplied
/// paths first, then the shipped Main database, then the user's Local one.
pub fn store_candidates(game: Game, store_dir: Option<&Path>, custom: &[PathBuf]) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = custom.to_vec();
    if let Some(dir) = store_dir {
        candidates.push(dir.join(game.main_store_file()));
        candidates.push(dir.join(game.local_store_file()));
    }
    candidates
}

/// First candidate that exists as a file.
pub fn find_store(candidates: &[PathBuf]) -> Option<&Path> {
    candidates
        .iter()
        .map(PathBuf::as_path)
        .find(|p| p.is_file())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::model::Game;
    use rusqlite::Connection;
    use std::path::Path;

    /// Create a FormID database at `path` holding `rows` of
    /// `(plugin, formid, entry)`.
    pub fn create_store(path: &Path, game: Game, rows: &[(&str, &str, &str)]) {
        let conn = Connection::open(path).unwrap();
        let table = game.table_name();
        conn.execute_batch(&format!(
            "CREATE TABLE \"{table}\" (id INTEGER PRIMARY KEY AUTOINCREMENT, \
             plugin TEXT NOT NULL, formid TEXT NOT NULL, entry TEXT NOT NULL);
             CREATE INDEX \"{table}_index\" ON \"{table}\" (formid, plugin COLLATE NOCASE);"
        ))
        .unwrap();
        for (plugin, formid, entry) in rows {
            conn.execute(
                &format!("INSERT INTO \"{table}\" (plugin, formid, entry) VALUES (?1, ?2, ?3)"),
                [plugin, formid, entry],
            )
            .unwrap();
        }
    }
}
