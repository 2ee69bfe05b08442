// CrashSleuth - core/analyzer.rs
//
// Forensic pipeline: extract FormIDs from the call stack, count them,
// resolve their owning plugins, attach database descriptions, and rank.
//
// Nothing in here returns an error. A missing or broken database lowers
// `store_available`; a failed lookup leaves `description` empty.

use crate::core::formid::{count_occurrences, extract_form_ids, plugin_index_to_hex};
use crate::core::load_order::resolve_module;
use crate::core::lookup::LookupStore;
use crate::core::model::{AnalysisResult, Game, LoadOrderTable, SuspectMatch};
use std::collections::HashSet;
use std::path::PathBuf;

/// Caller-controlled switches for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// When false the pipeline returns an empty result immediately.
    pub enabled: bool,
    /// Look up descriptions in the FormID database.
    pub show_descriptions: bool,
    /// Database files tried in order when none is open for the game yet.
    pub store_candidates: Vec<PathBuf>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            show_descriptions: true,
            store_candidates: Vec::new(),
        }
    }
}

/// Run the forensic pipeline over `call_stack` lines.
pub fn analyze<L: AsRef<str>>(
    call_stack: &[L],
    table: &LoadOrderTable,
    game: Game,
    store: &mut LookupStore,
    options: &AnalysisOptions,
) -> AnalysisResult {
    if !options.enabled {
        tracing::debug!("FormID analysis disabled");
        return AnalysisResult::default();
    }

    let ids = extract_form_ids(call_stack);
    if ids.is_empty() {
        tracing::debug!("No FormIDs in call stack");
        return AnalysisResult::default();
    }

    let counts = count_occurrences(&ids);

    let store_available = if store.is_loaded(game) {
        true
    } else if options.show_descriptions {
        store
            .load_first_available(&options.store_candidates, game)
            .is_some()
    } else {
        false
    };

    let mut seen: HashSet<&str> = HashSet::new();
    let mut matches: Vec<SuspectMatch> = Vec::with_capacity(counts.len());

    for id in &ids {
        if !seen.insert(id.full_hex.as_str()) {
            continue;
        }

        let resolved = resolve_module(id, table);
        let description = match resolved {
            Some(module) if store_available && options.show_descriptions => store
                .lookup(&id.record_index, module, game)
                .map(|entry| entry.description),
            _ => None,
        };

        matches.push(SuspectMatch {
            form_id: id.full_hex.clone(),
            plugin: resolved
                .map(str::to_string)
                .unwrap_or_else(|| format!("Unknown [{}]", plugin_index_to_hex(id.module_index))),
            description,
            count: counts.get(&id.full_hex).copied().unwrap_or(1),
        });
    }

    // Stable: equal counts keep first-appearance order.
    matches.sort_by(|a, b| b.count.cmp(&a.count));

    tracing::debug!(
        game = %game,
        form_ids = ids.len(),
        distinct = matches.len(),
        described = matches.iter().filter(|m| m.description.is_some()).count(),
        store_available,
        "FormID analysis complete"
    );

    AnalysisResult {
        matches,
        store_available,
        generator_name: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::load_order::parse_load_order;
    use crate::core::lookup::test_support::create_store;
    use crate::core::model::{Segment, SegmentKind};
    use tempfile::TempDir;

    fn table(lines: &[&str]) -> LoadOrderTable {
        let mut all = vec!["PLUGINS:"];
        all.extend_from_slice(lines);
        parse_load_order(Some(&Segment {
            kind: SegmentKind::LoadOrder,
            start_line: 0,
            lines: all,
        }))
    }

    fn store_with_ghoul(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("Fallout4 FormIDs Main.db");
        create_store(&path, Game::Fallout4, &[("Fallout4.esm", "0EAFB6", "GhoulRace")]);
        path
    }

    #[test]
    fn test_resolves_and_describes() {
        let dir = TempDir::new().unwrap();
        let path = store_with_ghoul(&dir);
        let mut store = LookupStore::new();
        store.load(&path, Game::Fallout4).unwrap();

        let result = analyze(
            &["FormID: 0x000EAFB6"],
            &table(&["[00]     Fallout4.esm"]),
            Game::Fallout4,
            &mut store,
            &AnalysisOptions::default(),
        );

        assert!(result.store_available);
        assert_eq!(
            result.matches,
            vec![SuspectMatch {
                form_id: "000EAFB6".to_string(),
                plugin: "Fallout4.esm".to_string(),
                description: Some("GhoulRace".to_string()),
                count: 1,
            }]
        );
    }

    #[test]
    fn test_unknown_plugin_label_and_ff_filtered() {
        let mut store = LookupStore::new();
        let result = analyze(
            &["FormID: 0xFF123456", "FormID: 0x0A001234", "FormID: 0xFF000001"],
            &LoadOrderTable::default(),
            Game::Fallout4,
            &mut store,
            &AnalysisOptions::default(),
        );
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].plugin, "Unknown [0A]");
        assert!(result.matches[0].description.is_none());
    }

    #[test]
    fn test_null_form_id_counted() {
        let mut store = LookupStore::new();
        let result = analyze(
            &["FormID: 0x00000000", "FormID: 0xFF000000", "FormID: 0x00000000"],
            &LoadOrderTable::default(),
            Game::Fallout4,
            &mut store,
            &AnalysisOptions::default(),
        );
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].form_id, "00000000");
        assert_eq!(result.matches[0].count, 2);
    }

    #[test]
    fn test_sorted_by_count_descending() {
        let mut store = LookupStore::new();
        let result = analyze(
            &[
                "FormID: 0x01000001",
                "FormID: 0x02000002",
                "FormID: 0x02000002",
                "FormID: 0x03000003",
                "FormID: 0x02000002",
                "FormID: 0x03000003",
            ],
            &LoadOrderTable::default(),
            Game::Fallout4,
            &mut store,
            &AnalysisOptions::default(),
        );
        let counts: Vec<usize> = result.matches.iter().map(|m| m.count).collect();
        assert_eq!(counts, vec![3, 2, 1]);
        assert_eq!(result.matches[0].form_id, "02000002");
    }

    #[test]
    fn test_disabled_returns_empty() {
        let mut store = LookupStore::new();
        let options = AnalysisOptions {
            enabled: false,
            ..AnalysisOptions::default()
        };
        let result = analyze(
            &["FormID: 0x000EAFB6"],
            &LoadOrderTable::default(),
            Game::Fallout4,
            &mut store,
            &options,
        );
        assert_eq!(result, AnalysisResult::default());
        assert!(!result.store_available);
    }

    #[test]
    fn test_no_form_ids_returns_empty() {
        let mut store = LookupStore::new();
        let result = analyze(
            &["[0] 0x7FF6A1B2C3D4 Fallout4.exe+0D3C3D4"],
            &LoadOrderTable::default(),
            Game::Fallout4,
            &mut store,
            &AnalysisOptions::default(),
        );
        assert!(result.matches.is_empty());
    }

    #[test]
    fn test_store_opened_from_candidates() {
        let dir = TempDir::new().unwrap();
        let path = store_with_ghoul(&dir);
        let mut store = LookupStore::new();
        let options = AnalysisOptions {
            store_candidates: vec![dir.path().join("missing.db"), path],
            ..AnalysisOptions::default()
        };
        let result = analyze(
            &["FormID: 0x000EAFB6"],
            &table(&["[00] Fallout4.esm"]),
            Game::Fallout4,
            &mut store,
            &options,
        );
        assert!(result.store_available);
        assert_eq!(result.matches[0].description.as_deref(), Some("GhoulRace"));
        assert!(store.is_loaded(Game::Fallout4));
    }

    #[test]
    fn test_no_store_reachable_keeps_plugins() {
        let dir = TempDir::new().unwrap();
        let mut store = LookupStore::new();
        let options = AnalysisOptions {
            store_candidates: vec![dir.path().join("nope.db")],
            ..AnalysisOptions::default()
        };
        let result = analyze(
            &["FormID: 0x000EAFB6"],
            &table(&["[00] Fallout4.esm"]),
            Game::Fallout4,
            &mut store,
            &options,
        );
        assert!(!result.store_available);
        assert_eq!(result.matches[0].plugin, "Fallout4.esm");
        assert!(result.matches[0].description.is_none());
    }

    #[test]
    fn test_descriptions_off_skips_store_discovery() {
        let dir = TempDir::new().unwrap();
        let path = store_with_ghoul(&dir);
        let mut store = LookupStore::new();
        let options = AnalysisOptions {
            show_descriptions: false,
            store_candidates: vec![path],
            ..AnalysisOptions::default()
        };
        let result = analyze(
            &["FormID: 0x000EAFB6"],
            &table(&["[00] Fallout4.esm"]),
            Game::Fallout4,
            &mut store,
            &options,
        );
        assert!(!result.store_available);
        assert!(!store.is_loaded(Game::Fallout4));
        assert!(result.matches[0].description.is_none());
    }

    #[test]
    fn test_light_plugin_form_id_stays_unknown() {
        let mut store = LookupStore::new();
        let result = analyze(
            &["FormID: 0xFE01C800"],
            &table(&["[FE:01C] Light.esl"]),
            Game::Fallout4,
            &mut store,
            &AnalysisOptions::default(),
        );
        assert_eq!(result.matches[0].plugin, "Unknown [FE]");
    }
}
