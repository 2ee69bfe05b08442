// CrashSleuth - app/scan.rs
//
// Crash log analysis orchestration: read → segment → load order →
// forensic analysis, for one log or a batch.
//
// Architecture:
//   - Reading, segmenting, and load-order parsing are per-log and run in
//     parallel under rayon for batches.
//   - The `LookupStore` is shared state (open connections + cache). Batches
//     share one store behind a `Mutex`, held only for the analysis step.
//   - Per-file failures are recorded in the file's report; a batch never
//     aborts because one log is unreadable.

use crate::core::analyzer::{self, AnalysisOptions};
use crate::core::load_order::parse_load_order;
use crate::core::lookup::LookupStore;
use crate::core::model::{
    AnalysisResult, Game, GeneratorInfo, LoadOrderTable, SegmentKind, SegmentedLog,
};
use crate::core::segmenter::segment_log;
use crate::platform::fs::read_crash_log;
use crate::util::constants;
use crate::util::error::CrashSleuthError;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

/// Everything learned from one crash log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator: Option<GeneratorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,
    pub total_lines: usize,
    /// Number of entries in the crash log's plugin list.
    pub plugin_count: usize,
    pub analysis: AnalysisResult,
}

/// Outcome of analysing one file in a batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<CrashReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Segments and load order of a log, computed without touching the store.
struct Prepared<'a> {
    log: SegmentedLog<'a>,
    call_stack: Vec<&'a str>,
    table: LoadOrderTable,
}

fn prepare(text: &str, game: Game) -> Prepared<'_> {
    let log = segment_log(text, game);
    let call_stack = log.call_stack_lines();
    let table = parse_load_order(log.first(SegmentKind::LoadOrder));
    Prepared {
        log,
        call_stack,
        table,
    }
}

fn finish(prepared: Prepared<'_>, mut analysis: AnalysisResult) -> CrashReport {
    analysis.generator_name = prepared.log.generator.as_ref().map(|g| g.name.clone());
    CrashReport {
        generator: prepared.log.generator,
        game_version: prepared.log.game_version,
        total_lines: prepared.log.total_lines,
        plugin_count: prepared.table.total,
        analysis,
    }
}

/// Analyse crash log text already in memory.
pub fn analyze_crash_log(
    text: &str,
    game: Game,
    store: &mut LookupStore,
    options: &AnalysisOptions,
) -> CrashReport {
    let prepared = prepare(text, game);
    let analysis = analyzer::analyze(&prepared.call_stack, &prepared.table, game, store, options);
    finish(prepared, analysis)
}

/// Read and analyse one crash log file.
pub fn analyze_file(
    path: &Path,
    game: Game,
    store: &mut LookupStore,
    options: &AnalysisOptions,
) -> Result<CrashReport, CrashSleuthError> {
    let text = read_log(path)?;
    let report = analyze_crash_log(&text, game, store, options);
    tracing::info!(
        file = %path.display(),
        suspects = report.analysis.matches.len(),
        store_available = report.analysis.store_available,
        "Crash log analysed"
    );
    Ok(report)
}

/// Analyse many crash logs in parallel, sharing one lookup store.
///
/// Reports come back in the same order as `paths`.
pub fn analyze_files(
    paths: &[PathBuf],
    game: Game,
    store: &Mutex<LookupStore>,
    options: &AnalysisOptions,
) -> Vec<FileReport> {
    let started = Instant::now();

    let reports: Vec<FileReport> = paths
        .par_iter()
        .map(|path| {
            let text = match read_log(path) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable crash log");
                    return FileReport {
                        path: path.clone(),
                        report: None,
                        error: Some(e.to_string()),
                    };
                }
            };

            let prepared = prepare(&text, game);
            let analysis = {
                let mut guard = store.lock().unwrap_or_else(|p| p.into_inner());
                analyzer::analyze(&prepared.call_stack, &prepared.table, game, &mut guard, options)
            };

            FileReport {
                path: path.clone(),
                report: Some(finish(prepared, analysis)),
                error: None,
            }
        })
        .collect();

    tracing::info!(
        files = paths.len(),
        failed = reports.iter().filter(|r| r.error.is_some()).count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Batch analysis complete"
    );
    reports
}

fn read_log(path: &Path) -> Result<String, CrashSleuthError> {
    read_crash_log(path, constants::DEFAULT_LARGE_FILE_THRESHOLD).map_err(|source| {
        CrashSleuthError::Io {
            path: path.to_path_buf(),
            operation: "read crash log",
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lookup::test_support::create_store;
    use tempfile::TempDir;

    const LOG: &str = "Fallout 4 v1.10.163\n\
                       Buffout 4 v1.26.2\n\
                       \n\
                       Unhandled exception \"EXCEPTION_ACCESS_VIOLATION\" at 0x7FF6A1B2C3D4\n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       \n\
                       PROBABLE CALL STACK:\n\
                       \t[0] 0x7FF6A1B2C3D4 Fallout4.exe+0D3C3D4\n\
                       \t\tFormID: 0x000EAFB6\n\
                       \t\tFormID: 0x01001234\n\
                       \t\tFormID: 0x000EAFB6\n\
                       REGISTERS:\n\
                       \tRAX 0x0 (size_t) [0]\n\
                       \t\tFormID: 0x02000001\n\
                       PLUGINS:\n\
                       \t[00]     Fallout4.esm\n\
                       \t[01]     DLCRobot.esm\n";

    #[test]
    fn test_analyze_crash_log_end_to_end() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("store.db");
        create_store(&db, Game::Fallout4, &[("Fallout4.esm", "0EAFB6", "GhoulRace")]);
        let mut store = LookupStore::new();
        let options = AnalysisOptions {
            store_candidates: vec![db],
            ..AnalysisOptions::default()
        };

        let report = analyze_crash_log(LOG, Game::Fallout4, &mut store, &options);

        assert_eq!(report.plugin_count, 2);
        assert_eq!(report.game_version.as_deref(), Some("Fallout 4 v1.10.163"));
        assert_eq!(report.analysis.generator_name.as_deref(), Some("Buffout 4"));
        assert!(report.analysis.store_available);
        // The FormID under REGISTERS is not part of the call stack.
        let ids: Vec<&str> = report
            .analysis
            .matches
            .iter()
            .map(|m| m.form_id.as_str())
            .collect();
        assert_eq!(ids, vec!["000EAFB6", "01001234"]);
        assert_eq!(report.analysis.matches[0].count, 2);
        assert_eq!(report.analysis.matches[0].description.as_deref(), Some("GhoulRace"));
        assert_eq!(report.analysis.matches[1].plugin, "DLCRobot.esm");
    }

    #[test]
    fn test_analyze_files_keeps_order_and_reports_failures() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("crash-2024-01-01-00-00-00.log");
        std::fs::write(&good, LOG).unwrap();
        let missing = dir.path().join("crash-2024-01-02-00-00-00.log");

        let store = Mutex::new(LookupStore::new());
        let reports = analyze_files(
            &[missing.clone(), good.clone()],
            Game::Fallout4,
            &store,
            &AnalysisOptions::default(),
        );

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].path, missing);
        assert!(reports[0].error.is_some());
        assert!(reports[0].report.is_none());
        assert_eq!(reports[1].path, good);
        let report = reports[1].report.as_ref().unwrap();
        assert_eq!(report.analysis.matches.len(), 2);
        assert!(!report.analysis.store_available);
    }
}
