// CrashSleuth - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Single-log or directory analysis
// 4. Text, JSON, or CSV output

use clap::Parser;
use crashsleuth::app::scan::{self, CrashReport, FileReport};
use crashsleuth::core::discovery::{self, DiscoveryConfig};
use crashsleuth::core::export;
use crashsleuth::core::lookup::{self, LookupStore};
use crashsleuth::core::model::Game;
use crashsleuth::platform::config::{self, AppConfig, PlatformPaths};
use crashsleuth::util;
use crashsleuth::util::error::{CrashSleuthError, Result};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

/// CrashSleuth - crash log forensics for Fallout 4 and Skyrim.
///
/// Point CrashSleuth at a crash log (or the folder your crash logger writes
/// to) to list the FormIDs found in the call stack, the plugins that own
/// them, and what they are.
#[derive(Parser, Debug)]
#[command(name = "CrashSleuth", version, about)]
struct Cli {
    /// Crash log file, or a directory to search for crash logs.
    path: PathBuf,

    /// Game the crash logs come from: fallout4 or skyrim.
    #[arg(short = 'g', long = "game", default_value = "fallout4")]
    game: Game,

    /// FormID database to try before the default locations (repeatable).
    #[arg(long = "db")]
    db: Vec<PathBuf>,

    /// Skip FormID database lookups.
    #[arg(long = "no-descriptions")]
    no_descriptions: bool,

    /// Disable FormID analysis entirely.
    #[arg(long = "disable")]
    disable: bool,

    /// Print reports as JSON on stdout.
    #[arg(long = "json")]
    json: bool,

    /// Also write the suspect list of a single log to this CSV file.
    #[arg(long = "csv")]
    csv: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let platform_paths = PlatformPaths::resolve();
    let (app_config, config_warnings) = config::load_config(&platform_paths.config_dir);

    util::logging::init(cli.debug, app_config.log_level.as_deref());
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Config warning");
    }

    tracing::info!(
        version = util::constants::APP_VERSION,
        game = %cli.game,
        path = %cli.path.display(),
        "CrashSleuth starting"
    );

    match run(&cli, &app_config, &platform_paths) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "CrashSleuth failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, app_config: &AppConfig, platform_paths: &PlatformPaths) -> Result<ExitCode> {
    let mut options = app_config.analysis_options(cli.game, platform_paths);
    if cli.disable {
        options.enabled = false;
    }
    if cli.no_descriptions {
        options.show_descriptions = false;
    }

    let mut store = LookupStore::with_cache_capacity(app_config.cache_capacity);

    if options.enabled && options.show_descriptions {
        load_requested_stores(&mut store, &cli.db, cli.game);
        if !store.is_loaded(cli.game) {
            match lookup::find_store(&options.store_candidates) {
                Some(db) => tracing::debug!(path = %db.display(), "FormID database found"),
                None => tracing::warn!(
                    candidates = options.store_candidates.len(),
                    "No FormID database found; suspects will be listed without descriptions"
                ),
            }
        }
    }

    if cli.path.is_dir() {
        let discovery_config = DiscoveryConfig {
            max_depth: app_config.max_depth,
            max_files: app_config.max_files,
            ..DiscoveryConfig::default()
        };
        let (logs, warnings) = discovery::discover_crash_logs(&cli.path, &discovery_config)?;
        for warning in &warnings {
            tracing::warn!(warning = %warning, "Discovery warning");
        }
        if cli.csv.is_some() {
            tracing::warn!("--csv applies to a single crash log; ignored for directories");
        }

        let paths: Vec<PathBuf> = logs.into_iter().map(|l| l.path).collect();
        let store = Mutex::new(store);
        let reports = scan::analyze_files(&paths, cli.game, &store, &options);

        if cli.json {
            export::export_json(&reports, std::io::stdout().lock(), Path::new("<stdout>"))?;
            println!();
        } else {
            if reports.is_empty() {
                println!("No crash logs found under '{}'.", cli.path.display());
            }
            for file_report in &reports {
                print_file_report(file_report);
            }
        }

        if reports.iter().any(|r| r.error.is_some()) {
            return Ok(ExitCode::FAILURE);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let report = scan::analyze_file(&cli.path, cli.game, &mut store, &options)?;
    store.close();

    if let Some(ref csv_path) = cli.csv {
        write_csv(csv_path, &report)?;
        tracing::info!(path = %csv_path.display(), "Suspect list exported");
    }

    if cli.json {
        export::export_json(&report, std::io::stdout().lock(), Path::new("<stdout>"))?;
        println!();
    } else {
        print_report(&cli.path, &report);
    }

    Ok(ExitCode::SUCCESS)
}

/// Load the first `--db` path that opens. Each failure is reported once;
/// the default database locations remain the fallback.
fn load_requested_stores(store: &mut LookupStore, requested: &[PathBuf], game: Game) {
    for path in requested {
        match store.load(path, game).map_err(CrashSleuthError::from) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Using requested FormID database");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Requested FormID database unusable");
                eprintln!("Error: {e}");
            }
        }
    }
}

fn write_csv(path: &Path, report: &CrashReport) -> Result<usize> {
    let file = std::fs::File::create(path).map_err(|source| CrashSleuthError::Io {
        path: path.to_path_buf(),
        operation: "create CSV export",
        source,
    })?;
    Ok(export::export_csv(&report.analysis.matches, file, path)?)
}

fn print_file_report(file_report: &FileReport) {
    match (&file_report.report, &file_report.error) {
        (Some(report), _) => print_report(&file_report.path, report),
        (None, Some(error)) => {
            println!("== {}", file_report.path.display());
            println!("  could not be analysed: {error}");
            println!();
        }
        (None, None) => {}
    }
}

fn print_report(path: &Path, report: &CrashReport) {
    println!("== {}", path.display());

    let generator = report
        .generator
        .as_ref()
        .map(|g| g.to_string())
        .unwrap_or_else(|| "unknown generator".to_string());
    let game_version = report.game_version.as_deref().unwrap_or("unknown game version");
    println!(
        "  {generator} | {game_version} | {} lines | {} plugins",
        report.total_lines, report.plugin_count
    );

    let analysis = &report.analysis;
    if analysis.matches.is_empty() {
        println!("  No FormID suspects found in the call stack.");
    } else {
        println!("  FormID suspects (most frequent first):");
        for m in &analysis.matches {
            match &m.description {
                Some(desc) => println!("    - {} | {} | {} | {}", m.form_id, m.plugin, desc, m.count),
                None => println!("    - {} | {} | {}", m.form_id, m.plugin, m.count),
            }
        }
        if !analysis.store_available {
            println!("  (FormID database not available; descriptions omitted)");
        }
    }
    println!();
}
