mod commands;
mod logging;
mod progress;

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::sync::atomic::Ordering;

use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use dotenv::dotenv;
use progress::CliReporter;
use report_dedupe_core::analysis::retention::select_retention;
use report_dedupe_core::storage::import::load_reports_json;
use report_dedupe_core::storage::SqliteReportStore;
use report_dedupe_core::{AppConfig, CleanupEngine, CleanupResult, ScanResult};
use tracing::{error, info, warn};

/// Exit status when cleanup ran but left duplicates behind (failed or cancelled deletes).
const EXIT_INCOMPLETE: i32 = 2;

fn main() {
    dotenv().ok();

    let guard = logging::init_logger();

    let config = match report_dedupe_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    if let Err(err) = config.validate() {
        error!("{}", err);
        process::exit(1);
    }

    let args = Cli::parse();

    let outcome = match args.command {
        Some(Commands::Import { path }) => run_import(&config, &path).map(|()| 0),
        Some(Commands::Scan) => run_scan(&config).map(|()| 0),
        Some(Commands::Cleanup { yes }) => run_cleanup(&config, yes),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
            Ok(0)
        }
        None => Cli::command().print_long_help().map(|()| 0).map_err(Into::into),
    };

    let code = match outcome {
        Ok(code) => code,
        Err(err) => {
            error!("Error: {}", err);
            1
        }
    };
    if code != 0 {
        // Flush the file log before exiting
        drop(guard);
        process::exit(code);
    }
}

fn open_engine(config: &AppConfig) -> Result<CleanupEngine<SqliteReportStore>, Box<dyn std::error::Error>> {
    let store = SqliteReportStore::open(&config.db_path)?;
    Ok(CleanupEngine::from_config(store, config))
}

fn run_import(config: &AppConfig, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let reports = load_reports_json(path)?;
    let store = SqliteReportStore::open(&config.db_path)?;
    let written = store.insert_reports(&config.owner_id, &reports)?;
    info!(
        "Imported {} reports for owner '{}'",
        format!("{}", written).green(),
        config.owner_id,
    );
    Ok(())
}

fn run_scan(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine(config)?;
    let result = engine.scan(&CliReporter::new())?;
    print_groups(&result);
    Ok(())
}

/// Returns the process exit status: 0 when every duplicate was removed.
fn run_cleanup(config: &AppConfig, assume_yes: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let engine = open_engine(config)?;
    let reporter = CliReporter::new();

    // Always act on a fresh scan
    let scan = engine.scan(&reporter)?;
    print_groups(&scan);
    if scan.groups.is_empty() {
        return Ok(0);
    }

    if !assume_yes {
        let prompt = format!(
            "Delete {} duplicate reports and keep {}?",
            scan.removal_count(),
            scan.group_count()
        );
        let stdin = io::stdin();
        if !confirm(&prompt, &mut stdin.lock(), &mut io::stdout())? {
            info!("Cleanup aborted");
            return Ok(0);
        }
    }

    // Ctrl-C stops the run after the batch in flight settles
    let cancel = engine.cancel_token();
    ctrlc::set_handler(move || {
        cancel.store(true, Ordering::Relaxed);
    })?;

    let result = engine.cleanup(&scan.groups, &reporter)?;

    println!();
    info!(
        "{} kept, {} deleted, {} failed",
        format!("{}", result.kept_count).cyan(),
        format!("{}", result.deleted_count).green(),
        format!("{}", result.failed_count).red(),
    );
    if result.cancelled {
        warn!("Cleanup cancelled, {} deletions not attempted", result.skipped_count);
    }
    for id in &result.failed_ids {
        warn!("Not deleted: {}", id);
    }
    let code = cleanup_exit_status(&result);
    if code != 0 {
        info!("Run cleanup again to retry the remaining duplicates");
    }
    Ok(code)
}

fn cleanup_exit_status(result: &CleanupResult) -> i32 {
    if result.failed_count > 0 || result.cancelled {
        EXIT_INCOMPLETE
    } else {
        0
    }
}

fn print_groups(result: &ScanResult) {
    println!();
    info!(
        "{} duplicate groups, {} reports to remove out of {}",
        format!("{}", result.group_count()).red(),
        format!("{}", result.removal_count()).red(),
        result.total_reports,
    );

    for group in &result.groups {
        let Some(decision) = select_retention(group) else {
            continue;
        };
        println!(
            "{} {} copies",
            group.fingerprint().to_string().yellow(),
            group.len()
        );
        println!(
            "    keep   {} ({}) {}",
            decision.keep.id.green(),
            decision.keep.created_at.to_rfc3339(),
            decision.keep.title
        );
        for removed in decision.remove {
            println!(
                "    remove {} ({}) {}",
                removed.id.red(),
                removed.created_at.to_rfc3339(),
                removed.title
            );
        }
    }
}

/// Anything but `y`/`yes` (case-insensitive), including end of input, declines.
fn confirm<R: BufRead, W: Write>(prompt: &str, input: &mut R, output: &mut W) -> io::Result<bool> {
    write!(output, "{} [y/N] ", prompt)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
