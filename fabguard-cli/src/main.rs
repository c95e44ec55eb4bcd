//! FabGuard CLI - pre-fabrication checks for routed KiCad boards.

use anyhow::{bail, Context};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use fabguard::{
    CheckId, CheckResult, FabGuardCore, PlacementList, Report, RuleConfig, Severity,
    VerifyOptions,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::level_filters::LevelFilter;

const DEFAULT_BOARD: &str = "hardware/kicad/board.kicad_pcb";
const MAX_ERROR_EXAMPLES: usize = 5;
const MAX_WARNING_EXAMPLES: usize = 10;

#[derive(Parser)]
#[command(name = "fabguard")]
#[command(about = "PCB manufacturability and short-circuit checker", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify a routed .kicad_pcb file
    Check {
        /// Path to the .kicad_pcb file
        #[arg(value_name = "FILE", default_value = DEFAULT_BOARD)]
        file: PathBuf,

        /// JSON rule set (defaults to the JLCPCB 4-layer preset)
        #[arg(long, value_name = "JSON")]
        rules: Option<PathBuf>,

        /// JSON placement list for the component spacing check
        #[arg(long, value_name = "JSON")]
        placements: Option<PathBuf>,

        /// Directory with exported Gerbers to probe for zone fills
        #[arg(long, value_name = "DIR")]
        artifacts: Option<PathBuf>,

        /// Take the board outline and cutouts from the file's Edge.Cuts layer
        #[arg(long)]
        board_outline: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Increase log verbosity (-v info, -vv debug)
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,
    },

    /// List available checks
    Rules {
        /// Show detailed check descriptions
        #[arg(short, long)]
        verbose: bool,

        /// Print the default rule set as JSON
        #[arg(long)]
        preset: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for CI/CD
    Json,
    /// GitHub Actions format
    Github,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            file,
            rules,
            placements,
            artifacts,
            board_outline,
            format,
            verbose,
        } => {
            init_logging(verbose);
            handle_check(
                &file,
                rules.as_deref(),
                placements.as_deref(),
                artifacts,
                board_outline,
                format,
            )
        }
        Commands::Rules { verbose, preset } => handle_rules(verbose, preset).map(|()| 0),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn handle_check(
    file: &Path,
    rules: Option<&Path>,
    placements: Option<&Path>,
    artifacts: Option<PathBuf>,
    board_outline: bool,
    format: OutputFormat,
) -> anyhow::Result<i32> {
    if !file.exists() {
        bail!("{} not found", file.display());
    }

    let rules = match rules {
        Some(path) => RuleConfig::from_file(path)
            .with_context(|| format!("loading rules from {}", path.display()))?,
        None => RuleConfig::jlcpcb_4layer(),
    };
    let placements = placements
        .map(|path| {
            PlacementList::from_file(path)
                .with_context(|| format!("loading placements from {}", path.display()))
        })
        .transpose()?;

    let options = VerifyOptions {
        rules,
        placements,
        artifact_dir: artifacts,
        use_board_outline: board_outline,
        checks: Vec::new(),
    };
    let report = FabGuardCore::verify_file(file, &options)?;

    match format {
        OutputFormat::Human => output_human(&report, file),
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Github => output_github(&report, file),
    }
    Ok(report.exit_code())
}

fn print_examples(messages: &[String], limit: usize) {
    for message in messages.iter().take(limit) {
        println!("         {}", message);
    }
    if messages.len() > limit {
        println!("         ... and {} more", messages.len() - limit);
    }
}

fn output_check(result: &CheckResult) {
    if result.skipped {
        println!("  [SKIP] {}", result.name);
        return;
    }

    let messages: Vec<String> = result.violations.iter().map(|v| v.message.clone()).collect();
    match result.severity {
        Severity::Error => {
            if messages.is_empty() {
                println!("  [PASS] {}", result.name);
            } else {
                println!("  [FAIL ({} errors)] {}", messages.len(), result.name);
                print_examples(&messages, MAX_ERROR_EXAMPLES);
            }
            if let Some(notice) = &result.truncated {
                println!("         {}", notice);
            }
        }
        Severity::Warning => {
            if messages.is_empty() {
                println!("  [PASS] {}", result.name);
            } else {
                println!("  [WARN] {} ({} warnings)", result.name, messages.len());
                print_examples(&messages, MAX_WARNING_EXAMPLES);
            }
        }
    }
}

fn output_human(report: &Report, file: &Path) {
    let rule = "=".repeat(60);
    let summary = &report.summary;

    println!("FabGuard check: {}", file.display());
    println!("Rules: {}", report.rules);
    println!("{}", rule);
    println!(
        "Parsed: {} segments, {} vias, {} nets, {} pads ({} drilled), {} zones, {} filled polygons",
        summary.segments,
        summary.vias,
        summary.nets,
        summary.pads,
        summary.drilled_pads,
        summary.zones,
        summary.filled_polygons
    );
    println!();

    // Errors first, then the warning-only checks.
    for result in report.checks.iter().filter(|c| c.severity == Severity::Error) {
        output_check(result);
    }
    for result in report.checks.iter().filter(|c| c.severity == Severity::Warning) {
        output_check(result);
    }

    println!();
    println!("{}", rule);
    println!(
        "RESULT: {} — {} errors, {} warnings",
        if report.passed { "PASS" } else { "FAIL" },
        report.error_count,
        report.warning_count
    );
}

fn output_github(report: &Report, file: &Path) {
    for result in &report.checks {
        for violation in &result.violations {
            let level = match violation.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            println!(
                "::{} file={},title={}::{}",
                level,
                file.display(),
                result.name,
                violation.message.replace('\n', " ")
            );
        }
    }
    for notice in report.truncations() {
        println!(
            "::notice file={},title={}::{}",
            file.display(),
            notice.check.title(),
            notice
        );
    }
}

fn handle_rules(verbose: bool, preset: bool) -> anyhow::Result<()> {
    if preset {
        println!("{}", RuleConfig::jlcpcb_4layer().to_json()?);
        return Ok(());
    }

    println!("Available checks:\n");
    for id in CheckId::ALL {
        let severity = match id.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("  {} ({})", id.as_str(), severity);
        println!("    {}", id.title());
        if verbose {
            println!("    {}", id.description());
        }
        println!();
    }
    Ok(())
}
