//! Example: running selected checks against a JSON rule set without FabGuardCore.
//! Run with: cargo run --example custom_rules <board.kicad_pcb> <rules.json>

use fabguard::{parse_board, CheckContext, CheckEngine, CheckId, RuleConfig, Severity};
use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let (Some(board_path), Some(rules_path)) = (args.next(), args.next()) else {
        eprintln!("Usage: cargo run --example custom_rules <board.kicad_pcb> <rules.json>");
        std::process::exit(1);
    };

    let board = parse_board(Path::new(&board_path))?;
    let rules = RuleConfig::from_file(Path::new(&rules_path))?;

    let engine = CheckEngine::with_checks(&[
        CheckId::TraceWidth,
        CheckId::TraceSpacing,
        CheckId::ViaDimensions,
        CheckId::TraceShorts,
    ]);
    let results = engine.run(&CheckContext::new(&board, &rules));

    println!("{} against '{}'", board_path, rules.name);
    let mut errors = 0;
    for result in &results {
        println!("  {}: {} violations", result.name, result.violations.len());
        for violation in &result.violations {
            println!("    [{:?}] {}", violation.severity, violation.message);
            if violation.severity == Severity::Error {
                errors += 1;
            }
        }
    }

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
