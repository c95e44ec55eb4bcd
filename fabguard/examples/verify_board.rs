//! Example: verify a board with the default JLCPCB rule set.
//! Run with: cargo run --example verify_board [path/to/board.kicad_pcb]

use fabguard::{FabGuardCore, VerifyOptions};
use std::path::Path;

fn main() -> Result<(), fabguard::FabGuardError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "hardware/kicad/board.kicad_pcb".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example verify_board [path/to/board.kicad_pcb]");
        std::process::exit(1);
    }

    let report = FabGuardCore::verify_file(path, &VerifyOptions::default())?;

    println!(
        "{}: {} errors, {} warnings",
        report.file, report.error_count, report.warning_count
    );
    for check in &report.checks {
        let status = if check.skipped {
            "SKIP"
        } else if check.passed() {
            "PASS"
        } else {
            "FAIL"
        };
        println!("  [{}] {}", status, check.name);
    }

    std::process::exit(report.exit_code());
}
