use crate::output::read_analysis;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Validate an analysis JSON file
pub fn validate_analysis_file(file_path: PathBuf) -> Result<()> {
    println!("Validating analysis: {}", file_path.display());

    let report = read_analysis(&file_path)
        .with_context(|| format!("Not a valid analysis file: {}", file_path.display()))?;

    if report.version != SCHEMA_VERSION {
        log::warn!(
            "Schema version {} differs from current {}",
            report.version,
            SCHEMA_VERSION
        );
    }

    let diagnostics = &report.analysis.diagnostics;
    println!("✓ Valid analysis JSON");
    println!("  Version: {}", report.version);
    println!("  Log: {}", report.log_file);
    println!("  Generated: {}", report.generated_at);
    println!("  Files: {}", report.analysis.files.len());
    println!("  Records: {} ({} malformed)", diagnostics.records, diagnostics.malformed);
    println!("  Unattributed events: {}", diagnostics.unattributed);
    println!("  {}", report.summary.summary());

    Ok(())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Deopt Lens Analysis Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Schema Structure:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  logFile: string            - Analysed V8 log");
        println!("  generatedAt: string        - RFC 3339 timestamp");
        println!("  summary: object            - Per-file counts and hottest sites");
        println!("  analysis: object");
        println!("    files: object            - Keyed by file identity, first-seen order");
        println!("      fullPath: string       - Path or URL the source came from");
        println!("      src: string?           - Source text, if it could be loaded");
        println!("      ics: object            - IC sites keyed by 'function:line:column'");
        println!("      deopts: object         - Deopt sites, same keys");
        println!("      codes: object          - Code object sites, same keys");
        println!("      icLocations: array     - Keys of ics in first-seen order");
        println!("      deoptLocations: array  - Keys of deopts in first-seen order");
        println!("      codeLocations: array   - Keys of codes in first-seen order");
        println!("    diagnostics: object      - Record counters and source warnings");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Deopt Lens v{}", env!("CARGO_PKG_VERSION"));
    println!("Analysis Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Inline-cache and deoptimization analysis for V8 trace logs.");
}
