//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Reads and decodes the V8 log
//! 2. Loads sources for every file found
//! 3. Summarizes the result
//! 4. Writes output files

use super::models::AnalyzeArgs;
use crate::aggregator::summary::AnalysisSummary;
use crate::analysis::{analyze_log_file, AnalysisOptions, AnalysisReport, UnattributedPolicy};
use crate::output::{write_analysis, write_analysis_compact, write_render_data, DefaultSourceLoader};
use anyhow::{Context, Result};
use log::{debug, info};
use std::time::Instant;

/// Largest accepted worker count
const MAX_JOBS: usize = 256;

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// # Arguments
/// * `args` - Analyze command arguments
///
/// # Returns
/// The written report
///
/// # Errors
/// * Log file missing or unreadable
/// * File write errors
pub fn execute_analyze(args: AnalyzeArgs) -> Result<AnalysisReport> {
    let start_time = Instant::now();

    info!("Starting analysis of: {}", args.log_file.display());

    // Steps 1 and 2 both run inside analyze_log_file
    info!("Step 1/4: Processing log records...");
    let options = options_from_args(&args);
    if options.load_sources {
        info!(
            "Step 2/4: Sources will be loaded with {} workers",
            options.source_concurrency
        );
    } else {
        info!("Step 2/4: Skipping source loading (not requested)");
    }

    let loader = DefaultSourceLoader::new();
    let analysis = analyze_log_file(&args.log_file, &loader, &options)
        .with_context(|| format!("Failed to analyze {}", args.log_file.display()))?;

    // Step 3: Summarize
    info!("Step 3/4: Summarizing {} files...", analysis.files.len());
    let report = AnalysisReport::new(analysis, args.log_file.display().to_string());
    info!("Summary: {}", report.summary.summary());

    debug!("Top 3 sites:");
    for (i, site) in report.summary.hot_sites.iter().take(3).enumerate() {
        debug!(
            "  {}. severity {} ({} updates): {} in {}",
            i + 1,
            site.severity,
            site.updates,
            site.location,
            site.file
        );
    }

    // Step 4: Write outputs
    info!("Step 4/4: Writing output files...");
    let written = if args.compact {
        write_analysis_compact(&report, &args.output_json)
    } else {
        write_analysis(&report, &args.output_json)
    };
    written.context("Failed to write analysis JSON")?;

    info!("✓ Analysis written to: {}", args.output_json.display());

    if let Some(render_path) = &args.output_render {
        write_render_data(&report.analysis, render_path).context("Failed to write render data")?;
        info!("✓ Render data written to: {}", render_path.display());
    }

    if args.print_summary {
        print_summary(&report.summary, report.analysis.diagnostics.source_warnings.len());
    }

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    Ok(report)
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.log_file.as_os_str().is_empty() {
        anyhow::bail!("Log file path cannot be empty");
    }

    if args.output_json.as_os_str().is_empty() {
        anyhow::bail!("Output path cannot be empty");
    }

    if args.output_render.as_ref() == Some(&args.output_json) {
        anyhow::bail!("Render output must differ from the JSON output");
    }

    if let Some(jobs) = args.jobs {
        if jobs == 0 {
            anyhow::bail!("jobs must be greater than 0");
        }
        if jobs > MAX_JOBS {
            anyhow::bail!("jobs is too large (max {})", MAX_JOBS);
        }
    }

    Ok(())
}

/// Build analysis options from CLI args
///
/// **Private** - internal helper for execute_analyze
fn options_from_args(args: &AnalyzeArgs) -> AnalysisOptions {
    let defaults = AnalysisOptions::default();
    AnalysisOptions {
        unattributed: if args.discard_unattributed {
            UnattributedPolicy::Discard
        } else {
            defaults.unattributed
        },
        source_concurrency: args.jobs.unwrap_or(defaults.source_concurrency),
        load_sources: !args.no_sources,
    }
}

/// Print a text summary to stdout
///
/// **Private** - the `--summary` output
fn print_summary(summary: &AnalysisSummary, source_warnings: usize) {
    println!("\n{}", "=".repeat(80));
    println!("ANALYSIS SUMMARY");
    println!("{}", "=".repeat(80));
    println!("{}", summary.summary());
    println!();
    for file in &summary.files {
        println!(
            "{:<50} ICs {:>4} ({:>5})  deopts {:>4} ({:>5})  code {:>4}  sev {:?} max {}",
            file.file,
            file.ic_sites,
            file.ic_updates,
            file.deopt_sites,
            file.deopt_updates,
            file.code_sites,
            file.severities,
            file.max_severity
        );
    }
    if !summary.hot_sites.is_empty() {
        println!("\nHottest sites:");
        for site in summary.hot_sites.iter().take(10) {
            println!(
                "  [{}] {:?} {} ({} updates) in {}",
                site.severity, site.kind, site.location, site.updates, site.file
            );
        }
    }
    if source_warnings > 0 {
        println!("\n{} file(s) without source", source_warnings);
    }
    println!("{}", "=".repeat(80));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_args_valid() {
        assert!(validate_args(&AnalyzeArgs::default()).is_ok());
    }

    #[test]
    fn test_validate_args_empty_log() {
        let args = AnalyzeArgs {
            log_file: PathBuf::new(),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_render_same_as_output() {
        let args = AnalyzeArgs {
            output_render: Some(PathBuf::from("analysis.json")),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_jobs_zero() {
        let args = AnalyzeArgs {
            jobs: Some(0),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_jobs_too_large() {
        let args = AnalyzeArgs {
            jobs: Some(MAX_JOBS + 1),
            ..Default::default()
        };
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_options_from_args() {
        let args = AnalyzeArgs {
            no_sources: true,
            discard_unattributed: true,
            jobs: Some(3),
            ..Default::default()
        };
        let options = options_from_args(&args);
        assert!(!options.load_sources);
        assert_eq!(options.unattributed, UnattributedPolicy::Discard);
        assert_eq!(options.source_concurrency, 3);
    }

    #[test]
    fn test_execute_analyze_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("v8.log");
        std::fs::write(
            &log,
            "code-creation,LazyCompile,10,1,0x100,64,f /nowhere/a.js:1:1,0x1,~\n",
        )
        .unwrap();

        let args = AnalyzeArgs {
            log_file: log,
            output_json: dir.path().join("out/analysis.json"),
            output_render: Some(dir.path().join("out/render.json")),
            jobs: Some(1),
            ..Default::default()
        };
        let report = execute_analyze(args).unwrap();

        assert!(dir.path().join("out/analysis.json").exists());
        assert!(dir.path().join("out/render.json").exists());
        assert_eq!(report.analysis.files.len(), 1);
        assert_eq!(report.analysis.diagnostics.source_warnings.len(), 1);
    }
}
