//! Library entry points: analyse a log from text or from a file.

use crate::aggregator::processor::LogProcessor;
use crate::aggregator::summary::{summarize, AnalysisSummary};
use crate::output::assembler::assemble;
use crate::output::sources::SourceLoader;
use crate::parser::schema::Analysis;
use crate::utils::config::{DEFAULT_SOURCE_CONCURRENCY, SCHEMA_VERSION};
use crate::utils::error::AnalysisError;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

pub use crate::aggregator::location::UnattributedPolicy;

/// Number of hot sites kept in a report summary
const REPORT_HOT_SITES: usize = 20;

/// Runtime options for one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Where IC/deopt events without a location go
    pub unattributed: UnattributedPolicy,
    /// Worker threads for source loading
    pub source_concurrency: usize,
    /// Attach source text to every file
    pub load_sources: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            unattributed: UnattributedPolicy::default(),
            source_concurrency: default_source_concurrency(),
            load_sources: true,
        }
    }
}

/// Available parallelism, capped
pub fn default_source_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(DEFAULT_SOURCE_CONCURRENCY)
}

/// Analyse log text that is already in memory
///
/// **Public** - main library entry point
///
/// # Arguments
/// * `text` - Full V8 log
/// * `loader` - Source loader for the files found in the log
/// * `options` - Analysis options
///
/// # Returns
/// The analysis. Malformed records and failed source loads are reported
/// in `diagnostics`, never as errors.
pub fn analyze_log_text<L>(text: &str, loader: &L, options: &AnalysisOptions) -> Analysis
where
    L: SourceLoader + ?Sized,
{
    let start_time = Instant::now();

    let mut processor = LogProcessor::new(options.unattributed.clone());
    processor.process_text(text);
    let (files, diagnostics) = processor.finish();

    info!(
        "Processed {} records into {} files ({} malformed, {} unattributed)",
        diagnostics.records,
        files.len(),
        diagnostics.malformed,
        diagnostics.unattributed
    );

    let analysis = assemble(files, diagnostics, loader, options);
    debug!("Analysis finished in {:.2}s", start_time.elapsed().as_secs_f64());
    analysis
}

/// Analyse a log file
///
/// **Public** - convenience wrapper around [`analyze_log_text`]
///
/// # Errors
/// * `AnalysisError::LogRead` - The log is missing or unreadable
pub fn analyze_log_file<L>(
    path: impl AsRef<Path>,
    loader: &L,
    options: &AnalysisOptions,
) -> Result<Analysis, AnalysisError>
where
    L: SourceLoader + ?Sized,
{
    let path = path.as_ref();
    info!("Reading log: {}", path.display());

    let text = std::fs::read_to_string(path).map_err(|source| AnalysisError::LogRead {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(analyze_log_text(&text, loader, options))
}

/// An analysis as written to disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    /// Schema version
    pub version: String,
    /// Log the analysis was made from
    pub log_file: String,
    /// RFC 3339 timestamp
    pub generated_at: String,
    pub summary: AnalysisSummary,
    pub analysis: Analysis,
}

impl AnalysisReport {
    pub fn new(analysis: Analysis, log_file: impl Into<String>) -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            log_file: log_file.into(),
            generated_at: Utc::now().to_rfc3339(),
            summary: summarize(&analysis, REPORT_HOT_SITES),
            analysis,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::SourceError;

    fn no_sources(_: &str) -> Result<String, SourceError> {
        Ok(String::new())
    }

    #[test]
    fn test_default_options() {
        let options = AnalysisOptions::default();
        assert!(options.load_sources);
        assert!(options.source_concurrency >= 1);
        assert!(options.source_concurrency <= DEFAULT_SOURCE_CONCURRENCY);
    }

    #[test]
    fn test_missing_log_is_fatal() {
        let result = analyze_log_file("/no/such/v8.log", &no_sources, &AnalysisOptions::default());
        assert!(matches!(result, Err(AnalysisError::LogRead { .. })));
    }

    #[test]
    fn test_empty_log() {
        let analysis = analyze_log_text("", &no_sources, &AnalysisOptions::default());
        assert!(analysis.files.is_empty());
        assert_eq!(analysis.diagnostics.records, 0);
    }

    #[test]
    fn test_report_carries_version() {
        let report = AnalysisReport::new(Analysis::default(), "v8.log");
        assert_eq!(report.version, SCHEMA_VERSION);
        assert_eq!(report.log_file, "v8.log");
        assert!(chrono::DateTime::parse_from_rfc3339(&report.generated_at).is_ok());
    }
}
