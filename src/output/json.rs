//! JSON report output writer.
//!
//! Writes analysis reports to JSON files with proper formatting.

use crate::analysis::AnalysisReport;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Report to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let report = AnalysisReport::new(analysis, "v8.log");
/// write_analysis(&report, "analysis.json")?;
/// ```
pub fn write_analysis(report: &AnalysisReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    write_json(report, output_path.as_ref(), true)
}

/// Write a report as compact JSON (no formatting)
///
/// **Public** - for large logs, where pretty printing doubles the size
pub fn write_analysis_compact(
    report: &AnalysisReport,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    write_json(report, output_path.as_ref(), false)
}

/// Write a report to a string (for testing or in-memory use)
///
/// **Public** - useful for tests and debugging
pub fn analysis_to_string(report: &AnalysisReport) -> Result<String, OutputError> {
    serde_json::to_string_pretty(report).map_err(OutputError::SerializationFailed)
}

/// Serialize any value to a JSON file
///
/// **Public** - shared by the report and render writers
pub fn write_json<T: Serialize + ?Sized>(
    value: &T,
    output_path: &Path,
    pretty: bool,
) -> Result<(), OutputError> {
    info!("Writing JSON to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    let written = if pretty {
        serde_json::to_writer_pretty(&mut writer, value)
    } else {
        serde_json::to_writer(&mut writer, value)
    };
    written.map_err(OutputError::SerializationFailed)?;
    writer.flush().map_err(OutputError::WriteFailed)?;

    info!("JSON written successfully ({} bytes)", calculate_file_size(output_path));

    Ok(())
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a report from a JSON file
///
/// **Public** - used by `validate` and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_analysis(input_path: impl AsRef<Path>) -> Result<AnalysisReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: AnalysisReport =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Report loaded: version {}, {} files",
        report.version,
        report.analysis.files.len()
    );

    Ok(report)
}
