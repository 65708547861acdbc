use std::path::PathBuf;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// V8 log to analyse
    pub log_file: PathBuf,

    /// Output path for the JSON report
    pub output_json: PathBuf,

    /// Also write the ordered render form here
    pub output_render: Option<PathBuf>,

    /// Write the report without pretty printing
    pub compact: bool,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Skip loading script sources
    pub no_sources: bool,

    /// Drop unattributed events instead of bucketing them
    pub discard_unattributed: bool,

    /// Source loading workers (None = available parallelism, capped)
    pub jobs: Option<usize>,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("v8.log"),
            output_json: PathBuf::from("analysis.json"),
            output_render: None,
            compact: false,
            print_summary: false,
            no_sources: false,
            discard_unattributed: false,
            jobs: None,
        }
    }
}
