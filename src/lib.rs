//! Deopt Lens
//!
//! Inline-cache and deoptimization analysis for V8 trace logs.
//!
//! Reads a log written by `node --log-ic --log-deopt --log-code` (or the
//! equivalent `d8` flags), attributes every inline-cache transition,
//! deoptimization and code lifecycle event to a source location, and
//! groups them per file in first-seen order.
//!
//! ## Getting Started
//!
//! ```no_run
//! use deopt_lens::analysis::{analyze_log_file, AnalysisOptions};
//! use deopt_lens::output::FsSourceLoader;
//!
//! let analysis = analyze_log_file("v8.log", &FsSourceLoader, &AnalysisOptions::default())?;
//! for (file, aggregate) in &analysis.files {
//!     println!("{}: {} deopt sites", file, aggregate.deopts.len());
//! }
//! # Ok::<(), deopt_lens::utils::AnalysisError>(())
//! ```
//!
//! Most users should use the CLI:
//!
//! ```bash
//! deopt-lens analyze --log v8.log --summary
//! ```

pub mod aggregator;
pub mod analysis;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;

pub use analysis::{analyze_log_file, analyze_log_text, AnalysisOptions, AnalysisReport};
pub use parser::schema::Analysis;
