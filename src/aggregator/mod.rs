//! Attribution and aggregation of decoded events.
//!
//! This module turns the decoded event stream into per-file aggregates:
//! - Address table tracking code object lifecycles
//! - Location resolution (file identity + location key)
//! - Per-site accumulation with severities
//! - Summary statistics

pub mod accumulator;
pub mod address_table;
pub mod location;
pub mod processor;
pub mod severity;
pub mod summary;

// Re-export main types and functions
pub use accumulator::Accumulator;
pub use address_table::{AddressTable, CodeObject};
pub use location::{full_path_for, normalize_file_identity, Location, LocationResolver, UnattributedPolicy};
pub use processor::LogProcessor;
pub use summary::{summarize, AnalysisSummary, FileSummary, HotSite, SiteKind};
