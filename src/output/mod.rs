//! Result assembly and output writers.
//!
//! This module handles:
//! - Loading source text for every analysed file
//! - JSON reports (pretty and compact)
//! - The ordered render form consumed by the viewer

pub mod assembler;
pub mod json;
pub mod render;
pub mod sources;

// Re-export main functions
pub use assembler::assemble;
pub use json::{analysis_to_string, read_analysis, write_analysis, write_analysis_compact};
pub use render::{to_render_data, write_render_data, RenderData, RenderFile};
pub use sources::{DefaultSourceLoader, FsSourceLoader, HttpSourceLoader, SourceLoader};
