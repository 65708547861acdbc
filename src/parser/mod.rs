//! Log parsing and schema definitions.
//!
//! This module handles:
//! - Splitting a V8 log into records and fields
//! - Decoding records into typed events
//! - Defining the output schema

pub mod decoder;
pub mod events;
pub mod schema;
pub mod tokenizer;

// Re-export main types
pub use decoder::{decode, parse_code_name, Decoded};
pub use events::{
    BailoutType, CodeKind, IcState, LogEvent, OptimizationState, Record, SourcePosition,
};
pub use schema::{Analysis, Diagnostics, FileAggregate, SourceWarning};
