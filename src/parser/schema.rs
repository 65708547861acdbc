//! Output schema definitions for analysis results.
//!
//! This module defines the structure handed back to callers and written
//! to JSON. Field names are camelCase because the consumer is a UI.
//! Maps are insertion-ordered: the first entry is always the first site
//! seen in the log.

use super::events::{BailoutType, CodeKind, IcState, OptimizationState};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Result of analysing one log: one aggregate per file identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub files: IndexMap<String, FileAggregate>,
    pub diagnostics: Diagnostics,
}

impl Analysis {
    /// Aggregate for a file identity
    pub fn file(&self, identity: &str) -> Option<&FileAggregate> {
        self.files.get(identity)
    }
}

/// Everything that happened in one source file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAggregate {
    /// Local path (or URL for remote scripts) the source is loaded from
    pub full_path: String,

    /// Source text, absent until loaded or if loading failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,

    pub ics: IndexMap<String, IcSiteRecord>,
    pub deopts: IndexMap<String, DeoptSiteRecord>,
    pub codes: IndexMap<String, CodeSiteRecord>,

    /// Keys of `ics` in first-seen order
    pub ic_locations: Vec<String>,
    /// Keys of `deopts` in first-seen order
    pub deopt_locations: Vec<String>,
    /// Keys of `codes` in first-seen order
    pub code_locations: Vec<String>,
}

impl FileAggregate {
    pub fn new(full_path: impl Into<String>) -> Self {
        Self {
            full_path: full_path.into(),
            src: None,
            ics: IndexMap::new(),
            deopts: IndexMap::new(),
            codes: IndexMap::new(),
            ic_locations: Vec::new(),
            deopt_locations: Vec::new(),
            code_locations: Vec::new(),
        }
    }

    /// Highest severity over all sites in the file
    pub fn max_severity(&self) -> u8 {
        let ics = self.ics.values().map(|s| s.severity);
        let deopts = self.deopts.values().map(|s| s.severity);
        let codes = self.codes.values().map(|s| s.severity);
        ics.chain(deopts).chain(codes).max().unwrap_or(0)
    }
}

/// All updates observed at one location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteRecord<U> {
    pub file: String,
    pub function_name: String,
    pub line: u32,
    pub column: u32,
    /// Maximum severity over `updates`
    pub severity: u8,
    /// One entry per log event, in log order
    pub updates: Vec<U>,
}

impl<U> SiteRecord<U> {
    pub fn new(file: impl Into<String>, function_name: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            function_name: function_name.into(),
            line,
            column,
            severity: 0,
            updates: Vec::new(),
        }
    }

    /// Append an update, raising the site severity if needed
    pub fn push(&mut self, update: U, severity: u8) {
        self.severity = self.severity.max(severity);
        self.updates.push(update);
    }
}

pub type IcSiteRecord = SiteRecord<IcUpdate>;
pub type DeoptSiteRecord = SiteRecord<DeoptUpdate>;
pub type CodeSiteRecord = SiteRecord<CodeUpdate>;

/// One inline cache transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IcUpdate {
    pub order: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(rename = "type")]
    pub ic_type: String,
    pub old_state: IcState,
    pub new_state: IcState,
    pub map: String,
    pub key: String,
    pub modifier: String,
    pub slow_reason: String,
    pub severity: u8,
}

/// One deoptimization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeoptUpdate {
    pub order: u64,
    pub timestamp: u64,
    pub bailout_type: BailoutType,
    pub deopt_reason: String,
    /// Whether the deopt happened inside an inlined function
    pub inlined: bool,
    pub script_offset: i64,
    pub severity: u8,
}

/// Lifecycle step of a code object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeEvent {
    Created,
    Moved,
    Deleted,
}

/// One code creation, move or deletion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeUpdate {
    pub order: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    pub event: CodeEvent,
    /// Hex address after the change
    pub address: String,
    pub kind: CodeKind,
    pub state: OptimizationState,
    pub severity: u8,
}

/// Counters for everything the pass skipped or degraded
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Non-empty log records seen
    pub records: u64,
    /// Records decoded into events
    pub events: u64,
    /// Records of kinds the analysis doesn't use
    pub ignored: u64,
    /// Records of known kinds with a broken layout
    pub malformed: u64,
    /// First few malformed records, for debugging a log
    #[serde(default)]
    pub malformed_samples: Vec<MalformedRecord>,
    /// IC/deopt events with no code object and no embedded location
    pub unattributed: u64,
    /// Moves/deletes that referenced an unknown address
    pub unresolved_code_events: u64,
    /// Code creations with no script position (builtins, stubs)
    pub unlocated_code: u64,
    /// Files whose source could not be loaded
    #[serde(default)]
    pub source_warnings: Vec<SourceWarning>,
}

/// A record the decoder rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRecord {
    pub order: u64,
    pub reason: String,
}

/// A file whose source text is missing from the result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceWarning {
    pub file: String,
    pub message: String,
}
