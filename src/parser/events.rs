//! Typed events decoded from V8 log records.
//!
//! Every recognized record kind has its own struct; `LogEvent` is the closed
//! set the rest of the pipeline matches on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime address of a code object
pub type Address = u64;

/// A decoded event together with its position in the log
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// 1-based line number of the record, used as emission order
    pub order: u64,
    pub event: LogEvent,
}

/// Closed set of events the analysis understands
#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    CodeCreation(CodeCreation),
    CodeMove(CodeMove),
    CodeDeletion(CodeDeletion),
    IcTransition(IcTransition),
    Deopt(DeoptEvent),
}

/// A location in a script as written in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePosition {
    /// Script path or URL; `None` when the log left it out
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

/// `code-creation` record
#[derive(Debug, Clone, PartialEq)]
pub struct CodeCreation {
    pub timestamp: Option<u64>,
    pub kind: CodeKind,
    pub address: Address,
    pub size: u64,
    pub function_name: String,
    /// Absent for builtins, stubs and other code without a script position
    pub position: Option<SourcePosition>,
    pub state: OptimizationState,
}

/// `code-move` record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeMove {
    pub from: Address,
    pub to: Address,
}

/// `code-delete` record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeDeletion {
    pub address: Address,
}

/// Inline cache transition (`LoadIC`, `KeyedStoreIC`, ...)
#[derive(Debug, Clone, PartialEq)]
pub struct IcTransition {
    pub ic_type: String,
    /// Program counter inside the code object that owns the IC
    pub address: Address,
    pub timestamp: Option<u64>,
    pub line: u32,
    pub column: u32,
    pub old_state: IcState,
    pub new_state: IcState,
    /// Hidden class pointer without the `0x` prefix
    pub map: String,
    pub key: String,
    pub modifier: String,
    pub slow_reason: String,
}

/// `code-deopt` record
#[derive(Debug, Clone, PartialEq)]
pub struct DeoptEvent {
    pub timestamp: u64,
    pub size: u64,
    pub address: Address,
    /// `-1` unless the deopt happened inside an inlined function
    pub inlining_id: i64,
    pub script_offset: i64,
    pub bailout_type: BailoutType,
    pub position: Option<SourcePosition>,
    pub reason: String,
}

/// Code-creation type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CodeKind {
    LazyCompile,
    Function,
    Script,
    Js,
    Eval,
    Builtin,
    BytecodeHandler,
    Handler,
    Stub,
    RegExp,
    Other(String),
}

impl CodeKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "LazyCompile" => Self::LazyCompile,
            "Function" => Self::Function,
            "Script" => Self::Script,
            "JS" => Self::Js,
            "Eval" => Self::Eval,
            "Builtin" => Self::Builtin,
            "BytecodeHandler" => Self::BytecodeHandler,
            "Handler" => Self::Handler,
            "Stub" => Self::Stub,
            "RegExp" => Self::RegExp,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::LazyCompile => "LazyCompile",
            Self::Function => "Function",
            Self::Script => "Script",
            Self::Js => "JS",
            Self::Eval => "Eval",
            Self::Builtin => "Builtin",
            Self::BytecodeHandler => "BytecodeHandler",
            Self::Handler => "Handler",
            Self::Stub => "Stub",
            Self::RegExp => "RegExp",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for CodeKind {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<CodeKind> for String {
    fn from(kind: CodeKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for CodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compilation tier of a code object, from the trailing marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationState {
    /// No marker: builtins and code that was never a candidate for optimizing
    Compiled,
    /// `~` bytecode, not yet optimized
    Interpreted,
    /// `^` baseline (sparkplug)
    Baseline,
    /// `+` mid-tier (maglev)
    Maglev,
    /// `*` fully optimized
    Optimized,
}

impl OptimizationState {
    /// Tier for a marker label
    ///
    /// Only the first character decides the tier; suffixes such as the
    /// `'` on context-specialized code (`*'`, `+'`) are ignored.
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker.chars().next() {
            None => Some(Self::Compiled),
            Some('~') => Some(Self::Interpreted),
            Some('^') => Some(Self::Baseline),
            Some('+') => Some(Self::Maglev),
            Some('*') => Some(Self::Optimized),
            Some(_) => None,
        }
    }
}

/// Inline cache state as logged by `--trace-ic`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IcState {
    Uninitialized,
    Premonomorphic,
    Monomorphic,
    RecomputeHandler,
    Polymorphic,
    Megamorphic,
    Megadom,
    Generic,
    NoFeedback,
    Other(String),
}

impl IcState {
    /// Parse the one-character label the runtime writes
    pub fn from_label(label: &str) -> Self {
        match label {
            "0" => Self::Uninitialized,
            "." => Self::Premonomorphic,
            "1" => Self::Monomorphic,
            "^" => Self::RecomputeHandler,
            "P" => Self::Polymorphic,
            "N" => Self::Megamorphic,
            "D" => Self::Megadom,
            "G" => Self::Generic,
            "X" => Self::NoFeedback,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Premonomorphic => "premonomorphic",
            Self::Monomorphic => "monomorphic",
            Self::RecomputeHandler => "recompute_handler",
            Self::Polymorphic => "polymorphic",
            Self::Megamorphic => "megamorphic",
            Self::Megadom => "megadom",
            Self::Generic => "generic",
            Self::NoFeedback => "no_feedback",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for IcState {
    fn from(value: String) -> Self {
        // Accept both serialized names and raw labels
        match value.as_str() {
            "uninitialized" => Self::Uninitialized,
            "premonomorphic" => Self::Premonomorphic,
            "monomorphic" => Self::Monomorphic,
            "recompute_handler" => Self::RecomputeHandler,
            "polymorphic" => Self::Polymorphic,
            "megamorphic" => Self::Megamorphic,
            "megadom" => Self::Megadom,
            "generic" => Self::Generic,
            "no_feedback" => Self::NoFeedback,
            label => Self::from_label(label),
        }
    }
}

impl From<IcState> for String {
    fn from(state: IcState) -> Self {
        state.name().to_string()
    }
}

impl fmt::Display for IcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deoptimization bailout kind
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BailoutType {
    Eager,
    Lazy,
    Soft,
    Other(String),
}

impl BailoutType {
    /// Parse a bailout label, accepting the `deopt-` prefixed spelling of newer builds
    pub fn from_label(label: &str) -> Self {
        match label.strip_prefix("deopt-").unwrap_or(label) {
            "eager" => Self::Eager,
            "lazy" => Self::Lazy,
            "soft" => Self::Soft,
            _ => Self::Other(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Eager => "eager",
            Self::Lazy => "lazy",
            Self::Soft => "soft",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for BailoutType {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<BailoutType> for String {
    fn from(bailout: BailoutType) -> Self {
        bailout.as_str().to_string()
    }
}

impl fmt::Display for BailoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
