//! Attribute events to a file identity and a location key.
//!
//! A location key is `"<functionName>:<line>:<column>"` and is only unique
//! within one file. File identities are normalized so the same script
//! always produces the same string: grouping is by exact equality.

use super::address_table::CodeObject;
use crate::parser::events::{DeoptEvent, IcTransition, SourcePosition};
use crate::utils::config::UNATTRIBUTED_FILE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A resolved place in a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: String,
    pub key: String,
    pub function_name: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<String>, function_name: impl Into<String>, line: u32, column: u32) -> Self {
        let function_name = function_name.into();
        Self {
            file: file.into(),
            key: location_key(&function_name, line, column),
            function_name,
            line,
            column,
        }
    }
}

/// What to do with IC/deopt events that can't be tied to a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnattributedPolicy {
    /// File them under a sentinel file identity
    Bucket { file: String },
    /// Drop them; they are still counted in the diagnostics
    Discard,
}

impl Default for UnattributedPolicy {
    fn default() -> Self {
        Self::Bucket {
            file: UNATTRIBUTED_FILE.to_string(),
        }
    }
}

impl UnattributedPolicy {
    /// Location for an unattributed event under this policy
    pub fn location(&self, function_name: &str, line: u32, column: u32) -> Option<Location> {
        match self {
            Self::Bucket { file } => Some(Location::new(file.clone(), function_name, line, column)),
            Self::Discard => None,
        }
    }

    /// The sentinel file identity, if bucketing
    pub fn sentinel(&self) -> Option<&str> {
        match self {
            Self::Bucket { file } => Some(file),
            Self::Discard => None,
        }
    }
}

/// Build the grouping key for a site
pub fn location_key(function_name: &str, line: u32, column: u32) -> String {
    format!("{}:{}:{}", function_name, line, column)
}

/// Resolves events to locations
///
/// Holds the one piece of state the log grammar needs: the file of the
/// most recent code creation that named one, for creations that omit it
/// (several inline scripts of the same HTML page).
#[derive(Debug, Default)]
pub struct LocationResolver {
    last_script: Option<String>,
}

impl LocationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// File identity for a code creation position
    ///
    /// **Public** - called for every code creation, in log order
    ///
    /// A position naming a file updates the "last script"; a position
    /// without a file inherits it. Code without a position gets no file.
    pub fn script_for(&mut self, position: Option<&SourcePosition>) -> Option<String> {
        let position = position?;
        match &position.file {
            Some(raw) => {
                let identity = normalize_file_identity(raw);
                self.last_script = Some(identity.clone());
                Some(identity)
            }
            None => self.last_script.clone(),
        }
    }

    /// Location of a code object's own definition
    pub fn resolve_code(&self, code: &CodeObject) -> Option<Location> {
        let file = code.file.as_ref()?;
        Some(Location::new(
            file.clone(),
            code.function_name.clone(),
            code.line?,
            code.column?,
        ))
    }

    /// Location of an inline cache transition
    ///
    /// The function and file come from the owning code object, the
    /// line/column from the IC record itself.
    pub fn resolve_ic(&self, ic: &IcTransition, code: Option<&CodeObject>) -> Option<Location> {
        let code = code?;
        let file = code.file.as_ref()?;
        Some(Location::new(
            file.clone(),
            code.function_name.clone(),
            ic.line,
            ic.column,
        ))
    }

    /// Location of a deoptimization
    ///
    /// The position embedded in the record wins over the code object's
    /// own location: a deopt inside an inlined function points at the
    /// inlined source, possibly in another file.
    pub fn resolve_deopt(&self, deopt: &DeoptEvent, code: Option<&CodeObject>) -> Option<Location> {
        let function_name = code.map(|c| c.function_name.clone()).unwrap_or_default();

        if let Some(position) = &deopt.position {
            let file = position
                .file
                .as_deref()
                .map(normalize_file_identity)
                .or_else(|| code.and_then(|c| c.file.clone()))?;
            return Some(Location::new(file, function_name, position.line, position.column));
        }

        code.and_then(|c| self.resolve_code(c))
    }
}

/// Normalize a script path or URL into a stable file identity
///
/// **Public** - every grouping lookup goes through this
///
/// Backslashes become forward slashes and local `file:` URLs are written
/// as `file:///<path>`, with a `localhost` authority dropped. `file:` URLs
/// naming another host and all other URLs are kept as they are.
///
/// # Example
/// ```
/// use deopt_lens::aggregator::location::normalize_file_identity;
///
/// assert_eq!(normalize_file_identity("C:\\src\\a.js"), "C:/src/a.js");
/// assert_eq!(normalize_file_identity("file://///tmp/a.html"), "file:///tmp/a.html");
/// assert_eq!(normalize_file_identity("file://localhost/tmp/a.js"), "file:///tmp/a.js");
/// ```
pub fn normalize_file_identity(raw: &str) -> String {
    let slashed = raw.trim().replace('\\', "/");
    match slashed.get(..5) {
        Some(scheme) if scheme.eq_ignore_ascii_case("file:") => normalize_file_url(&slashed[5..]),
        _ => slashed,
    }
}

/// Normalize what follows `file:`
fn normalize_file_url(rest: &str) -> String {
    let has_authority = rest
        .strip_prefix("//")
        .is_some_and(|after| !after.is_empty() && !after.starts_with('/'));

    if has_authority {
        if let Ok(url) = url::Url::parse(&format!("file:{}", rest)) {
            return match url.host_str() {
                None | Some("") => format!("file://{}", url.path()),
                Some(host) if host.eq_ignore_ascii_case("localhost") => {
                    format!("file://{}", url.path())
                }
                Some(_) => format!("file:{}", rest),
            };
        }
    }

    format!("file:///{}", rest.trim_start_matches('/'))
}

/// Where to load the source for a file identity from
///
/// **Public** - used when creating a file aggregate
///
/// `file:` URLs become local paths (percent-decoded, drive letters
/// handled by the platform); everything else is returned unchanged.
pub fn full_path_for(identity: &str) -> String {
    if !identity.starts_with("file:") {
        return identity.to_string();
    }

    url::Url::parse(identity)
        .ok()
        .and_then(|url| url.to_file_path().ok())
        .map(|path: PathBuf| path.to_string_lossy().into_owned())
        .unwrap_or_else(|| identity.to_string())
}

/// Whether a file identity is a remote URL
pub fn is_remote(identity: &str) -> bool {
    identity.starts_with("http://") || identity.starts_with("https://")
}
