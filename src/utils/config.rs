//! Configuration and constants for log analysis.

use std::time::Duration;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// File identity used for events that cannot be tied to a script
pub const UNATTRIBUTED_FILE: &str = "<unattributed>";

/// Upper bound on worker threads used for source loading
pub const DEFAULT_SOURCE_CONCURRENCY: usize = 8;

/// Timeout for fetching scripts served over http(s)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// How many malformed records are kept verbatim for diagnostics
pub const MAX_MALFORMED_SAMPLES: usize = 16;

// Record tags emitted by the V8 logger
pub const TAG_CODE_CREATION: &str = "code-creation";
pub const TAG_CODE_MOVE: &str = "code-move";
pub const TAG_CODE_DELETE: &str = "code-delete";
pub const TAG_CODE_DEOPT: &str = "code-deopt";

/// Suffix shared by every inline-cache record tag (LoadIC, KeyedStoreIC, ...)
pub const IC_TAG_SUFFIX: &str = "IC";

