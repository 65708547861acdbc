//! Decode tokenized V8 log records into typed events.
//!
//! Decoding is pure: it looks at one record at a time and never consults
//! the address table, so it can be tested record by record. Anything that
//! isn't one of the recognized kinds comes back as `Decoded::Ignored`, and
//! recognized kinds with a broken layout come back as `Decoded::Malformed`.

use super::events::{
    Address, BailoutType, CodeCreation, CodeDeletion, CodeKind, CodeMove, DeoptEvent, IcState,
    IcTransition, LogEvent, OptimizationState, Record, SourcePosition,
};
use super::tokenizer::split_fields;
use crate::utils::config::{
    IC_TAG_SUFFIX, TAG_CODE_CREATION, TAG_CODE_DELETE, TAG_CODE_DEOPT, TAG_CODE_MOVE,
};
use log::debug;

/// Outcome of decoding a single record
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Event(Record),
    /// A record kind the analysis has no use for (ticks, heap stats, ...)
    Ignored { order: u64, tag: String },
    /// A recognized kind whose fields don't fit the expected layout
    Malformed { order: u64, reason: String },
}

/// Decode one log record
///
/// **Public** - main entry point for decoding
///
/// # Arguments
/// * `order` - Position of the record in the log (1-based line number)
/// * `record` - Raw record text without the line terminator
///
/// # Returns
/// The decoded event, or an explicit ignored/malformed marker
pub fn decode(order: u64, record: &str) -> Decoded {
    let fields = split_fields(record);
    let tag = fields[0].as_str();

    let result = match tag {
        TAG_CODE_CREATION => decode_code_creation(&fields).map(LogEvent::CodeCreation),
        TAG_CODE_MOVE => decode_code_move(&fields).map(LogEvent::CodeMove),
        TAG_CODE_DELETE => decode_code_delete(&fields).map(LogEvent::CodeDeletion),
        TAG_CODE_DEOPT => decode_deopt(&fields).map(LogEvent::Deopt),
        _ if is_ic_tag(tag) => decode_ic(&fields).map(LogEvent::IcTransition),
        _ => {
            return Decoded::Ignored {
                order,
                tag: tag.to_string(),
            }
        }
    };

    match result {
        Ok(event) => Decoded::Event(Record { order, event }),
        Err(reason) => Decoded::Malformed {
            order,
            reason: format!("{}: {}", tag, reason),
        },
    }
}

/// Whether a tag names an inline cache record (`LoadIC`, `KeyedStoreIC`, ...)
fn is_ic_tag(tag: &str) -> bool {
    tag.len() > IC_TAG_SUFFIX.len()
        && tag.ends_with(IC_TAG_SUFFIX)
        && tag.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Decode `code-creation`
///
/// Modern layout (with timestamp):
/// `code-creation,<type>,<kind>,<timestamp>,<address>,<size>,<name>[,<sfi>,<marker>]`
///
/// Legacy layout:
/// `code-creation,<type>,<kind>,<address>,<size>,<name>[,<sfi>,<marker>]`
fn decode_code_creation(fields: &[String]) -> Result<CodeCreation, String> {
    // Legacy logs have the address where modern ones have the timestamp
    let legacy = fields.len() > 3 && is_address(&fields[3]);
    let (timestamp, base) = if legacy {
        (None, 3)
    } else {
        let ts = fields.get(3).ok_or("missing timestamp")?;
        (Some(parse_u64(ts, "timestamp")?), 4)
    };

    let min = base + 3;
    if fields.len() < min || fields.len() > min + 2 {
        return Err(format!(
            "expected {} to {} fields, found {}",
            min,
            min + 2,
            fields.len()
        ));
    }

    let kind = CodeKind::from_tag(&fields[1]);
    let address = parse_address(&fields[base])?;
    let size = parse_u64(&fields[base + 1], "size")?;
    let (name_marker, name) = split_leading_marker(&fields[base + 2]);

    // Unknown markers degrade to Compiled
    let state = match fields.get(base + 4) {
        Some(marker) => OptimizationState::from_marker(marker).unwrap_or_else(|| {
            debug!("unknown tier marker '{}', treating as compiled", marker);
            OptimizationState::Compiled
        }),
        None => name_marker.unwrap_or(OptimizationState::Compiled),
    };

    let (function_name, position) = parse_code_name(name);

    Ok(CodeCreation {
        timestamp,
        kind,
        address,
        size,
        function_name,
        position,
        state,
    })
}

/// Decode `code-move,<from>,<to>`
fn decode_code_move(fields: &[String]) -> Result<CodeMove, String> {
    expect_len(fields, 3)?;
    Ok(CodeMove {
        from: parse_address(&fields[1])?,
        to: parse_address(&fields[2])?,
    })
}

/// Decode `code-delete,<address>`
fn decode_code_delete(fields: &[String]) -> Result<CodeDeletion, String> {
    expect_len(fields, 2)?;
    Ok(CodeDeletion {
        address: parse_address(&fields[1])?,
    })
}

/// Decode an inline cache transition
///
/// Modern layout:
/// `<type>,<pc>,<timestamp>,<line>,<column>,<old>,<new>,<map>,<key>,<modifier>,<slow_reason>`
///
/// Legacy layout drops the timestamp.
fn decode_ic(fields: &[String]) -> Result<IcTransition, String> {
    let (timestamp, base) = match fields.len() {
        11 => (Some(parse_u64(&fields[2], "timestamp")?), 3),
        10 => (None, 2),
        n => return Err(format!("expected 10 or 11 fields, found {}", n)),
    };

    Ok(IcTransition {
        ic_type: fields[0].clone(),
        address: parse_address(&fields[1])?,
        timestamp,
        line: parse_u32(&fields[base], "line")?,
        column: parse_u32(&fields[base + 1], "column")?,
        old_state: IcState::from_label(&fields[base + 2]),
        new_state: IcState::from_label(&fields[base + 3]),
        map: normalize_map(&fields[base + 4]),
        key: fields[base + 5].clone(),
        modifier: fields[base + 6].clone(),
        slow_reason: fields[base + 7].clone(),
    })
}

/// Decode `code-deopt`
///
/// Layout:
/// `code-deopt,<timestamp>,<size>,<address>,<inlining_id>,<script_offset>,<bailout>,<position>,<reason>`
fn decode_deopt(fields: &[String]) -> Result<DeoptEvent, String> {
    if fields.len() < 9 {
        return Err(format!("expected 9 fields, found {}", fields.len()));
    }

    Ok(DeoptEvent {
        timestamp: parse_u64(&fields[1], "timestamp")?,
        size: parse_u64(&fields[2], "size")?,
        address: parse_address(&fields[3])?,
        inlining_id: parse_i64(&fields[4], "inlining id")?,
        script_offset: parse_i64(&fields[5], "script offset")?,
        bailout_type: BailoutType::from_label(&fields[6]),
        position: parse_inline_position(&fields[7]),
        // An unescaped comma in the reason splits it; stitch it back together
        reason: fields[8..].join(","),
    })
}

/// Split a legacy tier marker off the front of a code name (`~addAny ...`)
fn split_leading_marker(name: &str) -> (Option<OptimizationState>, &str) {
    let mut chars = name.chars();
    match chars.next() {
        Some(c @ ('~' | '*' | '^' | '+')) => {
            let marker = c.to_string();
            (OptimizationState::from_marker(&marker), chars.as_str())
        }
        _ => (None, name),
    }
}

/// Parse a code name of the form `[<function> ][<file>]:<line>:<column>`
///
/// **Public** - exposed for testing the name grammar directly
///
/// Names without a trailing position (builtins, stubs) yield no position.
/// A position without a file means "the file of the last script seen";
/// the resolver fills that in because decoding is stateless.
pub fn parse_code_name(name: &str) -> (String, Option<SourcePosition>) {
    let Some((rest, line, column)) = split_line_column(name) else {
        return (name.trim().to_string(), None);
    };

    // Accessors are logged as "get x" / "set x"; the space is part of the name
    let skip = if rest.starts_with("get ") || rest.starts_with("set ") {
        4
    } else {
        0
    };

    let (function_name, file) = match rest[skip..].find(' ') {
        Some(i) => {
            let split = skip + i;
            (&rest[..split], &rest[split + 1..])
        }
        None if looks_like_path(rest) => ("", rest),
        None => (rest, ""),
    };

    let file = file.trim();
    let position = SourcePosition {
        file: (!file.is_empty()).then(|| file.to_string()),
        line,
        column,
    };

    (function_name.trim().to_string(), Some(position))
}

/// Parse a deopt position `<file:line:column>` (optionally followed by
/// ` inlined at <...>`); only the innermost location is used
fn parse_inline_position(text: &str) -> Option<SourcePosition> {
    let start = text.find('<')?;
    let end = start + text[start..].find('>')?;
    let (file, line, column) = split_line_column(&text[start + 1..end])?;
    let file = file.trim();

    Some(SourcePosition {
        file: (!file.is_empty() && file != "unknown").then(|| file.to_string()),
        line,
        column,
    })
}

/// Split `<prefix>:<line>:<column>` from the right, so that colons in
/// drive letters and URLs stay in the prefix
fn split_line_column(text: &str) -> Option<(&str, u32, u32)> {
    let mut parts = text.rsplitn(3, ':');
    let column = parts.next()?.trim().parse().ok()?;
    let line = parts.next()?.trim().parse().ok()?;
    let rest = parts.next()?;
    Some((rest, line, column))
}

fn looks_like_path(text: &str) -> bool {
    text.contains('/') || text.contains('\\')
}

fn is_address(text: &str) -> bool {
    text.strip_prefix("0x")
        .map(|hex| !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false)
}

/// Strip the `0x` prefix from a map pointer so it reads like the UI expects
fn normalize_map(text: &str) -> String {
    text.strip_prefix("0x").unwrap_or(text).to_string()
}

/// Parse a hex address, with or without the `0x` prefix
pub fn parse_address(text: &str) -> Result<Address, String> {
    let hex = text.strip_prefix("0x").unwrap_or(text);
    Address::from_str_radix(hex, 16).map_err(|e| format!("invalid address '{}': {}", text, e))
}

fn parse_u64(text: &str, what: &str) -> Result<u64, String> {
    text.parse()
        .map_err(|e| format!("invalid {} '{}': {}", what, text, e))
}

fn parse_u32(text: &str, what: &str) -> Result<u32, String> {
    text.parse()
        .map_err(|e| format!("invalid {} '{}': {}", what, text, e))
}

fn parse_i64(text: &str, what: &str) -> Result<i64, String> {
    text.parse()
        .map_err(|e| format!("invalid {} '{}': {}", what, text, e))
}

fn expect_len(fields: &[String], expected: usize) -> Result<(), String> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(format!("expected {} fields, found {}", expected, fields.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(record: &str) -> LogEvent {
        match decode(1, record) {
            Decoded::Event(r) => r.event,
            other => panic!("expected event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_modern_code_creation() {
        let e = event("code-creation,LazyCompile,10,2345,0x3e4c3cd0d1a2,120,addAny /tmp/adders.js:93:27,0x1f2a,~");
        let LogEvent::CodeCreation(c) = e else {
            panic!("wrong variant");
        };
        assert_eq!(c.timestamp, Some(2345));
        assert_eq!(c.kind, CodeKind::LazyCompile);
        assert_eq!(c.address, 0x3e4c3cd0d1a2);
        assert_eq!(c.size, 120);
        assert_eq!(c.function_name, "addAny");
        assert_eq!(c.state, OptimizationState::Interpreted);
        let pos = c.position.unwrap();
        assert_eq!(pos.file.as_deref(), Some("/tmp/adders.js"));
        assert_eq!((pos.line, pos.column), (93, 27));
    }

    #[test]
    fn test_decode_legacy_code_creation_with_quoted_name() {
        let e = event(r#"code-creation,LazyCompile,0,0x2b0,64,"*Object1 /tmp/objects.js:3:12",0x1"#);
        let LogEvent::CodeCreation(c) = e else {
            panic!("wrong variant");
        };
        assert_eq!(c.timestamp, None);
        assert_eq!(c.function_name, "Object1");
        assert_eq!(c.state, OptimizationState::Optimized);
    }

    #[test]
    fn test_decode_unfamiliar_tier_markers() {
        let specialized = event("code-creation,JS,18,1,0x1000,256,addAny /tmp/a.js:93:1,0x2,*'");
        let LogEvent::CodeCreation(c) = specialized else {
            panic!("wrong variant");
        };
        assert_eq!(c.state, OptimizationState::Optimized);
        assert_eq!(c.address, 0x1000);

        let unknown = event("code-creation,JS,18,1,0x2000,64,f /tmp/a.js:1:1,0x2,?");
        let LogEvent::CodeCreation(c) = unknown else {
            panic!("wrong variant");
        };
        assert_eq!(c.state, OptimizationState::Compiled);
        assert_eq!(c.function_name, "f");
    }

    #[test]
    fn test_decode_builtin_without_position() {
        let e = event("code-creation,Builtin,2,100,0x10,64,ArrayPush");
        let LogEvent::CodeCreation(c) = e else {
            panic!("wrong variant");
        };
        assert_eq!(c.function_name, "ArrayPush");
        assert!(c.position.is_none());
        assert_eq!(c.state, OptimizationState::Compiled);
    }

    #[test]
    fn test_decode_ic_modern_and_legacy() {
        let modern = event("LoadIC,0x2c5a,85,93,27,0,1,0x37cdf3b7a811,x,,");
        let legacy = event("KeyedStoreIC,0x2c5a,93,27,1,P,0x37cdf3b7a811,0,,");
        let LogEvent::IcTransition(m) = modern else {
            panic!("wrong variant");
        };
        let LogEvent::IcTransition(l) = legacy else {
            panic!("wrong variant");
        };
        assert_eq!(m.timestamp, Some(85));
        assert_eq!(m.map, "37cdf3b7a811");
        assert_eq!(m.new_state, IcState::Monomorphic);
        assert_eq!(m.key, "x");
        assert_eq!(l.timestamp, None);
        assert_eq!(l.ic_type, "KeyedStoreIC");
        assert_eq!(l.new_state, IcState::Polymorphic);
    }

    #[test]
    fn test_decode_deopt() {
        let e = event("code-deopt,2370,544,0x3e4c,-1,1018,eager,<C:\\\\src\\\\adders.js:93:27>,not a Smi");
        let LogEvent::Deopt(d) = e else {
            panic!("wrong variant");
        };
        assert_eq!(d.bailout_type, BailoutType::Eager);
        assert_eq!(d.reason, "not a Smi");
        assert_eq!(d.inlining_id, -1);
        let pos = d.position.unwrap();
        assert_eq!(pos.file.as_deref(), Some("C:\\src\\adders.js"));
        assert_eq!((pos.line, pos.column), (93, 27));
    }

    #[test]
    fn test_decode_deopt_inlined_position_uses_innermost() {
        let e = event("code-deopt,1,2,0x3,0,5,soft,<file:///a.js:4:5> inlined at <file:///b.js:9:1>,Insufficient type feedback");
        let LogEvent::Deopt(d) = e else {
            panic!("wrong variant");
        };
        let pos = d.position.unwrap();
        assert_eq!(pos.file.as_deref(), Some("file:///a.js"));
        assert_eq!(pos.line, 4);
    }

    #[test]
    fn test_decode_move_and_delete() {
        assert_eq!(
            event("code-move,0x10,0x20"),
            LogEvent::CodeMove(CodeMove { from: 0x10, to: 0x20 })
        );
        assert_eq!(
            event("code-delete,0x20"),
            LogEvent::CodeDeletion(CodeDeletion { address: 0x20 })
        );
    }

    #[test]
    fn test_ignored_records() {
        assert_eq!(
            decode(7, "tick,0x1,2,0,0x0,0"),
            Decoded::Ignored {
                order: 7,
                tag: "tick".to_string()
            }
        );
        assert!(matches!(decode(1, "sfi-move,0x1,0x2"), Decoded::Ignored { .. }));
    }

    #[test]
    fn test_malformed_records() {
        assert!(matches!(decode(1, "code-move,0x10"), Decoded::Malformed { .. }));
        assert!(matches!(decode(1, "code-delete,zz"), Decoded::Malformed { .. }));
        assert!(matches!(decode(1, "LoadIC,0x1,2,three,4,0,1,0x1,x,,"), Decoded::Malformed { .. }));
        assert!(matches!(decode(1, "code-creation,LazyComp"), Decoded::Malformed { .. }));
    }

    #[test]
    fn test_parse_code_name_variants() {
        let (name, pos) = parse_code_name(" /tmp/a.js:1:1");
        assert_eq!(name, "");
        assert_eq!(pos.unwrap().file.as_deref(), Some("/tmp/a.js"));

        let (name, pos) = parse_code_name("get size /tmp/a.js:4:3");
        assert_eq!(name, "get size");
        assert_eq!(pos.unwrap().file.as_deref(), Some("/tmp/a.js"));

        let (name, pos) = parse_code_name("addAny:98:33");
        assert_eq!(name, "addAny");
        assert_eq!(pos.unwrap().file, None);

        let (name, pos) = parse_code_name("add file:///tmp/x.html:98:33");
        assert_eq!(name, "add");
        assert_eq!(pos.unwrap().file.as_deref(), Some("file:///tmp/x.html"));
    }
}
