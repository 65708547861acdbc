use deopt_lens::parser::decoder::{decode, parse_code_name, Decoded};
use deopt_lens::parser::tokenizer::{records, split_fields};
use deopt_lens::parser::{BailoutType, IcState, LogEvent, SourcePosition};
use pretty_assertions::assert_eq;

fn decode_event(record: &str) -> LogEvent {
    match decode(7, record) {
        Decoded::Event(r) => {
            assert_eq!(r.order, 7);
            r.event
        }
        other => panic!("expected an event, got {:?}", other),
    }
}

#[test]
fn test_records_and_fields_together() {
    let log = "code-move,0x1,0x2\r\n\r\ncode-delete,0x2\n";
    let parsed: Vec<(u64, Vec<String>)> = records(log)
        .map(|(order, record)| (order, split_fields(record)))
        .collect();

    assert_eq!(
        parsed,
        vec![
            (1, vec!["code-move".to_string(), "0x1".to_string(), "0x2".to_string()]),
            (3, vec!["code-delete".to_string(), "0x2".to_string()]),
        ]
    );
}

#[test]
fn test_escaped_comma_in_code_name() {
    let event = decode_event(
        r"code-creation,LazyCompile,10,5,0x100,64,get a\,b /tmp/x.js:2:3,0x1,~",
    );
    let LogEvent::CodeCreation(code) = event else {
        panic!("wrong variant");
    };
    assert_eq!(code.function_name, "get a,b");
    assert_eq!(
        code.position,
        Some(SourcePosition {
            file: Some("/tmp/x.js".to_string()),
            line: 2,
            column: 3,
        })
    );
}

#[test]
fn test_every_ic_family_is_recognized() {
    for tag in ["LoadIC", "StoreIC", "KeyedLoadIC", "KeyedStoreIC", "LoadGlobalIC", "StoreInArrayLiteralIC"] {
        let record = format!("{},0x10,1,2,3,0,1,0xff,k,,", tag);
        let LogEvent::IcTransition(ic) = decode_event(&record) else {
            panic!("{} not decoded as IC", tag);
        };
        assert_eq!(ic.ic_type, tag);
        assert_eq!(ic.old_state, IcState::Uninitialized);
        assert_eq!(ic.new_state, IcState::Monomorphic);
    }
}

#[test]
fn test_deopt_reason_with_unescaped_comma() {
    let LogEvent::Deopt(deopt) =
        decode_event("code-deopt,1,2,0x30,-1,4,lazy,<unknown>,wrong map, expected x")
    else {
        panic!("wrong variant");
    };
    assert_eq!(deopt.bailout_type, BailoutType::Lazy);
    assert_eq!(deopt.position, None);
    assert_eq!(deopt.reason, "wrong map, expected x");
}

#[test]
fn test_unknown_records_are_ignored_not_malformed() {
    for record in ["tick,0x1,2,0,0x0,0", "heap-capacity,123", "sfi-move,0x1,0x2"] {
        assert!(matches!(decode(1, record), Decoded::Ignored { .. }), "{}", record);
    }
}

#[test]
fn test_broken_known_records_are_malformed() {
    for record in [
        "code-creation,LazyCompile",
        "code-move,0x1",
        "code-delete,zz",
        "LoadIC,0x1,2,3",
        "code-deopt,1,2,3",
    ] {
        assert!(matches!(decode(1, record), Decoded::Malformed { .. }), "{}", record);
    }
}

#[test]
fn test_code_name_grammar() {
    let cases = [
        ("addAny /tmp/adders.js:93:27", "addAny", Some("/tmp/adders.js"), 93, 27),
        (" /tmp/adders.js:1:1", "", Some("/tmp/adders.js"), 1, 1),
        ("/tmp/adders.js:1:1", "", Some("/tmp/adders.js"), 1, 1),
        ("set value file:///C:/a.js:4:5", "set value", Some("file:///C:/a.js"), 4, 5),
        ("helper:8:2", "helper", None, 8, 2),
    ];

    for (name, function_name, file, line, column) in cases {
        let (parsed_name, position) = parse_code_name(name);
        let position = position.unwrap_or_else(|| panic!("no position for {}", name));
        assert_eq!(parsed_name, function_name, "{}", name);
        assert_eq!(position.file.as_deref(), file, "{}", name);
        assert_eq!((position.line, position.column), (line, column), "{}", name);
    }

    assert_eq!(parse_code_name("ArrayPush"), ("ArrayPush".to_string(), None));
}
