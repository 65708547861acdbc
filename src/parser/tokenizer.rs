//! Line and field tokenizer for V8 log text.
//!
//! The V8 logger writes one record per line, fields separated by commas.
//! String fields escape their own commas and backslashes (`\,`, `\\`,
//! `\x2C`, `\u00e9`), and older builds wrap them in double quotes instead.
//! Tokenizing never fails: a broken record still becomes a list of fields,
//! and the decoder decides whether the fields make sense.

/// Iterate over the records of a log, one per line
///
/// **Public** - entry point for the streaming pass
///
/// Each item is `(order, record)` where `order` is the 1-based line number.
/// CRLF line endings are normalized by trimming the trailing `\r`, and
/// empty lines are skipped. Calling this again restarts from the top.
pub fn records(text: &str) -> impl Iterator<Item = (u64, &str)> + '_ {
    text.split('\n')
        .enumerate()
        .map(|(index, line)| (index as u64 + 1, line.strip_suffix('\r').unwrap_or(line)))
        .filter(|(_, line)| !line.trim().is_empty())
}

/// Split one record into unescaped fields
///
/// **Public** - used by the decoder and by tests
///
/// # Example
/// ```
/// use deopt_lens::parser::tokenizer::split_fields;
///
/// let fields = split_fields(r"code-move,0x1,0x2");
/// assert_eq!(fields, vec!["code-move", "0x1", "0x2"]);
/// ```
pub fn split_fields(record: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = record.chars().peekable();
    let mut at_field_start = true;

    while let Some(c) = chars.next() {
        match c {
            '"' if at_field_start => {
                read_quoted(&mut chars, &mut current);
                at_field_start = false;
            }
            ',' => {
                fields.push(std::mem::take(&mut current));
                at_field_start = true;
            }
            '\\' => {
                read_escape(&mut chars, &mut current);
                at_field_start = false;
            }
            _ => {
                current.push(c);
                at_field_start = false;
            }
        }
    }
    fields.push(current);
    fields
}

/// Consume a legacy quoted field up to its closing quote.
///
/// `""` stands for a literal quote. An unterminated quote swallows the rest
/// of the record.
fn read_quoted<I>(chars: &mut std::iter::Peekable<I>, out: &mut String)
where
    I: Iterator<Item = char>,
{
    while let Some(c) = chars.next() {
        match c {
            '"' if chars.peek() == Some(&'"') => {
                chars.next();
                out.push('"');
            }
            '"' => return,
            '\\' => read_escape(chars, out),
            _ => out.push(c),
        }
    }
}

/// Decode one backslash escape. The backslash has already been consumed.
fn read_escape<I>(chars: &mut std::iter::Peekable<I>, out: &mut String)
where
    I: Iterator<Item = char>,
{
    match chars.next() {
        Some('n') => out.push('\n'),
        Some('x') => push_code_point(chars, 2, 'x', out),
        Some('u') => push_code_point(chars, 4, 'u', out),
        Some(other) => out.push(other),
        // trailing lone backslash
        None => out.push('\\'),
    }
}

fn push_code_point<I>(chars: &mut std::iter::Peekable<I>, digits: usize, marker: char, out: &mut String)
where
    I: Iterator<Item = char>,
{
    let mut hex = String::with_capacity(digits);
    while hex.len() < digits {
        match chars.peek() {
            Some(c) if c.is_ascii_hexdigit() => {
                hex.push(*c);
                chars.next();
            }
            _ => break,
        }
    }

    let decoded = (hex.len() == digits)
        .then(|| u32::from_str_radix(&hex, 16).ok())
        .flatten()
        .and_then(char::from_u32);

    match decoded {
        Some(c) => out.push(c),
        None => {
            // Not a valid escape, keep the text as written
            out.push('\\');
            out.push(marker);
            out.push_str(&hex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_normalizes_crlf() {
        let text = "a,1\r\nb,2\r\n";
        let lines: Vec<_> = records(text).collect();
        assert_eq!(lines, vec![(1, "a,1"), (2, "b,2")]);
    }

    #[test]
    fn test_records_skips_blank_lines_but_keeps_numbering() {
        let text = "a\n\n  \nb\n";
        let lines: Vec<_> = records(text).collect();
        assert_eq!(lines, vec![(1, "a"), (4, "b")]);
    }

    #[test]
    fn test_records_is_restartable() {
        let text = "x\ny";
        assert_eq!(records(text).count(), 2);
        assert_eq!(records(text).next(), Some((1, "x")));
    }

    #[test]
    fn test_split_fields_plain() {
        assert_eq!(split_fields("code-delete,0x10"), vec!["code-delete", "0x10"]);
    }

    #[test]
    fn test_split_fields_keeps_empty_fields() {
        assert_eq!(split_fields("LoadIC,,,"), vec!["LoadIC", "", "", ""]);
    }

    #[test]
    fn test_split_fields_escaped_comma_and_backslash() {
        let fields = split_fields(r"x,C:\\dir\\a.js,not\x2C really");
        assert_eq!(fields, vec!["x", r"C:\dir\a.js", "not, really"]);
    }

    #[test]
    fn test_split_fields_unicode_escape() {
        assert_eq!(split_fields(r"x,caf\u00e9"), vec!["x", "café"]);
    }

    #[test]
    fn test_split_fields_legacy_quotes() {
        let fields = split_fields(r#"code-creation,"add, ""quoted"" /a.js:1:2",0x1"#);
        assert_eq!(fields, vec!["code-creation", r#"add, "quoted" /a.js:1:2"#, "0x1"]);
    }

    #[test]
    fn test_split_fields_unterminated_quote_does_not_panic() {
        let fields = split_fields(r#"a,"never closed,b"#);
        assert_eq!(fields, vec!["a", "never closed,b"]);
    }

    #[test]
    fn test_split_fields_bad_hex_escape_is_kept() {
        assert_eq!(split_fields(r"a\xZZ"), vec![r"a\xZZ"]);
    }
}
