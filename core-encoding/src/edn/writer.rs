use crate::Document;
use serde_json::Number;
use std::fmt::Write;

pub(crate) fn write(document: &Document) -> String {
    let mut out = String::new();
    write_value(&mut out, document);
    out
}

fn write_value(out: &mut String, value: &Document) {
    match value {
        Document::Null => out.push_str("nil"),
        Document::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Document::Number(n) => write_number(out, n),
        Document::String(s) => write_string(out, s),
        Document::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Document::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_key(out, key);
                out.push(' ');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        let _ = write!(out, "{i}");
    } else if let Some(u) = n.as_u64() {
        let _ = write!(out, "{u}");
    } else if let Some(f) = n.as_f64() {
        let start = out.len();
        let _ = write!(out, "{f}");
        // A float must stay a float when read back.
        if !out[start..].contains(['.', 'e', 'E']) {
            out.push_str(".0");
        }
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_key(out: &mut String, key: &str) {
    if is_keyword_safe(key) {
        out.push(':');
        out.push_str(key);
    } else {
        write_string(out, key);
    }
}

fn is_keyword_safe(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        None => false,
        Some(c) if c.is_ascii_digit() => false,
        Some(first) => std::iter::once(first)
            .chain(chars)
            .all(|c| c.is_alphanumeric() || "*+!-_?<>=./".contains(c)),
    }
}
