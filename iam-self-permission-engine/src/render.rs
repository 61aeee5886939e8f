//! JSON rendering helpers for the text summaries

use serde::Serialize;

const INDENT: &[u8] = b"    ";

/// Pretty-print with four-space indentation
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Wrap pretty JSON in a fenced markdown block
pub fn fenced_json(json: &str) -> String {
    format!("```json\n{json}\n```")
}

/// Collapse lines nested deeper than `limit` repetitions of `indent` onto the
/// preceding line.
///
/// A line is folded when it starts with `limit` indents followed by at least one
/// more indent, or by a closing `}` or `]`. Purely cosmetic.
pub fn limit_indentation(json: &str, indent: &str, limit: usize) -> String {
    if indent.is_empty() {
        return json.to_string();
    }
    let prefix = indent.repeat(limit);
    let mut out = String::with_capacity(json.len());

    for (index, line) in json.split('\n').enumerate() {
        if index > 0 {
            let folded = line.strip_prefix(prefix.as_str()).filter(|rest| {
                rest.starts_with(indent) || rest.starts_with('}') || rest.starts_with(']')
            });
            if let Some(rest) = folded {
                out.push_str(rest.trim_start_matches(indent));
                continue;
            }
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}
