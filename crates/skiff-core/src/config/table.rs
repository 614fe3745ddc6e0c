//! Minimal dotted-table serializer for `.toml` host configs.
//!
//! Only the subset needed for server registrations is understood:
//! `[section.table]` headers with exactly two components, followed by
//! `key = value` lines whose values are strings or arrays of strings.
//! Headers of any other depth are ignored together with their keys, and
//! any other value token is kept as an opaque string. Root-level
//! `key = value` lines before the first header are carried through as well.

use anyhow::Result;
use serde_json::{Map, Value};
use tracing::debug;

use super::{ConfigFormat, ConfigSerializer};

/// Minimal table-format serializer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableSerializer;

enum Cursor {
    Root,
    Table(String, String),
    Ignored,
}

impl ConfigSerializer for TableSerializer {
    fn parse(&self, content: &str) -> Result<Map<String, Value>> {
        let mut root = Map::new();
        let mut cursor = Cursor::Root;

        let mut lines = content.lines();
        while let Some(line) = lines.next() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') {
                cursor = match parse_header(line) {
                    Some((section, table)) if open_table(&mut root, &section, &table) => {
                        Cursor::Table(section, table)
                    }
                    _ => {
                        debug!(header = line, "Ignoring unsupported table header");
                        Cursor::Ignored
                    }
                };
                continue;
            }

            let Some((raw_key, raw_value)) = line.split_once('=') else {
                continue;
            };
            let key = unquote(raw_key.trim());
            if key.is_empty() {
                continue;
            }
            let mut raw_value = raw_value.trim().to_string();
            if raw_value.starts_with('[') {
                while !brackets_closed(&raw_value) {
                    let Some(next) = lines.next() else {
                        break;
                    };
                    raw_value.push('\n');
                    raw_value.push_str(next);
                }
            }
            let value = parse_value(&raw_value);

            match &cursor {
                Cursor::Root => {
                    root.insert(key, value);
                }
                Cursor::Table(section, table) => {
                    if let Some(Value::Object(fields)) = root
                        .get_mut(section)
                        .and_then(|s| s.as_object_mut())
                        .and_then(|s| s.get_mut(table))
                    {
                        fields.insert(key, value);
                    }
                }
                Cursor::Ignored => {}
            }
        }

        Ok(root)
    }

    fn render(&self, map: &Map<String, Value>) -> Result<String> {
        let mut out = String::new();

        let mut wrote_root = false;
        for (key, value) in map {
            if value.is_object() {
                continue;
            }
            if let Some(rendered) = render_value(value) {
                out.push_str(&format!("{} = {}\n", render_key(key), rendered));
                wrote_root = true;
            }
        }
        if wrote_root {
            out.push('\n');
        }

        for (section, tables) in map {
            let Value::Object(tables) = tables else {
                continue;
            };
            for (table, fields) in tables {
                let Value::Object(fields) = fields else {
                    debug!(section, table, "Skipping non-table value in section");
                    continue;
                };
                out.push_str(&format!("[{}.{}]\n", render_key(section), render_key(table)));
                for (key, value) in fields {
                    match render_value(value) {
                        Some(rendered) => {
                            out.push_str(&format!("{} = {}\n", render_key(key), rendered))
                        }
                        None => debug!(section, table, key, "Skipping unsupported value"),
                    }
                }
                out.push('\n');
            }
        }

        Ok(out)
    }

    fn format(&self) -> ConfigFormat {
        ConfigFormat::Table
    }
}

/// Ensure `root[section][table]` is a table, returning false on a type clash.
fn open_table(root: &mut Map<String, Value>, section: &str, table: &str) -> bool {
    let section_value = root
        .entry(section.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(tables) = section_value else {
        return false;
    };
    tables
        .entry(table.to_string())
        .or_insert_with(|| Value::Object(Map::new()))
        .is_object()
}

/// Parse `[section.table]`, rejecting array-of-tables and other depths.
fn parse_header(line: &str) -> Option<(String, String)> {
    if line.starts_with("[[") {
        return None;
    }
    let close = line.rfind(']')?;
    let rest = line[close + 1..].trim();
    if !rest.is_empty() && !rest.starts_with('#') {
        return None;
    }
    let parts = split_dotted(&line[1..close])?;
    match parts.as_slice() {
        [section, table] if !section.is_empty() && !table.is_empty() => {
            Some((section.clone(), table.clone()))
        }
        _ => None,
    }
}

/// Split a dotted key, honouring double-quoted components.
fn split_dotted(inner: &str) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => quoted = !quoted,
            '\\' if quoted => current.push(chars.next()?),
            '.' if !quoted => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if quoted {
        return None;
    }
    parts.push(current.trim().to_string());
    Some(parts)
}

/// Decode a quoted key, undoing the escapes `render_key` adds.
fn unquote(key: &str) -> String {
    if key.starts_with('"') || key.starts_with('\'') {
        if let Some(toml::Value::String(s)) = decode(key) {
            return s;
        }
    }
    key.to_string()
}

/// Whether every `[` opened in `raw` is closed, ignoring brackets inside
/// strings and comments.
fn brackets_closed(raw: &str) -> bool {
    let mut depth = 0i32;
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            '"' => {
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' | '\n' => break,
                        _ => {}
                    }
                }
            }
            '\'' => {
                for c in chars.by_ref() {
                    if c == '\'' || c == '\n' {
                        break;
                    }
                }
            }
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            _ => {}
        }
    }
    depth <= 0
}

/// Parse a single TOML value.
fn decode(raw: &str) -> Option<toml::Value> {
    let mut doc = toml::from_str::<toml::Table>(&format!("v = {raw}")).ok()?;
    doc.remove("v")
}

/// Decode a string or string-array value; anything else stays verbatim.
fn parse_value(raw: &str) -> Value {
    if raw.starts_with('"') || raw.starts_with('\'') || raw.starts_with('[') {
        match decode(raw) {
            Some(toml::Value::String(s)) => return Value::String(s),
            Some(toml::Value::Array(items)) => {
                let strings: Option<Vec<Value>> = items
                    .iter()
                    .map(|item| item.as_str().map(|s| Value::String(s.to_string())))
                    .collect();
                if let Some(strings) = strings {
                    return Value::Array(strings);
                }
            }
            _ => {}
        }
    }
    Value::String(raw.to_string())
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(quote(s)),
        Value::Array(items) => {
            let rendered: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => quote(s),
                    other => other.to_string(),
                })
                .collect();
            Some(format!("[{}]", rendered.join(", ")))
        }
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Object(_) => None,
    }
}

fn render_key(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare { key.to_string() } else { quote(key) }
}

/// Render a TOML basic string.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(content: &str) -> Map<String, Value> {
        TableSerializer.parse(content).expect("parse")
    }

    fn render(value: Value) -> String {
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        TableSerializer.render(&map).expect("render")
    }

    #[test]
    fn parses_two_level_tables_with_strings_and_arrays() {
        let map = parse(
            r#"
# managed by hand
[mcp_servers.context7]
command = "npx"
args = ["-y", "@upstash/context7-mcp"]

[mcp_servers.wcag]
command = "node"
args = []
"#,
        );

        assert_eq!(
            Value::Object(map),
            json!({
                "mcp_servers": {
                    "context7": {"command": "npx", "args": ["-y", "@upstash/context7-mcp"]},
                    "wcag": {"command": "node", "args": []}
                }
            })
        );
    }

    #[test]
    fn other_tokens_are_kept_verbatim_without_coercion() {
        let map = parse("[a.b]\nport = 8080\nenabled = true\nmixed = [1, \"x\"]\n");
        let fields = &map["a"]["b"];
        assert_eq!(fields["port"], json!("8080"));
        assert_eq!(fields["enabled"], json!("true"));
        assert_eq!(fields["mixed"], json!("[1, \"x\"]"));
    }

    #[test]
    fn headers_of_other_depths_are_ignored_with_their_keys() {
        let map = parse(
            "[profile]\nname = \"x\"\n[a.b.c]\nk = \"v\"\n[[arr.tables]]\nq = \"r\"\n[ok.table]\nk = \"v\"\n",
        );
        assert_eq!(Value::Object(map), json!({"ok": {"table": {"k": "v"}}}));
    }

    #[test]
    fn root_keys_before_first_header_are_kept() {
        let map = parse("model = \"o3\"\n\n[mcp_servers.a]\ncommand = \"x\"\n");
        assert_eq!(map["model"], json!("o3"));
        let content = TableSerializer.render(&map).expect("render");
        assert_eq!(
            content,
            "model = \"o3\"\n\n[mcp_servers.a]\ncommand = \"x\"\n\n"
        );
    }

    #[test]
    fn quoted_header_components_survive() {
        let content = render(json!({"mcp_servers": {"my.server": {"command": "x"}}}));
        assert!(content.starts_with("[mcp_servers.\"my.server\"]\n"));
        let map = parse(&content);
        assert_eq!(map["mcp_servers"]["my.server"]["command"], json!("x"));
    }

    #[test]
    fn render_writes_blank_line_after_each_table_in_insertion_order() {
        let content = render(json!({
            "mcp_servers": {
                "zeta": {"command": "node", "args": ["a b", "c\"d"]},
                "alpha": {"command": "python", "type": "stdio"}
            }
        }));
        assert_eq!(
            content,
            "[mcp_servers.zeta]\ncommand = \"node\"\nargs = [\"a b\", \"c\\\"d\"]\n\n\
             [mcp_servers.alpha]\ncommand = \"python\"\ntype = \"stdio\"\n\n"
        );
    }

    #[test]
    fn supported_subset_roundtrips() {
        let original = json!({
            "mcp_servers": {
                "a": {"command": "C:\\tools\\node.exe", "args": ["--flag=1", "", "tab\there"]},
                "b": {"command": "uvx", "args": []}
            },
            "other": {"table": {"note": "line\nbreak"}}
        });
        let content = render(original.clone());
        assert_eq!(Value::Object(parse(&content)), original);
    }

    #[test]
    fn inline_comment_after_string_value_is_dropped() {
        let map = parse("[a.b]\ncommand = \"node\" # runtime\n");
        assert_eq!(map["a"]["b"]["command"], json!("node"));
    }

    #[test]
    fn multi_line_string_arrays_are_read_whole() {
        let map = parse(
            "[mcp_servers.existing]\ncommand = \"npx\"\nargs = [\n  \"-y\",\n  \"pkg\", # pinned\n  \"a]b\",\n]\nenv_file = \".env\"\n",
        );
        assert_eq!(
            Value::Object(map),
            json!({
                "mcp_servers": {
                    "existing": {
                        "command": "npx",
                        "args": ["-y", "pkg", "a]b"],
                        "env_file": ".env"
                    }
                }
            })
        );
    }

    #[test]
    fn escaped_keys_roundtrip() {
        let original = json!({
            "we\"ird\\root": "v",
            "mcp_servers": {"a": {"quo\"te": "x", "back\\slash": "y"}}
        });
        let content = render(original.clone());
        assert_eq!(Value::Object(parse(&content)), original);
    }
}
