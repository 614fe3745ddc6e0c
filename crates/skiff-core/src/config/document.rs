//! Config documents and server-section merge/removal.
//!
//! A document is mostly owned by someone else. Everything outside the server
//! section being edited is kept as opaque JSON and written back untouched;
//! only entries written by this crate are typed ([`ServerEntry`]).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::ServerDescriptor;

/// A server entry as written into a host's server section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub server_type: Option<String>,
}

impl From<&ServerDescriptor> for ServerEntry {
    fn from(server: &ServerDescriptor) -> Self {
        Self {
            command: server.command.clone(),
            args: server.args.clone(),
            server_type: server.server_type.clone(),
        }
    }
}

/// A loaded configuration document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: Map<String, Value>,
}

impl ConfigDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(root: Map<String, Value>) -> Self {
        Self { root }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// The server section at `section_key`, if present and a mapping.
    pub fn section(&self, section_key: &str) -> Option<&Map<String, Value>> {
        self.root.get(section_key).and_then(Value::as_object)
    }

    /// Names of servers registered under `section_key`, in document order.
    pub fn server_names(&self, section_key: &str) -> Vec<String> {
        self.section(section_key)
            .map(|section| section.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Decode one server entry, if present and well-formed.
    pub fn server(&self, section_key: &str, name: &str) -> Option<ServerEntry> {
        self.section(section_key)?
            .get(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

impl From<Map<String, Value>> for ConfigDocument {
    fn from(root: Map<String, Value>) -> Self {
        Self::from_map(root)
    }
}

/// Outcome of [`remove_servers`].
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveResult {
    pub updated: ConfigDocument,
    pub removed_count: usize,
}

/// Return `existing` with `servers` merged into the `section_key` section.
///
/// Prior entries are kept; an incoming server replaces any entry of the same
/// name. Fails if the section exists but is not a mapping, rather than
/// overwriting data this crate does not understand.
pub fn merge_servers(
    existing: &ConfigDocument,
    servers: &[ServerDescriptor],
    section_key: &str,
) -> anyhow::Result<ConfigDocument> {
    let mut root = existing.root.clone();
    if servers.is_empty() {
        return Ok(ConfigDocument { root });
    }

    let section = root
        .entry(section_key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(section) = section else {
        anyhow::bail!("Expected '{}' to be an object", section_key);
    };

    for server in servers {
        let entry = serde_json::to_value(ServerEntry::from(server))?;
        section.insert(server.name.clone(), entry);
    }

    Ok(ConfigDocument { root })
}

/// Return `existing` without the named servers in the `section_key` section.
///
/// When nothing matches the original document is returned with a count of
/// zero so the caller can skip writing. A section left empty is removed.
pub fn remove_servers<S: AsRef<str>>(
    existing: &ConfigDocument,
    names: &[S],
    section_key: &str,
) -> RemoveResult {
    let Some(section) = existing.section(section_key) else {
        return RemoveResult {
            updated: existing.clone(),
            removed_count: 0,
        };
    };

    let mut section = section.clone();
    let mut removed_count = 0;
    for name in names {
        if section.shift_remove(name.as_ref()).is_some() {
            removed_count += 1;
        }
    }
    if removed_count == 0 {
        return RemoveResult {
            updated: existing.clone(),
            removed_count,
        };
    }

    let mut root = existing.root.clone();
    if section.is_empty() {
        root.shift_remove(section_key);
    } else {
        root.insert(section_key.to_string(), Value::Object(section));
    }
    RemoveResult {
        updated: ConfigDocument { root },
        removed_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> ConfigDocument {
        match value {
            Value::Object(map) => ConfigDocument::from_map(map),
            _ => panic!("expected object"),
        }
    }

    fn wcag() -> ServerDescriptor {
        ServerDescriptor::new("wcag", "node").with_args(["index.js"])
    }

    #[test]
    fn merge_into_empty_document() {
        let merged = merge_servers(&ConfigDocument::new(), &[wcag()], "servers").unwrap();
        assert_eq!(
            Value::Object(merged.into_map()),
            json!({"servers": {"wcag": {"command": "node", "args": ["index.js"]}}})
        );
    }

    #[test]
    fn merge_preserves_unrelated_keys_and_entries() {
        let existing = doc(json!({
            "theme": "dark",
            "servers": {"user": {"command": "echo", "env": {"A": "1"}}},
            "other": [1, 2]
        }));

        let merged = merge_servers(&existing, &[wcag()], "servers").unwrap();

        assert_eq!(merged.get("theme"), Some(&json!("dark")));
        assert_eq!(merged.get("other"), Some(&json!([1, 2])));
        assert_eq!(
            merged.section("servers").unwrap()["user"],
            json!({"command": "echo", "env": {"A": "1"}})
        );
        assert_eq!(merged.server_names("servers"), vec!["user", "wcag"]);
        let keys: Vec<_> = merged.as_map().keys().cloned().collect();
        assert_eq!(keys, vec!["theme", "servers", "other"]);
    }

    #[test]
    fn merge_is_last_write_wins_and_omits_absent_type() {
        let existing = doc(json!({
            "servers": {"wcag": {"command": "python", "args": ["old.py"], "type": "sse"}}
        }));
        let first = ServerDescriptor::new("wcag", "deno");
        let second = wcag().with_type("stdio");

        let merged = merge_servers(&existing, &[first, second], "servers").unwrap();
        assert_eq!(
            merged.section("servers").unwrap()["wcag"],
            json!({"command": "node", "args": ["index.js"], "type": "stdio"})
        );

        let merged = merge_servers(&existing, &[ServerDescriptor::new("wcag", "x")], "servers")
            .unwrap();
        assert_eq!(
            merged.section("servers").unwrap()["wcag"],
            json!({"command": "x", "args": []})
        );
    }

    #[test]
    fn merge_refuses_non_mapping_section() {
        let existing = doc(json!({"servers": "not a map"}));
        assert!(merge_servers(&existing, &[wcag()], "servers").is_err());
    }

    #[test]
    fn merge_with_no_servers_does_not_create_empty_section() {
        let merged = merge_servers(&ConfigDocument::new(), &[], "servers").unwrap();
        assert!(merged.is_empty());
    }

    #[test]
    fn remove_drops_empty_section() {
        let merged = merge_servers(&ConfigDocument::new(), &[wcag()], "servers").unwrap();
        let result = remove_servers(&merged, &["wcag"], "servers");
        assert_eq!(result.removed_count, 1);
        assert!(result.updated.is_empty());
    }

    #[test]
    fn remove_with_disjoint_names_is_a_noop() {
        let existing = doc(json!({"servers": {"a": {"command": "x"}}, "keep": true}));
        let result = remove_servers(&existing, &["b", "c"], "servers");
        assert_eq!(result.removed_count, 0);
        assert_eq!(result.updated, existing);

        let result = remove_servers(&existing, &["a"], "missing");
        assert_eq!(result.removed_count, 0);
        assert_eq!(result.updated, existing);
    }

    #[test]
    fn remove_after_merge_restores_original() {
        let original = doc(json!({
            "editor.fontSize": 14,
            "mcpServers": {"user": {"command": "echo"}}
        }));
        let servers = vec![
            wcag(),
            ServerDescriptor::new("lint", "uvx").with_args(["lint-mcp"]),
        ];

        let merged = merge_servers(&original, &servers, "mcpServers").unwrap();
        let names: Vec<&str> = servers.iter().map(|s| s.name.as_str()).collect();
        let result = remove_servers(&merged, &names, "mcpServers");

        assert_eq!(result.removed_count, 2);
        assert_eq!(result.updated, original);
    }

    #[test]
    fn server_decodes_typed_entry() {
        let merged =
            merge_servers(&ConfigDocument::new(), &[wcag().with_type("stdio")], "servers").unwrap();
        let entry = merged.server("servers", "wcag").expect("entry");
        assert_eq!(entry.command, "node");
        assert_eq!(entry.server_type.as_deref(), Some("stdio"));
    }
}
