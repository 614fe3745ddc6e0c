//! JSON serializer for host configuration files.

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use super::{ConfigFormat, ConfigSerializer};

/// JSON configuration file serializer.
///
/// Output uses two-space indentation and ends with a newline.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSerializer;

impl ConfigSerializer for JsonSerializer {
    fn parse(&self, content: &str) -> Result<Map<String, Value>> {
        let value: Value = serde_json::from_str(content).context("Failed to parse JSON config")?;
        match value {
            Value::Object(map) => Ok(map),
            _ => anyhow::bail!("Expected JSON object at root"),
        }
    }

    fn render(&self, map: &Map<String, Value>) -> Result<String> {
        let mut content =
            serde_json::to_string_pretty(map).context("Failed to serialize JSON config")?;
        content.push('\n');
        Ok(content)
    }

    fn format(&self) -> ConfigFormat {
        ConfigFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_uses_two_space_indent_and_trailing_newline() {
        let mut map = Map::new();
        map.insert("servers".to_string(), json!({"a": {"command": "node"}}));

        let content = JsonSerializer.render(&map).expect("render");

        assert!(content.ends_with("}\n"));
        assert!(content.contains("\n  \"servers\": {\n    \"a\""));
    }

    #[test]
    fn parse_rejects_non_object_root() {
        assert!(JsonSerializer.parse("[1, 2]").is_err());
        assert!(JsonSerializer.parse("{ not json").is_err());
    }

    #[test]
    fn roundtrip_preserves_key_order() {
        let content = "{\n  \"zeta\": 1,\n  \"alpha\": {\n    \"b\": true,\n    \"a\": null\n  }\n}\n";
        let map = JsonSerializer.parse(content).expect("parse");
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(JsonSerializer.render(&map).expect("render"), content);
    }
}
