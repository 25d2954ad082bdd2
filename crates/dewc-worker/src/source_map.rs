//! Post-processing of generated v3 source maps.

use serde_json::Value;

/// Shift every mapping down by `lines` generated lines.
///
/// Each `;` in `mappings` starts a new generated line, and segment columns
/// are relative to their own line, so prefixing is enough.
pub(crate) fn prepend_lines(map: &mut Value, lines: usize) {
    if lines == 0 {
        return;
    }
    if let Some(mappings) = map.get_mut("mappings") {
        let shifted = format!("{}{}", ";".repeat(lines), mappings.as_str().unwrap_or_default());
        *mappings = Value::String(shifted);
    }
}

/// Set the generated file name.
pub(crate) fn set_file(map: &mut Value, file: &str) {
    if let Some(obj) = map.as_object_mut() {
        obj.insert("file".to_string(), Value::String(file.to_string()));
    }
}

/// Embed `source` as the content of the single original source.
pub fn embed_source(map: &str, source: &str) -> Result<String, serde_json::Error> {
    let mut value: Value = serde_json::from_str(map)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "sourcesContent".to_string(),
            Value::Array(vec![Value::String(source.to_string())]),
        );
    }
    serde_json::to_string(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prepend_lines() {
        let mut map = json!({ "version": 3, "mappings": "AAAA;AACA" });
        prepend_lines(&mut map, 3);
        assert_eq!(map["mappings"], ";;;AAAA;AACA");

        prepend_lines(&mut map, 0);
        assert_eq!(map["mappings"], ";;;AAAA;AACA");
    }

    #[test]
    fn test_set_file() {
        let mut map = json!({ "version": 3 });
        set_file(&mut map, "/pkg/a.js?dew");
        assert_eq!(map["file"], "/pkg/a.js?dew");
    }

    #[test]
    fn test_embed_source() {
        let map = embed_source(r#"{"version":3,"sources":["a.js"],"mappings":""}"#, "x = 1;").unwrap();
        let value: Value = serde_json::from_str(&map).unwrap();
        assert_eq!(value["sourcesContent"], json!(["x = 1;"]));
        assert_eq!(value["sources"], json!(["a.js"]));
    }

    #[test]
    fn test_embed_source_rejects_invalid_map() {
        assert!(embed_source("not json", "x").is_err());
    }
}
