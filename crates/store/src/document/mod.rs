//! Document snapshots and dot-separated field paths

use classquest_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// One document snapshot: an id plus the raw document body
///
/// The body stays a raw `Value` so callers can address individual fields
/// the way the backing store does, and deserialize into typed models only
/// at the edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Deserialize the whole body into a typed model
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.data.clone()).map_err(Into::into)
    }

    /// Read the value at a dot-separated field path, if present
    pub fn field(&self, path: &str) -> Option<&Value> {
        resolve(&self.data, path)
    }
}

/// Resolve a dot-separated field path against a document body
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Write `value` at a dot-separated field path, creating intermediate
/// objects as needed
///
/// Fails if a non-object value sits on the path; field paths only address
/// object members, matching the backing store's update semantics.
pub fn set(root: &mut Value, path: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        let map = current.as_object_mut().ok_or_else(|| {
            Error::InvalidData(format!("Field path '{}' crosses a non-object value", path))
        })?;
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }
    let map = current.as_object_mut().ok_or_else(|| {
        Error::InvalidData(format!("Field path '{}' crosses a non-object value", path))
    })?;
    map.insert(segments[segments.len() - 1].to_string(), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested_path() {
        let doc = json!({"levelRewardDrawn": {"2": true}, "level": 2});
        assert_eq!(resolve(&doc, "level"), Some(&json!(2)));
        assert_eq!(resolve(&doc, "levelRewardDrawn.2"), Some(&json!(true)));
        assert_eq!(resolve(&doc, "levelRewardDrawn.3"), None);
        assert_eq!(resolve(&doc, "missing.deeply"), None);
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut doc = json!({});
        set(&mut doc, "emotionCheckins.2024-05-01", json!({"emotion": "happy"})).unwrap();
        assert_eq!(
            resolve(&doc, "emotionCheckins.2024-05-01"),
            Some(&json!({"emotion": "happy"}))
        );
    }

    #[test]
    fn test_set_rejects_non_object_crossing() {
        let mut doc = json!({"level": 2});
        assert!(set(&mut doc, "level.nested", json!(1)).is_err());
    }

    #[test]
    fn test_document_typed_read() {
        let doc = Document::new("s-1", json!({"id": "s-1", "level": 3}));
        #[derive(serde::Deserialize)]
        struct Probe {
            level: u32,
        }
        let probe: Probe = doc.deserialize().unwrap();
        assert_eq!(probe.level, 3);
        assert_eq!(doc.field("level"), Some(&json!(3)));
    }
}
