//! Persistence of ROIs into an element tree. A node is a JSON object where scalar fields are
//! plain values and repeated child elements (such as the slices of a stack) are stored as an
//! array of objects under their element name.

use crate::Result;
use crate::errors::RoiError;
use crate::roi::Roi;
use serde_json::{Map, Value};

pub type Node = Map<String, Value>;

pub fn set_int(node: &mut Node, key: &str, value: i64) {
    node.insert(key.to_string(), Value::from(value));
}

pub fn set_float(node: &mut Node, key: &str, value: f64) {
    node.insert(key.to_string(), Value::from(value));
}

pub fn set_bool(node: &mut Node, key: &str, value: bool) {
    node.insert(key.to_string(), Value::Bool(value));
}

pub fn set_str(node: &mut Node, key: &str, value: &str) {
    node.insert(key.to_string(), Value::String(value.to_string()));
}

/// Read an integer field, `default` when it is absent. A present field of the wrong type is
/// an error.
pub fn get_int(node: &Node, key: &str, default: i64) -> Result<i64> {
    match node.get(key) {
        None => Ok(default),
        Some(v) => v.as_i64().ok_or_else(|| malformed(key)),
    }
}

pub fn get_float(node: &Node, key: &str, default: f64) -> Result<f64> {
    match node.get(key) {
        None => Ok(default),
        Some(v) => v.as_f64().ok_or_else(|| malformed(key)),
    }
}

pub fn get_bool(node: &Node, key: &str, default: bool) -> Result<bool> {
    match node.get(key) {
        None => Ok(default),
        Some(v) => v.as_bool().ok_or_else(|| malformed(key)),
    }
}

pub fn get_str(node: &Node, key: &str, default: &str) -> Result<String> {
    match node.get(key) {
        None => Ok(default.to_string()),
        Some(v) => v
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| malformed(key)),
    }
}

/// Read an `i32` field, rejecting values outside the `i32` range.
pub fn get_i32(node: &Node, key: &str, default: i32) -> Result<i32> {
    let value = get_int(node, key, default as i64)?;
    i32::try_from(value).map_err(|_| malformed(key))
}

/// Append a child element under `key`.
pub fn push_element(node: &mut Node, key: &str, child: Node) {
    match node.get_mut(key) {
        Some(Value::Array(items)) => items.push(Value::Object(child)),
        _ => {
            node.insert(key.to_string(), Value::Array(vec![Value::Object(child)]));
        }
    }
}

/// All child elements stored under `key`, in order. A single object is accepted as a one
/// element list.
pub fn elements<'a>(node: &'a Node, key: &str) -> Result<Vec<&'a Node>> {
    match node.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Object(child)) => Ok(vec![child]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_object().ok_or_else(|| malformed(key)))
            .collect(),
        Some(_) => Err(malformed(key)),
    }
}

fn malformed(key: &str) -> Box<dyn std::error::Error> {
    RoiError::MalformedField(key.to_string()).into()
}

/// Save a ROI into a pretty-printed JSON document.
pub fn to_json_string(roi: &dyn Roi) -> Result<String> {
    let mut node = Node::new();
    if !roi.save_to_node(&mut node) {
        return Err(RoiError::SaveFailed.into());
    }
    Ok(serde_json::to_string_pretty(&Value::Object(node))?)
}

/// Load a ROI from a JSON document produced by `to_json_string`. Returns false when the
/// document cannot be parsed or the ROI rejects its contents.
pub fn from_json_str(roi: &mut dyn Roi, text: &str) -> bool {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(node)) => roi.load_from_node(&node),
        Ok(_) => {
            tracing::warn!("ROI document is not an object");
            false
        }
        Err(e) => {
            tracing::warn!("Failed to parse ROI document: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: Value) -> Node {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn absent_fields_use_default() {
        let n = Node::new();
        assert_eq!(get_int(&n, "t", -1).unwrap(), -1);
        assert_eq!(get_str(&n, "name", "x").unwrap(), "x");
        assert!(get_bool(&n, "readOnly", true).unwrap());
    }

    #[test]
    fn wrong_types_are_errors() {
        let n = node(json!({ "t": "three", "x": true, "big": 1u64 << 40 }));
        assert!(get_int(&n, "t", -1).is_err());
        assert!(get_float(&n, "x", 0.0).is_err());
        assert!(get_i32(&n, "big", 0).is_err());
    }

    #[test]
    fn repeated_elements_keep_order() {
        let mut n = Node::new();
        for t in [4, 1, 9] {
            let mut child = Node::new();
            set_int(&mut child, "t", t);
            push_element(&mut n, "slice", child);
        }

        let children = elements(&n, "slice").unwrap();
        let ts: Vec<i64> = children.iter().map(|c| get_int(c, "t", 0).unwrap()).collect();
        assert_eq!(ts, vec![4, 1, 9]);
    }

    #[test]
    fn single_object_is_one_element() {
        let n = node(json!({ "slice": { "t": 2 } }));
        assert_eq!(elements(&n, "slice").unwrap().len(), 1);
        assert!(elements(&n, "missing").unwrap().is_empty());

        let bad = node(json!({ "slice": [1, 2] }));
        assert!(elements(&bad, "slice").is_err());
    }
}
