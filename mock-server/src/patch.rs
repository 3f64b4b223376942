//! Minimal JSON Patch (RFC 6902) over `serde_json::Value`.

use serde_json::Value;

use crate::models::PatchOperation;

/// Apply `ops` in order. On error the document may be partially patched;
/// callers patch a copy.
pub fn apply(doc: &mut Value, ops: &[PatchOperation]) -> Result<(), String> {
    for op in ops {
        match op.op.as_str() {
            "add" => add(doc, &op.path, required_value(op)?)?,
            "remove" => {
                remove(doc, &op.path)?;
            }
            "replace" => replace(doc, &op.path, required_value(op)?)?,
            "test" => {
                let expected = required_value(op)?;
                if doc.pointer(&op.path) != Some(&expected) {
                    return Err(format!("test failed at {}", op.path));
                }
            }
            "move" => {
                let from = required_from(op)?;
                let value = remove(doc, from)?;
                add(doc, &op.path, value)?;
            }
            "copy" => {
                let from = required_from(op)?;
                let value = doc
                    .pointer(from)
                    .cloned()
                    .ok_or_else(|| format!("no value at {from}"))?;
                add(doc, &op.path, value)?;
            }
            other => return Err(format!("unsupported patch op {other:?}")),
        }
    }
    Ok(())
}

fn required_value(op: &PatchOperation) -> Result<Value, String> {
    op.value
        .clone()
        .ok_or_else(|| format!("{} at {} requires a value", op.op, op.path))
}

fn required_from(op: &PatchOperation) -> Result<&str, String> {
    op.from
        .as_deref()
        .ok_or_else(|| format!("{} at {} requires from", op.op, op.path))
}

/// Split a pointer into its parent pointer and unescaped last token.
fn split(path: &str) -> Result<(&str, String), String> {
    if !path.starts_with('/') {
        return Err(format!("invalid path {path:?}"));
    }
    let (parent, last) = path.rsplit_once('/').ok_or_else(|| format!("invalid path {path:?}"))?;
    Ok((parent, last.replace("~1", "/").replace("~0", "~")))
}

fn parent_mut<'a>(doc: &'a mut Value, parent: &str) -> Result<&'a mut Value, String> {
    doc.pointer_mut(parent)
        .ok_or_else(|| format!("no value at {parent:?}"))
}

fn add(doc: &mut Value, path: &str, value: Value) -> Result<(), String> {
    if path.is_empty() {
        *doc = value;
        return Ok(());
    }
    let (parent, token) = split(path)?;
    match parent_mut(doc, parent)? {
        Value::Object(map) => {
            map.insert(token, value);
            Ok(())
        }
        Value::Array(items) => {
            if token == "-" {
                items.push(value);
                return Ok(());
            }
            let index = array_index(&token, items.len() + 1)?;
            items.insert(index, value);
            Ok(())
        }
        _ => Err(format!("cannot add below a scalar at {path}")),
    }
}

fn remove(doc: &mut Value, path: &str) -> Result<Value, String> {
    let (parent, token) = split(path)?;
    match parent_mut(doc, parent)? {
        Value::Object(map) => map.remove(&token).ok_or_else(|| format!("no value at {path}")),
        Value::Array(items) => {
            let index = array_index(&token, items.len())?;
            Ok(items.remove(index))
        }
        _ => Err(format!("no value at {path}")),
    }
}

fn replace(doc: &mut Value, path: &str, value: Value) -> Result<(), String> {
    let target = doc
        .pointer_mut(path)
        .ok_or_else(|| format!("no value at {path}"))?;
    *target = value;
    Ok(())
}

fn array_index(token: &str, bound: usize) -> Result<usize, String> {
    match token.parse::<usize>() {
        Ok(index) if index < bound => Ok(index),
        _ => Err(format!("array index {token:?} out of range")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(op: &str, path: &str, value: Option<Value>) -> PatchOperation {
        PatchOperation {
            op: op.to_string(),
            path: path.to_string(),
            from: None,
            value,
        }
    }

    #[test]
    fn replace_add_remove() {
        let mut doc = json!({"name": "a", "tags": ["x"], "description": "d"});
        apply(
            &mut doc,
            &[
                op("replace", "/name", Some(json!("b"))),
                op("add", "/tags/-", Some(json!("y"))),
                op("add", "/tags/0", Some(json!("w"))),
                op("remove", "/description", None),
            ],
        )
        .unwrap();
        assert_eq!(doc, json!({"name": "b", "tags": ["w", "x", "y"]}));
    }

    #[test]
    fn escaped_tokens_are_unescaped() {
        let mut doc = json!({"environments": {}});
        apply(&mut doc, &[op("add", "/environments/a~1b~0c", Some(json!(1)))]).unwrap();
        assert_eq!(doc["environments"]["a/b~c"], 1);
    }

    #[test]
    fn replace_missing_path_fails() {
        let mut doc = json!({"name": "a"});
        assert!(apply(&mut doc, &[op("replace", "/missing", Some(json!(1)))]).is_err());
    }

    #[test]
    fn failing_test_op_stops_patch() {
        let mut doc = json!({"_version": 2});
        let err = apply(&mut doc, &[op("test", "/_version", Some(json!(1)))]).unwrap_err();
        assert!(err.contains("test failed"));
    }

    #[test]
    fn move_and_copy() {
        let mut doc = json!({"a": 1, "b": {}});
        let mut mv = op("move", "/b/a", None);
        mv.from = Some("/a".into());
        let mut cp = op("copy", "/c", None);
        cp.from = Some("/b".into());
        apply(&mut doc, &[mv, cp]).unwrap();
        assert_eq!(doc, json!({"b": {"a": 1}, "c": {"a": 1}}));
    }

    #[test]
    fn rejects_unknown_op_and_missing_value() {
        let mut doc = json!({});
        assert!(apply(&mut doc, &[op("merge", "/a", Some(json!(1)))]).is_err());
        assert!(apply(&mut doc, &[op("add", "/a", None)]).is_err());
        assert!(apply(&mut doc, &[op("add", "a", Some(json!(1)))]).is_err());
    }

    #[test]
    fn array_index_out_of_range() {
        let mut doc = json!({"tags": ["x"]});
        assert!(apply(&mut doc, &[op("remove", "/tags/3", None)]).is_err());
        assert!(apply(&mut doc, &[op("add", "/tags/2", Some(json!("z")))]).is_err());
    }
}
