//! Sparse patch ops.
//!
//! Ops arrive as loose JSON objects inside a tick's `patch` array and are
//! interpreted one at a time, so a single malformed op never aborts the rest
//! of the array. Unknown op kinds are reported as [`OpError::UnknownKind`]
//! and skipped by the applier (forward compatible).

use serde_json::Value;

/// One interpreted patch op. Applied strictly in array order within a tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchOp {
    SetResourceJson { tag: String, raw: String },
    SetResourceFixed64 { tag: String, value: String },
    SetResourceValue { tag: String, value: Value },
    SetComponentJson { entity: u64, component: String, raw: String },
    RemoveComponent { entity: u64, component: String },
}

#[derive(Debug, thiserror::Error)]
pub enum OpError {
    #[error("op is not a JSON object")]
    NotAnObject,

    #[error("op object has no \"op\" kind")]
    MissingKind,

    #[error("unknown op kind {0:?}")]
    UnknownKind(String),

    #[error("{kind} is missing field {field:?}")]
    MissingField { kind: &'static str, field: &'static str },

    #[error("{kind}: {reason}")]
    Malformed { kind: &'static str, reason: String },
}

impl PatchOp {
    /// Interpret one element of a tick's `patch` array.
    pub fn interpret(value: &Value) -> Result<Self, OpError> {
        let obj = value.as_object().ok_or(OpError::NotAnObject)?;
        let kind = obj
            .get("op")
            .and_then(Value::as_str)
            .ok_or(OpError::MissingKind)?;

        match kind {
            "set_resource_json" => {
                let tag = str_field(obj, "set_resource_json", "tag")?;
                let raw = raw_field(obj, "set_resource_json")?;
                Ok(Self::SetResourceJson { tag, raw })
            }
            "set_resource_fixed64" => {
                let tag = str_field(obj, "set_resource_fixed64", "tag")?;
                let value = decimal_field(obj, "set_resource_fixed64")?;
                Ok(Self::SetResourceFixed64 { tag, value })
            }
            "set_resource_value" => {
                let tag = str_field(obj, "set_resource_value", "tag")?;
                let value = scalar_field(obj, "set_resource_value")?;
                Ok(Self::SetResourceValue { tag, value })
            }
            "set_component_json" => {
                let entity = entity_field(obj, "set_component_json")?;
                let component = str_field(obj, "set_component_json", "component")?;
                let raw = raw_field(obj, "set_component_json")?;
                Ok(Self::SetComponentJson {
                    entity,
                    component,
                    raw,
                })
            }
            "remove_component" => {
                let entity = entity_field(obj, "remove_component")?;
                let component = str_field(obj, "remove_component", "component")?;
                Ok(Self::RemoveComponent { entity, component })
            }
            other => Err(OpError::UnknownKind(other.to_string())),
        }
    }
}

fn str_field(
    obj: &serde_json::Map<String, Value>,
    kind: &'static str,
    field: &'static str,
) -> Result<String, OpError> {
    match obj.get(field) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(_) => Err(OpError::Malformed {
            kind,
            reason: format!("field {:?} must be a non-empty string", field),
        }),
        None => Err(OpError::MissingField { kind, field }),
    }
}

/// Raw view payload. Engines usually send the payload pre-serialized as a
/// string; inline objects are re-serialized compactly so identical inline
/// payloads keep their identity for dedup.
fn raw_field(obj: &serde_json::Map<String, Value>, kind: &'static str) -> Result<String, OpError> {
    match obj.get("value") {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(OpError::MissingField {
            kind,
            field: "value",
        }),
        Some(other) => serde_json::to_string(other).map_err(|e| OpError::Malformed {
            kind,
            reason: e.to_string(),
        }),
    }
}

/// Fixed-point value, kept as its decimal string form. Must parse finite.
fn decimal_field(
    obj: &serde_json::Map<String, Value>,
    kind: &'static str,
) -> Result<String, OpError> {
    let text = match obj.get("value") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            return Err(OpError::Malformed {
                kind,
                reason: "field \"value\" must be a decimal string or number".to_string(),
            });
        }
        None => {
            return Err(OpError::MissingField {
                kind,
                field: "value",
            });
        }
    };

    match text.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(text),
        _ => Err(OpError::Malformed {
            kind,
            reason: format!("{:?} is not a finite decimal", text),
        }),
    }
}

/// Opaque scalar: string, finite number, or bool.
fn scalar_field(obj: &serde_json::Map<String, Value>, kind: &'static str) -> Result<Value, OpError> {
    match obj.get("value") {
        Some(v @ Value::String(_)) | Some(v @ Value::Bool(_)) => Ok(v.clone()),
        Some(v @ Value::Number(n)) => {
            if n.as_f64().is_some_and(f64::is_finite) {
                Ok(v.clone())
            } else {
                Err(OpError::Malformed {
                    kind,
                    reason: format!("{} is not a finite number", n),
                })
            }
        }
        Some(_) => Err(OpError::Malformed {
            kind,
            reason: "field \"value\" must be a scalar".to_string(),
        }),
        None => Err(OpError::MissingField {
            kind,
            field: "value",
        }),
    }
}

/// Entity ids arrive as JSON numbers; non-finite or fractional ids are
/// malformed, never coerced.
fn entity_field(obj: &serde_json::Map<String, Value>, kind: &'static str) -> Result<u64, OpError> {
    let value = obj.get("entity").ok_or(OpError::MissingField {
        kind,
        field: "entity",
    })?;

    if let Some(id) = value.as_u64() {
        return Ok(id);
    }
    if let Some(f) = value.as_f64() {
        if f.is_finite() && f >= 0.0 && f.fract() == 0.0 {
            return Ok(f as u64);
        }
    }
    Err(OpError::Malformed {
        kind,
        reason: format!("entity id {} is not a non-negative integer", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_kind_is_reported_not_malformed() {
        let err = PatchOp::interpret(&json!({ "op": "set_resource_blob", "tag": "x" })).unwrap_err();
        assert!(matches!(err, OpError::UnknownKind(k) if k == "set_resource_blob"));
    }

    #[test]
    fn missing_tag_is_malformed() {
        let err = PatchOp::interpret(&json!({ "op": "set_resource_json", "value": "{}" })).unwrap_err();
        assert!(matches!(
            err,
            OpError::MissingField { field: "tag", .. }
        ));
    }

    #[test]
    fn non_scalar_value_is_malformed() {
        let err = PatchOp::interpret(&json!({
            "op": "set_resource_value", "tag": "t", "value": {"a": 1}
        }))
        .unwrap_err();
        assert!(matches!(err, OpError::Malformed { .. }));
    }

    #[test]
    fn fractional_entity_id_is_malformed() {
        let err = PatchOp::interpret(&json!({
            "op": "remove_component", "entity": 1.5, "component": "pose"
        }))
        .unwrap_err();
        assert!(matches!(err, OpError::Malformed { .. }));
    }

    #[test]
    fn inline_json_payload_is_reserialized() {
        let op = PatchOp::interpret(&json!({
            "op": "set_resource_json", "tag": "t", "value": {"columns": ["a"], "rows": [[1]]}
        }))
        .unwrap();
        match op {
            PatchOp::SetResourceJson { raw, .. } => {
                assert_eq!(raw, r#"{"columns":["a"],"rows":[[1]]}"#);
            }
            other => panic!("unexpected op {:?}", other),
        }
    }

    #[test]
    fn fixed64_must_be_finite_decimal() {
        let err = PatchOp::interpret(&json!({
            "op": "set_resource_fixed64", "tag": "view.zoom", "value": "not-a-number"
        }))
        .unwrap_err();
        assert!(matches!(err, OpError::Malformed { .. }));

        let op = PatchOp::interpret(&json!({
            "op": "set_resource_fixed64", "tag": "view.zoom", "value": "1.25"
        }))
        .unwrap();
        assert_eq!(
            op,
            PatchOp::SetResourceFixed64 {
                tag: "view.zoom".to_string(),
                value: "1.25".to_string()
            }
        );
    }
}
