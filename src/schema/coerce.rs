use std::collections::BTreeMap;

use anyhow::{Result, bail};

use super::InputValue;

/// Deterministic coercion of a raw user-entered JSON value into the
/// `InputValue` sum type. Shapes we cannot represent are dropped
/// (`None`) rather than failing the whole form; a required field whose
/// value drops is then caught by required-field validation.
pub fn coerce(raw: &serde_json::Value) -> Option<InputValue> {
    match raw {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(InputValue::Bool(*b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(InputValue::Int(i))
            } else {
                n.as_f64().map(InputValue::Num)
            }
        }
        serde_json::Value::String(s) => Some(InputValue::Str(s.clone())),
        serde_json::Value::Array(items) => {
            Some(InputValue::List(items.iter().filter_map(coerce).collect()))
        }
        serde_json::Value::Object(entries) => {
            let coerced: BTreeMap<String, InputValue> = entries
                .iter()
                .filter_map(|(k, v)| coerce(v).map(|cv| (k.clone(), cv)))
                .collect();
            Some(InputValue::Map(coerced))
        }
    }
}

/// JSON-safety gate: serialize the assembled payload and parse it
/// back, requiring a deep-equal result. Anything that fails here is a
/// hard "Invalid input data" error, never a silent submit.
pub fn verify_json_safe(payload: &serde_json::Value) -> Result<serde_json::Value> {
    let text = serde_json::to_string(payload)?;
    let parsed: serde_json::Value = serde_json::from_str(&text)?;
    if &parsed != payload {
        bail!("Invalid input data");
    }
    Ok(parsed)
}
