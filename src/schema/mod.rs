mod coerce;


pub use coerce::{coerce, verify_json_safe};

use std::collections::BTreeMap;

/// Declared primitive type of a schema field. Schema producers are
/// untrusted, so anything we do not recognize parses as `None` on the
/// property rather than failing the whole schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Integer => "integer",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "string" => Some(PropertyType::String),
            "integer" => Some(PropertyType::Integer),
            "number" => Some(PropertyType::Number),
            "boolean" => Some(PropertyType::Boolean),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, PropertyType::Integer | PropertyType::Number)
    }
}

fn lenient_type<'de, D>(deserializer: D) -> Result<Option<PropertyType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = serde::Deserialize::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(PropertyType::from_wire))
}

/// One declared input field of a model. Constructed once per
/// model-detail load and immutable afterwards.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct InputProperty {
    #[serde(rename = "type", default, deserialize_with = "lenient_type")]
    pub property_type: Option<PropertyType>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    #[serde(rename = "enum", default)]
    pub enum_values: Option<Vec<String>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
    #[serde(default)]
    pub format: Option<String>,
}

impl InputProperty {
    /// Display label, falling back to the field key.
    pub fn label<'a>(&'a self, key: &'a str) -> &'a str {
        self.title.as_deref().unwrap_or(key)
    }

    pub fn has_bounds(&self) -> bool {
        self.minimum.is_some() && self.maximum.is_some()
    }
}

/// A model's declared input schema: a JSON-Schema-like document with
/// `type`, `properties`, and `required`. `required` may name keys that
/// do not exist in `properties`; those are kept and treated as
/// unsatisfiable downstream.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type", default)]
    pub schema_type: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, InputProperty>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl InputSchema {
    pub fn is_required(&self, key: &str) -> bool {
        self.required.iter().any(|k| k == key)
    }
}

/// Fully coerced, JSON-safe input value. Every submission payload is
/// built from these; no opaque native types survive past coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Num(f64),
    List(Vec<InputValue>),
    Map(BTreeMap<String, InputValue>),
}

impl InputValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            InputValue::Str(s) => serde_json::Value::String(s.clone()),
            InputValue::Bool(b) => serde_json::Value::Bool(*b),
            InputValue::Int(i) => serde_json::Value::from(*i),
            InputValue::Num(n) => {
                serde_json::Number::from_f64(*n).map_or(serde_json::Value::Null, serde_json::Value::Number)
            }
            InputValue::List(items) => {
                serde_json::Value::Array(items.iter().map(InputValue::to_json).collect())
            }
            InputValue::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}
