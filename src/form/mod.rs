mod image;

#[cfg(test)]
mod tests;

pub use image::encode_image_data_uri;

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::schema::{InputProperty, InputSchema, PropertyType, coerce, verify_json_safe};

pub const REQUIRED_FIELD_MESSAGE: &str = "This field is required";

/// Description length above which a text field renders multi-line.
const MULTILINE_THRESHOLD: usize = 100;

/// The control the form renders for one field, with its initial value
/// already resolved from the property's default.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Choice { options: Vec<String>, initial: String },
    Toggle { initial: bool },
    Slider { min: f64, max: f64, step: f64, initial: f64 },
    NumberEntry { initial: f64 },
    ImagePicker,
    TextEntry { multiline: bool, initial: String },
}

/// Why a submission attempt was rejected before reaching the network.
#[derive(Debug, Clone, PartialEq)]
pub enum FormError {
    /// Per-field validation failures, keyed by field name.
    Fields(BTreeMap<String, String>),
    /// The assembled payload failed the JSON round-trip gate.
    InvalidData,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormError::Fields(errors) => write!(f, "{} field(s) failed validation", errors.len()),
            FormError::InvalidData => write!(f, "Invalid input data"),
        }
    }
}

impl std::error::Error for FormError {}

/// Presentation order: every required key first (stable in the order
/// the schema declared them), then the remaining keys ascending.
/// Required keys that do not exist in `properties` are not rendered.
pub fn ordered_fields(schema: &InputSchema) -> Vec<String> {
    let mut out: Vec<String> = schema
        .required
        .iter()
        .filter(|k| schema.properties.contains_key(*k))
        .cloned()
        .collect();
    // BTreeMap iteration is already ascending lexical.
    for key in schema.properties.keys() {
        if !schema.is_required(key) {
            out.push(key.clone());
        }
    }
    out
}

/// Select the control for a field. Priority: enum, boolean, numeric,
/// asset format, free text.
pub fn control_for(property: &InputProperty) -> ControlKind {
    if let Some(options) = property.enum_values.as_ref().filter(|e| !e.is_empty()) {
        let initial = property
            .default
            .as_ref()
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| options[0].clone());
        return ControlKind::Choice {
            options: options.clone(),
            initial,
        };
    }

    match property.property_type {
        Some(PropertyType::Boolean) => {
            let initial = property
                .default
                .as_ref()
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            ControlKind::Toggle { initial }
        }
        Some(t) if t.is_numeric() => {
            let default = property.default.as_ref().and_then(|v| v.as_f64());
            match (property.minimum, property.maximum) {
                (Some(min), Some(max)) => ControlKind::Slider {
                    min,
                    max,
                    step: 1.0,
                    initial: default.unwrap_or(min).clamp(min, max),
                },
                _ => ControlKind::NumberEntry {
                    initial: default.unwrap_or(0.0),
                },
            }
        }
        _ => {
            if matches!(property.format.as_deref(), Some("uri") | Some("data-url")) {
                return ControlKind::ImagePicker;
            }
            let multiline = property
                .description
                .as_ref()
                .is_some_and(|d| d.len() > MULTILINE_THRESHOLD);
            let initial = property
                .default
                .as_ref()
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            ControlKind::TextEntry { multiline, initial }
        }
    }
}

/// A raw value counts as present when it is neither null nor an empty
/// string. An empty string never satisfies a required field.
fn is_present(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// One form session over a model's schema: the user's raw edits plus
/// the current validation errors. Created when the schema loads,
/// cleared on successful submission or dismissal.
#[derive(Debug, Clone)]
pub struct FormSession {
    schema: InputSchema,
    values: BTreeMap<String, serde_json::Value>,
    errors: BTreeMap<String, String>,
}

impl FormSession {
    pub fn new(schema: InputSchema) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &InputSchema {
        &self.schema
    }

    pub fn set_value(&mut self, key: &str, value: serde_json::Value) {
        self.errors.remove(key);
        self.values.insert(key.to_string(), value);
    }

    pub fn clear_value(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// Drop all edits and errors. Called after a successful submit or
    /// when the form is dismissed.
    pub fn reset(&mut self) {
        self.values.clear();
        self.errors.clear();
    }

    /// Check every required field. Satisfied means a present FormState
    /// value or a declared default; required keys absent from
    /// `properties` are unsatisfiable. Returns true when submission
    /// may proceed.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();
        for key in &self.schema.required {
            let entered = self.values.get(key).is_some_and(is_present);
            let has_default = self
                .schema
                .properties
                .get(key)
                .is_some_and(|p| p.default.is_some());
            if !entered && !has_default {
                self.errors
                    .insert(key.clone(), REQUIRED_FIELD_MESSAGE.to_string());
            }
        }
        self.errors.is_empty()
    }

    /// Validate, assemble, coerce, and JSON-gate the submission
    /// payload. All-or-nothing: any required-field error blocks the
    /// whole submit.
    pub fn build_payload(&mut self) -> Result<serde_json::Value, FormError> {
        if !self.validate() {
            return Err(FormError::Fields(self.errors.clone()));
        }

        let mut payload = serde_json::Map::new();
        for (key, property) in &self.schema.properties {
            let candidate = match self.values.get(key) {
                Some(v) if is_present(v) => Some(v),
                _ => property.default.as_ref(),
            };
            let Some(raw) = candidate else { continue };
            match coerce(raw) {
                Some(value) => {
                    payload.insert(key.clone(), value.to_json());
                }
                None => {
                    // Unsupported shape: treated as absent. Required
                    // fields without a surviving value were already
                    // rejected by validate().
                    debug!(field = %key, "dropping uncoercible form value");
                }
            }
        }

        let assembled = serde_json::Value::Object(payload);
        verify_json_safe(&assembled).map_err(|_| FormError::InvalidData)
    }
}
