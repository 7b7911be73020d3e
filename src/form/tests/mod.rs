mod ordering;

use crate::schema::InputSchema;

pub(crate) fn schema(raw: serde_json::Value) -> InputSchema {
    serde_json::from_value(raw).unwrap()
}
