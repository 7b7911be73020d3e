use super::schema;
use crate::form::ordered_fields;

#[test]
fn required_fields_come_first_in_declared_order() {
    let s = schema(serde_json::json!({
        "properties": {
            "width": {}, "prompt": {}, "seed": {}, "zoom": {}, "aspect": {}
        },
        "required": ["seed", "prompt"]
    }));
    assert_eq!(
        ordered_fields(&s),
        vec!["seed", "prompt", "aspect", "width", "zoom"]
    );
}

#[test]
fn optional_fields_sort_lexically() {
    let s = schema(serde_json::json!({
        "properties": { "b": {}, "a": {}, "c": {} },
        "required": []
    }));
    assert_eq!(ordered_fields(&s), vec!["a", "b", "c"]);
}

#[test]
fn unknown_required_keys_are_not_rendered() {
    let s = schema(serde_json::json!({
        "properties": { "prompt": {} },
        "required": ["prompt", "ghost"]
    }));
    assert_eq!(ordered_fields(&s), vec!["prompt"]);
}

#[test]
fn every_required_key_precedes_every_optional_key() {
    let s = schema(serde_json::json!({
        "properties": {
            "alpha": {}, "beta": {}, "gamma": {}, "delta": {}
        },
        "required": ["gamma", "beta"]
    }));
    let order = ordered_fields(&s);
    let boundary = order.iter().position(|k| k == "alpha").unwrap();
    for key in &order[..boundary] {
        assert!(s.is_required(key), "{key} should be required");
    }
    for key in &order[boundary..] {
        assert!(!s.is_required(key), "{key} should be optional");
    }
}
