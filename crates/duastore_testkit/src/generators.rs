//! Property-based test generators using proptest.
//!
//! Provides strategies for generating record values and payloads.

use duastore_codec::{Document, Value};
use duastore_core::Collection;
use proptest::prelude::*;

/// Strategy for generating scalar values (no arrays or maps).
pub fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-zA-Z0-9 ]{0,16}".prop_map(Value::Text),
    ]
}

/// Strategy for generating nested values up to a few levels deep.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(Value::Map),
        ]
    })
}

/// Strategy for generating record content, without system fields.
pub fn content_strategy() -> impl Strategy<Value = Document> {
    prop::collection::btree_map("[a-z]{1,8}", value_strategy(), 0..6)
        .prop_map(|mut doc| {
            doc.remove("id");
            doc.remove("version");
            doc
        })
}

/// Strategy for generating a write payload with a non-blank text id.
pub fn identified_payload_strategy() -> impl Strategy<Value = (String, Document)> {
    ("[a-z0-9]{1,8}", content_strategy()).prop_map(|(id, content)| {
        let mut payload = content;
        payload.insert("id".to_string(), Value::Text(id.clone()));
        (id, payload)
    })
}

/// Strategy for picking a managed collection.
pub fn collection_strategy() -> impl Strategy<Value = Collection> {
    prop::sample::select(Collection::ALL.to_vec())
}
