//! Property tests for the write and read paths.

use duastore_codec::Value;
use duastore_core::{Collection, DeltaFeed, EngineConfig, UpsertEngine, WriteKind};
use duastore_storage::InMemoryStore;
use duastore_testkit::prelude::*;
use proptest::prelude::*;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn rewriting_same_content_is_a_no_op(
        collection in collection_strategy(),
        (id, payload) in identified_payload_strategy(),
    ) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(fixed_clock());
        let engine = UpsertEngine::new(store.clone(), clock.clone(), EngineConfig::default());

        let (first, second) = runtime().block_on(async {
            let first = engine.upsert(collection, payload.clone()).await.unwrap();
            clock.advance(1_000);
            let second = engine.upsert(collection, payload).await.unwrap();
            (first, second)
        });

        prop_assert_eq!(first.kind, WriteKind::Inserted);
        prop_assert_eq!(second.kind, WriteKind::Unchanged);
        prop_assert_eq!(&second.record.id, &id);
        prop_assert_eq!(second.record.version, first.record.version);
        prop_assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn changed_content_is_delivered_once(
        (id, payload) in identified_payload_strategy(),
        extra in value_strategy(),
    ) {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(fixed_clock());
        let engine = UpsertEngine::new(store.clone(), clock.clone(), EngineConfig::default());
        let feed = DeltaFeed::new(store);

        let mut changed = payload.clone();
        changed.insert("zz_extra".to_string(), extra);

        let (after_first, after_change, after_all) = runtime().block_on(async {
            let first = engine.upsert(Collection::Duas, payload).await.unwrap();
            let after_first = feed
                .changes_since(Collection::Duas, Some(first.record.version))
                .await
                .unwrap();
            clock.advance(1);
            let second = engine.upsert(Collection::Duas, changed).await.unwrap();
            let after_change = feed
                .changes_since(Collection::Duas, Some(first.record.version))
                .await
                .unwrap();
            let after_all = feed
                .changes_since(Collection::Duas, Some(second.record.version))
                .await
                .unwrap();
            (after_first, after_change, after_all)
        });

        prop_assert!(after_first.is_empty());
        prop_assert_eq!(after_change.len(), 1);
        prop_assert_eq!(&after_change[0].id, &id);
        prop_assert!(after_change[0].fields.contains_key("zz_extra"));
        prop_assert!(after_all.is_empty());
    }

    #[test]
    fn deep_equality_is_reflexive_on_generated_values(value in value_strategy()) {
        prop_assert!(value.is_same(&value.clone()));
        prop_assert!(!value.is_same(&Value::Array(vec![value.clone(), Value::Null])));
    }
}
