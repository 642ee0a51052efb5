//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check key composition, TTL truncation and reply conversion.

use proptest::prelude::*;
use std::time::Duration;

use bb8::Pool;
use redis::Value;
use redis_test::{MockCmd, MockRedisConnection};

use crate::cache::test_support::MockManager;
use crate::cache::{namespaced_key, CacheClient, FromReply, DEFAULT_SEPARATOR};

// == Strategies ==
/// Generates base keys without the separator
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_-]{1,32}".prop_map(|s| s)
}

/// Generates namespace segment lists, possibly empty
fn namespace_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-zA-Z0-9_-]{1,16}", 0..4)
}

/// Generates separators that never occur in generated keys or segments
fn separator_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(":".to_string()),
        Just("::".to_string()),
        Just("/".to_string()),
        Just(".".to_string()),
    ]
}

fn as_refs(segments: &[String]) -> Vec<&str> {
    segments.iter().map(String::as_str).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // The base key is always the last segment, preceded by every namespace
    // segment in order.
    #[test]
    fn prop_key_layout(
        key in key_strategy(),
        namespace in namespace_strategy(),
        separator in separator_strategy()
    ) {
        let refs = as_refs(&namespace);
        let built = namespaced_key(&separator, &key, &refs);

        let parts: Vec<&str> = built.split(separator.as_str()).collect();
        prop_assert_eq!(parts.len(), namespace.len() + 1);
        prop_assert_eq!(*parts.last().unwrap(), key.as_str());
        for (part, segment) in parts.iter().zip(&namespace) {
            prop_assert_eq!(*part, segment.as_str());
        }
    }

    // A namespaced write never lands on the un-namespaced key.
    #[test]
    fn prop_namespace_changes_effective_key(
        key in key_strategy(),
        namespace in prop::collection::vec("[a-zA-Z0-9_-]{1,16}", 1..4)
    ) {
        let refs = as_refs(&namespace);
        let plain = namespaced_key(DEFAULT_SEPARATOR, &key, &[]);
        let scoped = namespaced_key(DEFAULT_SEPARATOR, &key, &refs);

        prop_assert_eq!(plain.as_ref(), key.as_str());
        prop_assert_ne!(plain, scoped);
    }

    // Integer text round-trips through the int getter.
    #[test]
    fn prop_int_text_converts(n in any::<i64>()) {
        let reply = Value::BulkString(n.to_string().into_bytes());
        prop_assert_eq!(i64::from_reply(reply), Ok(Some(n)));
    }

    // Any UTF-8 text comes back unchanged from the string getter.
    #[test]
    fn prop_string_passes_through(text in ".{0,64}") {
        let reply = Value::BulkString(text.clone().into_bytes());
        prop_assert_eq!(String::from_reply(reply), Ok(Some(text)));
    }
}

// Each case builds a runtime and a pool, so keep the count small
proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // SETEX receives the TTL truncated to whole seconds, never rounded.
    #[test]
    fn prop_set_ex_truncates_ttl(
        key in key_strategy(),
        namespace in namespace_strategy(),
        millis in 0u64..10_000_000
    ) {
        let refs = as_refs(&namespace);
        let effective = namespaced_key(DEFAULT_SEPARATOR, &key, &refs).into_owned();
        let conn = MockRedisConnection::new(vec![MockCmd::new(
            redis::cmd("SETEX").arg(&effective).arg(millis / 1000).arg("value"),
            Ok(Value::Okay),
        )]);

        let rt = tokio::runtime::Runtime::new().unwrap();
        let result = rt.block_on(async {
            let pool = Pool::builder()
                .max_size(1)
                .build(MockManager { conn: conn.clone() })
                .await
                .unwrap();
            let client = CacheClient::from_pool(pool);
            client
                .set_ex(&key, "value", Duration::from_millis(millis), &refs)
                .await
        });

        prop_assert!(result.is_ok(), "SETEX failed: {:?}", result);
        prop_assert!(conn.is_empty());
    }
}
