//! Property tests for request signatures.

use proptest::prelude::*;

use simple_rest::auth::{calculate_signature, SignatureAuth, SignatureError, MAX_CLOCK_SKEW};
use simple_rest::Params;

fn params_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map("[a-z]{1,8}", "[ -~]{0,16}", 0..8)
        .prop_map(|map| map.into_iter().collect())
}

proptest! {
    #[test]
    fn prop_signature_is_deterministic(
        key in "[ -~]{1,32}",
        pairs in params_strategy(),
        t in 0i64..4_000_000_000,
    ) {
        let data: Params = pairs.iter().cloned().collect();
        prop_assert_eq!(
            calculate_signature(&key, &data, Some(t)),
            calculate_signature(&key, &data, Some(t))
        );
    }

    #[test]
    fn prop_insertion_order_is_irrelevant(
        key in "[ -~]{1,32}",
        pairs in params_strategy(),
        t in 0i64..4_000_000_000,
    ) {
        let forward: Params = pairs.iter().cloned().collect();
        let backward: Params = pairs.iter().rev().cloned().collect();
        prop_assert_eq!(
            calculate_signature(&key, &forward, Some(t)),
            calculate_signature(&key, &backward, Some(t))
        );
    }

    #[test]
    fn prop_timestamp_change_changes_signature(
        key in "[ -~]{1,32}",
        pairs in params_strategy(),
        t in 0i64..4_000_000_000,
    ) {
        let data: Params = pairs.iter().cloned().collect();
        prop_assert_ne!(
            calculate_signature(&key, &data, Some(t)),
            calculate_signature(&key, &data, Some(t + 1))
        );
    }

    #[test]
    fn prop_replay_window(
        pairs in params_strategy(),
        t in 1_000_000i64..4_000_000_000,
        offset in -1000i64..1000,
    ) {
        let auth = SignatureAuth::new("window-secret");
        let data: Params = pairs.iter().cloned().collect();
        let sig = auth.sign_at(&data, t);

        let result = auth.verify_at(&data, &sig, t, t + offset);
        if offset.unsigned_abs() <= MAX_CLOCK_SKEW.as_secs() {
            prop_assert!(result.is_ok());
        } else {
            let is_expired = matches!(result, Err(SignatureError::Expired { .. }));
            prop_assert!(is_expired);
        }
    }
}
