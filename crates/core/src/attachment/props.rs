//! Property-based tests for the attachment hooks.
//!
//! The hooks run against the OpenDAL memory service on a current-thread
//! runtime, one runtime per generated case.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use proptest::prelude::*;

use super::*;
use crate::clock::FixedClock;
use crate::message::{Message, TimeToLive};
use crate::storage::{BlobRef, BlobStore, OpendalBlobStore, StorageProvider};

const REFERENCE: &str = AttachmentConfig::DEFAULT_REFERENCE_PROPERTY_NAME;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime")
}

fn claim_check(threshold: usize, now: DateTime<Utc>) -> ClaimCheck<OpendalBlobStore> {
    ClaimCheck::new(
        AttachmentConfig::new(StorageProvider::Memory, move |m: &Message| {
            m.body.len() > threshold
        }),
        || OpendalBlobStore::from_provider(&StorageProvider::Memory),
        FixedClock::new(now),
    )
    .expect("valid config")
}

/// Strategy for clock readings between 2000 and 2100, microsecond aligned.
fn arb_now() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800_000_000i64..4_102_444_800_000_000)
        .prop_map(|micros| DateTime::<Utc>::from_timestamp_micros(micros).unwrap())
}

/// Strategy for TTLs up to ten years, including the infinite sentinel.
fn arb_ttl() -> impl Strategy<Value = TimeToLive> {
    prop_oneof![
        Just(TimeToLive::Infinite),
        (0u64..315_360_000_000_000).prop_map(|micros| TimeToLive::Finite(Duration::from_micros(micros))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // =========================================================================
    // Round trip: after_receive(before_send(m)).body == m.body
    // =========================================================================
    #[test]
    fn prop_round_trip_restores_body(
        body in proptest::collection::vec(any::<u8>(), 0..4096),
        threshold in 0usize..4096,
        ttl in arb_ttl(),
        now in arb_now(),
    ) {
        let cc = claim_check(threshold, now);
        let mut message = Message::new(body.clone()).with_time_to_live(ttl);
        let offloaded = body.len() > threshold;
        let rt = runtime();

        rt.block_on(async {
            cc.writer().before_send(&mut message).await.unwrap();
        });
        prop_assert_eq!(message.body.is_empty(), offloaded || body.is_empty());
        prop_assert_eq!(message.user_properties.contains_key(REFERENCE), offloaded);

        rt.block_on(async {
            cc.reader().after_receive(&mut message).await.unwrap();
        });
        prop_assert_eq!(message.body.as_ref(), body.as_slice());
    }

    // =========================================================================
    // Expiry: _ValidUntilUtc == now + ttl, absent for infinite TTL
    // =========================================================================
    #[test]
    fn prop_valid_until_matches_clock_plus_ttl(
        ttl in arb_ttl(),
        now in arb_now(),
    ) {
        let cc = claim_check(0, now);
        let mut message = Message::new(vec![1u8, 2, 3]).with_time_to_live(ttl);

        let metadata = runtime().block_on(async {
            cc.writer().before_send(&mut message).await.unwrap();
            let name = message.property_str(REFERENCE).unwrap();
            let blob = BlobRef::new(AttachmentConfig::DEFAULT_CONTAINER_NAME, name);
            let attributes = cc.store().unwrap().fetch_attributes(&blob).await.unwrap();
            AttachmentMetadata::from_attributes(&blob, &attributes).unwrap()
        });

        let expected = ttl
            .as_duration()
            .map(|d| now + TimeDelta::from_std(d).unwrap());
        prop_assert_eq!(metadata.valid_until, expected);
    }
}
