//! Module 1: Blockchain Time Tests
//!
//! Height/instant conversion through an anchor, cross-domain comparison
//! and the spans between two points.

use std::cmp::Ordering;

use chrono::Duration;
use wallet_ledger::ledger::{Anchor, BlockchainTime, TimeError, TimeSpan};

use crate::common::{genesis_instant, tip, tip_with_interval};

/// Test 1.1: Estimated heights round towards the past
#[test]
fn test_estimate_height_floors_partial_blocks() {
    let anchor = tip(1000);
    let t0 = genesis_instant();

    assert_eq!(anchor.estimate_height(t0), 1000);
    assert_eq!(anchor.estimate_height(t0 + Duration::seconds(119)), 1000);
    assert_eq!(anchor.estimate_height(t0 + Duration::seconds(120)), 1001);
    assert_eq!(
        anchor.estimate_height(t0 - Duration::seconds(1)),
        999,
        "An instant just before the anchor belongs to the previous block"
    );
}

/// Test 1.2: Estimated heights never go below zero
#[test]
fn test_estimate_height_clamps_at_zero() {
    let anchor = tip(5);
    let long_before = genesis_instant() - Duration::days(1);

    assert_eq!(anchor.estimate_height(long_before), 0);
}

/// Test 1.3: Estimated instants follow the block interval
#[test]
fn test_estimate_instant_uses_block_interval() {
    let t0 = genesis_instant();

    assert_eq!(tip(1000).estimate_instant(1010), t0 + Duration::minutes(20));
    assert_eq!(tip(1000).estimate_instant(990), t0 - Duration::minutes(20));
    assert_eq!(
        tip_with_interval(1000, 60).estimate_instant(1010),
        t0 + Duration::minutes(10)
    );
}

/// Test 1.4: An anchor needs a positive block interval
#[test]
fn test_anchor_rejects_non_positive_interval() {
    let result = Anchor::new(1000, genesis_instant(), Duration::zero());
    assert!(
        matches!(result, Err(TimeError::InvalidBlockInterval(_))),
        "Zero interval should be rejected, got: {:?}",
        result
    );

    let result = Anchor::new(1000, genesis_instant(), Duration::seconds(-120));
    assert!(matches!(result, Err(TimeError::InvalidBlockInterval(_))));
}

/// Test 1.5: Values of the same kind compare without an anchor
#[test]
fn test_compare_same_domain_without_anchor() {
    let t0 = genesis_instant();

    assert_eq!(
        BlockchainTime::Height(5).compare(&BlockchainTime::Height(7), None),
        Ok(Ordering::Less)
    );
    assert_eq!(
        BlockchainTime::Instant(t0 + Duration::hours(1))
            .compare(&BlockchainTime::Instant(t0), None),
        Ok(Ordering::Greater)
    );
}

/// Test 1.6: Comparing a height with an instant needs an anchor
#[test]
fn test_compare_cross_domain_without_anchor_fails() {
    let height = BlockchainTime::from_height(1010);
    let instant = BlockchainTime::from_instant(genesis_instant());

    assert_eq!(height.compare(&instant, None), Err(TimeError::MissingAnchor));
    assert_eq!(instant.compare(&height, None), Err(TimeError::MissingAnchor));
}

/// Test 1.7: Cross-domain comparison goes through the anchor
#[test]
fn test_compare_cross_domain_with_anchor() {
    let anchor = tip(1000);
    let at_1010 = BlockchainTime::Instant(genesis_instant() + Duration::minutes(20));

    assert_eq!(
        BlockchainTime::Height(1010).compare(&at_1010, Some(&anchor)),
        Ok(Ordering::Equal)
    );
    assert_eq!(
        BlockchainTime::Height(1009).compare(&at_1010, Some(&anchor)),
        Ok(Ordering::Less)
    );
    assert_eq!(
        at_1010.compare(&BlockchainTime::Height(1011), Some(&anchor)),
        Ok(Ordering::Less)
    );
}

/// Test 1.8: Spans are measured in the domain of the target
#[test]
fn test_span_until_uses_target_domain() {
    let anchor = tip(1000);
    let t0 = genesis_instant();

    assert_eq!(
        BlockchainTime::Height(1000).span_until(&BlockchainTime::Height(1010), None),
        Ok(TimeSpan::Blocks(10))
    );
    assert_eq!(
        BlockchainTime::Height(1000)
            .span_until(&BlockchainTime::Instant(t0 + Duration::hours(1)), Some(&anchor)),
        Ok(TimeSpan::Duration(Duration::hours(1)))
    );
    assert_eq!(
        BlockchainTime::Height(1020).span_until(&BlockchainTime::Height(1010), None),
        Ok(TimeSpan::Blocks(0)),
        "A target in the past should give an empty span"
    );
}

/// Test 1.9: Human-readable spans
#[test]
fn test_time_span_display() {
    assert_eq!(TimeSpan::Blocks(1).to_string(), "1 block");
    assert_eq!(TimeSpan::Blocks(5).to_string(), "5 blocks");
    assert_eq!(TimeSpan::Duration(Duration::seconds(45)).to_string(), "45s");
    assert_eq!(TimeSpan::Duration(Duration::minutes(90)).to_string(), "1h 30m");
    assert_eq!(
        TimeSpan::Duration(Duration::days(2) + Duration::hours(3)).to_string(),
        "2d 3h"
    );
}

/// Test 1.10: Retargeting estimates the missing half of the tip
#[test]
fn test_anchor_retarget() {
    let anchor = tip(1000);
    let t0 = genesis_instant();

    assert_eq!(anchor.retarget(None, None), anchor);

    let by_height = anchor.retarget(Some(1030), None);
    assert_eq!(by_height.height(), 1030);
    assert_eq!(by_height.instant(), t0 + Duration::hours(1));

    let by_instant = anchor.retarget(None, Some(t0 + Duration::hours(1)));
    assert_eq!(by_instant.height(), 1030);
    assert_eq!(by_instant.block_interval(), anchor.block_interval());

    let advanced = anchor.advanced_by(30);
    assert_eq!(advanced, by_height);
}
