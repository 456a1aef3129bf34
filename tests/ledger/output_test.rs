//! Module 3: Owned Output Tests
//!
//! Construction invariants, identity, age, effective locks and the
//! conversion from engine records.

use wallet_ledger::ledger::{OutputError, OwnedOutput, OwnedOutputRecord, TimeLock};

use chrono::Duration;
use wallet_ledger::ledger::{calculate_balance, is_spendable, TimeSpan};

use crate::common::{genesis_instant, output, record, spent_output, tip};

/// Test 3.1: Malformed outputs are rejected at construction
#[test]
fn test_new_rejects_invalid_outputs() {
    let cases: Vec<(&str, Result<OwnedOutput, OutputError>)> = vec![
        ("empty id", OwnedOutput::new(Vec::<u8>::new(), 100, 1000, 0)),
        ("zero amount", OwnedOutput::new(vec![0xaa], 0, 1000, 0)),
        ("spent in discovery block", OwnedOutput::new(vec![0xaa], 100, 1000, 1000)),
        ("spent before discovery", OwnedOutput::new(vec![0xaa], 100, 1000, 999)),
    ];

    for (case, result) in cases {
        assert!(
            matches!(result, Err(OutputError::InvalidOutput(_))),
            "Expected InvalidOutput for {}, got: {:?}",
            case,
            result
        );
    }
}

/// Test 3.2: Valid spent and unspent outputs are accepted
#[test]
fn test_new_accepts_valid_outputs() {
    let unspent = OwnedOutput::new(vec![0xaa], 100, 1000, 0).expect("Unspent output should be valid");
    assert!(!unspent.is_spent());
    assert_eq!(unspent.spent_height(), 0);

    let spent = spent_output(0xbb, 50, 900, 950);
    assert!(spent.is_spent());
    assert_eq!(spent.amount(), 50);
    assert_eq!(spent.block_height(), 900);
}

/// Test 3.3: Age counts blocks since discovery and never underflows
#[test]
fn test_age() {
    let out = output(0xaa, 100, 1000);

    assert_eq!(out.age(1005), 5);
    assert_eq!(out.age(1000), 0);
    assert_eq!(out.age(990), 0, "An output above the tip should have age 0");
}

/// Test 3.4: Identity depends on the identifier only
#[test]
fn test_identity_is_by_identifier() {
    let original = output(0xaa, 100, 1000);
    let respent = spent_output(0xaa, 100, 1000, 1020);
    let other = output(0xbb, 100, 1000);

    assert!(original.same_output(&respent), "Same id should denote the same output");
    assert!(!original.fields_eq(&respent), "Spent height differs");
    assert!(!original.same_output(&other));
    assert!(original.fields_eq(&original.clone()));
    assert_eq!(original.id().to_hex(), "aa");
}

/// Test 3.5: The effective lock is the later of declared and maturation
#[test]
fn test_time_locked_applies_maturation_window() {
    let fresh = output(0xaa, 100, 1000).time_locked(TimeLock::Unlocked, 10);
    assert_eq!(fresh.lock, TimeLock::ByHeight(1010));

    let declared = output(0xbb, 100, 1000).time_locked(TimeLock::ByHeight(2000), 10);
    assert_eq!(declared.lock, TimeLock::ByHeight(2000));

    let early = output(0xcc, 100, 1000).time_locked(TimeLock::ByHeight(1001), 10);
    assert_eq!(
        early.lock,
        TimeLock::ByHeight(1010),
        "A declared lock inside the window should not shorten maturation"
    );
}

/// Test 3.6: Engine records convert into validated outputs
#[test]
fn test_record_conversion() {
    let out = OwnedOutput::try_from(&record("deadbeef", 100, 1000, 1020, 0))
        .expect("Valid record should convert");
    assert_eq!(out.id().as_bytes(), &[0xde, 0xad, 0xbe, 0xef]);
    assert_eq!(out.spent_height(), 1020);

    let back = OwnedOutputRecord::from(&out);
    assert_eq!(back, record("deadbeef", 100, 1000, 1020, 0));

    assert_eq!(
        record("aa", 100, 1000, 0, 1500).declared_lock(),
        TimeLock::ByHeight(1500)
    );
}

/// Test 3.7: Malformed records are rejected
#[test]
fn test_record_conversion_rejects_invalid_records() {
    let cases = vec![
        ("bad hex", record("zz", 100, 1000, 0, 0)),
        ("negative amount", record("aa", -1, 1000, 0, 0)),
        ("negative height", record("aa", 100, -5, 0, 0)),
        ("spent before discovery", record("aa", 100, 1000, 900, 0)),
    ];

    for (case, rec) in cases {
        let result = OwnedOutput::try_from(rec);
        assert!(
            matches!(result, Err(OutputError::InvalidOutput(_))),
            "Expected InvalidOutput for {}, got: {:?}",
            case,
            result
        );
    }
}

/// Test 3.8: Records without optional fields deserialize as unspent and unlocked
#[test]
fn test_record_defaults() {
    let rec: OwnedOutputRecord =
        serde_json::from_str(r#"{"tx_id":"aa","amount":100,"block_height":1000}"#)
            .expect("Failed to parse record");

    assert_eq!(rec.spent_height, 0);
    assert_eq!(rec.unlock_time, 0);
    assert_eq!(rec.declared_lock(), TimeLock::Unlocked);
}

/// Test 3.9: A date lock does not cancel the maturation window
#[test]
fn test_date_lock_keeps_maturation_window() {
    let t0 = genesis_instant();
    let locked = output(0xaa, 100, 1000).time_locked(TimeLock::ByDate(t0 + Duration::hours(1)), 10);

    assert_eq!(
        locked.lock,
        TimeLock::ByHeightAndDate {
            height: 1010,
            date: t0 + Duration::hours(1),
        }
    );

    // Past the date but still inside the window
    let tip = tip(1000).retarget(Some(1005), Some(t0 + Duration::hours(2)));
    assert!(!is_spendable(&locked, &tip), "Output should still be maturing");

    let outputs = vec![locked];
    let balance = calculate_balance(&outputs, &tip);
    assert_eq!(balance.confirmed_amount, 0);
    assert_eq!(balance.locked_amounts.get(&TimeSpan::Blocks(5)), Some(&100));
}

/// Test 3.10: Only outputs discovered by a height have been received
#[test]
fn test_is_received_by() {
    let out = output(0xaa, 100, 1000);

    assert!(out.is_received_by(1000));
    assert!(out.is_received_by(1200));
    assert!(!out.is_received_by(999));
}
