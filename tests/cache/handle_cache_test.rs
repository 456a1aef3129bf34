//! Module 5: Wallet Handle Cache Tests
//!
//! Drives the cache with an in-memory opener whose delay, failures and
//! panics are scripted per test.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use wallet_ledger::cache::{CacheError, SlotState, WalletHandleCache, WalletOpener};

use crate::cache::init_test_logger;

#[derive(Debug, thiserror::Error)]
#[error("wallet {0} is corrupt")]
struct OpenError(String);

#[derive(Debug)]
struct Handle {
    name: String,
    serial: usize,
}

/// What the opener does on a given attempt (1-based)
#[derive(Clone, Copy)]
enum Script {
    Succeed,
    FailFirst,
    PanicFirst,
}

#[derive(Clone)]
struct ScriptedOpener {
    opens: Arc<AtomicUsize>,
    delay: Duration,
    script: Script,
}

impl ScriptedOpener {
    fn new(delay: Duration, script: Script) -> Self {
        Self {
            opens: Arc::new(AtomicUsize::new(0)),
            delay,
            script,
        }
    }

    fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl WalletOpener<String> for ScriptedOpener {
    type Handle = Handle;
    type Error = OpenError;

    fn open(&self, key: &String) -> impl Future<Output = Result<Handle, OpenError>> + Send + 'static {
        let opens = Arc::clone(&self.opens);
        let delay = self.delay;
        let script = self.script;
        let name = key.clone();

        async move {
            let serial = opens.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::time::sleep(delay).await;

            match (script, serial) {
                (Script::FailFirst, 1) => Err(OpenError(name)),
                (Script::PanicFirst, 1) => panic!("opener crashed while opening {}", name),
                _ => Ok(Handle { name, serial }),
            }
        }
    }
}

/// Test 5.1: Concurrent callers share a single initialization
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_opens_once() {
    init_test_logger();

    let opener = ScriptedOpener::new(Duration::from_millis(50), Script::Succeed);
    let cache = Arc::new(WalletHandleCache::new(opener.clone()));

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get("w1".to_string()).await })
        })
        .collect();

    let mut handles = Vec::new();
    for task in tasks {
        let handle = task
            .await
            .expect("Task panicked")
            .expect("Initialization should succeed");
        handles.push(handle);
    }

    assert_eq!(opener.opens(), 1, "Exactly one initialization should run");
    assert_eq!(cache.initializations(), 1);
    assert!(
        handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])),
        "All callers should receive the same handle instance"
    );
    assert_eq!(handles[0].name, "w1");
    assert_eq!(cache.state(&"w1".to_string()), SlotState::Ready);
}

/// Test 5.2: A ready handle is returned without reopening
#[tokio::test]
async fn test_ready_handle_is_reused() {
    let opener = ScriptedOpener::new(Duration::from_millis(1), Script::Succeed);
    let cache = WalletHandleCache::new(opener.clone());

    let first = cache.get("w1".to_string()).await.expect("First get failed");
    let second = cache.get("w1".to_string()).await.expect("Second get failed");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(opener.opens(), 1);
}

/// Test 5.3: Distinct keys initialize independently
#[tokio::test]
async fn test_distinct_keys_open_separately() {
    let opener = ScriptedOpener::new(Duration::from_millis(1), Script::Succeed);
    let cache = WalletHandleCache::new(opener.clone());

    assert!(cache.is_empty());
    assert_eq!(cache.state(&"a".to_string()), SlotState::Empty);

    let a = cache.get("a".to_string()).await.expect("Failed to open a");
    let b = cache.get("b".to_string()).await.expect("Failed to open b");

    assert_eq!(a.name, "a");
    assert_eq!(b.name, "b");
    assert_eq!(opener.opens(), 2);
    assert_eq!(cache.len(), 2);
}

/// Test 5.4: All waiters see the failure; the next call tries again
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failure_reaches_all_waiters_then_retries() {
    init_test_logger();

    let opener = ScriptedOpener::new(Duration::from_millis(50), Script::FailFirst);
    let cache = Arc::new(WalletHandleCache::new(opener.clone()));

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get("w2".to_string()).await })
        })
        .collect();

    let mut errors = Vec::new();
    for task in tasks {
        match task.await.expect("Task panicked") {
            Err(CacheError::InitializationFailure(error)) => errors.push(error),
            other => panic!("Expected InitializationFailure, got: {:?}", other.map(|h| h.serial)),
        }
    }

    assert_eq!(opener.opens(), 1, "Waiters should share the failing attempt");
    assert!(
        errors.iter().all(|e| Arc::ptr_eq(e, &errors[0])),
        "All waiters should observe the same error"
    );
    assert_eq!(errors[0].to_string(), "wallet w2 is corrupt");
    assert_eq!(cache.state(&"w2".to_string()), SlotState::Failed);
    let recorded = cache
        .last_error(&"w2".to_string())
        .expect("Failed slot should keep its error");
    assert!(
        Arc::ptr_eq(&recorded, &errors[0]),
        "Recorded error should be the one waiters saw"
    );

    let handle = cache
        .get("w2".to_string())
        .await
        .expect("Retry after failure should succeed");

    assert_eq!(handle.serial, 2, "Failure should not be cached");
    assert_eq!(opener.opens(), 2);
    assert_eq!(cache.state(&"w2".to_string()), SlotState::Ready);
    assert!(
        cache.last_error(&"w2".to_string()).is_none(),
        "Successful retry should clear the error"
    );
}

/// Test 5.5: A caller that stops waiting does not cancel the initialization
#[tokio::test]
async fn test_cancelled_waiter_does_not_abort_initialization() {
    let opener = ScriptedOpener::new(Duration::from_millis(100), Script::Succeed);
    let cache = WalletHandleCache::new(opener.clone());

    let timed_out =
        tokio::time::timeout(Duration::from_millis(10), cache.get("w3".to_string())).await;
    assert!(timed_out.is_err(), "Get should not finish within 10ms");
    assert_eq!(cache.state(&"w3".to_string()), SlotState::InFlight);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        cache.state(&"w3".to_string()),
        SlotState::Ready,
        "Initialization should complete with no one waiting"
    );

    let handle = cache.get("w3".to_string()).await.expect("Get after completion failed");
    assert_eq!(handle.serial, 1);
    assert_eq!(opener.opens(), 1);
}

/// Test 5.6: A crashed initializer is reported and replaced
#[tokio::test]
async fn test_panicking_initializer_is_retried() {
    init_test_logger();

    let opener = ScriptedOpener::new(Duration::from_millis(1), Script::PanicFirst);
    let cache = WalletHandleCache::new(opener.clone());

    let result = cache.get("w4".to_string()).await;
    assert!(
        matches!(result, Err(CacheError::InitializerAborted)),
        "Expected InitializerAborted, got: {:?}",
        result.map(|h| h.serial)
    );

    let handle = cache
        .get("w4".to_string())
        .await
        .expect("Get after a crashed initializer should reopen");
    assert_eq!(handle.serial, 2);
    assert_eq!(cache.initializations(), 2);
}
