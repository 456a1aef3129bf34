//! Wallet handle cache
//!
//! Opens each wallet at most once, no matter how many callers ask for it
//! at the same time. Every key moves through an explicit state machine:
//!
//! ```text
//!  Empty ──get──▶ InFlight ──ok──▶ Ready
//!                    │
//!                    └──err──▶ Failed ──get──▶ InFlight
//! ```
//!
//! The key→slot map sits behind a single mutex; a missing slot is replaced
//! by an in-flight one in the same critical section that observed it
//! missing. The opening future runs on its own tokio task and reports
//! through a `watch` channel, so callers that stop waiting never cancel it.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

/// Source of wallet handles
///
/// `open` is called while the cache holds its lock: it must only build the
/// future and leave the expensive work to it.
pub trait WalletOpener<K>: Send + Sync + 'static {
    type Handle: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    fn open(
        &self,
        key: &K,
    ) -> impl Future<Output = Result<Self::Handle, Self::Error>> + Send + 'static;
}

/// Errors returned to callers of [`WalletHandleCache::get`]
#[derive(Debug, thiserror::Error)]
pub enum CacheError<E: std::error::Error + 'static> {
    /// The opener failed; every caller waiting on that attempt sees the
    /// same error
    #[error("Wallet initialization failed: {0}")]
    InitializationFailure(#[source] Arc<E>),

    /// The opening task ended without reporting (it panicked or the runtime
    /// shut down)
    #[error("Wallet initialization aborted before completing")]
    InitializerAborted,
}

/// Observable state of a cache slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Empty,
    InFlight,
    Ready,
    Failed,
}

type Outcome<H, E> = Result<Arc<H>, Arc<E>>;

enum Slot<H, E> {
    InFlight {
        attempt: u64,
        outcome: watch::Receiver<Option<Outcome<H, E>>>,
    },
    Ready(Arc<H>),
    Failed(Arc<E>),
}

type Slots<K, H, E> = Arc<Mutex<HashMap<K, Slot<H, E>>>>;

/// Memoizing, single-initialization cache of wallet handles
///
/// # Example
///
/// ```ignore
/// let cache = WalletHandleCache::new(SnapshotOpener::new(config));
/// let wallet = cache.get("my-wallet".to_string()).await?;
/// ```
pub struct WalletHandleCache<K, O: WalletOpener<K>> {
    opener: Arc<O>,
    slots: Slots<K, O::Handle, O::Error>,
    attempts: AtomicU64,
}

impl<K, O> WalletHandleCache<K, O>
where
    K: Clone + Eq + Hash + Debug + Send + 'static,
    O: WalletOpener<K>,
{
    pub fn new(opener: O) -> Self {
        Self {
            opener: Arc::new(opener),
            slots: Arc::new(Mutex::new(HashMap::new())),
            attempts: AtomicU64::new(0),
        }
    }

    /// Get the handle for `key`, opening the wallet if needed
    ///
    /// Concurrent callers for a key that is not open yet share a single
    /// initialization and all observe its outcome. After a failure the
    /// next call starts a fresh attempt.
    ///
    /// # Errors
    ///
    /// - [`CacheError::InitializationFailure`] if the opener failed
    /// - [`CacheError::InitializerAborted`] if the opening task died
    pub async fn get(&self, key: K) -> Result<Arc<O::Handle>, CacheError<O::Error>> {
        let mut outcome = {
            let mut slots = lock(&self.slots);
            match slots.get(&key) {
                Some(Slot::Ready(handle)) => return Ok(Arc::clone(handle)),
                Some(Slot::InFlight { outcome, .. }) if !is_abandoned(outcome) => {
                    log::debug!("Waiting for in-flight initialization of {:?}", key);
                    outcome.clone()
                }
                _ => self.start(&key, &mut slots),
            }
        };

        let settled = loop {
            let current = outcome.borrow_and_update().clone();
            if let Some(settled) = current {
                break settled;
            }
            if outcome.changed().await.is_err() {
                let last = outcome.borrow().clone();
                break last.ok_or(CacheError::InitializerAborted)?;
            }
        };

        settled.map_err(CacheError::InitializationFailure)
    }

    /// Current state of the slot for `key`
    pub fn state(&self, key: &K) -> SlotState {
        match lock(&self.slots).get(key) {
            None => SlotState::Empty,
            Some(Slot::InFlight { .. }) => SlotState::InFlight,
            Some(Slot::Ready(_)) => SlotState::Ready,
            Some(Slot::Failed(_)) => SlotState::Failed,
        }
    }

    /// Error left by the last attempt for `key`, until the next `get`
    /// starts a new one
    pub fn last_error(&self, key: &K) -> Option<Arc<O::Error>> {
        match lock(&self.slots).get(key) {
            Some(Slot::Failed(error)) => Some(Arc::clone(error)),
            _ => None,
        }
    }

    /// Number of keys with a slot
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of initializations started so far
    pub fn initializations(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Install an in-flight slot for `key` and spawn its initialization
    ///
    /// Must be called with the slot map locked.
    fn start(
        &self,
        key: &K,
        slots: &mut HashMap<K, Slot<O::Handle, O::Error>>,
    ) -> watch::Receiver<Option<Outcome<O::Handle, O::Error>>> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let (sender, receiver) = watch::channel(None);

        slots.insert(
            key.clone(),
            Slot::InFlight {
                attempt,
                outcome: receiver.clone(),
            },
        );

        log::info!("Opening wallet {:?} (attempt {})", key, attempt);

        let opening = self.opener.open(key);
        let slots = Arc::clone(&self.slots);
        let key = key.clone();

        tokio::spawn(async move {
            let outcome: Outcome<O::Handle, O::Error> =
                opening.await.map(Arc::new).map_err(Arc::new);

            {
                let mut slots = lock(&slots);
                let current = matches!(
                    slots.get(&key),
                    Some(Slot::InFlight { attempt: a, .. }) if *a == attempt
                );
                if current {
                    let settled = match &outcome {
                        Ok(handle) => {
                            log::info!("Wallet {:?} opened", key);
                            Slot::Ready(Arc::clone(handle))
                        }
                        Err(error) => {
                            log::warn!("Failed to open wallet {:?}: {}", key, error);
                            Slot::Failed(Arc::clone(error))
                        }
                    };
                    slots.insert(key, settled);
                }
            }

            // Waiters may have given up; nobody listening is fine.
            let _ = sender.send(Some(outcome));
        });

        receiver
    }
}

/// An in-flight slot whose task died without reporting
fn is_abandoned<T>(outcome: &watch::Receiver<Option<T>>) -> bool {
    outcome.has_changed().is_err() && outcome.borrow().is_none()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
