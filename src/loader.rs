//! Keyed, cancellable, de-duplicated loads owned by a single view.
//!
//! Every view that fetches remote data owns a [`LoaderScope`]. A load is
//! identified by a small integer key. Asking for a key that is already in
//! flight (or already finished) attaches to that load instead of issuing a new
//! call, unless the request is forced. Destroying the scope cancels every load
//! it owns, and nothing started from it is delivered afterwards.

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::action::{Action, Loaded};
use crate::error::{HubError, Result};

pub type LoadKey = u32;

/// Identity of a loader scope, stamped on every delivery so the UI side can
/// drop results addressed to a view that no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(u64);

impl ScopeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ScopeId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

type AnyResult = std::result::Result<Arc<dyn Any + Send + Sync>, HubError>;

struct Slot {
    load: Shared<BoxFuture<'static, AnyResult>>,
    cancel: CancellationToken,
}

pub struct LoaderScope {
    id: ScopeId,
    cancel: CancellationToken,
    slots: HashMap<LoadKey, Slot>,
    tx: mpsc::UnboundedSender<Action>,
}

impl std::fmt::Debug for LoaderScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderScope")
            .field("id", &self.id)
            .field("keys", &self.slots.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl LoaderScope {
    pub fn new(tx: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            id: ScopeId::next(),
            cancel: CancellationToken::new(),
            slots: HashMap::new(),
            tx,
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    #[cfg(test)]
    pub fn is_destroyed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Wrap `call` so that it runs at most once per key.
    ///
    /// `force` discards whatever is cached or in flight under `key`; callers
    /// still waiting on the discarded load see [`HubError::Cancelled`]. When
    /// not forced, an existing load is reused and `call` is dropped unpolled.
    pub fn load<T, Fut>(&mut self, key: LoadKey, force: bool, call: Fut) -> BoxFuture<'static, Result<T>>
    where
        T: Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let scope = self.id;
        let (load, slot_cancel) = match self.slots.entry(key) {
            Entry::Occupied(mut slot) if force => {
                debug!(?scope, key, "forced reload, discarding previous load");
                slot.get().cancel.cancel();
                slot.insert(start(call, &self.cancel));
                (slot.get().load.clone(), slot.get().cancel.clone())
            }
            Entry::Occupied(slot) => {
                debug!(?scope, key, "reusing existing load");
                (slot.get().load.clone(), slot.get().cancel.clone())
            }
            Entry::Vacant(slot) => {
                trace!(?scope, key, "starting load");
                let slot = slot.insert(start(call, &self.cancel));
                (slot.load.clone(), slot.cancel.clone())
            }
        };

        async move {
            tokio::select! {
                biased;
                _ = slot_cancel.cancelled() => Err(HubError::Cancelled),
                result = load => {
                    let value = result?;
                    value.downcast_ref::<T>().cloned().ok_or_else(|| {
                        HubError::Internal(format!("load key {} reused for a different result type", key))
                    })
                }
            }
        }
        .boxed()
    }

    /// Cancellable but uncached call, for mutations such as follow/unfollow.
    pub fn run<T, Fut>(&self, call: Fut) -> BoxFuture<'static, Result<T>>
    where
        T: Send + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(HubError::Cancelled),
                result = call => result,
            }
        }
        .boxed()
    }

    /// Load under `key` on a background task and post the outcome to the owner.
    pub fn spawn<T, Fut, F>(&mut self, key: LoadKey, force: bool, call: Fut, on_success: F) -> JoinHandle<()>
    where
        T: Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        F: FnOnce(T) -> Loaded + Send + 'static,
    {
        let load = self.load(key, force, call);
        self.deliver(load, None, on_success)
    }

    /// Like [`spawn`](Self::spawn), but failures are attributed to a list tab.
    pub fn spawn_for_tab<T, Fut, F>(
        &mut self,
        tab: usize,
        key: LoadKey,
        force: bool,
        call: Fut,
        on_success: F,
    ) -> JoinHandle<()>
    where
        T: Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        F: FnOnce(T) -> Loaded + Send + 'static,
    {
        let load = self.load(key, force, call);
        self.deliver(load, Some(tab), on_success)
    }

    fn deliver<T, F>(&self, load: BoxFuture<'static, Result<T>>, tab: Option<usize>, on_success: F) -> JoinHandle<()>
    where
        T: Send + 'static,
        F: FnOnce(T) -> Loaded + Send + 'static,
    {
        let scope = self.id;
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match load.await {
                Ok(value) => {
                    tx.send(Action::Loaded {
                        scope,
                        data: on_success(value),
                    })
                    .ok();
                }
                Err(HubError::Cancelled) => {
                    trace!(?scope, "load cancelled, nothing delivered");
                }
                Err(err) => {
                    warn!(?scope, error = %err, "load failed");
                    tx.send(Action::LoadFailed {
                        scope,
                        tab,
                        message: err.to_string(),
                    })
                    .ok();
                }
            }
        })
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Action> {
        self.tx.clone()
    }

    /// Drop the loads stored under `keys`, cancelling any still in flight.
    /// The next request for one of those keys starts a fresh call.
    pub fn forget(&mut self, keys: RangeInclusive<LoadKey>) {
        let scope = self.id;
        self.slots.retain(|key, slot| {
            if keys.contains(key) {
                trace!(?scope, key, "forgetting load");
                slot.cancel.cancel();
                false
            } else {
                true
            }
        });
    }

    #[cfg(test)]
    pub fn holds(&self, key: LoadKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Cancel everything this scope started. Idempotent.
    pub fn destroy(&mut self) {
        if !self.cancel.is_cancelled() {
            debug!(scope = ?self.id, loads = self.slots.len(), "destroying loader scope");
        }
        self.cancel.cancel();
        self.slots.clear();
    }
}

impl Drop for LoaderScope {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn start<T, Fut>(call: Fut, parent: &CancellationToken) -> Slot
where
    T: Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let load = async move {
        call.await
            .map(|value| Arc::new(value) as Arc<dyn Any + Send + Sync>)
    }
    .boxed()
    .shared();

    Slot {
        load,
        cancel: parent.child_token(),
    }
}
