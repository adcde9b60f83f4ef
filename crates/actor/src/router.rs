//! Request routing to per-key actors
//!
//! [`CellRouter`] keeps a directory from key to mailbox. The first request
//! for a key spawns its actor (activation); an actor that stays idle for
//! `idle_timeout` leaves the directory and stops (deactivation). State
//! lives in the store, so reactivation picks up where the last actor
//! stopped.
//!
//! ## Delivery
//!
//! Mailboxes are bounded: when an actor falls behind, callers wait in
//! `send` instead of queueing without limit. A send that finds the mailbox
//! closed (the actor is deactivating) evicts the stale entry and retries
//! against a fresh actor.
//!
//! ## Cancellation
//!
//! Dropping an `apply_update` future before the actor dequeues it cancels
//! the update. Once the actor has committed, dropping the future changes
//! nothing.
//!
//! ## Blocking store calls
//!
//! [`DurableStore`] methods are synchronous and may block on fsync or a
//! per-key lock. Actors never call them on a runtime worker: every call
//! goes through `tokio::task::spawn_blocking`, which is why the store must
//! be `Clone + 'static`. A slow key therefore occupies a blocking-pool
//! thread, not a worker, and requests for other keys keep flowing. An
//! update whose store call is already running commits even if its caller
//! is dropped.

use crate::actor::{CellActor, Command};
use crate::error::{RouterError, RouterResult};
use dashmap::DashMap;
use highwater_core::{CellKey, CellResult, DurableStore};
use highwater_primitives::MaxCell;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

/// Attempts to reach a live actor before giving up
const MAX_DELIVERY_ATTEMPTS: usize = 3;

/// Router configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    /// Requests an actor can have queued before senders wait
    pub mailbox_capacity: usize,
    /// Quiet period after which an actor stops; `None` keeps actors alive
    /// until shutdown
    pub idle_timeout: Option<Duration>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 64,
            idle_timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl RouterConfig {
    /// Set the mailbox capacity (at least 1)
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity.max(1);
        self
    }

    /// Set the idle timeout
    pub fn idle_timeout(mut self, idle: Option<Duration>) -> Self {
        self.idle_timeout = idle;
        self
    }
}

/// Directory entry for an active key
pub(crate) struct Mailbox {
    pub(crate) sender: mpsc::Sender<Command>,
    pub(crate) generation: u64,
}

pub(crate) type Directory = DashMap<CellKey, Mailbox>;

struct RouterInner<S> {
    cells: MaxCell<S>,
    config: RouterConfig,
    directory: Arc<Directory>,
    next_generation: AtomicU64,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Routes cell requests to one actor per key
///
/// Cloning is cheap and clones share the same actors.
///
/// # Example
///
/// ```
/// use highwater_actor::{CellRouter, RouterConfig};
/// use highwater_primitives::MaxCell;
///
/// let runtime = tokio::runtime::Runtime::new().unwrap();
/// runtime.block_on(async {
///     let router = CellRouter::new(MaxCell::in_memory(), RouterConfig::default());
///     router.apply_update("a", 5).await.unwrap();
///     assert_eq!(router.read("a").await.unwrap(), 5);
///     router.shutdown().await;
/// });
/// ```
pub struct CellRouter<S> {
    inner: Arc<RouterInner<S>>,
}

impl<S> Clone for CellRouter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> CellRouter<S>
where
    S: DurableStore + Clone + 'static,
{
    /// Create a router over `cells`
    ///
    /// Actors are spawned on the current Tokio runtime when first needed.
    pub fn new(cells: MaxCell<S>, config: RouterConfig) -> Self {
        let config = RouterConfig {
            mailbox_capacity: config.mailbox_capacity.max(1),
            ..config
        };
        Self {
            inner: Arc::new(RouterInner {
                cells,
                config,
                directory: Arc::new(DashMap::new()),
                next_generation: AtomicU64::new(1),
                tasks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Cells the actors operate on
    pub fn cells(&self) -> &MaxCell<S> {
        &self.inner.cells
    }

    /// Active configuration
    pub fn config(&self) -> RouterConfig {
        self.inner.config
    }

    /// Create `key` with value 0 if absent
    pub async fn initialize(&self, key: impl Into<CellKey>) -> RouterResult<()> {
        let key = key.into();
        self.dispatch(&key, |reply| Command::Initialize { reply }).await
    }

    /// Current value of `key`
    ///
    /// The key's actor initializes it on activation, so routed reads of a
    /// fresh key return 0.
    pub async fn read(&self, key: impl Into<CellKey>) -> RouterResult<i64> {
        let key = key.into();
        self.dispatch(&key, |reply| Command::Read { reply }).await
    }

    /// Merge `candidate` into `key`, returning the resulting value
    pub async fn apply_update(&self, key: impl Into<CellKey>, candidate: i64) -> RouterResult<i64> {
        let key = key.into();
        self.dispatch(&key, |reply| Command::ApplyUpdate { candidate, reply })
            .await
    }

    /// Number of keys with a live actor
    pub fn active_actors(&self) -> usize {
        self.inner.directory.len()
    }

    /// Check if `key` has a live actor
    pub fn is_active(&self, key: &CellKey) -> bool {
        self.inner.directory.contains_key(key)
    }

    /// Stop every actor and wait for them to finish
    ///
    /// Requests already queued are still served. Requests sent after
    /// shutdown spawn new actors.
    pub async fn shutdown(&self) {
        self.inner.directory.clear();
        let tasks = std::mem::take(&mut *self.inner.tasks.lock());
        debug!(actors = tasks.len(), "router shutting down");
        for task in tasks {
            let _ = task.await;
        }
    }

    async fn dispatch<T>(
        &self,
        key: &CellKey,
        make: impl FnOnce(oneshot::Sender<CellResult<T>>) -> Command,
    ) -> RouterResult<T> {
        let (reply, response) = oneshot::channel();
        let mut command = make(reply);

        for _ in 0..MAX_DELIVERY_ATTEMPTS {
            let (sender, generation) = self.mailbox(key);
            match sender.send(command).await {
                Ok(()) => {
                    return match response.await {
                        Ok(result) => result.map_err(RouterError::from),
                        Err(_) => Err(RouterError::MailboxClosed { key: key.clone() }),
                    };
                }
                Err(mpsc::error::SendError(returned)) => {
                    // Actor is deactivating; evict it and retry with a fresh one
                    self.inner
                        .directory
                        .remove_if(key, |_, mailbox| mailbox.generation == generation);
                    command = returned;
                }
            }
        }

        Err(RouterError::MailboxClosed { key: key.clone() })
    }

    fn mailbox(&self, key: &CellKey) -> (mpsc::Sender<Command>, u64) {
        if let Some(mailbox) = self.inner.directory.get(key) {
            return (mailbox.sender.clone(), mailbox.generation);
        }

        let mut activation = None;
        let found = {
            let entry = self.inner.directory.entry(key.clone()).or_insert_with(|| {
                let (sender, inbox) = mpsc::channel(self.inner.config.mailbox_capacity);
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                activation = Some((inbox, generation));
                Mailbox { sender, generation }
            });
            (entry.sender.clone(), entry.generation)
        };

        if let Some((inbox, generation)) = activation {
            self.spawn_actor(key.clone(), generation, inbox);
        }
        found
    }

    fn spawn_actor(&self, key: CellKey, generation: u64, inbox: mpsc::Receiver<Command>) {
        debug!(key = %key, generation, "activating actor");
        let actor = CellActor::new(
            key,
            generation,
            self.inner.cells.clone(),
            inbox,
            self.inner.config.idle_timeout,
            Arc::downgrade(&self.inner.directory),
        );
        let handle = tokio::spawn(actor.run());

        let mut tasks = self.inner.tasks.lock();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}

impl<S> std::fmt::Debug for CellRouter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellRouter")
            .field("config", &self.inner.config)
            .field("active_actors", &self.inner.directory.len())
            .finish()
    }
}
