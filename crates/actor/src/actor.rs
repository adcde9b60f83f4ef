//! Per-key actor
//!
//! One task per active key. It owns the receiving end of the key's mailbox
//! and applies requests one at a time through a shared [`MaxCell`].
//!
//! ## Lifecycle
//!
//! ```text
//! spawn ──► Activated ──► initialize(key) ──► serve mailbox
//!                                               │
//!               idle_timeout, or all senders gone
//!                                               ▼
//!               close mailbox ──► drain ──► leave directory ──► Deactivated
//! ```
//!
//! Store calls may fsync or wait on a per-key lock, so the actor runs each
//! one on Tokio's blocking pool and awaits the result. Runtime workers stay
//! free for other keys, including on a current-thread runtime.

use crate::router::Directory;
use highwater_core::{CellEvent, CellKey, CellResult, DurableStore};
use highwater_primitives::MaxCell;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Request delivered to an actor
pub(crate) enum Command {
    Initialize {
        reply: oneshot::Sender<CellResult<()>>,
    },
    Read {
        reply: oneshot::Sender<CellResult<i64>>,
    },
    ApplyUpdate {
        candidate: i64,
        reply: oneshot::Sender<CellResult<i64>>,
    },
}

pub(crate) struct CellActor<S> {
    key: CellKey,
    generation: u64,
    cells: MaxCell<S>,
    inbox: mpsc::Receiver<Command>,
    idle_timeout: Option<Duration>,
    directory: Weak<Directory>,
    initialized: bool,
}

impl<S: DurableStore + Clone + 'static> CellActor<S> {
    pub(crate) fn new(
        key: CellKey,
        generation: u64,
        cells: MaxCell<S>,
        inbox: mpsc::Receiver<Command>,
        idle_timeout: Option<Duration>,
        directory: Weak<Directory>,
    ) -> Self {
        Self {
            key,
            generation,
            cells,
            inbox,
            idle_timeout,
            directory,
            initialized: false,
        }
    }

    pub(crate) async fn run(mut self) {
        self.cells.observer().observe(&CellEvent::Activated {
            key: self.key.clone(),
        });
        if let Some(Err(e)) = self.ensure_initialized().await {
            warn!(key = %self.key, error = %e, "activation could not initialize cell");
        }

        loop {
            let next = match self.idle_timeout {
                Some(idle) => match tokio::time::timeout(idle, self.inbox.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        debug!(key = %self.key, "actor idle");
                        break;
                    }
                },
                None => self.inbox.recv().await,
            };
            match next {
                Some(command) => self.handle(command).await,
                None => break,
            }
        }

        self.deactivate().await;
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Initialize { reply } => {
                if let Some(result) = self.ensure_initialized().await {
                    let _ = reply.send(result);
                }
            }
            Command::Read { reply } => {
                let needs_init = !self.initialized;
                let outcome = self
                    .on_blocking_pool(move |cells, key| {
                        if needs_init {
                            cells.initialize(key)?;
                        }
                        cells.read(key)
                    })
                    .await;
                if let Some(result) = outcome {
                    if result.is_ok() {
                        self.initialized = true;
                    }
                    let _ = reply.send(result);
                }
            }
            Command::ApplyUpdate { candidate, reply } => {
                // Caller gave up before we got here: drop without committing
                if reply.is_closed() {
                    debug!(key = %self.key, candidate, "skipping cancelled update");
                    return;
                }
                let outcome = self
                    .on_blocking_pool(move |cells, key| cells.apply_update(key, candidate))
                    .await;
                if let Some(result) = outcome {
                    let _ = reply.send(result);
                }
            }
        }
    }

    async fn ensure_initialized(&mut self) -> Option<CellResult<()>> {
        if self.initialized {
            return Some(Ok(()));
        }
        let result = self
            .on_blocking_pool(|cells, key| cells.initialize(key))
            .await?;
        if result.is_ok() {
            self.initialized = true;
        }
        Some(result)
    }

    /// Run one store call on the blocking pool
    ///
    /// `None` means the runtime shut down before the call finished; the
    /// caller's reply is dropped and it sees a closed mailbox.
    async fn on_blocking_pool<T, F>(&self, call: F) -> Option<CellResult<T>>
    where
        T: Send + 'static,
        F: FnOnce(&MaxCell<S>, &CellKey) -> CellResult<T> + Send + 'static,
    {
        let cells = self.cells.clone();
        let key = self.key.clone();
        match tokio::task::spawn_blocking(move || call(&cells, &key)).await {
            Ok(result) => Some(result),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => {
                warn!(key = %self.key, error = %e, "store call did not complete");
                None
            }
        }
    }

    async fn deactivate(&mut self) {
        // Refuse new requests, then serve whatever was already queued
        self.inbox.close();
        while let Some(command) = self.inbox.recv().await {
            self.handle(command).await;
        }

        if let Some(directory) = self.directory.upgrade() {
            directory.remove_if(&self.key, |_, mailbox| mailbox.generation == self.generation);
        }
        self.cells.observer().observe(&CellEvent::Deactivated {
            key: self.key.clone(),
        });
    }
}
