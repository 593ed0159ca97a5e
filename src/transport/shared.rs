// src/transport/shared.rs

//! Process-wide transport runtime with a reference-counted lifetime.
//!
//! The runtime is expensive to bring up and safe to share, so every
//! execution manager in the process uses the same one. It is initialized
//! when the usage count goes 0 → 1 and shut down when it returns to 0.
//! There is no finer-grained lifecycle hook than manager construction and
//! disposal, so the count tracks managers, not sessions.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use tracing::{debug, error, info};

/// Hooks run when the shared runtime comes up and goes down.
pub trait TransportRuntime: Send {
    fn initialize(&mut self);
    fn shutdown(&mut self);
}

/// Runtime that only records its transitions in the log.
///
/// Used for the process-wide instance unless another runtime was installed
/// with [`SharedTransport::install_global`].
#[derive(Debug, Default)]
pub struct LoggingRuntime;

impl TransportRuntime for LoggingRuntime {
    fn initialize(&mut self) {
        info!("transport runtime initialized");
    }

    fn shutdown(&mut self) {
        info!("transport runtime shut down");
    }
}

struct SharedState {
    usage_count: usize,
    runtime: Box<dyn TransportRuntime>,
}

/// Reference-counted handle to the shared transport runtime.
///
/// `acquire` and `release` are the only mutators; both run under one lock.
pub struct SharedTransport {
    state: Mutex<SharedState>,
}

static GLOBAL: OnceLock<Arc<SharedTransport>> = OnceLock::new();

impl SharedTransport {
    pub fn new(runtime: Box<dyn TransportRuntime>) -> Self {
        Self {
            state: Mutex::new(SharedState {
                usage_count: 0,
                runtime,
            }),
        }
    }

    /// The process-wide instance.
    pub fn global() -> Arc<SharedTransport> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(SharedTransport::new(Box::new(LoggingRuntime)))))
    }

    /// Install the runtime used by [`SharedTransport::global`].
    ///
    /// Returns `false` if the global instance already exists.
    pub fn install_global(runtime: Box<dyn TransportRuntime>) -> bool {
        GLOBAL
            .set(Arc::new(SharedTransport::new(runtime)))
            .is_ok()
    }

    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register one more user; initializes the runtime on the first one.
    ///
    /// Returns the usage count after the increment.
    pub fn acquire(&self) -> usize {
        let mut state = self.lock();
        state.usage_count += 1;
        debug!(usage_count = state.usage_count, "transport acquire");
        if state.usage_count == 1 {
            state.runtime.initialize();
        }
        state.usage_count
    }

    /// Drop one user; shuts the runtime down when the last one leaves.
    ///
    /// Releasing with no users is a caller bug: it is logged and ignored.
    /// Returns the usage count after the decrement.
    pub fn release(&self) -> usize {
        let mut state = self.lock();
        if state.usage_count == 0 {
            error!("transport release without matching acquire; ignoring");
            return 0;
        }
        state.usage_count -= 1;
        debug!(usage_count = state.usage_count, "transport release");
        if state.usage_count == 0 {
            state.runtime.shutdown();
        }
        state.usage_count
    }

    pub fn usage_count(&self) -> usize {
        self.lock().usage_count
    }

    /// The runtime is live iff at least one user holds it.
    pub fn is_live(&self) -> bool {
        self.usage_count() > 0
    }
}
