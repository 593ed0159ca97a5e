// src/manager/cache.rs

//! Per-language session cache.
//!
//! Each language owns one slot guarded by an async mutex. Holding the slot
//! lock is what serializes both session creation and command dispatch for
//! that language, so at most one session ever exists per language and
//! commands run one at a time, in lock-acquisition (FIFO) order.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::errors::{Result, classify};
use crate::session::ExecutionSession;
use crate::types::ScriptLanguage;

type Slot = Arc<AsyncMutex<Option<Box<dyn ExecutionSession>>>>;

#[derive(Default)]
pub struct SessionCache {
    slots: Mutex<HashMap<ScriptLanguage, Slot>>,
}

/// Exclusive access to a connected, cached session.
///
/// Dropping the guard lets the next command for the same language proceed.
pub struct CachedSession {
    language: ScriptLanguage,
    guard: OwnedMutexGuard<Option<Box<dyn ExecutionSession>>>,
}

impl CachedSession {
    pub fn language(&self) -> ScriptLanguage {
        self.language
    }

    /// Disconnect the session and drop it from the cache.
    pub async fn evict(mut self) {
        if let Some(mut session) = self.guard.take() {
            info!(
                language = %self.language,
                session = session.implementation_name(),
                "evicting session from cache"
            );
            if let Err(e) = session.disconnect().await {
                warn!(language = %self.language, error = %e, "disconnect of evicted session failed");
            }
        }
    }
}

impl Deref for CachedSession {
    type Target = dyn ExecutionSession;

    fn deref(&self) -> &Self::Target {
        // A CachedSession is only handed out for an occupied slot.
        match self.guard.as_deref() {
            Some(session) => session,
            None => unreachable!("cached session slot emptied while guarded"),
        }
    }
}

impl DerefMut for CachedSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self.guard.as_deref_mut() {
            Some(session) => session,
            None => unreachable!("cached session slot emptied while guarded"),
        }
    }
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, language: ScriptLanguage) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(language).or_default())
    }

    fn all_slots(&self) -> Vec<(ScriptLanguage, Slot)> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .iter()
            .map(|(lang, slot)| (*lang, Arc::clone(slot)))
            .collect()
    }

    /// Return the cached session for `language`, creating and connecting one
    /// with `create` on a miss.
    ///
    /// A session whose connect fails is disconnected and *not* cached, so the
    /// next call starts over with `create`.
    pub async fn get_or_create<F>(&self, language: ScriptLanguage, create: F) -> Result<CachedSession>
    where
        F: FnOnce() -> Result<Box<dyn ExecutionSession>>,
    {
        let mut guard = self.slot(language).lock_owned().await;

        if guard.is_none() {
            let mut session = create()?;
            debug!(
                language = %language,
                session = session.implementation_name(),
                "connecting new session"
            );
            if let Err(e) = session.connect().await {
                let context = format!("Cannot connect {}", session.implementation_name());
                if let Err(disconnect_err) = session.disconnect().await {
                    debug!(error = %disconnect_err, "cleanup after failed connect");
                }
                return Err(classify(&context, e));
            }
            info!(
                language = %language,
                session = session.implementation_name(),
                "session connected and cached"
            );
            *guard = Some(session);
        }

        Ok(CachedSession { language, guard })
    }

    /// Disconnect every cached session and empty the cache.
    ///
    /// Waits for in-flight commands on each slot. Individual disconnect
    /// failures are logged and do not stop the sweep.
    pub async fn disconnect_all(&self) {
        for (language, slot) in self.all_slots() {
            let mut guard = slot.lock().await;
            let Some(mut session) = guard.take() else {
                continue;
            };
            debug!(
                language = %language,
                session = session.implementation_name(),
                "disconnecting session"
            );
            if let Err(e) = session.disconnect().await {
                warn!(language = %language, error = %e, "failed to disconnect session; continuing");
            }
        }
    }

    /// Languages that currently have a connected session.
    pub fn cached_languages(&self) -> Vec<ScriptLanguage> {
        let mut langs: Vec<ScriptLanguage> = self
            .all_slots()
            .into_iter()
            .filter(|(_, slot)| slot.try_lock().map(|g| g.is_some()).unwrap_or(true))
            .map(|(lang, _)| lang)
            .collect();
        langs.sort();
        langs
    }

    pub fn contains(&self, language: ScriptLanguage) -> bool {
        self.cached_languages().contains(&language)
    }
}
