//! Application state shared across handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::StorefrontConfig;
use crate::infra::{sanitize_session_key, EventSink, FileGuestCart, MemoryGuestCart};
use crate::ports::{DocumentStore, GuestCartStore, IdentityProvider};
use crate::session::StorefrontSession;
use crate::{Result, StorefrontError};

/// Backend adapters plus one [`StorefrontSession`] per browser session key.
///
/// Cheaply cloneable; every clone shares the same registry. Sessions no
/// request is holding are evicted once idle for `SESSION_IDLE_SECS`, and the
/// least recently used one makes room when the registry is full.
pub struct AppState<S, I> {
    inner: Arc<AppStateInner<S, I>>,
}

impl<S, I> Clone for AppState<S, I> {
    fn clone(&self) -> Self { Self { inner: Arc::clone(&self.inner) } }
}

struct AppStateInner<S, I> {
    config: StorefrontConfig,
    store: Arc<S>,
    identity: Arc<I>,
    events: EventSink,
    sessions: Mutex<HashMap<String, SessionEntry<S, I>>>,
}

struct SessionEntry<S, I> {
    session: Arc<StorefrontSession<S, I>>,
    last_seen: Instant,
}

impl<S, I> SessionEntry<S, I> {
    /// The registry holds the only reference.
    fn is_unused(&self) -> bool { Arc::strong_count(&self.session) == 1 }
}

impl<S, I> AppState<S, I>
where
    S: DocumentStore + Send + Sync + 'static,
    I: IdentityProvider + Send + Sync + 'static,
{
    pub fn new(config: StorefrontConfig, store: S, identity: I, events: EventSink) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                store: Arc::new(store),
                identity: Arc::new(identity),
                events,
                sessions: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &StorefrontConfig { &self.inner.config }

    /// Session for `key`, created on first use. Keys outside `[A-Za-z0-9_-]`
    /// never name a session.
    pub fn session(&self, key: &str) -> Result<Arc<StorefrontSession<S, I>>> {
        let key = sanitize_session_key(key).ok_or(StorefrontError::NotFound("session"))?;
        let now = Instant::now();
        let mut sessions = self.inner.sessions.lock().expect("session registry lock poisoned");
        if let Some(entry) = sessions.get_mut(&key) {
            entry.last_seen = now;
            return Ok(Arc::clone(&entry.session));
        }

        if sessions.len() >= self.inner.config.sessions.max_sessions {
            self.make_room(&mut sessions, now);
        }
        tracing::debug!(session = %key, "new storefront session");
        let session = Arc::new(StorefrontSession::new(
            Arc::clone(&self.inner.store),
            Arc::clone(&self.inner.identity),
            self.guest_store(&key),
            self.inner.config.checkout.clone(),
            self.inner.events.clone(),
        ));
        sessions.insert(key, SessionEntry { session: Arc::clone(&session), last_seen: now });
        Ok(session)
    }

    pub fn session_count(&self) -> usize { self.inner.sessions.lock().expect("session registry lock poisoned").len() }

    /// Drops every unused session idle for at least the configured TTL.
    /// Returns how many were evicted.
    pub fn evict_idle(&self) -> usize {
        let mut sessions = self.inner.sessions.lock().expect("session registry lock poisoned");
        self.evict_idle_from(&mut sessions, Instant::now())
    }

    /// Runs [`evict_idle`](Self::evict_idle) on a fixed period for the life of the process.
    pub fn spawn_session_sweeper(&self) -> JoinHandle<()> {
        let state = self.clone();
        let period = (self.inner.config.sessions.idle_ttl / 2).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            loop {
                tick.tick().await;
                let evicted = state.evict_idle();
                if evicted > 0 {
                    tracing::debug!(evicted, remaining = state.session_count(), "idle sessions evicted");
                }
            }
        })
    }

    fn evict_idle_from(&self, sessions: &mut HashMap<String, SessionEntry<S, I>>, now: Instant) -> usize {
        let ttl = self.inner.config.sessions.idle_ttl;
        let before = sessions.len();
        sessions.retain(|_, entry| !(entry.is_unused() && now.saturating_duration_since(entry.last_seen) >= ttl));
        before - sessions.len()
    }

    fn make_room(&self, sessions: &mut HashMap<String, SessionEntry<S, I>>, now: Instant) {
        if self.evict_idle_from(sessions, now) > 0 {
            return;
        }
        let oldest = sessions
            .iter()
            .filter(|(_, entry)| entry.is_unused())
            .min_by_key(|(_, entry)| entry.last_seen)
            .map(|(key, _)| key.clone());
        match oldest {
            Some(key) => {
                tracing::debug!(session = %key, "session registry full, evicting least recently used");
                sessions.remove(&key);
            }
            None => tracing::warn!(sessions = sessions.len(), "session registry full and every session is in use"),
        }
    }

    fn guest_store(&self, key: &str) -> Arc<dyn GuestCartStore> {
        match &self.inner.config.guest_cart_dir {
            Some(dir) => Arc::new(FileGuestCart::new(dir, key)),
            None => Arc::new(MemoryGuestCart::new()),
        }
    }
}
