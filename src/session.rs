//! Cookie-identified sessions carrying one-shot flash messages.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request},
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    middleware::Next,
    response::Response,
};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "todos_session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);
impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Status messages shown on the next rendered page, then cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flash {
    pub error: Option<String>,
    pub success: Option<String>,
}

const FLASH_TTL: Duration = Duration::from_secs(10 * 60);
const MAX_PENDING_FLASHES: usize = 10_000;

#[derive(Debug, Clone)]
struct PendingFlash {
    flash: Flash,
    stored_at: Instant,
}

/// Flashes waiting for their session's next page.
///
/// Entries older than the ttl are dropped, and past `capacity` the oldest
/// entry makes room, so clients that never send the cookie back cannot grow
/// the map without bound.
#[derive(Debug, Clone)]
pub struct SessionStore {
    flashes: Arc<RwLock<HashMap<SessionId, PendingFlash>>>,
    ttl: Duration,
    capacity: usize,
}
impl Default for SessionStore {
    fn default() -> Self {
        Self::new(FLASH_TTL, MAX_PENDING_FLASHES)
    }
}
impl SessionStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            flashes: Arc::default(),
            ttl,
            capacity,
        }
    }

    pub async fn set_error(&self, id: SessionId, message: impl Into<String>) {
        let message = message.into();
        self.update(id, |flash| flash.error = Some(message)).await
    }
    pub async fn set_success(&self, id: SessionId, message: impl Into<String>) {
        let message = message.into();
        self.update(id, |flash| flash.success = Some(message)).await
    }
    pub async fn take(&self, id: SessionId) -> Flash {
        let pending = self.flashes.write().await.remove(&id);
        pending
            .filter(|pending| pending.stored_at.elapsed() < self.ttl)
            .map(|pending| pending.flash)
            .unwrap_or_default()
    }

    async fn update(&self, id: SessionId, apply: impl FnOnce(&mut Flash)) {
        let mut flashes = self.flashes.write().await;
        let now = Instant::now();
        flashes.retain(|_, pending| now.duration_since(pending.stored_at) < self.ttl);
        if !flashes.contains_key(&id) && flashes.len() >= self.capacity {
            let oldest = flashes
                .iter()
                .min_by_key(|(_, pending)| pending.stored_at)
                .map(|(id, _)| *id);
            if let Some(oldest) = oldest {
                tracing::debug!("flash store full, dropping oldest entry");
                flashes.remove(&oldest);
            }
        }
        let pending = flashes.entry(id).or_insert_with(|| PendingFlash {
            flash: Flash::default(),
            stored_at: now,
        });
        pending.stored_at = now;
        apply(&mut pending.flash);
    }

    #[cfg(test)]
    async fn pending(&self) -> usize {
        self.flashes.read().await.len()
    }
}

/// Per-request view of the caller's session.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    store: SessionStore,
}
impl Session {
    pub async fn flash_error(&self, message: impl Into<String>) {
        self.store.set_error(self.id, message).await
    }
    pub async fn flash_success(&self, message: impl Into<String>) {
        self.store.set_success(self.id, message).await
    }
    pub async fn take_flash(&self) -> Flash {
        self.store.take(self.id).await
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionStore: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // without the middleware every request gets a throwaway session
        let id = parts
            .extensions
            .get::<SessionId>()
            .copied()
            .unwrap_or_else(SessionId::generate);
        Ok(Self {
            id,
            store: SessionStore::from_ref(state),
        })
    }
}

/// Middleware: resolves the session cookie, issuing a new one when missing.
pub async fn ensure_session(mut req: Request, next: Next) -> Response {
    let existing = session_from_headers(req.headers());
    let id = existing.unwrap_or_else(SessionId::generate);
    req.extensions_mut().insert(id);

    let mut response = next.run(req).await;
    if existing.is_none() {
        let cookie = format!("{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax", id.0);
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(err) => tracing::warn!("invalid session cookie: {err}"),
        }
    }
    response
}

fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
        .map(SessionId)
}
