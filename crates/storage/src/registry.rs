// SPDX-License-Identifier: MIT

//! The Session Registry (C2): the authoritative in-memory map of session
//! records, with an optional append-only durable mirror.

use crate::durable::DurableMirror;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;
use wharf_core::{AsErrorKind, ErrorKind, OwnerId, Session, SessionId};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("session {0} already exists")]
    AlreadyExists(SessionId),

    #[error("session {0} not found")]
    NotFound(SessionId),

    #[error("durable mirror error: {0}")]
    Durable(#[from] std::io::Error),
}

impl AsErrorKind for RegistryError {
    fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            RegistryError::NotFound(_) => ErrorKind::NotFound,
            RegistryError::Durable(_) => ErrorKind::Internal,
        }
    }
}

/// A page of [`Session`]s plus an opaque token to fetch the next page, if
/// any remain.
pub struct Page {
    pub sessions: Vec<Session>,
    pub next_page_token: Option<String>,
}

struct Inner {
    sessions: HashMap<SessionId, Session>,
}

/// Authoritative, single-writer-locked map of session records. All
/// operations are atomic with respect to each other; none perform I/O
/// while the lock is held except the optional durable-mirror append, which
/// is a local file write, not network I/O.
pub struct SessionRegistry {
    inner: Mutex<Inner>,
    durable: Option<DurableMirror>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
            }),
            durable: None,
        }
    }

    /// Open a registry backed by a durable JSONL mirror at `path`, replaying
    /// any existing file to reconstruct in-memory state.
    pub fn open_durable(path: impl Into<std::path::PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let recovered = DurableMirror::load(&path)?;
        let mirror = DurableMirror::open(path)?;
        let mut sessions = HashMap::new();
        for session in recovered {
            sessions.insert(session.id, session);
        }
        Ok(Self {
            inner: Mutex::new(Inner { sessions }),
            durable: Some(mirror),
        })
    }

    pub fn create(&self, session: Session) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        if inner.sessions.contains_key(&session.id) {
            return Err(RegistryError::AlreadyExists(session.id));
        }
        if let Some(mirror) = &self.durable {
            mirror.append_upsert(&session)?;
        }
        inner.sessions.insert(session.id, session);
        Ok(())
    }

    pub fn get(&self, id: SessionId, owner: &OwnerId) -> Result<Session, RegistryError> {
        let inner = self.inner.lock();
        inner
            .sessions
            .get(&id)
            .filter(|s| &s.owner_id == owner)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    /// Fetch a session regardless of owner. Used by background tasks
    /// (readiness waiter, reaper) that already established ownership at
    /// creation time and act on behalf of the system, not a caller.
    pub fn get_unchecked(&self, id: SessionId) -> Result<Session, RegistryError> {
        let inner = self.inner.lock();
        inner.sessions.get(&id).cloned().ok_or(RegistryError::NotFound(id))
    }

    pub fn list(&self, owner: &OwnerId, page_size: usize, page_token: Option<&str>) -> Page {
        let inner = self.inner.lock();
        let mut matching: Vec<&Session> =
            inner.sessions.values().filter(|s| &s.owner_id == owner).collect();
        matching.sort_by(|a, b| {
            b.created_at_ms
                .cmp(&a.created_at_ms)
                .then_with(|| b.id.as_str().cmp(a.id.as_str()))
        });

        let start = match page_token {
            Some(token) => matching.iter().position(|s| s.id.as_str() == token).map(|i| i + 1).unwrap_or(0),
            None => 0,
        };
        let page_size = page_size.max(1);
        let end = (start + page_size).min(matching.len());
        let sessions: Vec<Session> = matching[start..end].iter().map(|s| (*s).clone()).collect();
        let next_page_token = if end < matching.len() {
            sessions.last().map(|s| s.id.as_str().to_string())
        } else {
            None
        };
        Page { sessions, next_page_token }
    }

    pub fn update(&self, session: Session) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock();
        if !inner.sessions.contains_key(&session.id) {
            return Err(RegistryError::NotFound(session.id));
        }
        if let Some(mirror) = &self.durable {
            mirror.append_upsert(&session)?;
        }
        inner.sessions.insert(session.id, session);
        Ok(())
    }

    pub fn delete(&self, id: SessionId, owner: &OwnerId, force: bool) -> Result<Session, RegistryError> {
        let mut inner = self.inner.lock();
        let matches_owner = inner.sessions.get(&id).map(|s| &s.owner_id == owner).unwrap_or(false);
        if !force && !matches_owner {
            return Err(RegistryError::NotFound(id));
        }
        let removed = inner.sessions.remove(&id).ok_or(RegistryError::NotFound(id))?;
        if let Some(mirror) = &self.durable {
            mirror.append_remove(id)?;
        }
        Ok(removed)
    }

    /// Advance `last_accessed_at`. Silently a no-op if the session is
    /// missing, per the registry contract.
    pub fn touch(&self, id: SessionId, now_ms: u64) {
        let mut inner = self.inner.lock();
        if let Some(session) = inner.sessions.get_mut(&id) {
            session.touch(now_ms);
        }
    }

    pub fn count(&self, owner: &OwnerId) -> usize {
        let inner = self.inner.lock();
        inner.sessions.values().filter(|s| &s.owner_id == owner).count()
    }

    pub fn total_count(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    pub fn list_expired(&self, ttl_seconds: u64, now_ms: u64) -> Vec<Session> {
        let ttl_ms = ttl_seconds.saturating_mul(1000);
        let inner = self.inner.lock();
        inner
            .sessions
            .values()
            .filter(|s| now_ms.saturating_sub(s.last_accessed_at_ms) >= ttl_ms)
            .cloned()
            .collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
