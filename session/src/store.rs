use crate::clock::{Clock, SystemClock};
use crate::UserId;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use log::*;
use rand::RngCore;
use std::sync::Arc;

/// Number of random bytes behind every session token.
const TOKEN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: UserId,
    pub nickname: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of `SessionStore::create`.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Sessions for the same nickname that this one replaced.
    pub superseded: Vec<Session>,
}

/// Concurrent session table with a secondary nickname index.
///
/// Both maps are sharded `DashMap`s so request handlers only contend when they
/// touch the same key. The nickname index is always written after the session
/// it points at exists, and whoever displaces an index entry removes the
/// session behind it. That keeps at most one live session per nickname even
/// when two sign-ins race.
pub struct SessionStore {
    /// Primary storage: token -> session
    sessions: DashMap<String, Session>,

    /// Secondary index: nickname -> token of its current session
    by_nickname: DashMap<String, String>,

    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            by_nickname: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates a session for `nickname` and drops any session it already had.
    pub fn create(&self, user_id: UserId, nickname: &str) -> CreatedSession {
        let token = self.unused_token();
        let now = self.clock.now();
        let expires_at = now + self.ttl;

        self.sessions.insert(
            token.clone(),
            Session {
                user_id,
                nickname: nickname.to_string(),
                expires_at,
            },
        );

        let mut superseded = Vec::new();
        if let Some(previous) = self.by_nickname.insert(nickname.to_string(), token.clone()) {
            // An expired but unswept session is just removed, nobody is using it
            if let Some((_, session)) = self.sessions.remove(&previous) {
                if now < session.expires_at {
                    debug!("Session for {nickname} superseded by a new sign-in");
                    superseded.push(session);
                }
            }
        }

        CreatedSession {
            token,
            expires_at,
            superseded,
        }
    }

    /// True iff a session exists for `token` and has not expired yet.
    pub fn validate(&self, token: &str) -> bool {
        let now = self.clock.now();
        self.sessions
            .get(token)
            .is_some_and(|session| now < session.expires_at)
    }

    /// Returns the session for `token` when it is still valid.
    pub fn get(&self, token: &str) -> Option<Session> {
        let now = self.clock.now();
        self.sessions
            .get(token)
            .filter(|session| now < session.expires_at)
            .map(|session| session.value().clone())
    }

    /// Removes the session for `token`. Unknown tokens are ignored.
    pub fn delete(&self, token: &str) -> Option<Session> {
        let (_, session) = self.sessions.remove(token)?;
        self.by_nickname
            .remove_if(&session.nickname, |_, current| current == token);
        Some(session)
    }

    pub fn exists_for_nickname(&self, nickname: &str) -> bool {
        // Copy the token out so the index guard is released before the lookup.
        let token = match self.by_nickname.get(nickname) {
            Some(entry) => entry.value().clone(),
            None => return false,
        };
        self.validate(&token)
    }

    /// Removes every session whose expiry is not in the future and returns how
    /// many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;

        self.sessions.retain(|_, session| {
            let keep = session.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });

        if removed > 0 {
            self.by_nickname
                .retain(|_, token| self.sessions.contains_key(token.as_str()));
        }

        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn unused_token(&self) -> String {
        loop {
            let token = generate_token();
            if !self.sessions.contains_key(&token) {
                return token;
            }
        }
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
