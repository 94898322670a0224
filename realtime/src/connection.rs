use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use tokio::sync::mpsc::{error::TrySendError, Sender};

/// Matches the entity crate's `Id` type.
pub type UserId = uuid::Uuid;

/// Already serialized frame queued for a single connection.
pub type Frame = String;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Empty until the channel declares who it is with a login frame.
    pub user_id: Option<UserId>,
    pub sender: Sender<Frame>,
}

/// Registry of open channels with a secondary index by declared user.
///
/// Lock order is always `connections` then `user_index`. Nothing holds a
/// `user_index` guard while touching `connections`; readers copy ids out of
/// the index first.
pub struct ConnectionRegistry {
    /// Primary storage: lookup by connection_id for registration/cleanup - O(1)
    connections: DashMap<ConnectionId, ConnectionInfo>,

    /// Secondary index: authenticated connections per user for routing - O(1)
    user_index: DashMap<UserId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            user_index: DashMap::new(),
        }
    }

    /// Adds an anonymous connection.
    pub fn register(&self, sender: Sender<Frame>) -> ConnectionId {
        let connection_id = ConnectionId::new();
        self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                user_id: None,
                sender,
            },
        );
        connection_id
    }

    /// Removes a connection and returns the user it was associated with.
    /// Unknown ids are ignored so cleanup paths can call this unconditionally.
    pub fn unregister(&self, connection_id: &ConnectionId) -> Option<UserId> {
        let (_, info) = self.connections.remove(connection_id)?;
        let user_id = info.user_id?;
        self.remove_from_index(&user_id, connection_id);
        Some(user_id)
    }

    /// Associates a connection with `user_id`, returning the user it was
    /// associated with before (re-login overwrites).
    pub fn set_user(&self, connection_id: &ConnectionId, user_id: UserId) -> Option<UserId> {
        let Some(mut info) = self.connections.get_mut(connection_id) else {
            warn!(
                "Ignoring login for unknown connection {}",
                connection_id.as_str()
            );
            return None;
        };

        let previous = info.user_id.replace(user_id);
        if let Some(previous) = previous.filter(|p| *p != user_id) {
            self.remove_from_index(&previous, connection_id);
        }
        // Index update happens under the connection guard so a concurrent
        // unregister cannot leave a dangling entry behind.
        self.user_index
            .entry(user_id)
            .or_default()
            .insert(connection_id.clone());

        previous
    }

    /// Makes a connection anonymous again, returning the user it had.
    pub fn clear_user(&self, connection_id: &ConnectionId) -> Option<UserId> {
        let mut info = self.connections.get_mut(connection_id)?;
        let previous = info.user_id.take()?;
        self.remove_from_index(&previous, connection_id);
        Some(previous)
    }

    pub fn user_of(&self, connection_id: &ConnectionId) -> Option<UserId> {
        self.connections.get(connection_id)?.user_id
    }

    /// Visits every registered connection. Connections registered or removed
    /// during the walk may or may not be seen.
    pub fn for_each(&self, mut visit: impl FnMut(&ConnectionId, Option<UserId>)) {
        for entry in self.connections.iter() {
            visit(entry.key(), entry.value().user_id);
        }
    }

    pub fn snapshot(&self) -> Vec<(ConnectionId, Option<UserId>)> {
        let mut pairs = Vec::with_capacity(self.connections.len());
        self.for_each(|id, user_id| pairs.push((id.clone(), user_id)));
        pairs
    }

    /// True while at least one connection declares `user_id`.
    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.user_index.contains_key(user_id)
    }

    pub fn online_users(&self) -> Vec<UserId> {
        self.user_index.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Queues `frame` on every connection accepted by `include`. Returns how
    /// many connections took it.
    pub fn send_where(&self, frame: &str, include: impl Fn(Option<UserId>) -> bool) -> usize {
        let mut delivered = 0;
        for entry in self.connections.iter() {
            if include(entry.value().user_id) && Self::try_deliver(entry.key(), entry.value(), frame)
            {
                delivered += 1;
            }
        }
        delivered
    }

    /// Queues `frame` on every connection currently associated with `user_id`.
    pub fn send_to_user(&self, user_id: &UserId, frame: &str) -> usize {
        let connection_ids: Vec<ConnectionId> = match self.user_index.get(user_id) {
            Some(ids) => ids.iter().cloned().collect(),
            None => return 0,
        };

        let mut delivered = 0;
        for connection_id in connection_ids {
            if let Some(info) = self.connections.get(&connection_id) {
                // The index may briefly lag a logout on this connection.
                if info.user_id.as_ref() == Some(user_id)
                    && Self::try_deliver(&connection_id, &info, frame)
                {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    fn try_deliver(connection_id: &ConnectionId, info: &ConnectionInfo, frame: &str) -> bool {
        match info.sender.try_send(frame.to_owned()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(
                    "Outbound queue full for connection {}, dropping frame",
                    connection_id.as_str()
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    "Connection {} is closing, frame not delivered",
                    connection_id.as_str()
                );
                false
            }
        }
    }

    fn remove_from_index(&self, user_id: &UserId, connection_id: &ConnectionId) {
        if let Some(mut entry) = self.user_index.get_mut(user_id) {
            entry.remove(connection_id);

            // Clean up empty user entries
            if entry.is_empty() {
                drop(entry); // Release lock before removal
                self.user_index.remove_if(user_id, |_, ids| ids.is_empty());
            }
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
