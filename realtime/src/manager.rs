use crate::connection::{ConnectionId, ConnectionRegistry, Frame, UserId};
use crate::message::{EventType, Message, MessageScope, ServerEvent};
use log::*;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::Sender;

/// Fans server events out to the channels in the `ConnectionRegistry`.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
    echo_messages_to_sender: bool,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            echo_messages_to_sender: true,
        }
    }

    /// Controls whether a direct message is also pushed to the sender's own
    /// channels. Enabled by default.
    pub fn with_sender_echo(mut self, enabled: bool) -> Self {
        self.echo_messages_to_sender = enabled;
        self
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Registers a new anonymous channel. The returned guard unregisters it
    /// when dropped.
    pub fn connect(self: &Arc<Self>, sender: Sender<Frame>) -> LiveConnection {
        let id = self.registry.register(sender);
        debug!("Registered live connection {}", id.as_str());
        LiveConnection {
            id,
            manager: Arc::clone(self),
        }
    }

    /// Serializes the event once and queues it on every channel in scope.
    /// Returns the number of channels that accepted it.
    pub fn send_message(&self, message: Message) -> usize {
        let event_type = message.event.event_type();

        let frame = match serde_json::to_string(&message.event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize {event_type} event: {e}");
                return 0;
            }
        };

        let delivered = match message.scope {
            MessageScope::Broadcast => self.registry.send_where(&frame, |_| true),
            MessageScope::AuthenticatedExcept { except } => self
                .registry
                .send_where(&frame, |user_id| user_id.is_some_and(|u| u != except)),
            MessageScope::Users { user_ids } => {
                let mut seen = HashSet::with_capacity(user_ids.len());
                user_ids
                    .iter()
                    .filter(|user_id| seen.insert(**user_id))
                    .map(|user_id| self.registry.send_to_user(user_id, &frame))
                    .sum()
            }
        };

        trace!("Delivered {event_type} event to {delivered} connection(s)");
        delivered
    }

    pub fn broadcast_new_post(&self, post: Value) -> usize {
        self.send_message(Message {
            event: ServerEvent::Post { post },
            scope: MessageScope::Broadcast,
        })
    }

    pub fn broadcast_new_comment(&self, post_id: impl ToString, comment: Value) -> usize {
        self.send_message(Message {
            event: ServerEvent::Comment {
                post_id: post_id.to_string(),
                comment,
            },
            scope: MessageScope::Broadcast,
        })
    }

    /// Tells every other authenticated channel that `user_id` came or went.
    pub fn broadcast_presence(&self, user_id: UserId, online: bool) -> usize {
        self.send_message(Message {
            event: ServerEvent::Status { user_id, online },
            scope: MessageScope::AuthenticatedExcept { except: user_id },
        })
    }

    /// Delivers a direct message to the receiver's channels, and to the
    /// sender's too when echo is enabled. A self-addressed message is
    /// delivered once per channel.
    pub fn broadcast_message(&self, message: Value, sender_id: UserId, receiver_id: UserId) -> usize {
        let mut user_ids = vec![receiver_id];
        if self.echo_messages_to_sender {
            user_ids.push(sender_id);
        }

        self.send_message(Message {
            event: ServerEvent::Message { message },
            scope: MessageScope::Users { user_ids },
        })
    }

    pub fn broadcast_forced_logout(&self, user_id: UserId) -> usize {
        info!("Notifying live connections of user {user_id} that their session ended");
        self.send_message(Message {
            event: ServerEvent::TokenExpired { user_id },
            scope: MessageScope::Users {
                user_ids: vec![user_id],
            },
        })
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle for one open channel.
///
/// Walks the `Open -> Authenticated -> Open -> Closed` lifecycle: `login`
/// and `logout` move between the first two states, dropping the handle closes
/// it.
pub struct LiveConnection {
    id: ConnectionId,
    manager: Arc<Manager>,
}

impl LiveConnection {
    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.manager.registry.user_of(&self.id)
    }

    /// Associates the channel with `user_id`. The user is announced online
    /// only when this is their first channel.
    pub fn login(&self, user_id: UserId) {
        let was_online = self.manager.registry.is_online(&user_id);
        let previous = self.manager.registry.set_user(&self.id, user_id);
        if previous == Some(user_id) {
            return;
        }
        if let Some(previous) = previous {
            self.announce_if_gone(previous);
        }
        debug!("Connection {} logged in as {user_id}", self.id.as_str());
        if !was_online {
            self.manager.broadcast_presence(user_id, true);
        }
    }

    /// Makes the channel anonymous again. The channel stays registered.
    pub fn logout(&self) {
        if let Some(user_id) = self.manager.registry.clear_user(&self.id) {
            debug!("Connection {} logged out {user_id}", self.id.as_str());
            self.announce_if_gone(user_id);
        }
    }

    // Offline only once the user's last channel has let go of them
    fn announce_if_gone(&self, user_id: UserId) {
        if !self.manager.registry.is_online(&user_id) {
            self.manager.broadcast_presence(user_id, false);
        }
    }
}

impl Drop for LiveConnection {
    fn drop(&mut self) {
        if let Some(user_id) = self.manager.registry.unregister(&self.id) {
            self.announce_if_gone(user_id);
        }
        debug!("Unregistered live connection {}", self.id.as_str());
    }
}
