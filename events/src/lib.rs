//! Event system infrastructure for the forum.
//!
//! This crate lets the domain layer announce what happened without knowing
//! who is listening (today: the live channel broadcaster).
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing all business events in the system
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// Domain events that represent business-level changes in the system.
/// These events are emitted when domain operations complete successfully.
///
/// Entity data is carried as `serde_json::Value` to avoid dependencies on
/// the entity crate.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A post was published. Everyone with an open channel hears about it.
    PostCreated {
        post_id: Id,
        /// Post as listed on the front page (title, slug, author, categories).
        post: Value,
    },
    /// A comment was added to a post.
    CommentCreated {
        post_id: Id,
        comment_id: Id,
        comment: Value,
    },
    /// A direct message was stored. Only the two participants are notified.
    MessageCreated {
        sender_id: Id,
        receiver_id: Id,
        message: Value,
    },
    /// A sign-in replaced an existing session of this user, so channels still
    /// running under the old session should log out.
    SessionSuperseded { user_id: Id },
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers, one after another.
    /// Handlers deal with their own failures; publishing never fails.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
