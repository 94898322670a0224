use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Turns domain events into pushes on the live channels.
pub struct LiveDomainEventHandler {
    manager: Arc<Manager>,
}

impl LiveDomainEventHandler {
    pub fn new(manager: Arc<Manager>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl EventHandler for LiveDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        match event {
            DomainEvent::PostCreated { post_id, post } => {
                let delivered = self.manager.broadcast_new_post(post.clone());
                debug!("Post {post_id} pushed to {delivered} connection(s)");
            }

            DomainEvent::CommentCreated {
                post_id,
                comment_id,
                comment,
            } => {
                let delivered = self.manager.broadcast_new_comment(post_id, comment.clone());
                debug!("Comment {comment_id} pushed to {delivered} connection(s)");
            }

            DomainEvent::MessageCreated {
                sender_id,
                receiver_id,
                message,
            } => {
                let delivered =
                    self.manager
                        .broadcast_message(message.clone(), *sender_id, *receiver_id);
                debug!("Direct message pushed to {delivered} connection(s)");
            }

            DomainEvent::SessionSuperseded { user_id } => {
                self.manager.broadcast_forced_logout(*user_id);
            }
        }
    }
}
