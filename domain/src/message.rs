use crate::error::Error;
use crate::{messages, users, Id};
use entity_api::{message as message_api, user as user_api};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Largest page a caller can ask for.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Body of `POST /chat/messages`.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct NewMessage {
    #[serde(rename = "receiverID")]
    #[schema(value_type = String, format = Uuid)]
    pub receiver_id: Id,
    pub content: String,
}

/// One page of a conversation and the other participant.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct Discussion {
    pub messages: Vec<messages::Model>,
    pub talker: users::Model,
}

pub async fn create(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    new_message: NewMessage,
    sender_id: Id,
) -> Result<messages::Model, Error> {
    let content = new_message.content.trim().to_owned();
    if content.is_empty() {
        return Err(Error::invalid("message content is required"));
    }

    user_api::find_by_id(db, new_message.receiver_id).await?;

    let message = message_api::create(
        db,
        messages::Model {
            id: Id::nil(),
            sender_id,
            receiver_id: new_message.receiver_id,
            content,
            created_at: chrono::Utc::now().into(),
        },
        sender_id,
    )
    .await?;

    match serde_json::to_value(&message) {
        Ok(payload) => {
            event_publisher
                .publish(DomainEvent::MessageCreated {
                    sender_id: message.sender_id,
                    receiver_id: message.receiver_id,
                    message: payload,
                })
                .await
        }
        Err(e) => warn!("Could not serialize message {} for broadcast: {e}", message.id),
    }

    Ok(message)
}

/// Messages exchanged between `user_id` and `other_user_id`, newest first.
pub async fn find_discussion(
    db: &DatabaseConnection,
    user_id: Id,
    other_user_id: Id,
    offset: Option<u64>,
    limit: Option<u64>,
) -> Result<Discussion, Error> {
    let talker = user_api::find_by_id(db, other_user_id).await?;
    let (offset, limit) = page(offset, limit);

    let messages =
        message_api::find_discussion(db, user_id, other_user_id, offset, limit).await?;

    Ok(Discussion { messages, talker })
}

fn page(offset: Option<u64>, limit: Option<u64>) -> (u64, u64) {
    let limit = match limit {
        None | Some(0) => DEFAULT_PAGE_SIZE,
        Some(limit) => limit.min(MAX_PAGE_SIZE),
    };
    (offset.unwrap_or(0), limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_defaults_and_is_capped() {
        assert_eq!(page(None, None), (0, DEFAULT_PAGE_SIZE));
        assert_eq!(page(Some(20), Some(0)), (20, DEFAULT_PAGE_SIZE));
        assert_eq!(page(Some(5), Some(25)), (5, 25));
        assert_eq!(page(None, Some(10_000)), (0, MAX_PAGE_SIZE));
    }
}
