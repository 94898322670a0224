use super::error::Error;
use chrono::Utc;
use entity::messages::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, Condition, ConnectionTrait, QueryOrder, QuerySelect, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    message_model: Model,
    sender_id: Id,
) -> Result<Model, Error> {
    debug!(
        "New Message Model to be inserted from {sender_id} to {}",
        message_model.receiver_id
    );

    let message_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        sender_id: Set(sender_id),
        receiver_id: Set(message_model.receiver_id),
        content: Set(message_model.content),
        created_at: Set(Utc::now().into()),
    };

    Ok(message_active_model.insert(db).await?)
}

/// One page of the conversation between two users, newest first.
pub async fn find_discussion(
    db: &impl ConnectionTrait,
    user_id: Id,
    other_user_id: Id,
    offset: u64,
    limit: u64,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(Column::SenderId.eq(user_id))
                        .add(Column::ReceiverId.eq(other_user_id)),
                )
                .add(
                    Condition::all()
                        .add(Column::SenderId.eq(other_user_id))
                        .add(Column::ReceiverId.eq(user_id)),
                ),
        )
        .order_by_desc(Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?)
}
