use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::comments::{ActiveModel, Column, Entity, Model};
use entity::{users, Id};
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};

pub async fn create(
    db: &impl ConnectionTrait,
    comment_model: Model,
    author_id: Id,
) -> Result<Model, Error> {
    debug!(
        "New Comment Model to be inserted on post {}",
        comment_model.post_id
    );

    let now = Utc::now();
    let comment_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        post_id: Set(comment_model.post_id),
        author_id: Set(author_id),
        parent_id: Set(comment_model.parent_id),
        text: Set(comment_model.text),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(comment_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Comments of a post with their authors, oldest first.
pub async fn find_by_post_with_authors(
    db: &impl ConnectionTrait,
    post_id: Id,
) -> Result<Vec<(Model, Option<users::Model>)>, Error> {
    Ok(Entity::find()
        .filter(Column::PostId.eq(post_id))
        .find_also_related(users::Entity)
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?)
}
