use crate::error::Error;
use crate::{comments, users, Id};
use entity_api::{comment as comment_api, post as post_api};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Body of `POST /posts/{id}/comments`.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct NewComment {
    pub text: String,
    /// Comment being replied to, if any.
    #[serde(default, rename = "parentID")]
    #[schema(value_type = Option<String>, format = Uuid)]
    pub parent_id: Option<Id>,
}

/// A comment with its author and its nesting level in the thread.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct CommentItem {
    pub comment: comments::Model,
    pub author_name: String,
    pub author_avatar: String,
    /// 0 for top level comments, parent's depth + 1 for replies.
    pub depth: usize,
}

pub async fn create(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    post_id: Id,
    new_comment: NewComment,
    author: &users::Model,
) -> Result<CommentItem, Error> {
    let text = new_comment.text.trim().to_owned();
    if text.is_empty() {
        return Err(Error::invalid("comment text is required"));
    }

    post_api::find_by_id(db, post_id).await?;

    if let Some(parent_id) = new_comment.parent_id {
        let parent = comment_api::find_by_id(db, parent_id).await?;
        if parent.post_id != post_id {
            return Err(Error::invalid("parent comment belongs to another post"));
        }
    }

    let now = chrono::Utc::now();
    let comment = comment_api::create(
        db,
        comments::Model {
            id: Id::nil(),
            post_id,
            author_id: author.id,
            parent_id: new_comment.parent_id,
            text,
            created_at: now.into(),
            updated_at: now.into(),
        },
        author.id,
    )
    .await?;
    debug!("New comment {} on post {post_id}", comment.id);

    let depth = match comment.parent_id {
        Some(_) => depth_of(db, post_id, &comment).await?,
        None => 0,
    };

    let item = CommentItem {
        comment,
        author_name: author.nickname.clone(),
        author_avatar: author.avatar_url.clone(),
        depth,
    };

    match serde_json::to_value(&item) {
        Ok(payload) => {
            event_publisher
                .publish(DomainEvent::CommentCreated {
                    post_id,
                    comment_id: item.comment.id,
                    comment: payload,
                })
                .await
        }
        Err(e) => warn!(
            "Could not serialize comment {} for broadcast: {e}",
            item.comment.id
        ),
    }

    Ok(item)
}

/// Comments of a post in thread order.
pub async fn find_by_post(db: &DatabaseConnection, post_id: Id) -> Result<Vec<CommentItem>, Error> {
    let rows = comment_api::find_by_post_with_authors(db, post_id).await?;

    let items = rows
        .into_iter()
        .map(|(comment, author)| {
            let (author_name, author_avatar) = author
                .map(|a| (a.nickname, a.avatar_url))
                .unwrap_or_default();
            CommentItem {
                comment,
                author_name,
                author_avatar,
                depth: 0,
            }
        })
        .collect();

    Ok(sort_comments(items))
}

/// Orders comments depth first: every comment is followed by its replies,
/// siblings oldest first, and each one gets its `depth`. Replies whose parent
/// is not in `items` are dropped.
pub fn sort_comments(items: Vec<CommentItem>) -> Vec<CommentItem> {
    let mut children: HashMap<Option<Id>, Vec<CommentItem>> = HashMap::new();
    for item in items {
        children.entry(item.comment.parent_id).or_default().push(item);
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| a.comment.created_at.cmp(&b.comment.created_at));
    }

    let mut sorted = Vec::new();
    // (parent, depth) frames; reversed so the oldest sibling pops first
    let mut stack: Vec<(CommentItem, usize)> = children
        .remove(&None)
        .unwrap_or_default()
        .into_iter()
        .rev()
        .map(|item| (item, 0))
        .collect();

    while let Some((mut item, depth)) = stack.pop() {
        item.depth = depth;
        if let Some(replies) = children.remove(&Some(item.comment.id)) {
            stack.extend(replies.into_iter().rev().map(|reply| (reply, depth + 1)));
        }
        sorted.push(item);
    }

    sorted
}

async fn depth_of(
    db: &DatabaseConnection,
    post_id: Id,
    comment: &comments::Model,
) -> Result<usize, Error> {
    let thread = find_by_post(db, post_id).await?;
    Ok(thread
        .iter()
        .find(|item| item.comment.id == comment.id)
        .map(|item| item.depth)
        .unwrap_or(1))
}


#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use crate::error::EntityErrorKind;
    use crate::posts;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn commenting_on_a_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<posts::Model>::new()])
            .into_connection();
        let now = chrono::Utc::now();
        let author = users::Model {
            id: Id::new_v4(),
            nickname: "bob".to_owned(),
            first_name: "Bob".to_owned(),
            last_name: "Marley".to_owned(),
            age: 36,
            gender: "male".to_owned(),
            email: "bob@example.com".to_owned(),
            password: "hash".to_owned(),
            avatar_url: String::new(),
            created_at: now.into(),
            updated_at: now.into(),
        };

        let err = create(
            &db,
            &EventPublisher::new(),
            Id::new_v4(),
            NewComment {
                text: "hello?".to_owned(),
                parent_id: None,
            },
            &author,
        )
        .await
        .unwrap_err();

        assert_eq!(err.entity_kind(), Some(&EntityErrorKind::NotFound));
    }
}
