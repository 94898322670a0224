use super::error::{EntityApiErrorKind, Error};
use crate::category;
use chrono::Utc;
use entity::posts::{ActiveModel, Column, Entity, Model};
use entity::{comments, users, Id};
use log::*;
use sea_orm::{
    entity::prelude::*, ConnectionTrait, DatabaseConnection, QueryOrder, QuerySelect, Set, Value,
};
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

/// A post as shown in listings: no description, but with its author's
/// nickname, category names and comment count.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PostItem {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    pub title: String,
    pub slug: String,
    #[schema(value_type = String, format = Uuid)]
    pub author_id: Id,
    pub author_name: String,
    pub image_url: Option<String>,
    pub is_edited: bool,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
    pub number_of_comments: u64,
    pub categories: Vec<String>,
}

pub async fn create(
    db: &impl ConnectionTrait,
    post_model: Model,
    author_id: Id,
) -> Result<Model, Error> {
    debug!("New Post Model to be inserted: {:?}", post_model.slug);

    let now = Utc::now();
    let post_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        author_id: Set(author_id),
        title: Set(post_model.title),
        slug: Set(post_model.slug),
        description: Set(post_model.description),
        image_url: Set(post_model.image_url),
        is_edited: Set(false),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(post_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

pub async fn find_by_slug(db: &impl ConnectionTrait, slug: &str) -> Result<Model, Error> {
    Entity::find()
        .filter(Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        })
}

pub async fn exists_by_slug(db: &impl ConnectionTrait, slug: &str) -> Result<bool, Error> {
    Ok(Entity::find()
        .filter(Column::Slug.eq(slug))
        .count(db)
        .await?
        > 0)
}

/// Applies `update_map` to the post and flags it as edited.
pub async fn update(
    db: &DatabaseConnection,
    id: Id,
    mut update_map: crate::mutate::UpdateMap,
) -> Result<Model, Error> {
    let post = find_by_id(db, id).await?;
    debug!("Existing Post model to be Updated: {:?}", post.id);

    update_map.insert("is_edited".to_string(), Some(Value::Bool(Some(true))));
    update_map.insert(
        "updated_at".to_string(),
        Some(Value::from(DateTimeWithTimeZone::from(Utc::now()))),
    );

    let active_model: ActiveModel = post.into();
    crate::mutate::update::<ActiveModel, Column>(db, active_model, update_map).await
}

/// Removes the post. Its comments and category links go with it.
pub async fn delete_by_id(db: &impl ConnectionTrait, id: Id) -> Result<(), Error> {
    let post = find_by_id(db, id).await?;
    debug!("Deleting Post: {:?}", post.id);

    post.delete(db).await?;
    Ok(())
}

/// Every post, most recently edited first.
pub async fn find_all_items(db: &impl ConnectionTrait) -> Result<Vec<PostItem>, Error> {
    find_items(db, None).await
}

pub async fn find_items_by_author(
    db: &impl ConnectionTrait,
    author_id: Id,
) -> Result<Vec<PostItem>, Error> {
    find_items(db, Some(author_id)).await
}

async fn find_items(
    db: &impl ConnectionTrait,
    author_id: Option<Id>,
) -> Result<Vec<PostItem>, Error> {
    let mut query = Entity::find();
    if let Some(author_id) = author_id {
        query = query.filter(Column::AuthorId.eq(author_id));
    }

    let posts = query
        .find_also_related(users::Entity)
        .order_by_desc(Column::UpdatedAt)
        .all(db)
        .await?;

    if posts.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Id> = posts.iter().map(|(post, _)| post.id).collect();

    let mut categories: HashMap<Id, Vec<String>> = HashMap::new();
    for (post_id, name) in category::find_names_by_posts(db, &post_ids).await? {
        categories.entry(post_id).or_default().push(name);
    }

    let comment_counts: HashMap<Id, i64> = comments::Entity::find()
        .select_only()
        .column(comments::Column::PostId)
        .column_as(comments::Column::Id.count(), "count")
        .filter(comments::Column::PostId.is_in(post_ids))
        .group_by(comments::Column::PostId)
        .into_tuple::<(Id, i64)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(posts
        .into_iter()
        .map(|(post, author)| PostItem {
            id: post.id,
            author_name: author.map(|a| a.nickname).unwrap_or_default(),
            number_of_comments: comment_counts
                .get(&post.id)
                .copied()
                .unwrap_or_default()
                .max(0) as u64,
            categories: categories.remove(&post.id).unwrap_or_default(),
            title: post.title,
            slug: post.slug,
            author_id: post.author_id,
            image_url: post.image_url,
            is_edited: post.is_edited,
            updated_at: post.updated_at,
        })
        .collect())
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    fn post_model() -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            author_id: Id::new_v4(),
            title: "Hello world".to_owned(),
            slug: "hello-world".to_owned(),
            description: "First post".to_owned(),
            image_url: None,
            is_edited: false,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn create_returns_a_new_post_model() -> Result<(), Error> {
        let post = post_model();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post.clone()]])
            .into_connection();

        let created = create(&db, post.clone(), post.author_id).await?;

        assert_eq!(created.id, post.id);
        assert_eq!(created.slug, "hello-world");
        Ok(())
    }

    #[tokio::test]
    async fn find_by_slug_returns_a_single_record() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let _ = find_by_slug(&db, "hello-world").await;

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "posts"."id", "posts"."author_id", "posts"."title", "posts"."slug", "posts"."description", "posts"."image_url", "posts"."is_edited", "posts"."created_at", "posts"."updated_at" FROM "forum"."posts" WHERE "posts"."slug" = $1 LIMIT $2"#,
                ["hello-world".into(), sea_orm::Value::BigUnsigned(Some(1))]
            )]
        );

        Ok(())
    }

    #[tokio::test]
    async fn find_by_slug_returns_not_found_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let result = find_by_slug(&db, "nope").await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn update_marks_the_post_as_edited() -> Result<(), Error> {
        let post = post_model();
        let edited = Model {
            title: "Hello again".to_owned(),
            is_edited: true,
            ..post.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post.clone()]])
            .append_query_results([[edited.clone()]])
            .into_connection();

        let mut update_map = crate::mutate::UpdateMap::new();
        update_map.insert(
            "title".to_string(),
            Some(Value::String(Some(Box::new("Hello again".to_string())))),
        );
        let updated = update(&db, post.id, update_map).await?;

        assert!(updated.is_edited);
        assert_eq!(updated.title, "Hello again");
        Ok(())
    }

    #[tokio::test]
    async fn delete_by_id_removes_an_existing_post() -> Result<(), Error> {
        let post = post_model();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post.clone()]])
            .append_exec_results([sea_orm::MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        delete_by_id(&db, post.id).await?;

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
        assert_eq!(
            log[1],
            Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"DELETE FROM "forum"."posts" WHERE "posts"."id" = $1"#,
                [post.id.into()]
            )
        );
        Ok(())
    }

    #[tokio::test]
    async fn delete_by_id_returns_not_found_for_an_unknown_post() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let result = delete_by_id(&db, Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn find_all_items_stops_after_one_query_when_there_are_no_posts() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let items = find_all_items(&db).await?;

        assert!(items.is_empty());
        assert_eq!(db.into_transaction_log().len(), 1);
        Ok(())
    }
}
