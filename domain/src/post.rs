use crate::comment::{self, CommentItem};
use crate::error::{EntityErrorKind, Error};
use crate::{posts, users, Id, IntoUpdateMap, UpdateMap};
use entity_api::{category, post as post_api, user as user_api};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::{DatabaseConnection, Value};
use serde::{Deserialize, Serialize};
use slugify::slugify;
use utoipa::ToSchema;

pub use entity_api::post::{find_by_id, PostItem};

/// Body of `POST /posts`.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    /// Category names; unknown names are created on the fly.
    pub categories: Vec<String>,
}

/// Body of `PUT /posts/{id}`. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct PostChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

impl IntoUpdateMap for PostChanges {
    fn into_update_map(self) -> UpdateMap {
        let mut update_map = UpdateMap::new();
        if let Some(title) = self.title {
            update_map.insert("title".to_string(), Some(Value::from(title)));
        }
        if let Some(description) = self.description {
            update_map.insert("description".to_string(), Some(Value::from(description)));
        }
        if let Some(image_url) = self.image_url {
            update_map.insert("image_url".to_string(), Some(Value::from(image_url)));
        }
        update_map
    }
}

/// A post page: the full post, who wrote it, its categories and its
/// comments in thread order.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PostDetail {
    pub post: posts::Model,
    pub author_name: String,
    pub categories: Vec<String>,
    pub comments: Vec<CommentItem>,
}

pub async fn create(
    db: &DatabaseConnection,
    event_publisher: &EventPublisher,
    new_post: NewPost,
    author: &users::Model,
) -> Result<PostItem, Error> {
    let title = new_post.title.trim().to_owned();
    let description = new_post.description.trim().to_owned();
    let category_names = normalize_categories(&new_post.categories);

    if title.is_empty() || description.is_empty() {
        return Err(Error::invalid("title and description are required"));
    }
    if category_names.is_empty() {
        return Err(Error::invalid("at least one category is required"));
    }

    let slug = slugify!(&title);
    if slug.is_empty() {
        return Err(Error::invalid("title must contain letters or digits"));
    }
    if post_api::exists_by_slug(db, &slug).await? {
        info!("Post slug already taken: {slug}");
        return Err(Error::entity(EntityErrorKind::Conflict));
    }

    let image_url = new_post
        .image_url
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty());

    let post = post_api::create(
        db,
        posts::Model {
            id: Id::nil(),
            author_id: author.id,
            title,
            slug,
            description,
            image_url,
            is_edited: false,
            created_at: chrono::Utc::now().into(),
            updated_at: chrono::Utc::now().into(),
        },
        author.id,
    )
    .await?;

    let categories = category::find_or_create_by_names(db, &category_names).await?;
    category::link_to_post(db, post.id, &categories).await?;

    let item = PostItem {
        id: post.id,
        title: post.title,
        slug: post.slug,
        author_id: author.id,
        author_name: author.nickname.clone(),
        image_url: post.image_url,
        is_edited: post.is_edited,
        updated_at: post.updated_at,
        number_of_comments: 0,
        categories: category_names,
    };

    match serde_json::to_value(&item) {
        Ok(payload) => {
            event_publisher
                .publish(DomainEvent::PostCreated {
                    post_id: item.id,
                    post: payload,
                })
                .await
        }
        Err(e) => warn!("Could not serialize post {} for broadcast: {e}", item.id),
    }

    Ok(item)
}

/// Listing of every post, optionally only those tagged with `category`.
pub async fn find_all(
    db: &DatabaseConnection,
    category: Option<&str>,
) -> Result<Vec<PostItem>, Error> {
    let items = post_api::find_all_items(db).await?;

    Ok(match category.map(|c| c.trim().to_lowercase()) {
        Some(wanted) if !wanted.is_empty() => items
            .into_iter()
            .filter(|item| item.categories.iter().any(|name| *name == wanted))
            .collect(),
        _ => items,
    })
}

pub async fn find_by_author(db: &DatabaseConnection, author_id: Id) -> Result<Vec<PostItem>, Error> {
    // 404 for an unknown author rather than an empty list
    user_api::find_by_id(db, author_id).await?;
    Ok(post_api::find_items_by_author(db, author_id).await?)
}

/// Loads a post page. `id_or_slug` is either the post id or its slug.
pub async fn find_with_comments(
    db: &DatabaseConnection,
    id_or_slug: &str,
) -> Result<PostDetail, Error> {
    let post = match Id::parse_str(id_or_slug) {
        Ok(id) => post_api::find_by_id(db, id).await?,
        Err(_) => post_api::find_by_slug(db, id_or_slug).await?,
    };
    let author = user_api::find_by_id(db, post.author_id).await?;
    let categories = category::find_names_by_posts(db, &[post.id])
        .await?
        .into_iter()
        .map(|(_, name)| name)
        .collect();
    let comments = comment::find_by_post(db, post.id).await?;

    Ok(PostDetail {
        post,
        author_name: author.nickname,
        categories,
        comments,
    })
}

/// Applies `changes` to the post and marks it edited. Only the author may
/// edit a post; the router checks that before this runs.
pub async fn update(
    db: &DatabaseConnection,
    post_id: Id,
    changes: PostChanges,
) -> Result<posts::Model, Error> {
    let changes = PostChanges {
        title: changes.title.map(|t| t.trim().to_owned()),
        description: changes.description.map(|d| d.trim().to_owned()),
        image_url: changes.image_url.map(|u| u.trim().to_owned()),
    };
    if changes.title.as_deref() == Some("") || changes.description.as_deref() == Some("") {
        return Err(Error::invalid("title and description cannot be empty"));
    }

    let update_map = changes.into_update_map();
    if update_map.is_empty() {
        return Err(Error::invalid("nothing to update"));
    }

    Ok(post_api::update(db, post_id, update_map).await?)
}

/// Deletes a post with its comments. The router lets only the author get here.
pub async fn delete(db: &DatabaseConnection, post_id: Id) -> Result<(), Error> {
    Ok(post_api::delete_by_id(db, post_id).await?)
}

/// Lower-cased, trimmed, de-duplicated category names in first-seen order.
fn normalize_categories(names: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.trim().to_lowercase();
        if !name.is_empty() && !normalized.contains(&name) {
            normalized.push(name);
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_normalized_in_order() {
        let names = vec![
            " Rust ".to_string(),
            "go".to_string(),
            "rust".to_string(),
            "".to_string(),
        ];
        assert_eq!(normalize_categories(&names), vec!["rust", "go"]);
    }

    #[test]
    fn only_given_fields_are_updated() {
        let update_map = PostChanges {
            title: Some("New title".to_string()),
            ..Default::default()
        }
        .into_update_map();

        assert_eq!(update_map.get("title"), Some(&Value::from("New title")));
        assert!(update_map.get("description").is_none());
        assert!(update_map.get("image_url").is_none());
    }
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn author() -> users::Model {
        let now = chrono::Utc::now();
        users::Model {
            id: Id::new_v4(),
            nickname: "alice".to_owned(),
            first_name: "Alice".to_owned(),
            last_name: "Liddell".to_owned(),
            age: 25,
            gender: "female".to_owned(),
            email: "alice@example.com".to_owned(),
            password: "hash".to_owned(),
            avatar_url: user_api::DEFAULT_AVATAR_URL.to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn new_post(title: &str, categories: &[&str]) -> NewPost {
        NewPost {
            title: title.to_owned(),
            description: "Some words".to_owned(),
            image_url: None,
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn create_rejects_a_post_without_categories() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let err = create(&db, &EventPublisher::new(), new_post("Hello", &[" "]), &author())
            .await
            .unwrap_err();

        assert_eq!(err.entity_kind(), Some(&EntityErrorKind::Invalid));
        assert!(db.into_transaction_log().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_a_taken_slug() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[count_row(1)]])
            .into_connection();

        let err = create(
            &db,
            &EventPublisher::new(),
            new_post("Hello World", &["general"]),
            &author(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.entity_kind(), Some(&EntityErrorKind::Conflict));
    }

    #[tokio::test]
    async fn delete_of_a_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<posts::Model>::new()])
            .into_connection();

        let err = delete(&db, Id::new_v4()).await.unwrap_err();

        assert_eq!(err.entity_kind(), Some(&EntityErrorKind::NotFound));
    }

    fn count_row(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        std::collections::BTreeMap::from([("num_items", sea_orm::Value::BigInt(Some(n)))])
    }
}
