use super::error::Error;
use chrono::Utc;
use entity::categories::{ActiveModel, Column, Entity, Model};
use entity::{posts_categories, Id};
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder, Set};

pub async fn find_all(db: &impl ConnectionTrait) -> Result<Vec<Model>, Error> {
    Ok(Entity::find().order_by_asc(Column::Name).all(db).await?)
}

pub async fn find_by_name(db: &impl ConnectionTrait, name: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Name.eq(name))
        .one(db)
        .await?)
}

/// Returns the categories named in `names`, creating the ones that do not
/// exist yet. Order follows `names`.
pub async fn find_or_create_by_names(
    db: &impl ConnectionTrait,
    names: &[String],
) -> Result<Vec<Model>, Error> {
    let mut categories = Vec::with_capacity(names.len());

    for name in names {
        let category = match find_by_name(db, name).await? {
            Some(category) => category,
            None => {
                debug!("Creating category {name}");
                ActiveModel {
                    id: Set(Id::new_v4()),
                    name: Set(name.clone()),
                    created_at: Set(Utc::now().into()),
                }
                .insert(db)
                .await?
            }
        };
        categories.push(category);
    }

    Ok(categories)
}

/// Attaches every category in `categories` to the post.
pub async fn link_to_post(
    db: &impl ConnectionTrait,
    post_id: Id,
    categories: &[Model],
) -> Result<(), Error> {
    if categories.is_empty() {
        return Ok(());
    }

    let now = Utc::now();
    let links = categories
        .iter()
        .map(|category| posts_categories::ActiveModel {
            id: Set(Id::new_v4()),
            post_id: Set(post_id),
            category_id: Set(category.id),
            created_at: Set(now.into()),
        })
        .collect::<Vec<_>>();

    posts_categories::Entity::insert_many(links).exec(db).await?;
    Ok(())
}

/// Category names per post for every post in `post_ids`.
pub async fn find_names_by_posts(
    db: &impl ConnectionTrait,
    post_ids: &[Id],
) -> Result<Vec<(Id, String)>, Error> {
    let links = posts_categories::Entity::find()
        .filter(posts_categories::Column::PostId.is_in(post_ids.iter().copied()))
        .find_also_related(Entity)
        .order_by_asc(posts_categories::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(links
        .into_iter()
        .filter_map(|(link, category)| category.map(|c| (link.post_id, c.name)))
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

    fn category(name: &str) -> Model {
        Model {
            id: Id::new_v4(),
            name: name.to_owned(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn find_all_orders_by_name() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let _ = find_all(&db).await;

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "categories"."id", "categories"."name", "categories"."created_at" FROM "forum"."categories" ORDER BY "categories"."name" ASC"#,
                []
            )]
        );

        Ok(())
    }

    #[tokio::test]
    async fn find_or_create_reuses_existing_and_creates_missing() -> Result<(), Error> {
        let rust = category("rust");
        let golang = category("golang");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // lookup "rust": found
            .append_query_results([[rust.clone()]])
            // lookup "golang": missing, then the insert returns it
            .append_query_results([Vec::<Model>::new()])
            .append_query_results([[golang.clone()]])
            .into_connection();

        let categories =
            find_or_create_by_names(&db, &["rust".to_owned(), "golang".to_owned()]).await?;

        assert_eq!(categories, vec![rust, golang]);
        assert_eq!(db.into_transaction_log().len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn link_to_post_does_nothing_without_categories() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        link_to_post(&db, Id::new_v4(), &[]).await?;

        assert!(db.into_transaction_log().is_empty());
        Ok(())
    }
}
