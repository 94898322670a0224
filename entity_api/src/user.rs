use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use sea_orm::{entity::prelude::*, Condition, ConnectionTrait, QueryOrder, Set};

/// Avatar assigned when a user signs up without one.
pub const DEFAULT_AVATAR_URL: &str = "/uploads/avatar.1.jpeg";

/// Inserts a new user. Nickname and email are stored lower-cased and the
/// password is hashed before it reaches the database.
pub async fn create(db: &impl ConnectionTrait, user_model: Model) -> Result<Model, Error> {
    debug!("New User Model to be inserted: {}", user_model.nickname);

    let avatar_url = if user_model.avatar_url.trim().is_empty() {
        DEFAULT_AVATAR_URL.to_string()
    } else {
        user_model.avatar_url
    };

    let now = Utc::now();
    let user_active_model: ActiveModel = ActiveModel {
        id: Set(Id::new_v4()),
        nickname: Set(user_model.nickname.to_lowercase()),
        first_name: Set(user_model.first_name),
        last_name: Set(user_model.last_name),
        age: Set(user_model.age),
        gender: Set(user_model.gender),
        email: Set(user_model.email.to_lowercase()),
        password: Set(generate_hash(user_model.password)),
        avatar_url: Set(avatar_url),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id).one(db).await?.ok_or_else(|| Error {
        source: None,
        error_kind: EntityApiErrorKind::RecordNotFound,
    })
}

/// Looks a user up by email or nickname, whichever `identifier` matches.
pub async fn find_by_identifier(
    db: &impl ConnectionTrait,
    identifier: &str,
) -> Result<Option<Model>, Error> {
    let identifier = identifier.trim().to_lowercase();

    Ok(Entity::find()
        .filter(
            Condition::any()
                .add(Column::Email.eq(identifier.as_str()))
                .add(Column::Nickname.eq(identifier.as_str())),
        )
        .one(db)
        .await?)
}

/// True when either the nickname or the email is already taken.
pub async fn exists_by_nickname_or_email(
    db: &impl ConnectionTrait,
    nickname: &str,
    email: &str,
) -> Result<bool, Error> {
    let count = Entity::find()
        .filter(
            Condition::any()
                .add(Column::Nickname.eq(nickname.to_lowercase()))
                .add(Column::Email.eq(email.to_lowercase())),
        )
        .count(db)
        .await?;

    Ok(count > 0)
}

/// All users other than `user_id`, ordered by nickname.
pub async fn find_all_except(db: &impl ConnectionTrait, user_id: Id) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Id.ne(user_id))
        .order_by_asc(Column::Nickname)
        .all(db)
        .await?)
}

pub async fn verify_password(password_to_verify: &str, password_hash: &str) -> Result<(), Error> {
    match password_auth::verify_password(password_to_verify, password_hash) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordUnauthenticated,
        }),
    }
}

pub fn generate_hash(password: String) -> String {
    password_auth::generate_hash(password)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    fn user_model() -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            nickname: "alice".to_owned(),
            first_name: "Alice".to_owned(),
            last_name: "Liddell".to_owned(),
            age: 25,
            gender: "female".to_owned(),
            email: "alice@example.com".to_owned(),
            password: generate_hash("password".to_owned()),
            avatar_url: DEFAULT_AVATAR_URL.to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn create_returns_the_inserted_user() -> Result<(), Error> {
        let user = user_model();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user.clone()]])
            .into_connection();

        let input = Model {
            nickname: "Alice".to_owned(),
            email: "Alice@Example.com".to_owned(),
            avatar_url: String::new(),
            ..user.clone()
        };
        let created = create(&db, input).await?;

        assert_eq!(created.id, user.id);
        assert_eq!(created.nickname, "alice");
        Ok(())
    }

    #[tokio::test]
    async fn create_returns_error_on_duplicate_nickname() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([sea_orm::DbErr::Custom("duplicate key".to_string())])
            .into_connection();

        assert!(create(&db, user_model()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_returns_a_single_record() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let user_id = Id::new_v4();
        let _ = find_by_id(&db, user_id).await;

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "users"."id", "users"."nickname", "users"."first_name", "users"."last_name", "users"."age", "users"."gender", "users"."email", "users"."password", "users"."avatar_url", "users"."created_at", "users"."updated_at" FROM "forum"."users" WHERE "users"."id" = $1 LIMIT $2"#,
                [user_id.into(), sea_orm::Value::BigUnsigned(Some(1))]
            )]
        );

        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_returns_not_found_for_missing_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let result = find_by_id(&db, Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn find_by_identifier_matches_email_or_nickname_lowercased() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let _ = find_by_identifier(&db, " Alice ").await;

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "users"."id", "users"."nickname", "users"."first_name", "users"."last_name", "users"."age", "users"."gender", "users"."email", "users"."password", "users"."avatar_url", "users"."created_at", "users"."updated_at" FROM "forum"."users" WHERE "users"."email" = $1 OR "users"."nickname" = $2 LIMIT $3"#,
                [
                    "alice".into(),
                    "alice".into(),
                    sea_orm::Value::BigUnsigned(Some(1))
                ]
            )]
        );

        Ok(())
    }

    #[tokio::test]
    async fn find_all_except_excludes_the_caller() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let user_id = Id::new_v4();
        let _ = find_all_except(&db, user_id).await;

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "users"."id", "users"."nickname", "users"."first_name", "users"."last_name", "users"."age", "users"."gender", "users"."email", "users"."password", "users"."avatar_url", "users"."created_at", "users"."updated_at" FROM "forum"."users" WHERE "users"."id" <> $1 ORDER BY "users"."nickname" ASC"#,
                [user_id.into()]
            )]
        );

        Ok(())
    }

    #[tokio::test]
    async fn verify_password_accepts_only_the_right_password() {
        let hash = generate_hash("s3cret".to_owned());

        assert!(verify_password("s3cret", &hash).await.is_ok());
        assert_eq!(
            verify_password("wrong", &hash).await.unwrap_err().error_kind,
            EntityApiErrorKind::RecordUnauthenticated
        );
    }
}
