use crate::{error::Error, users, Id};
use entity_api::user as user_api;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use session::SessionStore;
use utoipa::ToSchema;

pub use entity_api::user::find_by_id;

/// A user as listed in the chat sidebar.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    #[serde(flatten)]
    pub user: users::Model,
    /// True while the user holds a live session.
    pub is_connected: bool,
}

/// Every user other than `current_user_id`, each flagged with whether they
/// currently have a session.
pub async fn find_chat_users(
    db: &DatabaseConnection,
    sessions: &SessionStore,
    current_user_id: Id,
) -> Result<Vec<ChatUser>, Error> {
    let users = user_api::find_all_except(db, current_user_id).await?;

    Ok(users
        .into_iter()
        .map(|user| ChatUser {
            is_connected: sessions.exists_for_nickname(&user.nickname),
            user,
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
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user(nickname: &str) -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Id::new_v4(),
            nickname: nickname.to_owned(),
            first_name: nickname.to_owned(),
            last_name: "Tester".to_owned(),
            age: 30,
            gender: "other".to_owned(),
            email: format!("{nickname}@example.com"),
            password: "hash".to_owned(),
            avatar_url: user_api::DEFAULT_AVATAR_URL.to_owned(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn chat_users_are_flagged_by_live_session() -> Result<(), Error> {
        let bob = user("bob");
        let carol = user("carol");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![bob.clone(), carol.clone()]])
            .into_connection();
        let sessions = SessionStore::new(chrono::Duration::hours(2));
        sessions.create(bob.id, &bob.nickname);

        let listed = find_chat_users(&db, &sessions, Id::new_v4()).await?;

        assert_eq!(listed.len(), 2);
        assert!(listed[0].is_connected);
        assert!(!listed[1].is_connected);

        let json = serde_json::to_value(&listed[0]).unwrap();
        assert_eq!(json["nickname"], "bob");
        assert_eq!(json["isConnected"], true);
        assert!(json.get("password").is_none());
        Ok(())
    }
}
