//! Sign-up, sign-in and sign-out, and turning a session cookie back into a user.
use crate::error::{EntityErrorKind, Error};
use crate::users;
use email_address::EmailAddress;
use entity_api::user;
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use session::{CreatedSession, SessionStore};
use utoipa::ToSchema;

/// Sign-in body: `identifier` is either the email or the nickname.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct Credentials {
    pub identifier: String,
    pub password: String,
}

/// A user together with the session just opened for them.
#[derive(Debug)]
pub struct SignedIn {
    pub user: users::Model,
    pub session: CreatedSession,
}

pub async fn sign_up(
    db: &DatabaseConnection,
    sessions: &SessionStore,
    event_publisher: &EventPublisher,
    user_model: users::Model,
) -> Result<SignedIn, Error> {
    validate_sign_up(&user_model)?;

    if user::exists_by_nickname_or_email(db, user_model.nickname.trim(), user_model.email.trim())
        .await?
    {
        info!(
            "Sign-up refused, nickname or email already taken: {}",
            user_model.nickname
        );
        return Err(Error::entity(EntityErrorKind::Conflict));
    }

    let user_model = users::Model {
        nickname: user_model.nickname.trim().to_owned(),
        email: user_model.email.trim().to_owned(),
        first_name: user_model.first_name.trim().to_owned(),
        last_name: user_model.last_name.trim().to_owned(),
        ..user_model
    };
    let user = user::create(db, user_model).await?;
    debug!("New user signed up: {}", user.id);

    let session = open_session(sessions, event_publisher, &user).await;
    Ok(SignedIn { user, session })
}

pub async fn sign_in(
    db: &DatabaseConnection,
    sessions: &SessionStore,
    event_publisher: &EventPublisher,
    credentials: Credentials,
) -> Result<SignedIn, Error> {
    if credentials.identifier.trim().is_empty() || credentials.password.is_empty() {
        return Err(Error::invalid("identifier and password are required"));
    }

    let user = match user::find_by_identifier(db, &credentials.identifier).await? {
        Some(user) => user,
        None => {
            debug!("Sign-in for unknown identifier");
            return Err(Error::entity(EntityErrorKind::Unauthenticated));
        }
    };

    user::verify_password(&credentials.password, &user.password).await?;

    let session = open_session(sessions, event_publisher, &user).await;
    Ok(SignedIn { user, session })
}

/// Ends the session behind `token`. Fails with `Unauthenticated` when there
/// is no live session, so callers can tell a real logout from a stale cookie.
pub fn sign_out(sessions: &SessionStore, token: &str) -> Result<(), Error> {
    if !sessions.validate(token) {
        return Err(Error::entity(EntityErrorKind::Unauthenticated));
    }
    sessions.delete(token);
    Ok(())
}

/// Loads the user that owns a valid session.
pub async fn resolve_user(
    db: &DatabaseConnection,
    sessions: &SessionStore,
    token: &str,
) -> Result<users::Model, Error> {
    let session = sessions
        .get(token)
        .ok_or_else(|| Error::entity(EntityErrorKind::Unauthenticated))?;

    match user::find_by_id(db, session.user_id).await {
        Ok(user) => Ok(user),
        Err(err) => {
            let err = Error::from(err);
            if err.entity_kind() == Some(&EntityErrorKind::NotFound) {
                // The account is gone; the session is worthless.
                sessions.delete(token);
                Err(Error::entity(EntityErrorKind::Unauthenticated))
            } else {
                Err(err)
            }
        }
    }
}

async fn open_session(
    sessions: &SessionStore,
    event_publisher: &EventPublisher,
    user: &users::Model,
) -> CreatedSession {
    let session = sessions.create(user.id, &user.nickname);

    for superseded in &session.superseded {
        info!(
            "Session for {} superseded by a new sign-in",
            superseded.nickname
        );
        event_publisher
            .publish(DomainEvent::SessionSuperseded {
                user_id: superseded.user_id,
            })
            .await;
    }

    session
}

fn validate_sign_up(user_model: &users::Model) -> Result<(), Error> {
    if user_model.nickname.trim().is_empty()
        || user_model.email.trim().is_empty()
        || user_model.password.is_empty()
    {
        return Err(Error::invalid("nickname, email and password are required"));
    }
    if user_model.first_name.trim().is_empty() || user_model.last_name.trim().is_empty() {
        return Err(Error::invalid("first and last name are required"));
    }
    if !EmailAddress::is_valid(user_model.email.trim()) {
        return Err(Error::invalid("email address is not valid"));
    }
    if user_model.age <= 0 {
        return Err(Error::invalid("age must be positive"));
    }
    Ok(())
}
