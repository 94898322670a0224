use crate::{
    controller::health_check_controller, middleware::auth::require_auth, protect, ws, AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use crate::controller::{
    category_controller, comment_controller, message_controller, post_controller, user,
    user_controller, user_session_controller,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "Forum API"
        ),
        paths(
            category_controller::index,
            comment_controller::create,
            comment_controller::index,
            health_check_controller::health_check,
            message_controller::create,
            message_controller::index,
            post_controller::create,
            post_controller::index,
            post_controller::read,
            post_controller::update,
            post_controller::delete,
            user_controller::index,
            user_controller::read,
            user_session_controller::sign_up,
            user_session_controller::sign_in,
            user_session_controller::logout,
            user_session_controller::me,
            user::post_controller::index,
        ),
        components(
            schemas(
                domain::categories::Model,
                domain::comments::Model,
                domain::messages::Model,
                domain::posts::Model,
                domain::users::Model,
                domain::comment::CommentItem,
                domain::comment::NewComment,
                domain::message::Discussion,
                domain::message::NewMessage,
                domain::post::NewPost,
                domain::post::PostChanges,
                domain::post::PostDetail,
                domain::post::PostItem,
                domain::user::ChatUser,
                domain::user_session::Credentials,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "forum", description = "Real-time forum API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "auth_session",
                    "Session token returned from a successful sign in via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(user_session_routes(app_state.clone()))
        .merge(user_session_protected_routes(app_state.clone()))
        .merge(category_routes(app_state.clone()))
        .merge(post_routes(app_state.clone()))
        .merge(comment_routes(app_state.clone()))
        .merge(user_posts_routes(app_state.clone()))
        .merge(chat_routes(app_state.clone()))
        .merge(live_routes(app_state))
        // **** FIXME: protect the OpenAPI web UI
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sign-up", post(user_session_controller::sign_up))
        .route("/sign-in", post(user_session_controller::sign_in))
        // The controller answers 401 itself when no session cookie is present
        .route("/logout", delete(user_session_controller::logout))
        .with_state(app_state)
}

fn user_session_protected_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/me", get(user_session_controller::me))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn category_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/categories", get(category_controller::index))
        .with_state(app_state)
}

fn post_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/posts", post(post_controller::create))
        .route("/posts", get(post_controller::index))
        .route("/posts/{id}", get(post_controller::read))
        .merge(
            // PUT /posts/{id}
            Router::new()
                .route("/posts/{id}", put(post_controller::update))
                .route_layer(from_fn_with_state(app_state.clone(), protect::posts::update)),
        )
        .merge(
            // DELETE /posts/{id}
            Router::new()
                .route("/posts/{id}", delete(post_controller::delete))
                .route_layer(from_fn_with_state(app_state.clone(), protect::posts::delete)),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn comment_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/posts/{id}/comments", post(comment_controller::create))
        .route("/posts/{id}/comments", get(comment_controller::index))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn user_posts_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/users/{id}/posts", get(user::post_controller::index))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn chat_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/chat/users", get(user_controller::index))
        .route("/chat/users/{id}", get(user_controller::read))
        .route("/chat/messages", post(message_controller::create))
        .route("/chat/messages/{id}", get(message_controller::index))
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

fn live_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws::handler::ws_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use events::EventPublisher;
    use realtime::Manager;
    use service::config::Config;
    use session::SessionStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app_state() -> AppState {
        let db = Arc::new(sea_orm::DatabaseConnection::Disconnected);
        let sessions = Arc::new(SessionStore::new(chrono::Duration::hours(2)));
        AppState::new(
            service::AppState::new(Config::from_env(), &db, &sessions),
            &Arc::new(Manager::new()),
            &Arc::new(EventPublisher::new()),
        )
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        define_routes(app_state())
            .oneshot(request)
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn health_is_public() {
        assert_eq!(status_of("GET", "/health").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn forum_routes_require_a_session() {
        for (method, uri) in [
            ("GET", "/me"),
            ("GET", "/posts"),
            ("POST", "/posts"),
            ("GET", "/posts/some-slug"),
            ("PUT", "/posts/6f1c1f0e-8f43-4b7e-9d0b-2c1a5b4b1e11"),
            ("DELETE", "/posts/6f1c1f0e-8f43-4b7e-9d0b-2c1a5b4b1e11"),
            ("GET", "/posts/6f1c1f0e-8f43-4b7e-9d0b-2c1a5b4b1e11/comments"),
            ("GET", "/users/6f1c1f0e-8f43-4b7e-9d0b-2c1a5b4b1e11/posts"),
            ("GET", "/chat/users"),
            ("POST", "/chat/messages"),
        ] {
            assert_eq!(
                status_of(method, uri).await,
                StatusCode::UNAUTHORIZED,
                "{method} {uri}"
            );
        }
    }

    #[tokio::test]
    async fn ws_requires_an_upgrade_request() {
        let status = status_of("GET", "/ws").await;
        assert!(status.is_client_error(), "got {status}");
    }

    #[test]
    fn openapi_document_lists_forum_paths() {
        let doc = ApiDoc::openapi();
        for path in ["/posts", "/posts/{id}/comments", "/chat/messages/{id}", "/sign-in"] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
