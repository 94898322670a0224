pub(crate) mod authenticated_user;
pub(crate) mod session_token;

use axum::http::StatusCode;

type RejectionType = (StatusCode, String);
