use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};
use log::*;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html#associatedconstant.UNPROCESSABLE_ENTITY
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self.0.error_kind {
            DomainErrorKind::Internal(InternalErrorKind::Entity(ref entity_error_kind)) => {
                match entity_error_kind {
                    EntityErrorKind::NotFound => {
                        (StatusCode::NOT_FOUND, "NOT FOUND").into_response()
                    }
                    EntityErrorKind::Invalid => {
                        debug!("Rejected request input: {:?}", self.0.source);
                        (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE ENTITY").into_response()
                    }
                    EntityErrorKind::Unauthenticated => {
                        (StatusCode::UNAUTHORIZED, "UNAUTHORIZED").into_response()
                    }
                    EntityErrorKind::Forbidden => {
                        (StatusCode::FORBIDDEN, "FORBIDDEN").into_response()
                    }
                    EntityErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT").into_response(),
                    EntityErrorKind::DbTransaction | EntityErrorKind::Other(_) => {
                        internal_server_error(&self.0)
                    }
                }
            }
            DomainErrorKind::Internal(_) => internal_server_error(&self.0),
            DomainErrorKind::External(ExternalErrorKind::Network) => {
                error!("Upstream network error: {:?}", self.0);
                (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
            }
            DomainErrorKind::External(ExternalErrorKind::Other(_)) => {
                internal_server_error(&self.0)
            }
        }
    }
}

fn internal_server_error(err: &DomainError) -> Response {
    error!("Request failed: {err:?}");
    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_for(kind: EntityErrorKind) -> StatusCode {
        Error(DomainError {
            source: None,
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(kind)),
        })
        .into_response()
        .status()
    }

    #[test]
    fn entity_errors_map_to_distinct_statuses() {
        assert_eq!(status_for(EntityErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_for(EntityErrorKind::Invalid),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(EntityErrorKind::Unauthenticated),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_for(EntityErrorKind::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_for(EntityErrorKind::Conflict), StatusCode::CONFLICT);
        assert_eq!(
            status_for(EntityErrorKind::DbTransaction),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn storage_failures_hide_their_detail() {
        let response = Error(DomainError {
            source: Some("connection refused by 10.0.0.7".into()),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                EntityErrorKind::Other("db".to_string()),
            )),
        })
        .into_response();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"INTERNAL SERVER ERROR");
    }
}
