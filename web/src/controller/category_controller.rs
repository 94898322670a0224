use crate::controller::ApiResponse;
use crate::{AppState, Error};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::category as CategoryApi;

/// GET all Categories
#[utoipa::path(
    get,
    path = "/categories",
    responses(
        (status = 200, description = "Successfully retrieved all Categories", body = [domain::categories::Model]),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn index(State(app_state): State<AppState>) -> Result<impl IntoResponse, Error> {
    let categories = CategoryApi::find_all(app_state.db_conn_ref()).await?;

    Ok(Json(ApiResponse::new(StatusCode::OK.into(), categories)))
}
