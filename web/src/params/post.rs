use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    /// Only list posts tagged with this category name.
    pub(crate) category: Option<String>,
}
