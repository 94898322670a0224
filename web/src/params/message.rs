use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    /// Number of newer messages to skip.
    pub(crate) offset: Option<u64>,
    /// Page size, 10 when absent and at most 100.
    pub(crate) limit: Option<u64>,
}
