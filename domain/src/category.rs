use crate::{categories, error::Error};
use sea_orm::DatabaseConnection;

/// Every category, alphabetically.
pub async fn find_all(db: &DatabaseConnection) -> Result<Vec<categories::Model>, Error> {
    Ok(entity_api::category::find_all(db).await?)
}
