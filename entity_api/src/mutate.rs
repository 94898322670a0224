use crate::error::Error;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, Value,
};
use std::collections::HashMap;

/// Sets only the columns named in `update_map` on `active_model` and saves it.
///
/// Keys are column names as the entity defines them (`"title"`, `"image_url"`).
/// Keys that do not name a column of the entity are ignored.
pub async fn update<A, C>(
    db: &DatabaseConnection,
    mut active_model: A,
    update_map: UpdateMap,
) -> Result<<A::Entity as EntityTrait>::Model, Error>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send,
    C: ColumnTrait,
    A::Entity: EntityTrait<Column = C>,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    for column in C::iter() {
        if let Some(value) = update_map.get(&column.to_string()) {
            active_model.set(column, value.clone());
        }
    }
    Ok(active_model.update(db).await?)
}

/// Column name to new value, for partial updates.
#[derive(Debug, Default)]
pub struct UpdateMap {
    map: HashMap<String, Option<Value>>,
}

impl UpdateMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.map.get(key).and_then(|opt| opt.as_ref())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.map.remove(key).and_then(|opt| opt)
    }

    /// Overwrites any value already stored under `key`.
    pub fn insert(&mut self, key: String, value: Option<Value>) {
        self.map.insert(key, value);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Conversion from request parameters into an `UpdateMap`.
pub trait IntoUpdateMap {
    fn into_update_map(self) -> UpdateMap;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_flattens_missing_and_null_values() {
        let mut update_map = UpdateMap::new();
        update_map.insert("title".to_string(), Some(Value::from("New title")));
        update_map.insert("image_url".to_string(), None);

        assert_eq!(update_map.get("title"), Some(&Value::from("New title")));
        assert_eq!(update_map.get("image_url"), None);
        assert_eq!(update_map.get("missing"), None);
        assert_eq!(update_map.remove("title"), Some(Value::from("New title")));
        assert!(update_map.get("title").is_none());
    }
}
