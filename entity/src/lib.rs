use uuid::Uuid;

pub mod prelude;

pub mod categories;
pub mod comments;
pub mod messages;
pub mod posts;
pub mod posts_categories;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;
