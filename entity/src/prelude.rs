pub use super::categories::Entity as Categories;
pub use super::comments::Entity as Comments;
pub use super::messages::Entity as Messages;
pub use super::posts::Entity as Posts;
pub use super::posts_categories::Entity as PostsCategories;
pub use super::users::Entity as Users;
