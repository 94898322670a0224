use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use slugify::slugify;

pub use entity::{categories, comments, messages, posts, posts_categories, users, Id};

pub mod category;
pub mod comment;
pub mod error;
pub mod message;
pub mod mutate;
pub mod post;
pub mod user;

pub use mutate::{IntoUpdateMap, UpdateMap};

/// Fills an empty database with a handful of users, categories, posts and
/// comments for local development.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    let mut authors = Vec::new();
    for (nickname, first_name, last_name, age, gender) in [
        ("alice", "Alice", "Liddell", 25, "female"),
        ("bob", "Bob", "Marley", 36, "male"),
        ("carol", "Carol", "Danvers", 31, "female"),
    ] {
        let user = users::ActiveModel {
            id: Set(Id::new_v4()),
            nickname: Set(nickname.to_owned()),
            first_name: Set(first_name.to_owned()),
            last_name: Set(last_name.to_owned()),
            age: Set(age),
            gender: Set(gender.to_owned()),
            email: Set(format!("{nickname}@example.com")),
            password: Set(user::generate_hash("password".to_owned())),
            avatar_url: Set(user::DEFAULT_AVATAR_URL.to_owned()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await?;
        authors.push(user);
    }

    let names = ["general", "rust", "go", "javascript"]
        .map(str::to_owned)
        .to_vec();
    let categories = category::find_or_create_by_names(db, &names).await?;

    for (index, (author, title, description)) in [
        (
            &authors[0],
            "Welcome to the forum",
            "Introduce yourself and say hello to everyone.",
        ),
        (
            &authors[1],
            "Ownership explained",
            "A short walk through moves, borrows and lifetimes.",
        ),
    ]
    .into_iter()
    .enumerate()
    {
        let post = posts::ActiveModel {
            id: Set(Id::new_v4()),
            author_id: Set(author.id),
            title: Set(title.to_owned()),
            slug: Set(slugify!(title)),
            description: Set(description.to_owned()),
            image_url: Set(None),
            is_edited: Set(false),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await?;

        category::link_to_post(db, post.id, &categories[index..index + 2]).await?;

        comments::ActiveModel {
            id: Set(Id::new_v4()),
            post_id: Set(post.id),
            author_id: Set(authors[2].id),
            parent_id: Set(None),
            text: Set("Thanks for sharing!".to_owned()),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
