use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const UP: &str = r#"
CREATE TABLE IF NOT EXISTS forum.users (
    id UUID PRIMARY KEY,
    nickname VARCHAR(64) NOT NULL UNIQUE,
    first_name VARCHAR(128) NOT NULL,
    last_name VARCHAR(128) NOT NULL,
    age INTEGER NOT NULL CHECK (age >= 0),
    gender VARCHAR(32) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    password VARCHAR(255) NOT NULL,
    avatar_url VARCHAR(512) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS forum.posts (
    id UUID PRIMARY KEY,
    author_id UUID NOT NULL REFERENCES forum.users (id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    slug VARCHAR(255) NOT NULL UNIQUE,
    description TEXT NOT NULL,
    image_url VARCHAR(512),
    is_edited BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS posts_updated_at_idx ON forum.posts (updated_at DESC);

CREATE TABLE IF NOT EXISTS forum.categories (
    id UUID PRIMARY KEY,
    name VARCHAR(64) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS forum.posts_categories (
    id UUID PRIMARY KEY,
    post_id UUID NOT NULL REFERENCES forum.posts (id) ON DELETE CASCADE,
    category_id UUID NOT NULL REFERENCES forum.categories (id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (post_id, category_id)
);

CREATE TABLE IF NOT EXISTS forum.comments (
    id UUID PRIMARY KEY,
    post_id UUID NOT NULL REFERENCES forum.posts (id) ON DELETE CASCADE,
    author_id UUID NOT NULL REFERENCES forum.users (id) ON DELETE CASCADE,
    parent_id UUID REFERENCES forum.comments (id) ON DELETE CASCADE,
    text TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS comments_post_id_idx ON forum.comments (post_id, created_at);

CREATE TABLE IF NOT EXISTS forum.messages (
    id UUID PRIMARY KEY,
    sender_id UUID NOT NULL REFERENCES forum.users (id) ON DELETE CASCADE,
    receiver_id UUID NOT NULL REFERENCES forum.users (id) ON DELETE CASCADE,
    content TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS messages_participants_idx
    ON forum.messages (sender_id, receiver_id, created_at DESC);

ALTER TABLE forum.users OWNER TO forum;
ALTER TABLE forum.posts OWNER TO forum;
ALTER TABLE forum.categories OWNER TO forum;
ALTER TABLE forum.posts_categories OWNER TO forum;
ALTER TABLE forum.comments OWNER TO forum;
ALTER TABLE forum.messages OWNER TO forum;
"#;

const DOWN: &str = r#"
DROP TABLE IF EXISTS forum.messages;
DROP TABLE IF EXISTS forum.comments;
DROP TABLE IF EXISTS forum.posts_categories;
DROP TABLE IF EXISTS forum.categories;
DROP TABLE IF EXISTS forum.posts;
DROP TABLE IF EXISTS forum.users;
"#;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(UP).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(DOWN).await?;
        Ok(())
    }
}
