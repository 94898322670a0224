use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS forum;")
            .await?;

        manager
            .get_connection()
            .execute_unprepared("SET search_path TO forum, public;")
            .await?;

        // The application connects as the `forum` role
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    GRANT ALL ON SCHEMA forum TO forum;

                    ALTER DEFAULT PRIVILEGES IN SCHEMA forum GRANT ALL ON TABLES TO forum;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA forum GRANT ALL ON SEQUENCES TO forum;
                END $$;
            "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DO $$ BEGIN
                    ALTER DEFAULT PRIVILEGES IN SCHEMA forum REVOKE ALL ON SEQUENCES FROM forum;
                    ALTER DEFAULT PRIVILEGES IN SCHEMA forum REVOKE ALL ON TABLES FROM forum;
                    REVOKE ALL ON SCHEMA forum FROM forum;
                END $$;
            "#,
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared("DROP SCHEMA IF EXISTS forum CASCADE;")
            .await?;

        Ok(())
    }
}
