//! Tags, categories and goal kinds

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::tag::{EventCategory, Tag};
use crate::utils::errors::Result;

#[derive(Clone)]
#[derive(Debug)]
pub struct TaxonomyRepository {
    pool: PgPool,
}

impl TaxonomyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    pub async fn find_tags(&self, ids: &[Uuid]) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE id = ANY($1) ORDER BY name")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(tags)
    }

    /// Fetch tags by name, creating the missing ones. Names must already be normalized.
    pub async fn get_or_create_tags(&self, names: &[String]) -> Result<Vec<Tag>> {
        let mut tx = self.pool.begin().await?;

        for name in names {
            sqlx::query("INSERT INTO tags (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
                .bind(Uuid::new_v4())
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        let tags = sqlx::query_as::<_, Tag>("SELECT id, name FROM tags WHERE name = ANY($1) ORDER BY name")
            .bind(names)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(tags)
    }

    pub async fn tags_for_event(&self, event_id: Uuid) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.name
            FROM tags t
            JOIN event_tags et ON et.tag_id = t.id
            WHERE et.event_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    pub async fn attach_tags(&self, conn: &mut PgConnection, event_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO event_tags (event_id, tag_id)
            SELECT $1, UNNEST($2::UUID[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(event_id)
        .bind(tag_ids)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn list_categories(&self) -> Result<Vec<EventCategory>> {
        let categories = sqlx::query_as::<_, EventCategory>("SELECT id, name FROM event_categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(categories)
    }

    pub async fn find_category(&self, id: Uuid) -> Result<Option<EventCategory>> {
        let category = sqlx::query_as::<_, EventCategory>("SELECT id, name FROM event_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(category)
    }

    /// `name` must already be normalized
    pub async fn get_or_create_category(&self, name: &str) -> Result<EventCategory> {
        sqlx::query("INSERT INTO event_categories (id, name) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(Uuid::new_v4())
            .bind(name)
            .execute(&self.pool)
            .await?;

        let category = sqlx::query_as::<_, EventCategory>("SELECT id, name FROM event_categories WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;

        Ok(category)
    }

    pub async fn ensure_goal_kind(&self, conn: &mut PgConnection, kind: &str) -> Result<()> {
        sqlx::query("INSERT INTO goal_kinds (kind) VALUES ($1) ON CONFLICT (kind) DO NOTHING")
            .bind(kind)
            .execute(conn)
            .await?;

        Ok(())
    }
}
