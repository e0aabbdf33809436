//! Forum repository implementation

use std::collections::HashMap;

use chrono::Utc;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::forum::{Forum, ForumPost, ForumPostWithAuthor, PostRange, VoteDirection};
use crate::utils::errors::{CollectivError, Result};

const FORUM_COLUMNS: &str = "id, event_id, average_sentiment_score, number_of_post_sentiment_calculated, top_words";

const POST_WITH_AUTHOR_SELECT: &str = r#"
    SELECT fp.id, fp.forum_id, fp.author_id, fp.author_role, fp.content, fp.posted_at,
           fp.is_anonymous, fp.vote_count, fp.sentiment_score, u.full_name AS author_full_name
    FROM forum_posts fp
    LEFT JOIN users u ON u.user_id = fp.author_id
"#;

#[derive(Clone)]
#[derive(Debug)]
pub struct ForumRepository {
    pool: PgPool,
}

impl ForumRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the forum of a freshly created event
    pub async fn create(&self, conn: &mut PgConnection, event_id: Uuid) -> Result<Forum> {
        let forum = sqlx::query_as::<_, Forum>(&format!(
            "INSERT INTO forums (id, event_id) VALUES ($1, $2) RETURNING {FORUM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(event_id)
        .fetch_one(conn)
        .await?;

        Ok(forum)
    }

    /// The event's forum, created when missing
    pub async fn get_or_create(&self, event_id: Uuid) -> Result<Forum> {
        sqlx::query("INSERT INTO forums (id, event_id) VALUES ($1, $2) ON CONFLICT (event_id) DO NOTHING")
            .bind(Uuid::new_v4())
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        let forum = sqlx::query_as::<_, Forum>(&format!("SELECT {FORUM_COLUMNS} FROM forums WHERE event_id = $1"))
            .bind(event_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(forum)
    }

    pub async fn find_by_id(&self, forum_id: Uuid) -> Result<Forum> {
        sqlx::query_as::<_, Forum>(&format!("SELECT {FORUM_COLUMNS} FROM forums WHERE id = $1"))
            .bind(forum_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CollectivError::not_found("Forum"))
    }

    pub async fn lock(&self, conn: &mut PgConnection, forum_id: Uuid) -> Result<Forum> {
        sqlx::query_as::<_, Forum>(&format!("SELECT {FORUM_COLUMNS} FROM forums WHERE id = $1 FOR UPDATE"))
            .bind(forum_id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| CollectivError::not_found("Forum"))
    }

    pub async fn list_all(&self) -> Result<Vec<Forum>> {
        let forums = sqlx::query_as::<_, Forum>(&format!("SELECT {FORUM_COLUMNS} FROM forums"))
            .fetch_all(&self.pool)
            .await?;

        Ok(forums)
    }

    pub async fn update_sentiment(
        &self,
        conn: &mut PgConnection,
        forum_id: Uuid,
        average: f64,
        count: i32,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE forums SET average_sentiment_score = $2, number_of_post_sentiment_calculated = $3 WHERE id = $1",
        )
        .bind(forum_id)
        .bind(average)
        .bind(count)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn update_top_words(
        &self,
        conn: &mut PgConnection,
        forum_id: Uuid,
        top_words: &HashMap<String, i64>,
    ) -> Result<()> {
        sqlx::query("UPDATE forums SET top_words = $2 WHERE id = $1")
            .bind(forum_id)
            .bind(Json(top_words))
            .execute(conn)
            .await?;

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create_post(
        &self,
        conn: &mut PgConnection,
        forum_id: Uuid,
        author_id: &str,
        author_role: &str,
        content: &str,
        is_anonymous: bool,
        sentiment_score: Option<f64>,
    ) -> Result<ForumPost> {
        let post = sqlx::query_as::<_, ForumPost>(
            r#"
            INSERT INTO forum_posts (id, forum_id, author_id, author_role, content, posted_at, is_anonymous, sentiment_score)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, forum_id, author_id, author_role, content, posted_at, is_anonymous, vote_count, sentiment_score
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(forum_id)
        .bind(author_id)
        .bind(author_role)
        .bind(content)
        .bind(Utc::now())
        .bind(is_anonymous)
        .bind(sentiment_score)
        .fetch_one(conn)
        .await?;

        Ok(post)
    }

    pub async fn find_post(&self, post_id: Uuid) -> Result<Option<ForumPostWithAuthor>> {
        let post = sqlx::query_as::<_, ForumPostWithAuthor>(&format!("{POST_WITH_AUTHOR_SELECT} WHERE fp.id = $1"))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    /// Posts of the forum inside `range`, newest first
    pub async fn list_posts(&self, forum_id: Uuid, range: &PostRange) -> Result<Vec<ForumPostWithAuthor>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(POST_WITH_AUTHOR_SELECT);
        builder.push(" WHERE fp.forum_id = ").push_bind(forum_id);

        if let Some(before) = range.before {
            builder.push(" AND fp.posted_at < ").push_bind(before);
        }

        if let Some(after) = range.after {
            builder.push(" AND fp.posted_at > ").push_bind(after);
        }

        builder.push(" ORDER BY fp.posted_at DESC");

        if let Some(limit) = range.limit {
            builder.push(" LIMIT ").push_bind(limit);
        }

        let posts = builder
            .build_query_as::<ForumPostWithAuthor>()
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Posts of the forum with at least `threshold` votes
    pub async fn trending_posts(&self, forum_id: Uuid, threshold: i32) -> Result<Vec<ForumPostWithAuthor>> {
        let posts = sqlx::query_as::<_, ForumPostWithAuthor>(&format!(
            "{POST_WITH_AUTHOR_SELECT} WHERE fp.forum_id = $1 AND fp.vote_count >= $2 ORDER BY fp.vote_count DESC, fp.posted_at DESC"
        ))
        .bind(forum_id)
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    pub async fn lock_post(&self, conn: &mut PgConnection, post_id: Uuid) -> Result<ForumPost> {
        sqlx::query_as::<_, ForumPost>(
            r#"
            SELECT id, forum_id, author_id, author_role, content, posted_at, is_anonymous, vote_count, sentiment_score
            FROM forum_posts
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(post_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| CollectivError::not_found("Forum post"))
    }

    pub async fn find_vote(&self, conn: &mut PgConnection, post_id: Uuid, user_id: &str) -> Result<Option<VoteDirection>> {
        let direction: Option<i16> =
            sqlx::query_scalar("SELECT direction FROM forum_post_votes WHERE post_id = $1 AND user_id = $2")
                .bind(post_id)
                .bind(user_id)
                .fetch_optional(conn)
                .await?;

        Ok(direction.and_then(VoteDirection::from_i16))
    }

    /// Store the user's vote on the post, removing it when `vote` is `None`
    pub async fn set_vote(
        &self,
        conn: &mut PgConnection,
        post_id: Uuid,
        user_id: &str,
        vote: Option<VoteDirection>,
    ) -> Result<()> {
        match vote {
            Some(direction) => {
                sqlx::query(
                    r#"
                    INSERT INTO forum_post_votes (post_id, user_id, direction)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (post_id, user_id) DO UPDATE SET direction = EXCLUDED.direction
                    "#,
                )
                .bind(post_id)
                .bind(user_id)
                .bind(direction.as_i16())
                .execute(conn)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM forum_post_votes WHERE post_id = $1 AND user_id = $2")
                    .bind(post_id)
                    .bind(user_id)
                    .execute(conn)
                    .await?;
            }
        }

        Ok(())
    }

    pub async fn add_vote_count(&self, conn: &mut PgConnection, post_id: Uuid, delta: i32) -> Result<i32> {
        let count: i32 =
            sqlx::query_scalar("UPDATE forum_posts SET vote_count = vote_count + $2 WHERE id = $1 RETURNING vote_count")
                .bind(post_id)
                .bind(delta)
                .fetch_one(conn)
                .await?;

        Ok(count)
    }
}
