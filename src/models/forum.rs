//! Forum model

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::errors::{CollectivError, Result};
use crate::utils::helpers::parse_iso_datetime;

pub const ANONYMOUS_AUTHOR_NAME: &str = "Anonymous User";
pub const CREATOR_ROLE: &str = "creator";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Forum {
    pub id: Uuid,
    pub event_id: Uuid,
    pub average_sentiment_score: Option<f64>,
    pub number_of_post_sentiment_calculated: i32,
    pub top_words: Json<HashMap<String, i64>>,
}

impl Forum {
    /// Most frequent words, highest count first, ties broken alphabetically
    pub fn ranked_top_words(&self, limit: usize) -> Vec<(String, i64)> {
        let mut words: Vec<(String, i64)> = self
            .top_words
            .0
            .iter()
            .map(|(word, count)| (word.clone(), *count))
            .collect();

        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(limit);
        words
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumPost {
    pub id: Uuid,
    pub forum_id: Uuid,
    pub author_id: String,
    pub author_role: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub is_anonymous: bool,
    pub vote_count: i32,
    pub sentiment_score: Option<f64>,
}

/// Post row joined with its author's name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ForumPostWithAuthor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: ForumPost,
    pub author_full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumPostData {
    pub id: Uuid,
    pub forum_id: Uuid,
    /// Hidden for anonymous posts
    pub author: Option<String>,
    pub author_name: Option<String>,
    pub author_role: String,
    pub content: String,
    pub posted_at: DateTime<Utc>,
    pub is_anonymous: bool,
    pub vote_count: i32,
    pub sentiment_score: Option<f64>,
}

impl From<ForumPostWithAuthor> for ForumPostData {
    fn from(row: ForumPostWithAuthor) -> Self {
        let post = row.post;
        let (author, author_name) = if post.is_anonymous {
            (None, Some(ANONYMOUS_AUTHOR_NAME.to_string()))
        } else {
            (Some(post.author_id), row.author_full_name)
        };

        Self {
            id: post.id,
            forum_id: post.forum_id,
            author,
            author_name,
            author_role: post.author_role,
            content: post.content,
            posted_at: post.posted_at,
            is_anonymous: post.is_anonymous,
            vote_count: post.vote_count,
            sentiment_score: post.sentiment_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

impl CreatePostRequest {
    pub fn validate(&self) -> Result<String> {
        let content = self.content.trim();
        if content.is_empty() {
            return Err(CollectivError::invalid("Content must be a non-empty string."));
        }
        Ok(content.to_string())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostRangeQuery {
    pub before: Option<String>,
    pub after: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostRange {
    pub before: Option<DateTime<Utc>>,
    pub after: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl PostRangeQuery {
    pub fn parse(&self) -> Result<PostRange> {
        let before = self
            .before
            .as_deref()
            .map(|raw| parse_iso_datetime(raw, "'before'"))
            .transpose()?;
        let after = self
            .after
            .as_deref()
            .map(|raw| parse_iso_datetime(raw, "'after'"))
            .transpose()?;
        let limit = self
            .limit
            .as_deref()
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|limit| *limit > 0)
                    .ok_or_else(|| CollectivError::invalid("'limit' is not a valid integer"))
            })
            .transpose()?;

        Ok(PostRange { before, after, limit })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_i16(&self) -> i16 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(VoteDirection::Up),
            -1 => Some(VoteDirection::Down),
            _ => None,
        }
    }
}

/// Outcome of a vote request against the voter's existing vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteChange {
    pub delta: i32,
    pub new_vote: Option<VoteDirection>,
}

/// Repeating a vote withdraws it, the opposite vote flips it, a first vote counts once
pub fn resolve_vote(existing: Option<VoteDirection>, requested: VoteDirection) -> VoteChange {
    let weight = requested.as_i16() as i32;
    match existing {
        Some(current) if current == requested => VoteChange { delta: -weight, new_vote: None },
        Some(_) => VoteChange { delta: 2 * weight, new_vote: Some(requested) },
        None => VoteChange { delta: weight, new_vote: Some(requested) },
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteResult {
    pub post_id: Uuid,
    pub vote_count: i32,
    pub user_vote: Option<VoteDirection>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopWord {
    pub word: String,
    pub count: i64,
}

impl From<(String, i64)> for TopWord {
    fn from((word, count): (String, i64)) -> Self {
        Self { word, count }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumAnalytics {
    pub top_words: Vec<TopWord>,
    pub sentiment_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingForum {
    pub forum_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub event_location_name: Option<String>,
    pub forum_top_words: Vec<TopWord>,
    pub forum_trending_posts: Vec<ForumPostData>,
}
