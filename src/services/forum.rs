//! Event forums
//!
//! Every event owns one forum. Posts are scored for sentiment and mined for
//! named entities; the forum keeps a running sentiment average and counts of
//! the entity words seen so far.

use tracing::warn;
use uuid::Uuid;

use crate::config::ForumConfig;
use crate::database::DatabaseService;
use crate::models::event::Event;
use crate::models::forum::{
    resolve_vote, CreatePostRequest, Forum, ForumAnalytics, ForumPostData, PostRangeQuery, TopWord, TrendingForum,
    VoteDirection, VoteResult, CREATOR_ROLE,
};
use crate::services::inference::{count_entity_words, InferenceService};
use crate::utils::errors::{CollectivError, Result};
use crate::utils::helpers::update_average;
use crate::utils::logging::log_event_action;

#[derive(Clone)]
#[derive(Debug)]
pub struct ForumService {
    db: DatabaseService,
    inference: InferenceService,
    config: ForumConfig,
}

impl ForumService {
    pub fn new(db: DatabaseService, inference: InferenceService, config: ForumConfig) -> Self {
        Self { db, inference, config }
    }

    async fn find_event(&self, event_id: Uuid) -> Result<Event> {
        self.db
            .events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Event"))
    }

    /// Role the user speaks with in the event's forum
    async fn member_role(&self, event: &Event, user_id: &str) -> Result<String> {
        if event.is_creator(user_id) {
            return Ok(CREATOR_ROLE.to_string());
        }

        match self.db.participations.find(event.id, user_id).await? {
            Some(participation) if !participation.has_left_forum => Ok(participation.participation_type),
            _ => Err(CollectivError::restricted("User is not a member of the event forum")),
        }
    }

    pub async fn create_post(&self, user_id: &str, event_id: Uuid, request: &CreatePostRequest) -> Result<ForumPostData> {
        let content = request.validate()?;
        let event = self.find_event(event_id).await?;
        let role = self.member_role(&event, user_id).await?;
        let forum = self.db.forums.get_or_create(event.id).await?;

        let sentiment_score = self.inference.try_sentiment_score(&content).await;
        let entities = match self.inference.named_entities(&content).await {
            Ok(entities) => Some(entities),
            Err(e) => {
                warn!(error = %e, "Entity recognition unavailable, top words left unchanged");
                None
            }
        };

        let mut tx = self.db.begin().await?;
        let forum = self.db.forums.lock(&mut tx, forum.id).await?;
        let post = self
            .db
            .forums
            .create_post(&mut tx, forum.id, user_id, &role, &content, request.is_anonymous, sentiment_score)
            .await?;

        if let Some(score) = sentiment_score {
            let count = forum.number_of_post_sentiment_calculated;
            let average = update_average(score, forum.average_sentiment_score, count);
            self.db.forums.update_sentiment(&mut tx, forum.id, average, count + 1).await?;
        }

        if let Some(entities) = entities.filter(|entities| !entities.is_empty()) {
            let mut top_words = forum.top_words.0.clone();
            count_entity_words(&mut top_words, &entities);
            self.db.forums.update_top_words(&mut tx, forum.id, &top_words).await?;
        }

        tx.commit().await?;
        log_event_action(event.id, "forum_post", user_id, Some(&post.id.to_string()));

        let row = self
            .db
            .forums
            .find_post(post.id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Forum post"))?;
        Ok(row.into())
    }

    /// Posts of the event's forum, newest first
    pub async fn list_posts(&self, user_id: &str, event_id: Uuid, query: &PostRangeQuery) -> Result<Vec<ForumPostData>> {
        let range = query.parse()?;
        let event = self.find_event(event_id).await?;
        self.member_role(&event, user_id).await?;

        let forum = self.db.forums.get_or_create(event.id).await?;
        let posts = self.db.forums.list_posts(forum.id, &range).await?;
        Ok(posts.into_iter().map(ForumPostData::from).collect())
    }

    /// Toggle the user's vote on a post
    pub async fn vote(&self, user_id: &str, post_id: Uuid, direction: VoteDirection) -> Result<VoteResult> {
        let mut tx = self.db.begin().await?;
        let post = self.db.forums.lock_post(&mut tx, post_id).await?;
        let forum = self.db.forums.find_by_id(post.forum_id).await?;
        let event = self.find_event(forum.event_id).await?;
        self.member_role(&event, user_id).await?;

        let existing = self.db.forums.find_vote(&mut tx, post.id, user_id).await?;
        let change = resolve_vote(existing, direction);
        self.db.forums.set_vote(&mut tx, post.id, user_id, change.new_vote).await?;
        let vote_count = self.db.forums.add_vote_count(&mut tx, post.id, change.delta).await?;
        tx.commit().await?;

        Ok(VoteResult {
            post_id: post.id,
            vote_count,
            user_vote: change.new_vote,
        })
    }

    pub async fn leave(&self, user_id: &str, event_id: Uuid) -> Result<()> {
        let event = self.find_event(event_id).await?;
        let participation = self
            .db
            .participations
            .find(event.id, user_id)
            .await?
            .ok_or_else(|| CollectivError::not_found("Participation"))?;

        self.db.participations.mark_left_forum(participation.id).await?;
        log_event_action(event.id, "leave_forum", user_id, None);
        Ok(())
    }

    fn top_words(&self, forum: &Forum) -> Vec<TopWord> {
        forum
            .ranked_top_words(self.config.top_words_limit)
            .into_iter()
            .map(TopWord::from)
            .collect()
    }

    pub async fn analytics(&self, event_id: Uuid) -> Result<ForumAnalytics> {
        let event = self.find_event(event_id).await?;
        let forum = self.db.forums.get_or_create(event.id).await?;

        Ok(ForumAnalytics {
            top_words: self.top_words(&forum),
            sentiment_score: forum.average_sentiment_score,
        })
    }

    /// Forums holding posts voted at least the trending threshold
    pub async fn trending(&self) -> Result<Vec<TrendingForum>> {
        let mut trending = Vec::new();

        for forum in self.db.forums.list_all().await? {
            let posts = self
                .db
                .forums
                .trending_posts(forum.id, self.config.trending_vote_threshold)
                .await?;
            if posts.is_empty() {
                continue;
            }

            let Some(event) = self.db.events.find_by_id(forum.event_id).await? else {
                continue;
            };
            let location_name = self
                .db
                .locations
                .find_by_id(event.location_id)
                .await?
                .map(|location| location.name);

            trending.push(TrendingForum {
                forum_id: forum.id,
                event_id: event.id,
                event_name: event.name,
                event_location_name: location_name,
                forum_top_words: self.top_words(&forum),
                forum_trending_posts: posts.into_iter().map(ForumPostData::from).collect(),
            });
        }

        Ok(trending)
    }
}
