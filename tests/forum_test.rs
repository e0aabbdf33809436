//! Event forums: membership, posts, sentiment, votes and trending forums

mod fixtures;
mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;
use tokio_test::assert_ok;

use Collectiv::models::forum::{CreatePostRequest, PostRangeQuery, VoteDirection};
use Collectiv::CollectivError;

use helpers::*;

fn post(content: &str, is_anonymous: bool) -> CreatePostRequest {
    CreatePostRequest {
        content: content.to_string(),
        is_anonymous,
    }
}

#[tokio::test]
#[serial]
async fn test_forum_membership() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    ctx.external.mock_sentiment_unavailable().await;
    ctx.external.mock_entities(&[]).await;

    let creator = create_user(&ctx).await.unwrap();
    let member = create_user(&ctx).await.unwrap();
    let stranger = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let forums = &ctx.services.forum_service;

    ctx.services
        .participation_service
        .register_participant(&member.user_id, event.id)
        .await
        .unwrap();

    let by_creator = forums.create_post(&creator.user_id, event.id, &post("Welcome!", false)).await.unwrap();
    assert_eq!(by_creator.author_role, "creator");
    assert_eq!(by_creator.sentiment_score, None);

    let by_member = forums.create_post(&member.user_id, event.id, &post("See you there", true)).await.unwrap();
    assert_eq!(by_member.author_role, "participant");
    assert_eq!(by_member.author, None);
    assert_eq!(by_member.author_name.as_deref(), Some("Anonymous User"));

    assert_matches!(
        forums.create_post(&stranger.user_id, event.id, &post("Hello?", false)).await,
        Err(CollectivError::RestrictedAccess(_))
    );
    assert_matches!(
        forums.create_post(&member.user_id, event.id, &post("   ", false)).await,
        Err(CollectivError::InvalidRequest(_))
    );

    let posts = forums
        .list_posts(&member.user_id, event.id, &PostRangeQuery::default())
        .await
        .unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, by_member.id);

    let limited = forums
        .list_posts(
            &member.user_id,
            event.id,
            &PostRangeQuery {
                limit: Some("1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);

    assert_ok!(forums.leave(&member.user_id, event.id).await);
    assert_matches!(
        forums.list_posts(&member.user_id, event.id, &PostRangeQuery::default()).await,
        Err(CollectivError::RestrictedAccess(_))
    );
    assert_matches!(
        forums.leave(&stranger.user_id, event.id).await,
        Err(CollectivError::NotFound(_))
    );
}

#[tokio::test]
#[serial]
async fn test_sentiment_and_top_words() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    ctx.external.mock_positive_sentiment(0.8).await;
    ctx.external.mock_entities(&["Jakarta", "Monas", "jakarta"]).await;

    let creator = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let forums = &ctx.services.forum_service;

    let created = forums
        .create_post(&creator.user_id, event.id, &post("Meet at Monas, Jakarta", false))
        .await
        .unwrap();
    let score = created.sentiment_score.expect("sentiment score");
    assert!((score - 0.9).abs() < 1e-9);

    forums
        .create_post(&creator.user_id, event.id, &post("Bring gloves", false))
        .await
        .unwrap();

    let analytics = forums.analytics(event.id).await.unwrap();
    assert!((analytics.sentiment_score.unwrap() - 0.9).abs() < 1e-9);
    assert_eq!(analytics.top_words[0].word, "jakarta");
    assert_eq!(analytics.top_words[0].count, 4);
    assert_eq!(analytics.top_words[1].word, "monas");
    assert_eq!(analytics.top_words[1].count, 2);
}

#[tokio::test]
#[serial]
async fn test_votes_toggle_and_flip() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    ctx.external.mock_sentiment_unavailable().await;
    ctx.external.mock_entities(&[]).await;

    let creator = create_user(&ctx).await.unwrap();
    let member = create_user(&ctx).await.unwrap();
    let stranger = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let forums = &ctx.services.forum_service;

    ctx.services
        .participation_service
        .register_volunteer(&member.user_id, event.id)
        .await
        .unwrap();
    let created = forums.create_post(&creator.user_id, event.id, &post("Vote on me", false)).await.unwrap();

    let up = forums.vote(&member.user_id, created.id, VoteDirection::Up).await.unwrap();
    assert_eq!(up.vote_count, 1);
    assert_eq!(up.user_vote, Some(VoteDirection::Up));

    let flipped = forums.vote(&member.user_id, created.id, VoteDirection::Down).await.unwrap();
    assert_eq!(flipped.vote_count, -1);

    let withdrawn = forums.vote(&member.user_id, created.id, VoteDirection::Down).await.unwrap();
    assert_eq!(withdrawn.vote_count, 0);
    assert_eq!(withdrawn.user_vote, None);

    assert_matches!(
        forums.vote(&stranger.user_id, created.id, VoteDirection::Up).await,
        Err(CollectivError::RestrictedAccess(_))
    );
}

#[tokio::test]
#[serial]
async fn test_trending_forums() {
    let ctx = TestContext::with_settings(|settings| settings.forum.trending_vote_threshold = 2)
        .await
        .expect("Failed to create test context");
    ctx.external.mock_sentiment_unavailable().await;
    ctx.external.mock_entities(&["river"]).await;

    let creator = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let forums = &ctx.services.forum_service;

    let created = forums.create_post(&creator.user_id, event.id, &post("Popular", false)).await.unwrap();
    assert!(forums.trending().await.unwrap().is_empty());

    for _ in 0..2 {
        let voter = create_user(&ctx).await.unwrap();
        ctx.services
            .participation_service
            .register_participant(&voter.user_id, event.id)
            .await
            .unwrap();
        forums.vote(&voter.user_id, created.id, VoteDirection::Up).await.unwrap();
    }

    let trending = forums.trending().await.unwrap();
    assert_eq!(trending.len(), 1);
    assert_eq!(trending[0].event_id, event.id);
    assert_eq!(trending[0].forum_trending_posts.len(), 1);
    assert_eq!(trending[0].forum_top_words[0].word, "river");
}

#[tokio::test]
#[serial]
async fn test_vote_does_not_wait_on_forum_lock() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    ctx.external.mock_sentiment_unavailable().await;
    ctx.external.mock_entities(&[]).await;

    let creator = create_user(&ctx).await.unwrap();
    let member = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let forums = &ctx.services.forum_service;

    ctx.services
        .participation_service
        .register_participant(&member.user_id, event.id)
        .await
        .unwrap();
    let created = forums.create_post(&creator.user_id, event.id, &post("Hold on", false)).await.unwrap();

    // Another writer, such as a post in flight, holds the forum row
    let mut writer = ctx.db_pool().begin().await.unwrap();
    sqlx::query("SELECT id FROM forums WHERE event_id = $1 FOR UPDATE")
        .bind(event.id)
        .execute(&mut *writer)
        .await
        .unwrap();

    let voted = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        forums.vote(&member.user_id, created.id, VoteDirection::Up),
    )
    .await
    .expect("vote blocked on the forum row");
    assert_eq!(voted.unwrap().vote_count, 1);

    writer.rollback().await.unwrap();
}
