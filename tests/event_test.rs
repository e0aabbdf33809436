//! Event creation, images, status transitions, search and discovery

mod fixtures;
mod helpers;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use serial_test::serial;
use tokio_test::assert_ok;
use uuid::Uuid;

use Collectiv::models::event::{EventKindData, EventSearchQuery, UpdateProgressRequest};
use Collectiv::models::location::LocationPreferenceRequest;
use Collectiv::services::ImageUpload;
use Collectiv::utils::geo::Coordinate;
use Collectiv::CollectivError;

use helpers::*;

#[tokio::test]
#[serial]
async fn test_create_event_validation() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let venue = create_venue(&ctx).await.unwrap();
    let events = &ctx.services.event_service;

    let mut past = fixtures::initiative_request("Past event", venue.id);
    past.start_date_time = (Utc::now() - Duration::hours(2)).to_rfc3339();
    assert_matches!(
        events.create(&creator.user_id, past).await,
        Err(CollectivError::InvalidRequest(_))
    );

    let unknown_location = fixtures::initiative_request("Nowhere", Uuid::new_v4());
    assert_matches!(
        events.create(&creator.user_id, unknown_location).await,
        Err(CollectivError::NotFound(_))
    );

    let mut unknown_tag = fixtures::initiative_request("Tagged", venue.id);
    unknown_tag.tags = vec![Uuid::new_v4()];
    assert_matches!(
        events.create(&creator.user_id, unknown_tag).await,
        Err(CollectivError::InvalidRequest(_))
    );

    let tags = ctx
        .services
        .taxonomy_service
        .get_or_create_tags(&["environment".to_string(), "River".to_string()])
        .await
        .unwrap();
    let category = ctx.services.taxonomy_service.create_category("Cleanup").await.unwrap();

    let mut request = fixtures::initiative_request("Clean the beach", venue.id);
    request.tags = tags.iter().map(|tag| tag.id).collect();
    request.category_id = Some(category.id);

    let event = events.create(&creator.user_id, request).await.unwrap();
    assert_eq!(event.status, "Scheduled");
    assert_eq!(event.tags.len(), 2);
    assert_eq!(event.category.map(|c| c.id), Some(category.id));
    assert_eq!(event.creator.map(|c| c.user_id), Some(creator.user_id.clone()));
    assert_eq!(ctx.database.count_rows("forums").await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn test_project_progress() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let other = create_user(&ctx).await.unwrap();
    let project = create_project(&ctx, &creator, 40.0).await.unwrap();
    let events = &ctx.services.event_service;

    assert_matches!(project.kind, EventKindData::Project { goal, progress, .. } if goal == 40.0 && progress == 0.0);

    let request = UpdateProgressRequest {
        event_id: project.id,
        amount_to_update: 7.5,
    };
    assert_matches!(
        events.update_progress(&other.user_id, &request).await,
        Err(CollectivError::RestrictedAccess(_))
    );

    assert_eq!(events.update_progress(&creator.user_id, &request).await.unwrap(), 7.5);
    assert_eq!(events.update_progress(&creator.user_id, &request).await.unwrap(), 15.0);

    let detail = events.detail(project.id).await.unwrap();
    match detail.kind {
        EventKindData::Project { progress, transactions, .. } => {
            assert_eq!(progress, 15.0);
            assert_eq!(transactions.map(|t| t.len()), Some(2));
        }
        other => panic!("expected a project, got {:?}", other),
    }

    let negative = UpdateProgressRequest {
        event_id: project.id,
        amount_to_update: -1.0,
    };
    assert_matches!(
        events.update_progress(&creator.user_id, &negative).await,
        Err(CollectivError::InvalidRequest(_))
    );
}

#[tokio::test]
#[serial]
async fn test_status_transitions() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let other = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();

    assert_matches!(
        set_status(&ctx, &other, event.id, "On Going").await,
        Err(_)
    );
    assert_matches!(
        set_status(&ctx, &creator, event.id, "Completed").await,
        Err(_)
    );

    let started = set_status(&ctx, &creator, event.id, "ongoing").await.unwrap();
    assert_eq!(started.status, "On Going");

    assert_matches!(
        set_status(&ctx, &creator, event.id, "Cancelled").await,
        Err(_)
    );
    assert_ok!(set_status(&ctx, &creator, event.id, "Completed").await);
}

#[tokio::test]
#[serial]
async fn test_cancellation_with_registered_users() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();

    ctx.services
        .participation_service
        .register_participant(&user.user_id, event.id)
        .await
        .unwrap();

    let cancelled = set_status(&ctx, &creator, event.id, "Cancelled").await.unwrap();
    assert_eq!(cancelled.status, "Cancelled");

    let late = ctx
        .services
        .participation_service
        .register_volunteer(&create_user(&ctx).await.unwrap().user_id, event.id)
        .await;
    assert_matches!(late, Err(CollectivError::InvalidRequest(_)));
}

#[tokio::test]
#[serial]
async fn test_event_image_upload() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let png = b"\x89PNG\r\n\x1a\nfake-image";
    ctx.external.mock_storage(png).await;

    let creator = create_user(&ctx).await.unwrap();
    let other = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let events = &ctx.services.event_service;

    assert!(events.get_image(event.id).await.unwrap().is_none());

    let upload = |name: &str, bytes: &[u8]| ImageUpload {
        file_name: name.to_string(),
        bytes: bytes.to_vec(),
    };

    assert_matches!(
        events.upload_image(&other.user_id, event.id, upload("poster.png", png)).await,
        Err(CollectivError::RestrictedAccess(_))
    );
    assert_matches!(
        events.upload_image(&creator.user_id, event.id, upload("poster.exe", png)).await,
        Err(CollectivError::InvalidRequest(_))
    );
    assert_matches!(
        events.upload_image(&creator.user_id, event.id, upload("poster.png", &[0u8; 2048])).await,
        Err(CollectivError::InvalidRequest(_))
    );

    let updated = events
        .upload_image(&creator.user_id, event.id, upload("Poster.PNG", png))
        .await
        .unwrap();
    let directory = updated.event_image_directory.expect("image directory");
    assert!(directory.ends_with(&format!("{}.png", event.id)));

    let image = events.get_image(event.id).await.unwrap().expect("stored image");
    assert_eq!(image.bytes, png.to_vec());
    assert_eq!(image.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
#[serial]
async fn test_search_filters_and_pagination() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let venue = create_venue(&ctx).await.unwrap();
    let events = &ctx.services.event_service;

    for index in 0..3 {
        events
            .create(
                &creator.user_id,
                fixtures::initiative_request(&format!("Initiative {}", index), venue.id),
            )
            .await
            .unwrap();
    }
    events
        .create(&creator.user_id, fixtures::project_request("Library drive", venue.id, 10.0))
        .await
        .unwrap();

    let first_page = events
        .search(&EventSearchQuery {
            limit: Some(3),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(first_page.results.len(), 3);
    assert_eq!(first_page.next, Some(2));
    assert_eq!(first_page.previous, None);

    let projects = events
        .search(&EventSearchQuery {
            event_type: Some("project".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(projects.results.len(), 1);
    assert_eq!(projects.results[0].event_type, "project");

    let by_name = events
        .search(&EventSearchQuery {
            name: Some("initiative 1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_name.results.len(), 1);

    let sorted = events
        .search(&EventSearchQuery {
            latitude: Some(fixtures::VENUE_LATITUDE.to_string()),
            longitude: Some(fixtures::VENUE_LONGITUDE.to_string()),
            limit: Some(10),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(sorted.results.len(), 4);

    let at_venue = events.by_location(venue.id, &EventSearchQuery::default()).await.unwrap();
    assert_eq!(at_venue.len(), 4);

    let bad_status = events
        .search(&EventSearchQuery {
            status: Some("sleeping".to_string()),
            ..Default::default()
        })
        .await;
    assert_matches!(bad_status, Err(CollectivError::InvalidRequest(_)));
}

#[tokio::test]
#[serial]
async fn test_discover_nearby_matches_interests() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let venue = create_venue(&ctx).await.unwrap();
    let tags = ctx
        .services
        .taxonomy_service
        .get_or_create_tags(&["gardening".to_string()])
        .await
        .unwrap();

    let mut tagged = fixtures::initiative_request("Community garden", venue.id);
    tagged.tags = vec![tags[0].id];
    let tagged = ctx.services.event_service.create(&creator.user_id, tagged).await.unwrap();
    ctx.services
        .event_service
        .create(&creator.user_id, fixtures::initiative_request("Untagged", venue.id))
        .await
        .unwrap();

    let origin = Coordinate::new(fixtures::NEARBY_LATITUDE, fixtures::VENUE_LONGITUDE);

    // Not subscribed to the venue yet
    let user = ctx.services.user_service.get_or_create(&user.user_id).await.unwrap();
    assert!(ctx.services.event_service.discover_nearby(&user, origin).await.unwrap().is_empty());

    ctx.services
        .location_service
        .update_preference(
            &user.user_id,
            &LocationPreferenceRequest {
                location_id: venue.id,
                subscribe: true,
            },
        )
        .await
        .unwrap();
    ctx.services
        .user_service
        .replace_interests(&user.user_id, &[tags[0].id])
        .await
        .unwrap();

    let found = ctx.services.event_service.discover_nearby(&user, origin).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, tagged.id);
}
