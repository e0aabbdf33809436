//! Test data helpers
//!
//! Creates users, locations and events through the services so every row
//! passes the same validation as production data.

use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use uuid::Uuid;

use Collectiv::models::event::{EventData, UpdateStatusRequest};
use Collectiv::models::location::Location;
use Collectiv::models::user::{UpdateUserRequest, User};

use crate::fixtures;

use super::test_context::{TestContext, TestResult};

/// A registered user with a random id and name
pub async fn create_user(ctx: &TestContext) -> TestResult<User> {
    let user_id = format!("uid-{}", Uuid::new_v4().simple());
    ctx.services.user_service.get_or_create(&user_id).await?;

    let full_name: String = Name().fake();
    let user = ctx
        .services
        .user_service
        .update(
            &user_id,
            UpdateUserRequest {
                full_name: Some(full_name),
                preferred_radius: None,
                location_track: None,
            },
        )
        .await?;
    Ok(user)
}

/// A random email the identity mock resolves to `user_id`
pub async fn register_email(ctx: &TestContext, user_id: &str) -> String {
    let email: String = SafeEmail().fake();
    ctx.external.mock_email_lookup(&email, user_id).await;
    email
}

pub async fn create_venue(ctx: &TestContext) -> TestResult<Location> {
    let name = format!("Park {}", &Uuid::new_v4().simple().to_string()[..8]);
    let location = ctx
        .services
        .location_service
        .get_or_create(&fixtures::venue_request(&name))
        .await?;
    Ok(location)
}

pub async fn create_initiative(ctx: &TestContext, creator: &User) -> TestResult<EventData> {
    let venue = create_venue(ctx).await?;
    let event = ctx
        .services
        .event_service
        .create(&creator.user_id, fixtures::initiative_request("Clean the river", venue.id))
        .await?;
    Ok(event)
}

pub async fn create_project(ctx: &TestContext, creator: &User, goal: f64) -> TestResult<EventData> {
    let venue = create_venue(ctx).await?;
    let event = ctx
        .services
        .event_service
        .create(&creator.user_id, fixtures::project_request("Plant trees", venue.id, goal))
        .await?;
    Ok(event)
}

pub async fn set_status(ctx: &TestContext, creator: &User, event_id: Uuid, status: &str) -> TestResult<EventData> {
    let event = ctx
        .services
        .event_service
        .update_status(
            &creator.user_id,
            &UpdateStatusRequest {
                event_id,
                status: status.to_string(),
            },
        )
        .await?;
    Ok(event)
}

pub async fn start_event(ctx: &TestContext, creator: &User, event_id: Uuid) -> TestResult<EventData> {
    set_status(ctx, creator, event_id, "On Going").await
}
