//! Registration, attendance and contribution flows against a real database

mod fixtures;
mod helpers;

use assert_matches::assert_matches;
use serial_test::serial;
use tokio_test::assert_ok;

use Collectiv::models::participation::{AssistedAttendanceRequest, ContributionRequest, ParticipationViewQuery};
use Collectiv::CollectivError;

use helpers::*;

#[tokio::test]
#[serial]
async fn test_participant_registration_rules() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let participation = &ctx.services.participation_service;

    let created = assert_ok!(participation.register_participant(&user.user_id, event.id).await);
    assert_eq!(created.participation_type, "participant");

    let again = participation.register_participant(&user.user_id, event.id).await;
    assert_matches!(again, Err(CollectivError::InvalidRequest(message)) if message == "User has been registered as participant in the event");

    let as_volunteer = participation.register_volunteer(&user.user_id, event.id).await;
    assert_matches!(as_volunteer, Err(CollectivError::InvalidRequest(_)));

    let own_event = participation.register_participant(&creator.user_id, event.id).await;
    assert_matches!(own_event, Err(CollectivError::InvalidRequest(_)));

    let detail = ctx.services.event_service.detail(event.id).await.unwrap();
    assert_eq!(detail.current_num_of_participants, 1);

    let check = participation.check_registration(&user.user_id, event.id).await.unwrap();
    assert!(check.is_registered);
}

#[tokio::test]
#[serial]
async fn test_participants_cannot_register_to_projects() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let project = create_project(&ctx, &creator, 100.0).await.unwrap();

    let result = ctx
        .services
        .participation_service
        .register_participant(&user.user_id, project.id)
        .await;
    assert_matches!(result, Err(CollectivError::InvalidRequest(_)));

    let volunteer = ctx
        .services
        .participation_service
        .register_volunteer(&user.user_id, project.id)
        .await;
    assert_ok!(volunteer);
}

#[tokio::test]
#[serial]
async fn test_self_check_in_and_out_with_reward() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let attendance = &ctx.services.attendance_service;

    ctx.services
        .participation_service
        .register_participant(&user.user_id, event.id)
        .await
        .unwrap();

    // Not on going yet
    let early = attendance.participant_check_in(&user.user_id, &fixtures::at_venue(event.id)).await;
    assert_matches!(early, Err(CollectivError::InvalidRequest(_)));

    start_event(&ctx, &creator, event.id).await.unwrap();

    let outside = attendance.participant_check_in(&user.user_id, &fixtures::far_away(event.id)).await;
    assert_matches!(outside, Err(CollectivError::InvalidRequest(message)) if message == "User is outside the event area");

    assert_ok!(attendance.participant_check_in(&user.user_id, &fixtures::at_venue(event.id)).await);

    let current = ctx.services.user_service.current_event(&user.user_id).await.unwrap();
    assert!(current.is_currently_attending_event);
    assert_eq!(current.currently_attending_role.as_deref(), Some("participant"));

    let twice = attendance.participant_check_in(&user.user_id, &fixtures::at_venue(event.id)).await;
    assert_matches!(twice, Err(CollectivError::InvalidRequest(_)));

    let data = attendance
        .participant_check_out(&user.user_id, &fixtures::at_venue(event.id))
        .await
        .unwrap();
    assert_eq!(data.violated_geofencing_rule, Some(false));
    assert!(data.is_rewarded);
    assert!(data.duration_in_seconds >= 0.0);
    assert!(data.check_out_time >= data.check_in_time);

    let user = ctx.services.user_service.get_or_create(&user.user_id).await.unwrap();
    assert_eq!(user.reward_points, 1);
    assert!(user.currently_attended_event_id.is_none());
}

#[tokio::test]
#[serial]
async fn test_check_out_outside_buffer_flags_violation() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let attendance = &ctx.services.attendance_service;

    ctx.services
        .participation_service
        .register_participant(&user.user_id, event.id)
        .await
        .unwrap();
    start_event(&ctx, &creator, event.id).await.unwrap();
    attendance
        .participant_check_in(&user.user_id, &fixtures::at_venue(event.id))
        .await
        .unwrap();

    let data = attendance
        .participant_check_out(&user.user_id, &fixtures::far_away(event.id))
        .await
        .unwrap();
    assert_eq!(data.violated_geofencing_rule, Some(true));
    assert!(!data.is_rewarded);

    let user = ctx.services.user_service.get_or_create(&user.user_id).await.unwrap();
    assert_eq!(user.reward_points, 0);
}

#[tokio::test]
#[serial]
async fn test_automated_check_out_only_outside_area() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let attendance = &ctx.services.attendance_service;

    ctx.services
        .participation_service
        .register_participant(&user.user_id, event.id)
        .await
        .unwrap();
    start_event(&ctx, &creator, event.id).await.unwrap();
    attendance
        .participant_check_in(&user.user_id, &fixtures::at_venue(event.id))
        .await
        .unwrap();

    let inside = attendance
        .automated_check_out(&user.user_id, &fixtures::at_venue(event.id))
        .await
        .unwrap();
    assert!(!inside.checked_out);
    assert!(inside.data.is_none());

    let outside = attendance
        .automated_check_out(&user.user_id, &fixtures::far_away(event.id))
        .await
        .unwrap();
    assert!(outside.checked_out);
    let data = outside.data.expect("check-out data");
    assert_eq!(data.violated_geofencing_rule, Some(false));
    assert!(data.is_rewarded);
}

#[tokio::test]
#[serial]
async fn test_leave_event() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let participation = &ctx.services.participation_service;

    participation.register_participant(&user.user_id, event.id).await.unwrap();
    start_event(&ctx, &creator, event.id).await.unwrap();
    ctx.services
        .attendance_service
        .participant_check_in(&user.user_id, &fixtures::at_venue(event.id))
        .await
        .unwrap();

    let while_attending = participation.leave(&user.user_id, event.id).await;
    assert_matches!(while_attending, Err(CollectivError::InvalidRequest(_)));

    ctx.services
        .attendance_service
        .participant_check_out(&user.user_id, &fixtures::at_venue(event.id))
        .await
        .unwrap();
    assert_ok!(participation.leave(&user.user_id, event.id).await);

    let detail = ctx.services.event_service.detail(event.id).await.unwrap();
    assert_eq!(detail.current_num_of_participants, 0);

    let not_registered = participation.leave(&user.user_id, event.id).await;
    assert_matches!(not_registered, Err(CollectivError::NotFound(_)));
}

#[tokio::test]
#[serial]
async fn test_completing_event_checks_out_attendees() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();

    ctx.services
        .participation_service
        .register_participant(&user.user_id, event.id)
        .await
        .unwrap();
    start_event(&ctx, &creator, event.id).await.unwrap();
    ctx.services
        .attendance_service
        .participant_check_in(&user.user_id, &fixtures::at_venue(event.id))
        .await
        .unwrap();

    let completed = set_status(&ctx, &creator, event.id, "Completed").await.unwrap();
    assert_eq!(completed.status, "Completed");

    let check = ctx
        .services
        .participation_service
        .check_registration(&user.user_id, event.id)
        .await
        .unwrap();
    let record = check.data.expect("participation");
    assert!(!record.is_currently_attending);
    assert!(record.has_attended);
    assert!(record.has_violated_geofencing_rule);
    assert!(!record.rewarded);

    let current = ctx.services.user_service.current_event(&user.user_id).await.unwrap();
    assert!(!current.is_currently_attending_event);
}

#[tokio::test]
#[serial]
async fn test_assisted_attendance_and_manager_delegation() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let volunteer = create_user(&ctx).await.unwrap();
    let participant = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    let attendance = &ctx.services.attendance_service;

    let volunteer_email = register_email(&ctx, &volunteer.user_id).await;
    let participant_email = register_email(&ctx, &participant.user_id).await;

    ctx.services
        .participation_service
        .register_volunteer(&volunteer.user_id, event.id)
        .await
        .unwrap();
    ctx.services
        .participation_service
        .register_participant(&participant.user_id, event.id)
        .await
        .unwrap();
    start_event(&ctx, &creator, event.id).await.unwrap();

    let for_participant = AssistedAttendanceRequest {
        event_id: event.id,
        user_email_phone: participant_email,
    };
    let for_volunteer = AssistedAttendanceRequest {
        event_id: event.id,
        user_email_phone: volunteer_email,
    };

    // A plain volunteer is not a manager
    let denied = attendance
        .assisted_participant_check_in(&volunteer.user_id, &for_participant)
        .await;
    assert_matches!(denied, Err(CollectivError::RestrictedAccess(_)));

    assert_ok!(attendance.assisted_volunteer_check_in(&creator.user_id, &for_volunteer).await);
    let granted = attendance
        .grant_manager_access(&creator.user_id, &for_volunteer)
        .await
        .unwrap();
    assert!(granted.granted_manager_access);

    assert_ok!(
        attendance
            .assisted_participant_check_in(&volunteer.user_id, &for_participant)
            .await
    );
    let data = attendance
        .assisted_participant_check_out(&volunteer.user_id, &for_participant)
        .await
        .unwrap();
    assert!(data.is_rewarded);

    let volunteer_out = attendance.volunteer_check_out(&volunteer.user_id, event.id).await.unwrap();
    assert!(volunteer_out.is_rewarded);
}

#[tokio::test]
#[serial]
async fn test_unknown_contact_is_rejected() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    ctx.external.mock_unknown_lookups().await;
    let creator = create_user(&ctx).await.unwrap();
    let event = create_initiative(&ctx, &creator).await.unwrap();
    start_event(&ctx, &creator, event.id).await.unwrap();

    let result = ctx
        .services
        .attendance_service
        .assisted_participant_check_in(
            &creator.user_id,
            &AssistedAttendanceRequest {
                event_id: event.id,
                user_email_phone: "nobody@example.com".to_string(),
            },
        )
        .await;
    assert_matches!(result, Err(CollectivError::InvalidRequest(_)));
}

#[tokio::test]
#[serial]
async fn test_project_contributions() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let contributor = create_user(&ctx).await.unwrap();
    let project = create_project(&ctx, &creator, 50.0).await.unwrap();
    let email = register_email(&ctx, &contributor.user_id).await;
    let participation = &ctx.services.participation_service;

    let request = ContributionRequest {
        project_id: project.id,
        contributor_email_phone: email,
        amount_contributed: 12.5,
    };

    let scheduled = participation.register_contribution(&creator.user_id, &request).await;
    assert_matches!(scheduled, Err(CollectivError::InvalidRequest(_)));

    start_event(&ctx, &creator, project.id).await.unwrap();

    let first = participation.register_contribution(&creator.user_id, &request).await.unwrap();
    assert_eq!(first.total_contribution, 12.5);
    assert_eq!(first.project_progress, 12.5);
    assert!(first.is_rewarded);

    let second = participation.register_contribution(&creator.user_id, &request).await.unwrap();
    assert_eq!(second.total_contribution, 25.0);
    assert_eq!(second.project_progress, 25.0);
    assert!(!second.is_rewarded);

    let outsider = participation.register_contribution(&contributor.user_id, &request).await;
    assert_matches!(outsider, Err(CollectivError::RestrictedAccess(_)));

    let contributions = participation.list_contributions(&contributor.user_id).await.unwrap();
    assert_eq!(contributions.len(), 1);
    assert_eq!(contributions[0].activities.len(), 2);

    let contributor = ctx
        .services
        .user_service
        .get_or_create(&contributor.user_id)
        .await
        .unwrap();
    assert_eq!(contributor.reward_points, 1);
}

#[tokio::test]
#[serial]
async fn test_participation_views() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    let creator = create_user(&ctx).await.unwrap();
    let user = create_user(&ctx).await.unwrap();
    let first = create_initiative(&ctx, &creator).await.unwrap();
    let second = create_initiative(&ctx, &creator).await.unwrap();
    let participation = &ctx.services.participation_service;

    participation.register_participant(&user.user_id, first.id).await.unwrap();
    participation.register_volunteer(&user.user_id, second.id).await.unwrap();
    start_event(&ctx, &creator, second.id).await.unwrap();

    let all = participation
        .list_participations(&user.user_id, &ParticipationViewQuery::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let volunteering = participation
        .list_participations(
            &user.user_id,
            &ParticipationViewQuery {
                participation_type: Some("volunteer".to_string()),
                status: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(volunteering.len(), 1);
    assert_eq!(volunteering[0].event.id, second.id);

    let future = participation
        .list_participations(
            &user.user_id,
            &ParticipationViewQuery {
                participation_type: None,
                status: Some("future".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(future.len(), 1);
    assert_eq!(future[0].event.id, first.id);

    let created = participation.list_created_events(&creator.user_id, None).await.unwrap();
    assert_eq!(created.len(), 2);
}
