//! Review, report and reward handlers

use axum::extract::State;
use axum::Json;

use crate::handlers::extract::ApiJson;
use crate::middleware::AuthUser;
use crate::models::report::{EventReport, SubmitReportRequest};
use crate::models::review::{ParticipationReview, SubmitReviewRequest};
use crate::models::reward::{RedeemRequest, RedeemResult};
use crate::state::AppState;
use crate::utils::errors::Result;

pub async fn submit_review(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<SubmitReviewRequest>,
) -> Result<Json<ParticipationReview>> {
    Ok(Json(state.services.feedback_service.submit_review(auth.id(), &request).await?))
}

pub async fn submit_report(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<SubmitReportRequest>,
) -> Result<Json<EventReport>> {
    Ok(Json(state.services.feedback_service.submit_report(auth.id(), &request).await?))
}

pub async fn redeem_reward(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(request): ApiJson<RedeemRequest>,
) -> Result<Json<RedeemResult>> {
    Ok(Json(state.services.reward_service.redeem(auth.id(), &request).await?))
}
