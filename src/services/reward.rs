//! Reward points: granting, redeeming and the monthly reset

use std::time::Duration;

use chrono::Utc;
use sqlx::PgConnection;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::RewardConfig;
use crate::database::DatabaseService;
use crate::models::participation::Participation;
use crate::models::reward::{redeem_points, RedeemRequest, RedeemResult};
use crate::utils::errors::Result;
use crate::utils::helpers::next_monthly_reset;
use crate::utils::logging::log_user_action;

#[derive(Clone)]
#[derive(Debug)]
pub struct RewardService {
    db: DatabaseService,
    config: RewardConfig,
}

impl RewardService {
    pub fn new(db: DatabaseService, config: RewardConfig) -> Self {
        Self { db, config }
    }

    /// Reward the participation's user once it qualifies. Returns whether points were granted.
    pub async fn grant_if_eligible(&self, conn: &mut PgConnection, participation: &Participation) -> Result<bool> {
        if !participation.is_eligible_for_reward(self.config.minimum_seconds) {
            return Ok(false);
        }

        let balance = self
            .db
            .users
            .add_reward_points(&mut *conn, &participation.participant_id, self.config.points_per_attendance)
            .await?;
        self.db.participations.mark_rewarded(conn, participation.id).await?;

        info!(
            user_id = %participation.participant_id,
            event_id = %participation.event_id,
            balance = balance,
            "Reward points granted"
        );
        Ok(true)
    }

    pub async fn redeem(&self, user_id: &str, request: &RedeemRequest) -> Result<RedeemResult> {
        let cost = request.cost()?;

        let mut tx = self.db.begin().await?;
        let user = self.db.users.lock(&mut tx, user_id).await?;
        let result = redeem_points(user.reward_points, cost)?;
        self.db.users.set_reward_points(&mut tx, user_id, result.user_new_points).await?;
        tx.commit().await?;

        log_user_action(user_id, "redeem_reward", Some(&format!("cost={}", cost)));
        Ok(result)
    }

    pub async fn reset_monthly_points(&self) -> Result<u64> {
        let reset = self.db.users.reset_all_reward_points().await?;
        info!(users = reset, "Monthly reward points reset");
        Ok(reset)
    }

    /// Reset every user's points at 00:00 UTC on the first day of each month
    pub fn spawn_monthly_reset(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Utc::now();
                let next = match next_monthly_reset(now) {
                    Ok(next) => next,
                    Err(e) => {
                        error!(error = %e, "Cannot schedule monthly reward reset");
                        return;
                    }
                };

                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
                info!(next_reset = %next, "Monthly reward reset scheduled");
                tokio::time::sleep(wait).await;

                if let Err(e) = self.reset_monthly_points().await {
                    error!(error = %e, "Monthly reward reset failed");
                }
            }
        })
    }
}
