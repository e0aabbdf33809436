//! Reward point payloads

use serde::{Deserialize, Serialize};

use crate::utils::errors::{CollectivError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemRequest {
    pub reward_point_cost: serde_json::Value,
}

impl RedeemRequest {
    /// Cost as a positive integer
    pub fn cost(&self) -> Result<i64> {
        self.reward_point_cost
            .as_i64()
            .filter(|cost| *cost > 0)
            .ok_or_else(|| CollectivError::invalid("Reward point cost must be a positive integer"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RedeemResult {
    pub amount_redeemed: i64,
    pub user_new_points: i64,
}

/// Balance left after redeeming `cost` from `balance`
pub fn redeem_points(balance: i64, cost: i64) -> Result<RedeemResult> {
    if cost > balance {
        return Err(CollectivError::invalid("Insufficient reward points"));
    }

    Ok(RedeemResult {
        amount_redeemed: cost,
        user_new_points: balance - cost,
    })
}
