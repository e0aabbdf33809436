//! Event report model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::errors::{CollectivError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventReport {
    pub id: i64,
    pub event_id: Uuid,
    pub reporter_id: String,
    pub remarks: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReportRequest {
    pub event_id: Uuid,
    pub remarks: String,
}

impl SubmitReportRequest {
    pub fn validate(&self) -> Result<String> {
        let remarks = self.remarks.trim();
        if remarks.is_empty() {
            return Err(CollectivError::invalid("Remarks must be a non-empty string"));
        }
        Ok(remarks.to_string())
    }
}
