//! Daily emotion check-in records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the student submits for a daily check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinPayload {
    pub emotion: String,
    #[serde(default)]
    pub note: Option<String>,
}

/// A persisted check-in; at most one exists per student per calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionCheckin {
    pub emotion: String,
    #[serde(default)]
    pub note: Option<String>,
    /// Assigned at write time, not by the submitting client
    pub recorded_at: DateTime<Utc>,
}

impl EmotionCheckin {
    pub fn from_payload(payload: CheckinPayload, recorded_at: DateTime<Utc>) -> Self {
        Self {
            emotion: payload.emotion,
            note: payload.note,
            recorded_at,
        }
    }
}
