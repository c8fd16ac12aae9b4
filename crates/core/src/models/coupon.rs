//! Coupon entity - one drawn reward, redeemable exactly once

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted record of one drawn reward
///
/// The id is a surrogate identifier assigned at issuance, decoupled from
/// wall-clock time. The `used` flag only ever transitions false to true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    /// Which catalog entry was drawn
    pub reward_key: String,
    /// The level whose one-time draw issued this coupon
    pub level: u32,
    /// Immutable once set
    pub issued_at: DateTime<Utc>,
    #[serde(default)]
    pub used: bool,
}

impl Coupon {
    /// Issue a fresh, unused coupon for a drawn reward
    pub fn issue(reward_key: &str, level: u32, issued_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            reward_key: reward_key.to_string(),
            level,
            issued_at,
            used: false,
        }
    }
}
