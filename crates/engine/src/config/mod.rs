//! Engine configuration

use serde::{Deserialize, Serialize};

/// How reward-draw candidates are sampled from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawPolicy {
    /// Uniform choice among catalog entries. Catalog weights are ignored;
    /// this matches the deployed behavior.
    #[default]
    Uniform,
    /// Sample proportionally to each entry's weight
    Weighted,
}

/// Tunables for the leveling and reward engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Base experience required to clear level 0
    pub base_exp: u32,
    /// Additional experience required per level
    pub exp_increment: u32,
    /// How many candidates a draw presents for manual selection
    pub draw_candidates: usize,
    pub draw_policy: DrawPolicy,
    /// Fixed reference offset (hours east of UTC) for check-in dates
    pub checkin_utc_offset_hours: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_exp: 150,
            exp_increment: 10,
            draw_candidates: 3,
            draw_policy: DrawPolicy::default(),
            checkin_utc_offset_hours: 9,
        }
    }
}
