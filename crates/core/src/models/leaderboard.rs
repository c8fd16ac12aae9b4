//! Class leaderboard view models

use serde::{Deserialize, Serialize};

/// One ranked row on the class leaderboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRow {
    pub rank: usize,
    pub student_id: String,
    pub display_name: String,
    pub level: u32,
    pub experience: u32,
    pub balance: u64,
}
