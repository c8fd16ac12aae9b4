//! UI-facing view data and operation outcomes

use serde::{Deserialize, Serialize};

use crate::models::{Coupon, RewardEffect, RewardEntry};
use crate::types::Progress;

/// Progress toward the next level, for the student's home screen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub level: u32,
    pub experience: u32,
    pub required_exp: u32,
    pub ratio: Progress,
}

/// Everything the student page renders from one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentView {
    pub student_id: String,
    pub display_name: String,
    pub progress: ProgressView,
    pub balance: u64,
    /// Levels still owed a reward-draw prompt
    pub undrawn_levels: Vec<u32>,
    /// Coupons awaiting redemption, in issuance order
    pub unused_coupons: Vec<Coupon>,
}

/// Signal that an observed snapshot crossed a level boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpEvent {
    pub new_level: u32,
}

/// Result of applying an experience grant
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrantOutcome {
    pub experience: u32,
    pub level: u32,
    pub leveled_up: bool,
}

/// Three candidates presented for a single manual selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOffer {
    pub level: u32,
    pub candidates: Vec<RewardEntry>,
}

/// Terminal result of a claim attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum DrawOutcome {
    /// The claim won the draw flag and issued this coupon
    Issued { coupon: Coupon },
    /// Another writer already claimed this level; no coupon was issued
    AlreadyDrawn,
}

/// Terminal result of a redemption attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum RedemptionOutcome {
    Redeemed { effect: RewardEffect },
    /// The coupon was already used; nothing changed
    AlreadyRedeemed,
    /// The coupon's reward key has no catalog backing anymore
    InsufficientResource,
}
