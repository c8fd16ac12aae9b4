//! Student record - the single shared mutable document per student

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Coupon, EmotionCheckin, InventoryItem, LedgerEntry, Message};

/// A student document as stored in the `students` collection
///
/// Mutated by both the student (check-ins, draws, redemptions) and the
/// teacher (experience grants). Every field a remote writer owns carries
/// `#[serde(default)]` so partially-populated documents still parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    /// Filled from the snapshot id when the document body omits it
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    /// Accumulated experience; resets to exactly 0 on level-up
    #[serde(default)]
    pub experience: u32,
    /// Current level, starting at 0
    #[serde(default)]
    pub level: u32,
    /// Virtual currency balance
    #[serde(default)]
    pub balance: u64,
    /// Per-level one-time draw flags; once true, never reverts
    #[serde(default)]
    pub level_reward_drawn: BTreeMap<u32, bool>,
    /// Issuance order is insertion order; coupons are never deleted
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    /// Keyed by `YYYY-MM-DD` in the classroom's reference offset
    #[serde(default)]
    pub emotion_checkins: BTreeMap<String, EmotionCheckin>,
    /// Balance audit trail
    #[serde(default)]
    pub ledger: Vec<LedgerEntry>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Student {
    /// Levels up to and including the current one whose reward draw is
    /// still outstanding
    pub fn undrawn_levels(&self) -> Vec<u32> {
        (0..=self.level)
            .filter(|l| !self.level_reward_drawn.get(l).copied().unwrap_or(false))
            .collect()
    }

    /// Whether the one-time draw for `level` has already been claimed
    pub fn reward_drawn(&self, level: u32) -> bool {
        self.level_reward_drawn.get(&level).copied().unwrap_or(false)
    }

    /// Coupons still awaiting redemption, in issuance order
    pub fn unused_coupons(&self) -> Vec<Coupon> {
        self.coupons.iter().filter(|c| !c.used).cloned().collect()
    }

    pub fn find_coupon(&self, coupon_id: &str) -> Option<&Coupon> {
        self.coupons.iter().find(|c| c.id == coupon_id)
    }

    /// Whether a redemption effect for `coupon_id` already landed
    ///
    /// Checked before re-applying an effect so a retry after a crash between
    /// the effect write and the `used`-flag flip cannot double-apply.
    pub fn effect_recorded(&self, coupon_id: &str) -> bool {
        let matches = |id: &Option<String>| id.as_deref() == Some(coupon_id);
        self.ledger.iter().any(|e| matches(&e.coupon_id))
            || self.inventory.iter().any(|e| matches(&e.coupon_id))
            || self.messages.iter().any(|m| matches(&m.coupon_id))
    }
}
