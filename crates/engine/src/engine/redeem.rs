//! Coupon redemption
//!
//! The effect lands first and the `used` flag flips second. The store has
//! no multi-field transaction, so a crash between the two permits one
//! retry; the retry is deduplicated by the coupon id carried on every
//! effect record.

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use classquest_core::{
    Coupon, Error, InventoryItem, LedgerEntry, Message, RedemptionOutcome, Result, RewardEffect,
    Student,
};
use classquest_store::{Document, DocumentStore, IdentityProvider};

use crate::engine::{RewardEngine, STUDENTS_COLLECTION};

/// Audit reason recorded for currency grants from level rewards
const LEVEL_REWARD_REASON: &str = "level reward";

impl<S: DocumentStore, I: IdentityProvider> RewardEngine<S, I> {
    /// Redeem one coupon, applying its reward effect exactly once
    ///
    /// An already-used coupon is a no-op reporting `AlreadyRedeemed`. A
    /// coupon whose reward key lost its catalog backing reports
    /// `InsufficientResource` without mutating anything.
    #[instrument(skip(self))]
    pub async fn redeem(&self, student_id: &str, coupon_id: &str) -> Result<RedemptionOutcome> {
        self.require_user()?;
        let (student, doc) = self.load_student(student_id).await?;

        let coupon = student
            .find_coupon(coupon_id)
            .cloned()
            .ok_or_else(|| Error::InvalidData(format!("Unknown coupon '{}'", coupon_id)))?;
        if coupon.used {
            return Ok(RedemptionOutcome::AlreadyRedeemed);
        }

        let Some(entry) = self.catalog().get(&coupon.reward_key) else {
            warn!(
                student_id,
                coupon_id,
                reward_key = %coupon.reward_key,
                "coupon reward has no catalog backing"
            );
            return Ok(RedemptionOutcome::InsufficientResource);
        };
        let effect = entry.effect.clone();

        if student.effect_recorded(coupon_id) {
            // A previous attempt crashed after the effect write; only the
            // flag flip is still owed
            info!(student_id, coupon_id, "redemption effect already recorded, completing");
        } else {
            self.apply_effect(&student, &doc, &coupon, &effect).await?;
        }

        self.mark_coupon_used(student_id, &doc, coupon_id).await?;
        info!(student_id, coupon_id, reward_key = %coupon.reward_key, "coupon redeemed");
        Ok(RedemptionOutcome::Redeemed { effect })
    }

    async fn apply_effect(
        &self,
        student: &Student,
        doc: &Document,
        coupon: &Coupon,
        effect: &RewardEffect,
    ) -> Result<()> {
        let now = Utc::now();
        match effect {
            RewardEffect::CurrencyGrant { amount } => {
                self.store()
                    .conditional_update(
                        STUDENTS_COLLECTION,
                        &student.id,
                        "balance",
                        doc.field("balance").cloned(),
                        json!(student.balance + amount),
                    )
                    .await?;
                let entry =
                    LedgerEntry::coupon_deposit(LEVEL_REWARD_REASON, *amount, &coupon.id, now);
                self.store()
                    .append_to_array(
                        STUDENTS_COLLECTION,
                        &student.id,
                        "ledger",
                        serde_json::to_value(&entry)?,
                    )
                    .await?;
            }
            RewardEffect::ItemGrant { item, quantity } => {
                let granted = InventoryItem::from_coupon(item, *quantity, &coupon.id, now);
                self.store()
                    .append_to_array(
                        STUDENTS_COLLECTION,
                        &student.id,
                        "inventory",
                        serde_json::to_value(&granted)?,
                    )
                    .await?;
            }
            RewardEffect::SocialGift { message } => {
                let gift = Message::system_gift(message, &coupon.id, now);
                self.store()
                    .append_to_array(
                        STUDENTS_COLLECTION,
                        &student.id,
                        "messages",
                        serde_json::to_value(&gift)?,
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Flip the coupon's `used` flag via compare-and-set on the coupons array
    async fn mark_coupon_used(
        &self,
        student_id: &str,
        doc: &Document,
        coupon_id: &str,
    ) -> Result<()> {
        let current = doc
            .field("coupons")
            .cloned()
            .ok_or_else(|| Error::InvalidData("Student has no coupons field".to_string()))?;

        let mut updated = current.clone();
        let coupons = updated
            .as_array_mut()
            .ok_or_else(|| Error::InvalidData("Coupons field is not an array".to_string()))?;
        for raw in coupons {
            if raw.get("id").and_then(Value::as_str) == Some(coupon_id) {
                if let Some(obj) = raw.as_object_mut() {
                    obj.insert("used".to_string(), json!(true));
                }
            }
        }

        self.store()
            .conditional_update(
                STUDENTS_COLLECTION,
                student_id,
                "coupons",
                Some(current),
                updated,
            )
            .await
    }
}
