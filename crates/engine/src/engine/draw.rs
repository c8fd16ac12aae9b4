//! Reward-draw eligibility and coupon issuance
//!
//! Per (student, level) the draw flag moves NOT_DRAWN -> DRAWN exactly
//! once and never back. The compare-and-set on `levelRewardDrawn.<level>`
//! against the shared store is the sole source of truth for that
//! transition; local or cached state never decides it.

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument, warn};

use classquest_core::{Coupon, DrawOffer, DrawOutcome, Error, Result};
use classquest_store::{DocumentStore, IdentityProvider};

use crate::draw::sample_candidates;
use crate::engine::{RewardEngine, STUDENTS_COLLECTION};

impl<S: DocumentStore, I: IdentityProvider> RewardEngine<S, I> {
    /// Sample candidates for a level's one-time reward draw
    ///
    /// Candidates are drawn independently and with replacement, uniformly
    /// by default (see `DrawPolicy`). An already-drawn level is surfaced as
    /// `DuplicateSubmission`, not a hard error.
    #[instrument(skip(self))]
    pub async fn draw_offer(&self, student_id: &str, level: u32) -> Result<DrawOffer> {
        self.require_user()?;
        let (student, _) = self.load_student(student_id).await?;

        if level > student.level {
            return Err(Error::InvalidData(format!(
                "Student is level {}, cannot draw for level {}",
                student.level, level
            )));
        }
        if student.reward_drawn(level) {
            return Err(Error::DuplicateSubmission(format!(
                "level {} reward draw",
                level
            )));
        }

        let candidates = {
            let mut rng = self.locked_rng();
            sample_candidates(
                self.catalog(),
                self.config().draw_candidates,
                self.config().draw_policy,
                &mut *rng,
            )
            .into_iter()
            .cloned()
            .collect()
        };
        Ok(DrawOffer { level, candidates })
    }

    /// Claim the selected reward for a level's draw
    ///
    /// Wins the draw flag first; only a successful compare-and-set issues
    /// a coupon. A lost race issues nothing and reports `AlreadyDrawn`.
    #[instrument(skip(self))]
    pub async fn claim_reward(
        &self,
        student_id: &str,
        level: u32,
        reward_key: &str,
    ) -> Result<DrawOutcome> {
        self.require_user()?;
        if self.catalog().get(reward_key).is_none() {
            return Err(Error::UnknownReward(reward_key.to_string()));
        }

        let (student, doc) = self.load_student(student_id).await?;
        if level > student.level {
            return Err(Error::InvalidData(format!(
                "Student is level {}, cannot claim for level {}",
                student.level, level
            )));
        }
        if student.reward_drawn(level) {
            return Ok(DrawOutcome::AlreadyDrawn);
        }

        let flag_path = format!("levelRewardDrawn.{}", level);
        let claim = self
            .store()
            .conditional_update(
                STUDENTS_COLLECTION,
                student_id,
                &flag_path,
                doc.field(&flag_path).cloned(),
                json!(true),
            )
            .await;

        match claim {
            Ok(()) => {}
            Err(Error::Conflict { .. }) => {
                // Lost the race; if the winner set the flag our intent is
                // moot and the attempt is dropped without a coupon
                let (current, _) = self.load_student(student_id).await?;
                if current.reward_drawn(level) {
                    warn!(student_id, level, "draw already claimed by another writer");
                    return Ok(DrawOutcome::AlreadyDrawn);
                }
                return Err(Error::Conflict {
                    field_path: flag_path,
                });
            }
            Err(e) => return Err(e),
        }

        let coupon = Coupon::issue(reward_key, level, Utc::now());
        self.store()
            .append_to_array(
                STUDENTS_COLLECTION,
                student_id,
                "coupons",
                serde_json::to_value(&coupon)?,
            )
            .await?;

        info!(student_id, level, reward_key, coupon_id = %coupon.id, "issued level reward coupon");
        Ok(DrawOutcome::Issued { coupon })
    }
}
