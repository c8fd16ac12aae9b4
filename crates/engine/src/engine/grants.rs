//! Teacher-side experience grants

use serde_json::json;
use tracing::{info, instrument};

use classquest_core::{Error, GrantOutcome, Result};
use classquest_store::{DocumentStore, IdentityProvider};

use crate::engine::{RewardEngine, STUDENTS_COLLECTION};
use crate::leveling;

impl<S: DocumentStore, I: IdentityProvider> RewardEngine<S, I> {
    /// Grant experience to a student, rolling over into a level-up when the
    /// threshold is reached
    ///
    /// `level` is written before `experience` so no intermediate snapshot
    /// ever shows zeroed experience against the stale level. Grants tolerate
    /// last-write-wins; a concurrent grant surfaces as `Conflict` for the
    /// caller to retry.
    #[instrument(skip(self))]
    pub async fn grant_experience(&self, student_id: &str, amount: u32) -> Result<GrantOutcome> {
        self.require_user()?;
        if amount == 0 {
            return Err(Error::InvalidData(
                "Grant amount must be positive".to_string(),
            ));
        }

        let (student, doc) = self.load_student(student_id).await?;
        let outcome = leveling::apply_grant(student.experience, student.level, amount, self.config());

        if outcome.level != student.level {
            self.store()
                .conditional_update(
                    STUDENTS_COLLECTION,
                    student_id,
                    "level",
                    doc.field("level").cloned(),
                    json!(outcome.level),
                )
                .await?;
        }
        self.store()
            .conditional_update(
                STUDENTS_COLLECTION,
                student_id,
                "experience",
                doc.field("experience").cloned(),
                json!(outcome.experience),
            )
            .await?;

        info!(
            student_id,
            amount,
            level = outcome.level,
            leveled_up = outcome.leveled_up,
            "granted experience"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::*;
    use classquest_core::Error;
    use classquest_store::StaticIdentity;
    use serde_json::json;

    #[tokio::test]
    async fn test_grant_accumulates() {
        let engine = engine_for(StaticIdentity::teacher("t-1"));
        seed_student(&engine, "s-1", student_body("Mina", 100, 0));

        let outcome = engine.grant_experience("s-1", 30).await.unwrap();
        assert_eq!(outcome.experience, 130);
        assert_eq!(outcome.level, 0);
        assert!(!outcome.leveled_up);

        let view = engine.student_view("s-1").await.unwrap();
        assert_eq!(view.progress.experience, 130);
    }

    #[tokio::test]
    async fn test_grant_levels_up_and_resets_experience() {
        // A student at 140/150 receives 10 and crosses the threshold
        let engine = engine_for(StaticIdentity::teacher("t-1"));
        seed_student(&engine, "s-1", student_body("Mina", 140, 0));

        let outcome = engine.grant_experience("s-1", 10).await.unwrap();
        assert!(outcome.leveled_up);
        assert_eq!(outcome.level, 1);
        assert_eq!(outcome.experience, 0);

        let view = engine.student_view("s-1").await.unwrap();
        assert_eq!(view.progress.level, 1);
        assert_eq!(view.progress.experience, 0);
        // The fresh level now owes a reward draw
        assert!(view.undrawn_levels.contains(&1));
    }

    #[tokio::test]
    async fn test_grant_works_on_sparse_document() {
        // Brand-new documents have no experience/level fields yet
        let engine = engine_for(StaticIdentity::teacher("t-1"));
        seed_student(&engine, "s-1", json!({"displayName": "New Kid"}));

        let outcome = engine.grant_experience("s-1", 20).await.unwrap();
        assert_eq!(outcome.experience, 20);
        assert_eq!(outcome.level, 0);
    }

    #[tokio::test]
    async fn test_grant_rejects_zero_amount() {
        let engine = engine_for(StaticIdentity::teacher("t-1"));
        seed_student(&engine, "s-1", student_body("Mina", 0, 0));

        let err = engine.grant_experience("s-1", 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_no_mutation_while_unauthenticated() {
        let engine = engine_for(StaticIdentity::signed_out());
        seed_student(&engine, "s-1", student_body("Mina", 100, 0));

        let err = engine.grant_experience("s-1", 10).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated));

        // Nothing was written
        let view = engine.student_view("s-1").await.unwrap();
        assert_eq!(view.progress.experience, 100);
    }
}
