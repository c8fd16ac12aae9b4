//! The reward engine: store-touching operations over student documents

mod checkin;
mod draw;
mod grants;
mod redeem;

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Mutex;
use tracing::instrument;

use classquest_core::{
    Error, LeaderboardRow, ProgressView, Result, RewardCatalog, Student, StudentView,
};
use classquest_store::{Document, DocumentStore, IdentityProvider, OrderBy, UserIdentity};

use crate::config::EngineConfig;
use crate::leveling;
use crate::watch::StudentWatcher;

/// Collection holding one document per student
pub const STUDENTS_COLLECTION: &str = "students";

/// Leveling & reward engine over a document store and an auth provider
///
/// Consumes document snapshots and emits new snapshots plus UI-facing view
/// data. All mutating operations require a signed-in user; the at-most-once
/// operations (reward claims, check-ins) ride exclusively on the store's
/// conditional update.
pub struct RewardEngine<S, I> {
    store: S,
    identity: I,
    config: EngineConfig,
    catalog: RewardCatalog,
    rng: Mutex<StdRng>,
}

impl<S: DocumentStore, I: IdentityProvider> RewardEngine<S, I> {
    /// Create an engine with the default config and classroom catalog
    pub fn new(store: S, identity: I) -> Self {
        Self::with_config(store, identity, EngineConfig::default(), RewardCatalog::default())
    }

    pub fn with_config(
        store: S,
        identity: I,
        config: EngineConfig,
        catalog: RewardCatalog,
    ) -> Self {
        Self {
            store,
            identity,
            config,
            catalog,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the draw RNG with a seeded one (deterministic offers)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RewardCatalog {
        &self.catalog
    }

    /// The signed-in user, required before any mutation
    pub(crate) fn require_user(&self) -> Result<UserIdentity> {
        self.identity.current_user()
    }

    pub(crate) fn locked_rng(&self) -> std::sync::MutexGuard<'_, StdRng> {
        self.rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load a student with both the typed model and the raw snapshot
    ///
    /// The raw snapshot supplies `expected` values for compare-and-set
    /// writes; comparing against re-serialized models would race with
    /// representation drift.
    pub(crate) async fn load_student(&self, student_id: &str) -> Result<(Student, Document)> {
        let doc = self
            .store
            .get_document(STUDENTS_COLLECTION, student_id)
            .await?
            .ok_or_else(|| Error::NotFound {
                collection: STUDENTS_COLLECTION.to_string(),
                id: student_id.to_string(),
            })?;
        let mut student: Student = doc.deserialize()?;
        student.id = doc.id.clone();
        Ok((student, doc))
    }

    /// Everything the student's home screen renders from one snapshot
    #[instrument(skip(self))]
    pub async fn student_view(&self, student_id: &str) -> Result<StudentView> {
        let (student, _) = self.load_student(student_id).await?;
        Ok(StudentView {
            student_id: student.id.clone(),
            display_name: student.display_name.clone(),
            progress: ProgressView {
                level: student.level,
                experience: student.experience,
                required_exp: leveling::required_exp(student.level, &self.config),
                ratio: leveling::progress(student.experience, student.level, &self.config),
            },
            balance: student.balance,
            undrawn_levels: student.undrawn_levels(),
            unused_coupons: student.unused_coupons(),
        })
    }

    /// All students ranked by (level, experience) descending
    #[instrument(skip(self))]
    pub async fn class_leaderboard(&self) -> Result<Vec<LeaderboardRow>> {
        let docs = self
            .store
            .query(STUDENTS_COLLECTION, None, Some(OrderBy::descending("level")))
            .await?;

        let mut students = Vec::with_capacity(docs.len());
        for doc in &docs {
            let mut student: Student = doc.deserialize()?;
            student.id = doc.id.clone();
            students.push(student);
        }
        // The store orders by one field; break level ties by experience here
        students.sort_by(|a, b| (b.level, b.experience).cmp(&(a.level, a.experience)));

        Ok(students
            .into_iter()
            .enumerate()
            .map(|(i, s)| LeaderboardRow {
                rank: i + 1,
                student_id: s.id,
                display_name: s.display_name,
                level: s.level,
                experience: s.experience,
                balance: s.balance,
            })
            .collect())
    }

    /// Open a level-up watcher for one student
    ///
    /// The detector is primed with the current snapshot when the document
    /// exists, so only increases after this call fire events.
    #[instrument(skip(self))]
    pub async fn watch_student(&self, student_id: &str) -> Result<StudentWatcher> {
        let subscription = self.store.subscribe(STUDENTS_COLLECTION, student_id).await?;
        let current = self
            .store
            .get_document(STUDENTS_COLLECTION, student_id)
            .await?;
        let detector = match current {
            Some(doc) => {
                let student: Student = doc.deserialize()?;
                leveling::LevelUpDetector::primed(student.level)
            }
            None => leveling::LevelUpDetector::new(),
        };
        Ok(StudentWatcher::new(subscription, detector))
    }
}


#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use classquest_store::StaticIdentity;
    use serde_json::json;

    #[tokio::test]
    async fn test_student_view_progress_and_prompts() {
        let engine = engine_for(StaticIdentity::student("s-1"));
        seed_student(&engine, "s-1", student_body("Mina", 140, 0));

        let view = engine.student_view("s-1").await.unwrap();
        assert_eq!(view.progress.required_exp, 150);
        assert!((view.progress.ratio.as_f64() - 140.0 / 150.0).abs() < 1e-9);
        assert_eq!(view.undrawn_levels, vec![0]);
        assert!(view.unused_coupons.is_empty());
    }

    #[tokio::test]
    async fn test_student_view_missing_student() {
        let engine = engine_for(StaticIdentity::student("s-1"));
        let err = engine.student_view("ghost").await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_leaderboard_ranks_by_level_then_experience() {
        let engine = engine_for(StaticIdentity::teacher("t-1"));
        seed_student(&engine, "a", student_body("A", 40, 1));
        seed_student(&engine, "b", student_body("B", 10, 3));
        seed_student(&engine, "c", student_body("C", 90, 1));

        let rows = engine.class_leaderboard().await.unwrap();
        let order: Vec<&str> = rows.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[2].rank, 3);
    }

    #[tokio::test]
    async fn test_view_tolerates_sparse_documents() {
        let engine = engine_for(StaticIdentity::student("s-1"));
        seed_student(&engine, "s-1", json!({"displayName": "New Kid"}));

        let view = engine.student_view("s-1").await.unwrap();
        assert_eq!(view.progress.level, 0);
        assert_eq!(view.progress.experience, 0);
        assert_eq!(view.undrawn_levels, vec![0]);
    }
}
