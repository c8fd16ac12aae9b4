//! Subscription-driven level-up watching

use tracing::debug;

use classquest_core::{LevelUpEvent, Result, Student};
use classquest_store::Subscription;

use crate::leveling::LevelUpDetector;

/// Watches one student's document and surfaces level-up events
///
/// Wraps the store's change feed with a `LevelUpDetector`; snapshots that
/// do not cross a level boundary are consumed silently. Dropping the
/// watcher unsubscribes.
pub struct StudentWatcher {
    subscription: Subscription,
    detector: LevelUpDetector,
}

impl StudentWatcher {
    pub fn new(subscription: Subscription, detector: LevelUpDetector) -> Self {
        Self {
            subscription,
            detector,
        }
    }

    /// Wait for the next level-up
    ///
    /// Errors only when the store closes the feed; malformed snapshots are
    /// surfaced as `InvalidData` by the typed read.
    pub async fn next_level_up(&mut self) -> Result<LevelUpEvent> {
        loop {
            let doc = self.subscription.changed().await?;
            let student: Student = doc.deserialize()?;
            if let Some(event) = self.detector.observe(student.experience, student.level) {
                return Ok(event);
            }
            debug!(student_id = %doc.id, level = student.level, "snapshot without level-up");
        }
    }
}
