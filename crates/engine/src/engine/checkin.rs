//! Daily emotion check-in guard

use chrono::Utc;
use tracing::{info, instrument};

use classquest_core::{CheckinDate, CheckinPayload, EmotionCheckin, Error, Result};
use classquest_store::{DocumentStore, IdentityProvider};

use crate::engine::{RewardEngine, STUDENTS_COLLECTION};

impl<S: DocumentStore, I: IdentityProvider> RewardEngine<S, I> {
    /// Today's check-in date in the classroom's reference offset
    pub fn checkin_date_today(&self) -> Result<CheckinDate> {
        CheckinDate::from_instant(Utc::now(), self.config().checkin_utc_offset_hours)
    }

    /// Submit the daily emotion check-in for `date`
    ///
    /// At most one check-in exists per (student, date); the guard is a
    /// create-if-absent conditional update on the dated key, so two
    /// devices racing on the same day cannot both write. The stored
    /// record carries a write-time timestamp, not a client-supplied one.
    #[instrument(skip(self, payload))]
    pub async fn submit_checkin(
        &self,
        student_id: &str,
        date: CheckinDate,
        payload: CheckinPayload,
    ) -> Result<EmotionCheckin> {
        self.require_user()?;
        // Surfaces NotFound for unknown students before the field write
        self.load_student(student_id).await?;

        let record = EmotionCheckin::from_payload(payload, Utc::now());
        let field_path = format!("emotionCheckins.{}", date.key());
        let write = self
            .store()
            .conditional_update(
                STUDENTS_COLLECTION,
                student_id,
                &field_path,
                None,
                serde_json::to_value(&record)?,
            )
            .await;

        match write {
            Ok(()) => {
                info!(student_id, date = %date, "check-in recorded");
                Ok(record)
            }
            Err(Error::Conflict { .. }) => {
                Err(Error::DuplicateSubmission(format!("check-in for {}", date)))
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::*;
    use classquest_core::{CheckinDate, CheckinPayload, Error};
    use classquest_store::{DocumentStore, StaticIdentity};

    fn payload(emotion: &str) -> CheckinPayload {
        CheckinPayload {
            emotion: emotion.to_string(),
            note: None,
        }
    }

    #[tokio::test]
    async fn test_one_checkin_per_day() {
        let engine = engine_for(StaticIdentity::student("s-1"));
        seed_student(&engine, "s-1", student_body("Mina", 0, 0));
        let date = CheckinDate::parse("2024-05-01").unwrap();

        let record = engine
            .submit_checkin("s-1", date, payload("happy"))
            .await
            .unwrap();
        assert_eq!(record.emotion, "happy");

        // Second submission for the same date fails and writes nothing
        let err = engine
            .submit_checkin("s-1", date, payload("tired"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateSubmission(_)));

        let doc = engine
            .store()
            .get_document(super::STUDENTS_COLLECTION, "s-1")
            .await
            .unwrap()
            .unwrap();
        let student: classquest_core::Student = doc.deserialize().unwrap();
        assert_eq!(student.emotion_checkins.len(), 1);
        assert_eq!(student.emotion_checkins["2024-05-01"].emotion, "happy");
    }

    #[tokio::test]
    async fn test_next_day_checkin_succeeds() {
        let engine = engine_for(StaticIdentity::student("s-1"));
        seed_student(&engine, "s-1", student_body("Mina", 0, 0));

        engine
            .submit_checkin("s-1", CheckinDate::parse("2024-05-01").unwrap(), payload("happy"))
            .await
            .unwrap();
        engine
            .submit_checkin("s-1", CheckinDate::parse("2024-05-02").unwrap(), payload("calm"))
            .await
            .unwrap();

        let doc = engine
            .store()
            .get_document(super::STUDENTS_COLLECTION, "s-1")
            .await
            .unwrap()
            .unwrap();
        let student: classquest_core::Student = doc.deserialize().unwrap();
        assert_eq!(student.emotion_checkins.len(), 2);
    }

    #[tokio::test]
    async fn test_checkin_requires_sign_in() {
        let engine = engine_for(StaticIdentity::signed_out());
        seed_student(&engine, "s-1", student_body("Mina", 0, 0));

        let err = engine
            .submit_checkin(
                "s-1",
                CheckinDate::parse("2024-05-01").unwrap(),
                payload("happy"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthenticated));
    }

    #[tokio::test]
    async fn test_checkin_note_is_preserved() {
        let engine = engine_for(StaticIdentity::student("s-1"));
        seed_student(&engine, "s-1", student_body("Mina", 0, 0));

        let record = engine
            .submit_checkin(
                "s-1",
                CheckinDate::parse("2024-05-01").unwrap(),
                CheckinPayload {
                    emotion: "nervous".to_string(),
                    note: Some("math test today".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(record.note.as_deref(), Some("math test today"));
    }
}
