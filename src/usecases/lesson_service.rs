//! Lessons: pairing requests into lessons, and lesson edit/cancel/delete/view.

use crate::domain::forms::{LessonForm, PairForm};
use crate::domain::{
    DomainError, FieldErrors, LessonSchedule, LessonStatus, LessonView, NewLesson,
    StudentRequest, StudentRequestStatus, TutorRequest, TutorRequestStatus, User,
};
use crate::ports::{LessonFilter, LessonRepo, PairRejection, RequestRepo};
use std::sync::Arc;
use tracing::info;

pub const PAIRED: &str = "Student and tutor paired successfully!";
pub const STUDENT_NOT_PENDING: &str =
    "This student request cannot be paired as it is not in 'pending' status.";
pub const TUTOR_NOT_AVAILABLE: &str =
    "This tutor request cannot be paired as it is not in 'available' status.";
pub const LESSON_UPDATED: &str = "Lesson updated successfully!";
pub const LESSON_DELETED: &str = "Lesson deleted successfully!";
pub const LESSON_CANCELLED: &str = "Lesson cancelled.";

impl From<PairRejection> for DomainError {
    fn from(rejection: PairRejection) -> Self {
        let message = match rejection {
            PairRejection::StudentRequestNotPending => STUDENT_NOT_PENDING,
            PairRejection::TutorRequestNotAvailable => TUTOR_NOT_AVAILABLE,
        };
        DomainError::InvalidState(message.to_string())
    }
}

pub struct LessonService {
    lessons: Arc<dyn LessonRepo>,
    requests: Arc<dyn RequestRepo>,
}

impl LessonService {
    pub fn new(lessons: Arc<dyn LessonRepo>, requests: Arc<dyn RequestRepo>) -> Self {
        Self { lessons, requests }
    }

    /// Both requests shown on the pairing page.
    pub async fn pairing(
        &self,
        student_request_id: i64,
        tutor_request_id: i64,
    ) -> Result<(StudentRequest, TutorRequest), DomainError> {
        let student_request = self
            .requests
            .get_student_request(student_request_id)
            .await?
            .ok_or(DomainError::not_found("student request", student_request_id))?;
        let tutor_request = self
            .requests
            .get_tutor_request(tutor_request_id)
            .await?
            .ok_or(DomainError::not_found("tutor request", tutor_request_id))?;
        Ok((student_request, tutor_request))
    }

    /// Turns a pending student request and the tutor slot picked in `form` into a lesson.
    ///
    /// Subject, day and frequency come from the student request; timing and location from
    /// the form. Status checks and the insert are applied atomically by the store.
    pub async fn pair(
        &self,
        student_request_id: i64,
        form: &PairForm,
    ) -> Result<LessonSchedule, DomainError> {
        let command = form.validate()?;
        let student_request = self
            .requests
            .get_student_request(student_request_id)
            .await?
            .ok_or(DomainError::not_found("student request", student_request_id))?;
        let tutor_request = self
            .requests
            .get_tutor_request(command.tutor_request_id)
            .await?
            .ok_or_else(|| {
                DomainError::from(FieldErrors::single(
                    "tutor_request_id",
                    "Select a valid choice. That choice is not one of the available choices.",
                ))
            })?;

        if student_request.status != StudentRequestStatus::Pending {
            return Err(PairRejection::StudentRequestNotPending.into());
        }
        if tutor_request.status != TutorRequestStatus::Available {
            return Err(PairRejection::TutorRequestNotAvailable.into());
        }

        let lesson = NewLesson {
            tutor_id: tutor_request.tutor_id,
            student_id: student_request.student_id,
            subject: student_request.language.clone(),
            day_of_week: student_request.day_of_week,
            start_time: command.start_time,
            duration: command.duration,
            frequency: student_request.frequency,
            location: command.location,
            student_request_id: Some(student_request.id),
            tutor_request_id: Some(tutor_request.id),
        };
        let paired = self
            .lessons
            .pair_requests(student_request.id, tutor_request.id, &lesson)
            .await??;
        Ok(paired)
    }

    pub async fn lesson(&self, id: i64) -> Result<LessonView, DomainError> {
        self.lessons
            .get_lesson(id)
            .await?
            .ok_or(DomainError::not_found("lesson", id))
    }

    /// Admins see every lesson; others only lessons they take part in.
    pub async fn view_lesson(&self, user: &User, id: i64) -> Result<LessonView, DomainError> {
        let view = self.lesson(id).await?;
        if user.is_admin() || view.lesson.involves(user.id) {
            Ok(view)
        } else {
            Err(DomainError::PermissionDenied(format!(
                "user {} is not part of lesson {id}",
                user.id
            )))
        }
    }

    pub async fn edit_lesson(&self, id: i64, form: &LessonForm) -> Result<LessonView, DomainError> {
        let update = form.validate()?;
        if !self.lessons.update_lesson(id, &update).await? {
            return Err(DomainError::not_found("lesson", id));
        }
        info!(lesson_id = id, status = %update.status, "lesson updated");
        self.lesson(id).await
    }

    pub async fn delete_lesson(&self, id: i64) -> Result<(), DomainError> {
        if !self.lessons.delete_lesson(id).await? {
            return Err(DomainError::not_found("lesson", id));
        }
        info!(lesson_id = id, "lesson deleted");
        Ok(())
    }

    /// The lesson, if `user` is its student or tutor. Admins get no exception here.
    pub async fn participant_lesson(&self, user: &User, id: i64) -> Result<LessonView, DomainError> {
        let view = self.lesson(id).await?;
        if !view.lesson.involves(user.id) {
            return Err(DomainError::PermissionDenied(format!(
                "user {} is not part of lesson {id}",
                user.id
            )));
        }
        Ok(view)
    }

    /// Only the lesson's student or tutor may cancel it.
    pub async fn cancel_lesson(&self, user: &User, id: i64) -> Result<(), DomainError> {
        self.participant_lesson(user, id).await?;
        self.lessons
            .set_lesson_status(id, LessonStatus::Cancelled)
            .await?;
        info!(lesson_id = id, user_id = user.id, "lesson cancelled");
        Ok(())
    }

    pub async fn lessons_of_student(&self, user: &User) -> Result<Vec<LessonView>, DomainError> {
        self.lessons
            .list_lessons(LessonFilter {
                student_id: Some(user.id),
                ..LessonFilter::default()
            })
            .await
    }

    pub async fn lessons_of_tutor(&self, user: &User) -> Result<Vec<LessonView>, DomainError> {
        self.lessons
            .list_lessons(LessonFilter {
                tutor_id: Some(user.id),
                ..LessonFilter::default()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forms::PAIR_FIELDS_MESSAGE;
    use crate::domain::{DayOfWeek, Frequency, NON_FIELD};
    use crate::usecases::testing::{Fixture, s, student_request_form, tutor_request_form};
    use chrono::NaiveTime;

    struct Paired {
        fx: Fixture,
        student: User,
        tutor: User,
        sr: StudentRequest,
        tr: TutorRequest,
    }

    async fn setup() -> Paired {
        let fx = Fixture::new().await;
        let student = fx.student("@charlie").await;
        let tutor = fx.tutor("@janedoe").await;
        let sr = fx
            .services
            .requests
            .submit_student_request(&student, &student_request_form("Python", "monday"))
            .await
            .unwrap();
        let tr = fx
            .services
            .requests
            .submit_tutor_request(&tutor, &tutor_request_form("Python", "monday"))
            .await
            .unwrap();
        Paired {
            fx,
            student,
            tutor,
            sr,
            tr,
        }
    }

    fn pair_form(tutor_request_id: i64) -> PairForm {
        PairForm {
            tutor_request_id: Some(tutor_request_id.to_string()),
            start_time: s("10:00"),
            duration: s("60"),
            location: None,
        }
    }

    fn lesson_form() -> LessonForm {
        LessonForm {
            student: s("999"),
            tutor: s("999"),
            subject: s("Advanced Python"),
            day_of_week: s("Friday"),
            start_time: s("14:00"),
            duration: s("90"),
            frequency: s("monthly"),
            status: s("completed"),
            location: s("Room 4"),
        }
    }

    #[tokio::test]
    async fn pairing_creates_lesson_from_request_fields() {
        let p = setup().await;
        let lessons = &p.fx.services.lessons;
        let lesson = lessons.pair(p.sr.id, &pair_form(p.tr.id)).await.unwrap();

        assert_eq!(lesson.subject, "Python");
        assert_eq!(lesson.start_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(lesson.duration, 60);
        assert_eq!(lesson.status, LessonStatus::Scheduled);
        assert_eq!(lesson.location, "Online");
        assert_eq!(lesson.day_of_week, DayOfWeek::Monday);
        assert_eq!(lesson.frequency, Frequency::Weekly);
        assert_eq!(lesson.tutor_id, p.tutor.id);
        assert_eq!(lesson.student_id, p.student.id);

        let requests = &p.fx.services.requests;
        assert_eq!(
            requests.student_request(p.sr.id).await.unwrap().status,
            StudentRequestStatus::Approved
        );
        assert_eq!(
            requests.tutor_request(p.tr.id).await.unwrap().status,
            TutorRequestStatus::Scheduled
        );
    }

    #[tokio::test]
    async fn pairing_refuses_non_pending_student_request() {
        let p = setup().await;
        p.fx.services
            .requests
            .cancel_student_request(&p.student, p.sr.id)
            .await
            .unwrap();
        let err = p
            .fx
            .services
            .lessons
            .pair(p.sr.id, &pair_form(p.tr.id))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), STUDENT_NOT_PENDING);
        assert_eq!(
            p.fx.services.requests.tutor_request(p.tr.id).await.unwrap().status,
            TutorRequestStatus::Available
        );
    }

    #[tokio::test]
    async fn pairing_refuses_unavailable_tutor_request() {
        let p = setup().await;
        p.fx.services
            .requests
            .cancel_tutor_request(&p.tutor, p.tr.id)
            .await
            .unwrap();
        let err = p
            .fx
            .services
            .lessons
            .pair(p.sr.id, &pair_form(p.tr.id))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), TUTOR_NOT_AVAILABLE);
        assert_eq!(
            p.fx.services.requests.student_request(p.sr.id).await.unwrap().status,
            StudentRequestStatus::Pending
        );
    }

    #[tokio::test]
    async fn blank_pair_fields_change_nothing() {
        let p = setup().await;
        let form = PairForm {
            tutor_request_id: s(""),
            start_time: s("10:00"),
            duration: s(""),
            location: None,
        };
        match p.fx.services.lessons.pair(p.sr.id, &form).await {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains(NON_FIELD, PAIR_FIELDS_MESSAGE))
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(
            p.fx.services
                .lessons
                .lessons_of_student(&p.student)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn edit_keeps_participants() {
        let p = setup().await;
        let lessons = &p.fx.services.lessons;
        let lesson = lessons.pair(p.sr.id, &pair_form(p.tr.id)).await.unwrap();
        let view = lessons.edit_lesson(lesson.id, &lesson_form()).await.unwrap();
        assert_eq!(view.lesson.subject, "Advanced Python");
        assert_eq!(view.lesson.status, LessonStatus::Completed);
        assert_eq!(view.lesson.tutor_id, p.tutor.id);
        assert_eq!(view.lesson.student_id, p.student.id);
        assert_eq!(view.end_time, NaiveTime::from_hms_opt(15, 30, 0).unwrap());

        let missing = lessons.edit_lesson(9_999, &lesson_form()).await.unwrap_err();
        assert!(matches!(missing, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn only_participants_cancel_and_view() {
        let p = setup().await;
        let lessons = &p.fx.services.lessons;
        let lesson = lessons.pair(p.sr.id, &pair_form(p.tr.id)).await.unwrap();
        let outsider = p.fx.student("@outsider").await;
        let admin = p.fx.admin("@johndoe").await;

        assert!(matches!(
            lessons.cancel_lesson(&outsider, lesson.id).await.unwrap_err(),
            DomainError::PermissionDenied(_)
        ));
        assert!(matches!(
            lessons.view_lesson(&outsider, lesson.id).await.unwrap_err(),
            DomainError::PermissionDenied(_)
        ));
        assert!(lessons.view_lesson(&admin, lesson.id).await.is_ok());
        assert!(lessons.view_lesson(&p.tutor, lesson.id).await.is_ok());

        lessons.cancel_lesson(&p.student, lesson.id).await.unwrap();
        assert_eq!(
            lessons.lesson(lesson.id).await.unwrap().lesson.status,
            LessonStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn delete_missing_lesson_is_not_found() {
        let p = setup().await;
        let lessons = &p.fx.services.lessons;
        let lesson = lessons.pair(p.sr.id, &pair_form(p.tr.id)).await.unwrap();
        lessons.delete_lesson(lesson.id).await.unwrap();
        assert!(matches!(
            lessons.delete_lesson(lesson.id).await.unwrap_err(),
            DomainError::NotFound { .. }
        ));
        assert!(lessons.lessons_of_tutor(&p.tutor).await.unwrap().is_empty());
    }
}
