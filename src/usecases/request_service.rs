//! Student lesson requests and tutor availability: submit, list, cancel, match.

use crate::domain::forms::{StudentRequestForm, TutorRequestForm};
use crate::domain::{
    DomainError, Role, StudentRequest, StudentRequestStatus, TutorRequest, TutorRequestStatus,
    User,
};
use crate::ports::{RequestRepo, StudentRequestFilter, TutorRequestFilter};
use std::sync::Arc;
use tracing::info;

pub const STUDENT_REQUEST_SUBMITTED: &str = "Your request has been submitted!";
pub const TUTOR_REQUEST_SUBMITTED: &str = "Your availability has been submitted!";
pub const REQUEST_CANCELLED: &str = "Your request has been cancelled.";
pub const ONLY_PENDING_CANCEL: &str = "Only pending requests can be cancelled.";
pub const ONLY_AVAILABLE_CANCEL: &str = "Only available requests can be cancelled.";

pub struct RequestService {
    requests: Arc<dyn RequestRepo>,
}

fn require_role(user: &User, role: Role) -> Result<(), DomainError> {
    if user.role == role {
        Ok(())
    } else {
        Err(DomainError::PermissionDenied(format!(
            "{} accounts only",
            role.as_str()
        )))
    }
}

impl RequestService {
    pub fn new(requests: Arc<dyn RequestRepo>) -> Self {
        Self { requests }
    }

    pub async fn submit_student_request(
        &self,
        student: &User,
        form: &StudentRequestForm,
    ) -> Result<StudentRequest, DomainError> {
        require_role(student, Role::Student)?;
        let request = form.validate()?;
        self.requests
            .insert_student_request(student.id, &request)
            .await
    }

    pub async fn submit_tutor_request(
        &self,
        tutor: &User,
        form: &TutorRequestForm,
    ) -> Result<TutorRequest, DomainError> {
        require_role(tutor, Role::Tutor)?;
        let request = form.validate()?;
        self.requests.insert_tutor_request(tutor.id, &request).await
    }

    /// Someone else's request reads as missing.
    pub async fn cancel_student_request(&self, user: &User, id: i64) -> Result<(), DomainError> {
        let request = self
            .requests
            .get_student_request(id)
            .await?
            .filter(|r| r.student_id == user.id)
            .ok_or(DomainError::not_found("student request", id))?;
        let moved = self
            .requests
            .transition_student_request(
                request.id,
                StudentRequestStatus::Pending,
                StudentRequestStatus::Cancelled,
            )
            .await?;
        if !moved {
            return Err(DomainError::InvalidState(ONLY_PENDING_CANCEL.to_string()));
        }
        info!(request_id = id, user_id = user.id, "student request cancelled");
        Ok(())
    }

    pub async fn cancel_tutor_request(&self, user: &User, id: i64) -> Result<(), DomainError> {
        let request = self
            .requests
            .get_tutor_request(id)
            .await?
            .filter(|r| r.tutor_id == user.id)
            .ok_or(DomainError::not_found("tutor request", id))?;
        let moved = self
            .requests
            .transition_tutor_request(
                request.id,
                TutorRequestStatus::Available,
                TutorRequestStatus::Cancelled,
            )
            .await?;
        if !moved {
            return Err(DomainError::InvalidState(ONLY_AVAILABLE_CANCEL.to_string()));
        }
        info!(request_id = id, user_id = user.id, "tutor request cancelled");
        Ok(())
    }

    pub async fn student_requests_of(&self, user: &User) -> Result<Vec<StudentRequest>, DomainError> {
        self.requests
            .list_student_requests(StudentRequestFilter {
                student_id: Some(user.id),
                status: None,
            })
            .await
    }

    pub async fn tutor_requests_of(&self, user: &User) -> Result<Vec<TutorRequest>, DomainError> {
        self.requests
            .list_tutor_requests(TutorRequestFilter {
                tutor_id: Some(user.id),
                ..TutorRequestFilter::default()
            })
            .await
    }

    pub async fn student_requests(
        &self,
        status: Option<StudentRequestStatus>,
    ) -> Result<Vec<StudentRequest>, DomainError> {
        self.requests
            .list_student_requests(StudentRequestFilter {
                student_id: None,
                status,
            })
            .await
    }

    pub async fn tutor_requests(
        &self,
        status: Option<TutorRequestStatus>,
    ) -> Result<Vec<TutorRequest>, DomainError> {
        self.requests
            .list_tutor_requests(TutorRequestFilter {
                status,
                ..TutorRequestFilter::default()
            })
            .await
    }

    pub async fn student_request(&self, id: i64) -> Result<StudentRequest, DomainError> {
        self.requests
            .get_student_request(id)
            .await?
            .ok_or(DomainError::not_found("student request", id))
    }

    pub async fn tutor_request(&self, id: i64) -> Result<TutorRequest, DomainError> {
        self.requests
            .get_tutor_request(id)
            .await?
            .ok_or(DomainError::not_found("tutor request", id))
    }

    /// Available tutor slots on the same day that teach the language at the requested level.
    pub async fn match_candidates(
        &self,
        request: &StudentRequest,
    ) -> Result<Vec<TutorRequest>, DomainError> {
        let same_day = self
            .requests
            .list_tutor_requests(TutorRequestFilter {
                tutor_id: None,
                status: Some(TutorRequestStatus::Available),
                day_of_week: Some(request.day_of_week),
            })
            .await?;
        Ok(same_day.into_iter().filter(|t| t.matches(request)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::testing::{Fixture, s, student_request_form, tutor_request_form};

    #[tokio::test]
    async fn submitted_requests_start_in_open_status() {
        let fx = Fixture::new().await;
        let student = fx.student("@charlie").await;
        let tutor = fx.tutor("@janedoe").await;
        let requests = &fx.services.requests;

        let sr = requests
            .submit_student_request(&student, &student_request_form("Python", "Monday"))
            .await
            .unwrap();
        let tr = requests
            .submit_tutor_request(&tutor, &tutor_request_form("Python", "monday"))
            .await
            .unwrap();
        assert_eq!(sr.status, StudentRequestStatus::Pending);
        assert_eq!(tr.status, TutorRequestStatus::Available);
        assert_eq!(requests.student_requests_of(&student).await.unwrap(), vec![sr]);
        assert_eq!(requests.tutor_requests_of(&tutor).await.unwrap(), vec![tr]);
    }

    #[tokio::test]
    async fn wrong_role_cannot_submit() {
        let fx = Fixture::new().await;
        let tutor = fx.tutor("@janedoe").await;
        let err = fx
            .services
            .requests
            .submit_student_request(&tutor, &student_request_form("Python", "monday"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn invalid_choice_is_reported_on_field() {
        let fx = Fixture::new().await;
        let student = fx.student("@charlie").await;
        let mut form = student_request_form("Python", "InvalidDay");
        form.preferred_time = s("not a time");
        match fx
            .services
            .requests
            .submit_student_request(&student, &form)
            .await
        {
            Err(DomainError::Validation(errors)) => {
                assert!(errors.contains(
                    "day_of_week",
                    "Select a valid choice. InvalidDay is not one of the available choices."
                ));
                assert!(errors.contains("preferred_time", "Enter a valid time."));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn only_owner_cancels_and_only_once() {
        let fx = Fixture::new().await;
        let owner = fx.student("@charlie").await;
        let other = fx.student("@other").await;
        let requests = &fx.services.requests;
        let sr = requests
            .submit_student_request(&owner, &student_request_form("Python", "monday"))
            .await
            .unwrap();

        let err = requests.cancel_student_request(&other, sr.id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));

        requests.cancel_student_request(&owner, sr.id).await.unwrap();
        assert_eq!(
            requests.student_request(sr.id).await.unwrap().status,
            StudentRequestStatus::Cancelled
        );
        let again = requests.cancel_student_request(&owner, sr.id).await.unwrap_err();
        assert_eq!(again.to_string(), ONLY_PENDING_CANCEL);
    }

    #[tokio::test]
    async fn tutor_cancel_requires_available() {
        let fx = Fixture::new().await;
        let tutor = fx.tutor("@janedoe").await;
        let requests = &fx.services.requests;
        let tr = requests
            .submit_tutor_request(&tutor, &tutor_request_form("Python", "monday"))
            .await
            .unwrap();
        requests.cancel_tutor_request(&tutor, tr.id).await.unwrap();
        let err = requests.cancel_tutor_request(&tutor, tr.id).await.unwrap_err();
        assert_eq!(err.to_string(), ONLY_AVAILABLE_CANCEL);
        assert!(requests.cancel_tutor_request(&tutor, 9_999).await.is_err());
    }

    #[tokio::test]
    async fn match_candidates_filter_day_language_and_level() {
        let fx = Fixture::new().await;
        let student = fx.student("@charlie").await;
        let tutor = fx.tutor("@janedoe").await;
        let requests = &fx.services.requests;
        let sr = requests
            .submit_student_request(&student, &student_request_form("python", "monday"))
            .await
            .unwrap();

        let good = requests
            .submit_tutor_request(&tutor, &tutor_request_form("Java, Python", "monday"))
            .await
            .unwrap();
        requests
            .submit_tutor_request(&tutor, &tutor_request_form("Python", "tuesday"))
            .await
            .unwrap();
        requests
            .submit_tutor_request(&tutor, &tutor_request_form("Rust", "monday"))
            .await
            .unwrap();
        let mut advanced = tutor_request_form("Python", "monday");
        advanced.level_can_teach = s("advanced");
        requests.submit_tutor_request(&tutor, &advanced).await.unwrap();
        let cancelled = requests
            .submit_tutor_request(&tutor, &tutor_request_form("Python", "monday"))
            .await
            .unwrap();
        requests.cancel_tutor_request(&tutor, cancelled.id).await.unwrap();

        let candidates = requests.match_candidates(&sr).await.unwrap();
        assert_eq!(candidates, vec![good]);
    }
}
