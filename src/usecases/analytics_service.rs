//! Read models for dashboards, the admin request list and platform analytics.

use crate::domain::{
    DomainError, InvoiceStatus, LessonStatus, LessonView, Money, StudentRequest,
    StudentRequestStatus, TutorRequest, TutorRequestStatus, User,
};
use crate::ports::{
    FeedbackRepo, InvoiceFilter, InvoiceRepo, LessonFilter, LessonRepo, ProfileRepo, RequestRepo,
    StudentRequestFilter, TutorRequestFilter,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Analytics {
    pub total_tutors: u64,
    pub total_students: u64,
    pub hours_taught: i64,
    pub total_feedback: u64,
    pub total_lessons: u64,
    pub scheduled_lessons: u64,
    pub unpaid_invoices: u64,
    pub outstanding_amount: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub pending_student_requests: Vec<StudentRequest>,
    pub available_tutor_requests: Vec<TutorRequest>,
    pub scheduled_lessons: Vec<LessonView>,
}

/// A student request with the tutor slots that could serve it (only filled while pending).
#[derive(Debug, Clone, Serialize)]
pub struct RequestMatches {
    #[serde(flatten)]
    pub request: StudentRequest,
    pub candidates: Vec<TutorRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestList {
    pub student_requests: Vec<RequestMatches>,
    pub tutor_requests: Vec<TutorRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentDashboard {
    pub lessons: Vec<LessonView>,
    pub requests: Vec<StudentRequest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TutorDashboard {
    pub tutor_name: String,
    pub lessons: Vec<LessonView>,
    pub requests: Vec<TutorRequest>,
}

pub struct AnalyticsService {
    profiles: Arc<dyn ProfileRepo>,
    requests: Arc<dyn RequestRepo>,
    lessons: Arc<dyn LessonRepo>,
    invoices: Arc<dyn InvoiceRepo>,
    feedback: Arc<dyn FeedbackRepo>,
}

impl AnalyticsService {
    pub fn new(
        profiles: Arc<dyn ProfileRepo>,
        requests: Arc<dyn RequestRepo>,
        lessons: Arc<dyn LessonRepo>,
        invoices: Arc<dyn InvoiceRepo>,
        feedback: Arc<dyn FeedbackRepo>,
    ) -> Self {
        Self {
            profiles,
            requests,
            lessons,
            invoices,
            feedback,
        }
    }

    pub async fn analytics(&self) -> Result<Analytics, DomainError> {
        let unpaid = self
            .invoices
            .list_invoices(InvoiceFilter {
                student_id: None,
                status: Some(InvoiceStatus::Unpaid),
            })
            .await?;
        let outstanding = unpaid
            .iter()
            .try_fold(Money::default(), |sum, v| sum.checked_add(v.invoice.amount))
            .ok_or_else(|| DomainError::Repo("outstanding invoice total overflows".to_string()))?;
        Ok(Analytics {
            total_tutors: self.profiles.count_tutors().await?,
            total_students: self.profiles.count_students().await?,
            hours_taught: self.profiles.total_hours_taught().await?,
            total_feedback: self.feedback.count_feedback().await?,
            total_lessons: self.lessons.count_lessons(None).await?,
            scheduled_lessons: self
                .lessons
                .count_lessons(Some(LessonStatus::Scheduled))
                .await?,
            unpaid_invoices: unpaid.len() as u64,
            outstanding_amount: outstanding,
        })
    }

    pub async fn admin_dashboard(&self) -> Result<AdminDashboard, DomainError> {
        Ok(AdminDashboard {
            pending_student_requests: self
                .requests
                .list_student_requests(StudentRequestFilter {
                    student_id: None,
                    status: Some(StudentRequestStatus::Pending),
                })
                .await?,
            available_tutor_requests: self.available_tutor_requests().await?,
            scheduled_lessons: self
                .lessons
                .list_lessons(LessonFilter {
                    status: Some(LessonStatus::Scheduled),
                    ..LessonFilter::default()
                })
                .await?,
        })
    }

    async fn available_tutor_requests(&self) -> Result<Vec<TutorRequest>, DomainError> {
        self.requests
            .list_tutor_requests(TutorRequestFilter {
                status: Some(TutorRequestStatus::Available),
                ..TutorRequestFilter::default()
            })
            .await
    }

    /// Every request, with match candidates worked out for the pending student ones.
    pub async fn request_list(&self) -> Result<RequestList, DomainError> {
        let student_requests = self
            .requests
            .list_student_requests(StudentRequestFilter::default())
            .await?;
        let tutor_requests = self
            .requests
            .list_tutor_requests(TutorRequestFilter::default())
            .await?;
        let student_requests = student_requests
            .into_iter()
            .map(|request| {
                let candidates = if request.status == StudentRequestStatus::Pending {
                    tutor_requests
                        .iter()
                        .filter(|t| t.matches(&request))
                        .cloned()
                        .collect()
                } else {
                    Vec::new()
                };
                RequestMatches {
                    request,
                    candidates,
                }
            })
            .collect();
        Ok(RequestList {
            student_requests,
            tutor_requests,
        })
    }

    pub async fn student_dashboard(&self, user: &User) -> Result<StudentDashboard, DomainError> {
        Ok(StudentDashboard {
            lessons: self
                .lessons
                .list_lessons(LessonFilter {
                    student_id: Some(user.id),
                    ..LessonFilter::default()
                })
                .await?,
            requests: self
                .requests
                .list_student_requests(StudentRequestFilter {
                    student_id: Some(user.id),
                    status: None,
                })
                .await?,
        })
    }

    pub async fn tutor_dashboard(&self, user: &User) -> Result<TutorDashboard, DomainError> {
        Ok(TutorDashboard {
            tutor_name: user.full_name(),
            lessons: self
                .lessons
                .list_lessons(LessonFilter {
                    tutor_id: Some(user.id),
                    ..LessonFilter::default()
                })
                .await?,
            requests: self
                .requests
                .list_tutor_requests(TutorRequestFilter {
                    tutor_id: Some(user.id),
                    ..TutorRequestFilter::default()
                })
                .await?,
        })
    }
}
