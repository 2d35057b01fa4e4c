//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters. Lookups return `Ok(None)` for missing rows; mutations of a
//! specific row return `Ok(false)` when the row does not exist.

use crate::domain::{
    DayOfWeek, DomainError, Feedback, InvoiceStatus, InvoiceView, LessonSchedule, LessonStatus,
    LessonUpdate, LessonView, NewFeedback, NewInvoice, NewLesson, NewStudentRequest,
    NewTutorRequest, NewUser, ProfileUpdate, Student, StudentRequest, StudentRequestStatus,
    StudentSummary, Tutor, TutorRequest, TutorRequestStatus, TutorSummary, User,
};

/// User accounts.
#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Insert a user with an already-hashed password, plus the student or tutor profile its
    /// role needs, atomically. Fails with a validation error on duplicate username or email.
    async fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<User, DomainError>;

    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// True if another user (not `except`) already uses this username.
    async fn username_taken(&self, username: &str, except: Option<i64>)
    -> Result<bool, DomainError>;

    /// True if another user (not `except`) already uses this email.
    async fn email_taken(&self, email: &str, except: Option<i64>) -> Result<bool, DomainError>;

    async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<bool, DomainError>;

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> Result<bool, DomainError>;

    async fn count_users(&self) -> Result<u64, DomainError>;
}

/// Student and tutor profiles attached to users.
#[async_trait::async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn student_for_user(&self, user_id: i64) -> Result<Option<Student>, DomainError>;

    async fn tutor_for_user(&self, user_id: i64) -> Result<Option<Tutor>, DomainError>;

    async fn get_student(&self, id: i64) -> Result<Option<Student>, DomainError>;

    async fn get_tutor(&self, id: i64) -> Result<Option<Tutor>, DomainError>;

    /// Ordered by last name, first name.
    async fn list_students(&self) -> Result<Vec<StudentSummary>, DomainError>;

    /// Ordered by last name, first name.
    async fn list_tutors(&self) -> Result<Vec<TutorSummary>, DomainError>;

    async fn count_students(&self) -> Result<u64, DomainError>;

    async fn count_tutors(&self) -> Result<u64, DomainError>;

    /// Sum of `hours_taught` over all tutor profiles.
    async fn total_hours_taught(&self) -> Result<i64, DomainError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StudentRequestFilter {
    pub student_id: Option<i64>,
    pub status: Option<StudentRequestStatus>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TutorRequestFilter {
    pub tutor_id: Option<i64>,
    pub status: Option<TutorRequestStatus>,
    pub day_of_week: Option<DayOfWeek>,
}

/// Student lesson requests and tutor availability. Listings are newest first.
#[async_trait::async_trait]
pub trait RequestRepo: Send + Sync {
    async fn insert_student_request(
        &self,
        student_id: i64,
        request: &NewStudentRequest,
    ) -> Result<StudentRequest, DomainError>;

    async fn get_student_request(&self, id: i64) -> Result<Option<StudentRequest>, DomainError>;

    async fn list_student_requests(
        &self,
        filter: StudentRequestFilter,
    ) -> Result<Vec<StudentRequest>, DomainError>;

    /// Move to `to` only if the row is currently `from`. Returns whether it moved.
    async fn transition_student_request(
        &self,
        id: i64,
        from: StudentRequestStatus,
        to: StudentRequestStatus,
    ) -> Result<bool, DomainError>;

    async fn insert_tutor_request(
        &self,
        tutor_id: i64,
        request: &NewTutorRequest,
    ) -> Result<TutorRequest, DomainError>;

    async fn get_tutor_request(&self, id: i64) -> Result<Option<TutorRequest>, DomainError>;

    async fn list_tutor_requests(
        &self,
        filter: TutorRequestFilter,
    ) -> Result<Vec<TutorRequest>, DomainError>;

    /// Move to `to` only if the row is currently `from`. Returns whether it moved.
    async fn transition_tutor_request(
        &self,
        id: i64,
        from: TutorRequestStatus,
        to: TutorRequestStatus,
    ) -> Result<bool, DomainError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LessonFilter {
    pub tutor_id: Option<i64>,
    pub student_id: Option<i64>,
    pub status: Option<LessonStatus>,
}

/// Why a pairing was refused by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRejection {
    StudentRequestNotPending,
    TutorRequestNotAvailable,
}

/// Scheduled lessons.
#[async_trait::async_trait]
pub trait LessonRepo: Send + Sync {
    async fn get_lesson(&self, id: i64) -> Result<Option<LessonView>, DomainError>;

    /// Ordered by day of week then start time.
    async fn list_lessons(&self, filter: LessonFilter) -> Result<Vec<LessonView>, DomainError>;

    async fn update_lesson(&self, id: i64, update: &LessonUpdate) -> Result<bool, DomainError>;

    async fn set_lesson_status(&self, id: i64, status: LessonStatus) -> Result<bool, DomainError>;

    async fn delete_lesson(&self, id: i64) -> Result<bool, DomainError>;

    /// In one transaction: student request pending → approved, tutor request available →
    /// scheduled, insert `lesson`. Nothing changes when either transition is refused.
    async fn pair_requests(
        &self,
        student_request_id: i64,
        tutor_request_id: i64,
        lesson: &NewLesson,
    ) -> Result<Result<LessonSchedule, PairRejection>, DomainError>;

    async fn count_lessons(&self, status: Option<LessonStatus>) -> Result<u64, DomainError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvoiceFilter {
    /// Student profile id.
    pub student_id: Option<i64>,
    pub status: Option<InvoiceStatus>,
}

/// Invoices. Listings are ordered by due date (undated last), then id.
#[async_trait::async_trait]
pub trait InvoiceRepo: Send + Sync {
    async fn insert_invoice(&self, invoice: &NewInvoice) -> Result<InvoiceView, DomainError>;

    async fn get_invoice(&self, id: i64) -> Result<Option<InvoiceView>, DomainError>;

    async fn list_invoices(&self, filter: InvoiceFilter) -> Result<Vec<InvoiceView>, DomainError>;

    async fn set_invoice_status(&self, id: i64, status: InvoiceStatus)
    -> Result<bool, DomainError>;

    async fn delete_invoice(&self, id: i64) -> Result<bool, DomainError>;
}

/// Site feedback.
#[async_trait::async_trait]
pub trait FeedbackRepo: Send + Sync {
    async fn insert_feedback(&self, feedback: &NewFeedback) -> Result<Feedback, DomainError>;

    /// Newest first.
    async fn list_feedback(&self) -> Result<Vec<Feedback>, DomainError>;

    async fn count_feedback(&self) -> Result<u64, DomainError>;
}

/// Password hashing. Implementations are CPU-bound; callers run them off the async threads.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// `Ok(false)` on mismatch; `Err` only when `hash` is not a readable hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, DomainError>;
}
