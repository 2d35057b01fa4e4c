//! Domain entities. Pure data structures for the core business.
//!
//! No SQL/HTTP types here; adapters map rows and requests into these.

use crate::domain::values::{
    DayOfWeek, Frequency, InvoiceStatus, LessonStatus, Level, Money, Role, StudentRequestStatus,
    TutorRequestStatus,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

const GRAVATAR_SIZE: u32 = 120;
const MINI_GRAVATAR_SIZE: u32 = 60;

/// Account used for authentication. Owns at most one Student or Tutor profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Gravatar URL keyed by the SHA-256 of the normalized email, falling back to the "mystery person" image.
    pub fn gravatar(&self, size: u32) -> String {
        let digest = Sha256::digest(self.email.trim().to_lowercase().as_bytes());
        format!(
            "https://www.gravatar.com/avatar/{}?size={}&default=mp",
            hex::encode(digest),
            size
        )
    }

    pub fn default_gravatar(&self) -> String {
        self.gravatar(GRAVATAR_SIZE)
    }

    pub fn mini_gravatar(&self) -> String {
        self.gravatar(MINI_GRAVATAR_SIZE)
    }

    /// Path of the dashboard this user lands on after logging in.
    pub fn dashboard_path(&self) -> &'static str {
        match self.role {
            Role::Student => "/student/dashboard/",
            Role::Tutor => "/tutor/dashboard/",
            Role::Admin => "/admin/dashboard/",
        }
    }
}

/// Fields for a user that does not exist yet. Password is hashed by the account service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

/// Editable profile fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Student {
    pub id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tutor {
    pub id: i64,
    pub user_id: i64,
    pub subject: String,
    pub hourly_rate: Money,
    pub availability: String,
    pub hours_taught: i64,
}

/// Tutor profile fields; `Default` carries the values new tutors start with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorProfile {
    pub subject: String,
    pub hourly_rate: Money,
    pub availability: String,
    pub hours_taught: i64,
}

impl Default for TutorProfile {
    fn default() -> Self {
        Self {
            subject: "Default Subject".to_string(),
            hourly_rate: Money::from_cents(3_000),
            availability: "Flexible".to_string(),
            hours_taught: 0,
        }
    }
}

/// A profile row joined with its owning user, for listings and pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub student: Student,
    pub username: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorSummary {
    pub tutor: Tutor,
    pub username: String,
    pub full_name: String,
}

/// What a student asks for: a language at some level, on a weekday and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentRequest {
    pub id: i64,
    pub student_id: i64,
    pub language: String,
    pub frequency: Frequency,
    pub day_of_week: DayOfWeek,
    pub preferred_time: NaiveTime,
    pub difficulty: Level,
    pub additional_details: String,
    pub status: StudentRequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudentRequest {
    pub language: String,
    pub frequency: Frequency,
    pub day_of_week: DayOfWeek,
    pub preferred_time: NaiveTime,
    pub difficulty: Level,
    pub additional_details: String,
}

/// Availability a tutor declares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorRequest {
    pub id: i64,
    pub tutor_id: i64,
    pub languages: String,
    pub day_of_week: DayOfWeek,
    pub available_time: NaiveTime,
    pub level_can_teach: Level,
    pub additional_details: String,
    pub status: TutorRequestStatus,
    pub created_at: DateTime<Utc>,
}

impl TutorRequest {
    /// True if `language` appears in the comma-separated `languages` list (case-insensitive).
    pub fn teaches(&self, language: &str) -> bool {
        let wanted = language.trim();
        !wanted.is_empty()
            && self
                .languages
                .split(',')
                .any(|l| l.trim().eq_ignore_ascii_case(wanted))
    }

    /// A tutor slot that could serve `request`. Same day, language and level; no ranking.
    pub fn matches(&self, request: &StudentRequest) -> bool {
        self.status == TutorRequestStatus::Available
            && self.day_of_week == request.day_of_week
            && self.level_can_teach == request.difficulty
            && self.teaches(&request.language)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTutorRequest {
    pub languages: String,
    pub day_of_week: DayOfWeek,
    pub available_time: NaiveTime,
    pub level_can_teach: Level,
    pub additional_details: String,
}

/// A recurring lesson between one tutor and one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonSchedule {
    pub id: i64,
    pub tutor_id: i64,
    pub student_id: i64,
    pub subject: String,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    /// Minutes.
    pub duration: u32,
    pub frequency: Frequency,
    pub location: String,
    pub status: LessonStatus,
    pub student_request_id: Option<i64>,
    pub tutor_request_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl LessonSchedule {
    /// Wraps past midnight.
    pub fn end_time(&self) -> NaiveTime {
        self.start_time + Duration::minutes(i64::from(self.duration))
    }

    pub fn involves(&self, user_id: i64) -> bool {
        self.tutor_id == user_id || self.student_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLesson {
    pub tutor_id: i64,
    pub student_id: i64,
    pub subject: String,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub duration: u32,
    pub frequency: Frequency,
    pub location: String,
    pub student_request_id: Option<i64>,
    pub tutor_request_id: Option<i64>,
}

/// Admin edit of a lesson. Tutor and student stay fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonUpdate {
    pub subject: String,
    pub day_of_week: DayOfWeek,
    pub start_time: NaiveTime,
    pub duration: u32,
    pub frequency: Frequency,
    pub status: LessonStatus,
    pub location: String,
}

/// Lesson with participant names resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonView {
    #[serde(flatten)]
    pub lesson: LessonSchedule,
    pub end_time: NaiveTime,
    pub tutor_name: String,
    pub student_name: String,
}

/// Invoice against a student profile for a tutor profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    pub id: i64,
    pub student_id: i64,
    pub tutor_id: i64,
    pub amount: Money,
    pub status: InvoiceStatus,
    pub created_at: NaiveDate,
    pub due_date: Option<NaiveDate>,
}

impl Invoice {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == InvoiceStatus::Unpaid && self.due_date.is_some_and(|due| due < today)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvoice {
    pub student_id: i64,
    pub tutor_id: i64,
    pub amount: Money,
    pub due_date: Option<NaiveDate>,
}

/// Invoice with the parties' usernames resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceView {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub student_user_id: i64,
    pub student_username: String,
    pub tutor_user_id: i64,
    pub tutor_username: String,
    pub overdue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Feedback {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFeedback {
    pub name: String,
    pub email: String,
    pub message: String,
}
