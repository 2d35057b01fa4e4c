//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod forms;
pub mod values;

pub use entities::{
    Feedback, Invoice, InvoiceView, LessonSchedule, LessonUpdate, LessonView, NewFeedback,
    NewInvoice, NewLesson, NewStudentRequest, NewTutorRequest, NewUser, ProfileUpdate, Student,
    StudentRequest, StudentSummary, Tutor, TutorProfile, TutorRequest, TutorSummary, User,
};
pub use errors::{DomainError, FieldErrors, NON_FIELD};
pub use values::{
    DayOfWeek, Frequency, InvoiceStatus, LessonStatus, Level, Money, Role, StudentRequestStatus,
    TutorRequestStatus,
};
