//! Port traits. API boundaries for the hexagon.
//!
//! - Inbound: Called by the console adapter into the application
//! - Outbound: Called by application into infrastructure (store, hashing, sessions)

pub mod inbound;
pub mod outbound;
pub mod session;

pub use inbound::{ConsoleOutcome, InputPort};
pub use outbound::{
    FeedbackRepo, InvoiceFilter, InvoiceRepo, LessonFilter, LessonRepo, PairRejection,
    PasswordHasher, ProfileRepo, RequestRepo, StudentRequestFilter, TutorRequestFilter, UserRepo,
};
pub use session::{Flash, FlashLevel, SessionRecord, SessionStore};
