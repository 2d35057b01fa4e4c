//! Site feedback: anonymous submission, admin listing.

use crate::domain::forms::FeedbackForm;
use crate::domain::{DomainError, Feedback};
use crate::ports::FeedbackRepo;
use std::sync::Arc;
use tracing::info;

pub const FEEDBACK_THANKS: &str = "Thank you for your feedback";

pub struct FeedbackService {
    feedback: Arc<dyn FeedbackRepo>,
}

impl FeedbackService {
    pub fn new(feedback: Arc<dyn FeedbackRepo>) -> Self {
        Self { feedback }
    }

    pub async fn submit(&self, form: &FeedbackForm) -> Result<Feedback, DomainError> {
        let feedback = form.validate()?;
        let stored = self.feedback.insert_feedback(&feedback).await?;
        info!(feedback_id = stored.id, "feedback received");
        Ok(stored)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Feedback>, DomainError> {
        self.feedback.list_feedback().await
    }
}
