//! Application use cases. Orchestrate domain logic via ports.

pub mod account_service;
pub mod analytics_service;
pub mod feedback_service;
pub mod invoice_service;
pub mod lesson_service;
pub mod request_service;
pub mod seed_service;

pub use account_service::AccountService;
pub use analytics_service::AnalyticsService;
pub use feedback_service::FeedbackService;
pub use invoice_service::InvoiceService;
pub use lesson_service::LessonService;
pub use request_service::RequestService;
pub use seed_service::SeedService;

use crate::ports::{
    FeedbackRepo, InvoiceRepo, LessonRepo, PasswordHasher, ProfileRepo, RequestRepo, UserRepo,
};
use std::sync::Arc;

/// Every use case, wired to one store. Shared by the HTTP and console adapters.
pub struct Services {
    pub accounts: AccountService,
    pub requests: RequestService,
    pub lessons: LessonService,
    pub invoices: InvoiceService,
    pub feedback: FeedbackService,
    pub analytics: AnalyticsService,
    pub seed: SeedService,
}

impl Services {
    pub fn new<S>(store: Arc<S>, hasher: Arc<dyn PasswordHasher>) -> Self
    where
        S: UserRepo + ProfileRepo + RequestRepo + LessonRepo + InvoiceRepo + FeedbackRepo + 'static,
    {
        let users: Arc<dyn UserRepo> = store.clone();
        let profiles: Arc<dyn ProfileRepo> = store.clone();
        let requests: Arc<dyn RequestRepo> = store.clone();
        let lessons: Arc<dyn LessonRepo> = store.clone();
        let invoices: Arc<dyn InvoiceRepo> = store.clone();
        let feedback: Arc<dyn FeedbackRepo> = store;
        Self {
            accounts: AccountService::new(users.clone(), profiles.clone(), hasher.clone()),
            requests: RequestService::new(requests.clone()),
            lessons: LessonService::new(lessons.clone(), requests.clone()),
            invoices: InvoiceService::new(invoices.clone(), profiles.clone()),
            feedback: FeedbackService::new(feedback.clone()),
            analytics: AnalyticsService::new(profiles.clone(), requests, lessons, invoices, feedback),
            seed: SeedService::new(users, hasher),
        }
    }
}
