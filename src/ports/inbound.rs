//! Inbound port. The console (adapter) calls into the application.

use crate::domain::DomainError;

/// What the operator picked when the menu hands control back to `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOutcome {
    Serve,
    Exit,
}

/// Input port: operator console invokes application use cases.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Interactive menu. Seeding and admin creation run in place; serving and exiting return.
    async fn run(&self) -> Result<ConsoleOutcome, DomainError>;

    /// Prompt for and create an admin account.
    async fn create_admin(&self) -> Result<(), DomainError>;

    /// Fill the store with sample users up to `target`, showing progress.
    async fn seed(&self, target: u64) -> Result<(), DomainError>;
}
