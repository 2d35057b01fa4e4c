//! Route handlers, grouped by audience.

pub mod accounts;
pub mod admin;
pub mod feedback;
pub mod invoices;
pub mod lessons;
pub mod requests;
