//! Infrastructure adapters. Implement outbound ports and drive inbound ones.
//!
//! Storage, password hashing, HTTP, console. Map errors to DomainError.

pub mod http;
pub mod persistence;
pub mod security;
pub mod ui;
