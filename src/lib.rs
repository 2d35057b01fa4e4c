//! tutor-match: tutor/student matching with lesson scheduling, invoicing and feedback.
//!
//! Hexagonal layout: `domain` entities and rules, `ports` traits, `usecases` services,
//! `adapters` for libsql storage, argon2 hashing, the axum web surface and the operator console.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
