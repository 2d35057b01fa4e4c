//! Cross-cutting settings shared by every layer.

pub mod config;
