//! Shared utilities for the Notify Gate backend.
//!
//! This crate provides common functionality used across the other crates:
//! - Payload signing for outbound provider requests
//! - Common validation logic for request types

pub mod crypto;
pub mod validation;
