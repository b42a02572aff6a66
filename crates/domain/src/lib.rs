//! Domain layer for the Notify Gate backend.
//!
//! This crate contains:
//! - Domain models (UserPreference, DeliveryLogEntry)
//! - The preference decision function and the dispatch engine
//! - Store traits with in-memory reference implementations
//! - The channel sender capability

pub mod models;
pub mod services;
pub mod store;
