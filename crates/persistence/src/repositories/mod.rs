//! PostgreSQL implementations of the domain store traits.

pub mod delivery_log;
pub mod user_preference;

pub use delivery_log::DeliveryLogRepository;
pub use user_preference::UserPreferenceRepository;
