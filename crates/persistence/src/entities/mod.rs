//! Database entity definitions (row mappings).

pub mod delivery_log;
pub mod user_preference;

pub use delivery_log::DeliveryLogEntity;
pub use user_preference::UserPreferenceEntity;
