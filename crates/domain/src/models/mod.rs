//! Domain models for Notify Gate.

pub mod delivery_log;
pub mod preference;

pub use delivery_log::{
    DeliveryLogEntry, DeliveryStatus, DeliveryTransition, Metadata, SendNotificationRequest,
    TransitionError,
};
pub use preference::{
    Channel, ChannelSettings, ChannelSettingsPatch, CreatePreferenceRequest,
    DeletePreferenceResponse, Frequency, NotificationSettings, NotificationSettingsPatch,
    NotificationType, UpdatePreferenceRequest, UserPreference,
};
