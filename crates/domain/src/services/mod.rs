//! Domain services for Notify Gate.
//!
//! Services contain business logic that operates on domain models.

pub mod channel_sender;
pub mod decision;
pub mod dispatch;

pub use channel_sender::{
    ChannelSender, MockBehavior, MockChannelSender, OutboundMessage, SendOutcome, SenderError,
};
pub use decision::{decide, Decision, DenyReason};
pub use dispatch::{
    min_stale_pending_age, DeniedResult, DispatchEngine, DispatchError, DispatchOutcome,
    DEFAULT_SEND_TIMEOUT, TERMINAL_WRITE_BUDGET,
};
