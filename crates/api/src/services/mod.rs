//! Channel sender implementations.

pub mod senders;

pub use senders::{build_sender, ConsoleChannelSender, HttpChannelSender, SIGNATURE_HEADER};
