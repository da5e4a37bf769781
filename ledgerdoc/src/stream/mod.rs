//! Stream consumption and publishing.
//!
//! The stream client itself is external; [StreamClient] and [StreamPublisher]
//! describe the capabilities used here. [ConsumerGuard] makes sure that
//! repeated start requests from a host never start a second consumer for the
//! same stream and consumer group, and [StreamTrigger] wires a guarded client
//! to record decoding and response shaping.

mod client;
mod config;
mod guard;
mod publish;
mod record;
mod trigger;

pub use client::*;
pub use config::*;
pub use guard::*;
pub use publish::*;
pub use record::*;
pub use trigger::*;
