//! Outbound OSC messages for the sound engine.
//!
//! - `message`: OSC 1.0 message model and encoding
//! - `mapping`: FeatureVector -> messages, including send-side shaping
//! - `sender`: tokio UDP sender used by the CLI

mod mapping;
mod message;
mod sender;

pub use mapping::{feature_messages, gate_fraction, morph_trigger};
pub use message::{validate_address, OscArg, OscMessage};
pub use sender::OscSender;
