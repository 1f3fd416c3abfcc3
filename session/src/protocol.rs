//! JSON codec for messages exchanged with the game server.

use claimfield_core::{Command, Event};
use thiserror::Error;

use crate::snapshot::Snapshot;

/// Failures raised while translating wire messages.
#[derive(Debug, Error)]
pub enum WireError {
    /// The inbound message is not a well-formed event.
    #[error("malformed event message")]
    Event(#[source] serde_json::Error),
    /// The full-state message is not a well-formed snapshot.
    #[error("malformed snapshot message")]
    Snapshot(#[source] serde_json::Error),
    /// The outbound command could not be serialized.
    #[error("failed to encode command")]
    Command(#[source] serde_json::Error),
}

/// Decodes an inbound message.
///
/// Messages with an unrecognised `type` decode to [`Event::Unknown`].
pub fn decode_event(text: &str) -> Result<Event, WireError> {
    serde_json::from_str(text).map_err(WireError::Event)
}

/// Encodes an outbound command as a single JSON object.
pub fn encode_command(command: &Command) -> Result<String, WireError> {
    serde_json::to_string(command).map_err(WireError::Command)
}

/// Decodes a full-state snapshot.
pub fn decode_snapshot(text: &str) -> Result<Snapshot, WireError> {
    serde_json::from_str(text).map_err(WireError::Snapshot)
}
