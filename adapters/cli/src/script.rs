use std::{fs, path::Path};

use anyhow::{Context, Result};
use claimfield_core::{Command, Event, Position};
use claimfield_session::GameSession;
use serde::Deserialize;
use tracing::debug;

/// Single entry of a replay script.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum ScriptStep {
    /// Vetted location sample of the local player.
    Location {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
    /// Message received from the server.
    Message(Event),
}

/// Reads a script with one JSON step per line; blank lines and lines
/// starting with `#` are skipped.
pub(crate) fn load(path: &Path) -> Result<Vec<ScriptStep>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    parse(&contents).with_context(|| format!("failed to parse script {}", path.display()))
}

fn parse(contents: &str) -> Result<Vec<ScriptStep>> {
    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(number, line)| {
            serde_json::from_str(line).with_context(|| format!("invalid step on line {}", number + 1))
        })
        .collect()
}

/// Feeds every step through the session and returns the outbound commands.
pub(crate) fn replay(session: &mut GameSession, steps: &[ScriptStep]) -> Vec<Command> {
    let mut out = Vec::new();
    for step in steps {
        match step {
            ScriptStep::Location {
                latitude,
                longitude,
            } => session.handle_location(Position::new(*latitude, *longitude), &mut out),
            ScriptStep::Message(event) => {
                if !session.handle_event(event) {
                    debug!(?event, "script message not handled");
                }
            }
        }
    }
    out
}
