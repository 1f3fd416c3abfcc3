//! Full-state snapshot the server sends when a client joins a game.

use std::fmt;

use claimfield_core::{Bounds, LifecycleState, Role};
use serde::{Deserialize, Serialize};

/// Rules a game is played under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    /// Claim grid cells by walking through them.
    Area,
    /// Claim waypoints by walking near them without crossing existing lines.
    Target,
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Area => "area",
            Self::Target => "target",
        })
    }
}

/// Complete game state at the moment a client joins.
///
/// Area games fill the rectangle, `cell_size` and `cells`; target games fill
/// `proximity_threshold` and `targets`. Fields that belong to the other mode
/// are ignored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Rules of the game.
    pub mode: GameMode,
    /// Lifecycle state, if the server reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<LifecycleState>,
    /// Every participant with the captures they made so far.
    #[serde(default)]
    pub players: Vec<PlayerRecord>,
    /// Northern edge of the playing area in degrees.
    #[serde(default, alias = "areaNorth", skip_serializing_if = "Option::is_none")]
    pub north: Option<f64>,
    /// Southern edge of the playing area in degrees.
    #[serde(default, alias = "areaSouth", skip_serializing_if = "Option::is_none")]
    pub south: Option<f64>,
    /// Eastern edge of the playing area in degrees.
    #[serde(default, alias = "areaEast", skip_serializing_if = "Option::is_none")]
    pub east: Option<f64>,
    /// Western edge of the playing area in degrees.
    #[serde(default, alias = "areaWest", skip_serializing_if = "Option::is_none")]
    pub west: Option<f64>,
    /// Desired cell edge in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_size: Option<f64>,
    /// Cells that already have an owner.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<CellRecord>,
    /// Capture radius around each target in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proximity_threshold: Option<f64>,
    /// Every target of the game.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<TargetRecord>,
}

impl Snapshot {
    /// Playing area, when all four edges are present.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        Some(Bounds::new(self.north?, self.south?, self.east?, self.west?))
    }

    /// Entry describing the participant identified by `email`.
    #[must_use]
    pub fn player(&self, email: &str) -> Option<&PlayerRecord> {
        self.players.iter().find(|player| player.email == email)
    }
}

/// Participant listed in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// Email identifying the participant.
    pub email: String,
    /// Team the participant plays for.
    pub team: Role,
    /// Captures made by the participant, oldest first.
    #[serde(default)]
    pub path: Vec<PathEntry>,
}

/// One capture on a player's path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathEntry {
    /// Bare target identifier.
    TargetId(String),
    /// Target identifier wrapped in an object.
    Target {
        /// Identifier of the captured target.
        id: String,
    },
    /// Captured grid cell.
    Cell {
        /// Column of the cell.
        x: u32,
        /// Row of the cell.
        y: u32,
    },
}

impl PathEntry {
    /// Identifier of the captured target, for target-mode entries.
    #[must_use]
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::TargetId(id) | Self::Target { id } => Some(id),
            Self::Cell { .. } => None,
        }
    }
}

/// Ownership record for a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Column of the cell.
    pub x: u32,
    /// Row of the cell.
    pub y: u32,
    /// Owner of the cell; the observer identifier means unclaimed.
    pub team: Role,
}

/// Target description in a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TargetRecord {
    /// Identifier shared by every client.
    pub id: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Owner of the target; absent or observer means unclaimed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Role>,
}
