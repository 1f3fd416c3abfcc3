#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Claimfield engine.
//!
//! This crate defines the message surface that connects the transport
//! adapter, the game session and the pure capture systems. Capture systems
//! validate the local player's movements and answer with [`Command`] values
//! describing capture intents for the server. The server relays every
//! validated capture back to all clients as [`Event`] values, which the
//! session replays into its engine so that every client converges on the same
//! ownership state.

use std::fmt;

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands the local client sends to the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    /// Announces that the local player captured a grid cell in area mode.
    CellCapture {
        /// Column of the captured cell, increasing toward the east.
        x: u32,
        /// Row of the captured cell, increasing toward the north.
        y: u32,
    },
    /// Announces that the local player captured a target in target mode.
    TargetVisit {
        /// External identifier of the captured target.
        #[serde(rename = "targetId")]
        target_id: String,
    },
    /// Reports the local player's latest vetted position.
    LocationUpdate {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
}

/// Events received from the server describing changes made elsewhere.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// A player captured a grid cell in area mode.
    PlayerCellCapture {
        /// Email identifying the capturing player.
        email: String,
        /// Role of the capturing player.
        team: Role,
        /// Column of the captured cell.
        x: u32,
        /// Row of the captured cell.
        y: u32,
    },
    /// A player captured a target in target mode.
    PlayerTargetVisit {
        /// Email identifying the capturing player.
        email: String,
        /// Role of the capturing player.
        team: Role,
        /// External identifier of the captured target.
        #[serde(rename = "targetId")]
        target_id: String,
    },
    /// The game moved to a new lifecycle state.
    GameState {
        /// Lifecycle state that became active.
        state: LifecycleState,
    },
    /// Any message type this client does not understand.
    #[serde(other)]
    Unknown,
}

/// Lifecycle of a game as broadcast by the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// The game has been created but never started.
    Setup,
    /// The game was started and is currently on hold.
    Paused,
    /// Movements are being scored.
    #[default]
    Running,
    /// The game is over and no further captures are accepted.
    Ended,
}

/// Competing teams that can own territory.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub enum Team {
    /// Wire identifier 1.
    Red,
    /// Wire identifier 2.
    Yellow,
    /// Wire identifier 3.
    Green,
    /// Wire identifier 4.
    Blue,
}

impl Team {
    /// Every competing team in wire-identifier order.
    pub const ALL: [Team; 4] = [Team::Red, Team::Yellow, Team::Green, Team::Blue];

    /// Numeric identifier used on the wire.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Red => 1,
            Self::Yellow => 2,
            Self::Green => 3,
            Self::Blue => 4,
        }
    }
}

impl TryFrom<u8> for Team {
    type Error = UnknownTeamId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Red),
            2 => Ok(Self::Yellow),
            3 => Ok(Self::Green),
            4 => Ok(Self::Blue),
            other => Err(UnknownTeamId(other)),
        }
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> Self {
        team.id()
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
        };
        f.write_str(name)
    }
}

/// Part a participant plays in a game.
///
/// On ownership records the observer identifier doubles as "unclaimed".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Role {
    /// Watches the game without owning territory. Wire identifier 0.
    Observer,
    /// Competes for territory as a member of the team.
    Player(Team),
}

impl Role {
    /// Team the participant competes for, if any.
    #[must_use]
    pub const fn team(self) -> Option<Team> {
        match self {
            Self::Observer => None,
            Self::Player(team) => Some(team),
        }
    }

    /// Numeric identifier used on the wire.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Observer => 0,
            Self::Player(team) => team.id(),
        }
    }
}

impl From<Option<Team>> for Role {
    fn from(team: Option<Team>) -> Self {
        team.map_or(Self::Observer, Self::Player)
    }
}

impl TryFrom<u8> for Role {
    type Error = UnknownTeamId;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value == 0 {
            Ok(Self::Observer)
        } else {
            Team::try_from(value).map(Self::Player)
        }
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        role.id()
    }
}

/// Raised when a wire team identifier does not name a known role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unknown team identifier {0}")]
pub struct UnknownTeamId(pub u8);

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: u32,
    y: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index, increasing toward the east.
    #[must_use]
    pub const fn x(&self) -> u32 {
        self.x
    }

    /// Zero-based row index, increasing toward the north.
    #[must_use]
    pub const fn y(&self) -> u32 {
        self.y
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Geographic position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees, positive north of the equator.
    pub latitude: f64,
    /// Longitude in degrees, positive east of Greenwich.
    pub longitude: f64,
}

impl Position {
    /// Creates a position from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in meters.
    #[must_use]
    pub fn distance_to(self, other: Position) -> f64 {
        let from = Point::new(self.longitude, self.latitude);
        let to = Point::new(other.longitude, other.latitude);
        from.haversine_distance(&to)
    }
}

/// Axis-aligned geographic rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Northern edge latitude.
    pub north: f64,
    /// Southern edge latitude.
    pub south: f64,
    /// Eastern edge longitude.
    pub east: f64,
    /// Western edge longitude.
    pub west: f64,
}

impl Bounds {
    /// Creates a rectangle from its four edges.
    #[must_use]
    pub const fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Southwest corner.
    #[must_use]
    pub const fn south_west(&self) -> Position {
        Position::new(self.south, self.west)
    }

    /// Northeast corner.
    #[must_use]
    pub const fn north_east(&self) -> Position {
        Position::new(self.north, self.east)
    }
}

/// Capability shared by the area and target capture systems.
///
/// A session picks one implementation when it is created and routes every
/// local movement and every server event through it.
pub trait CaptureEngine {
    /// Attempts captures triggered by the local player standing at `position`.
    ///
    /// Successful captures append their capture intent to `out`.
    fn handle_own_movement(&mut self, position: Position, out: &mut Vec<Command>);

    /// Applies an event received from the server.
    ///
    /// Returns `false` when the event type does not belong to this mode.
    fn handle_peer_event(&mut self, event: &Event) -> bool;

    /// Number of cells or targets currently owned by `team`.
    fn score_of(&self, team: Team) -> usize;

    /// Number of cells or targets that nobody owns.
    fn unclaimed_count(&self) -> usize;

    /// Total number of cells or targets in the game.
    fn capturable_count(&self) -> usize;
}
