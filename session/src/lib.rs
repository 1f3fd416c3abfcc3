#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game session binding one capture engine to the local player.
//!
//! A session is built once from the server's full-state snapshot. It owns the
//! engine that matches the game's mode, tracks the broadcast lifecycle state
//! and turns the local player's positions into outbound commands while
//! replaying every server event into the engine.

pub mod protocol;
pub mod snapshot;

use claimfield_core::{
    Bounds, CaptureEngine, CellCoord, Command, Event, LifecycleState, Position, Role, Team,
};
use claimfield_partition::{GridError, GridSpec};
use claimfield_system_area_capture::AreaCapture;
use claimfield_system_target_capture::{RegistryError, Target, TargetCapture};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use snapshot::{CellRecord, GameMode, PathEntry, PlayerRecord, Snapshot, TargetRecord};

/// Reasons a snapshot cannot be turned into a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A field required by the game's mode is absent.
    #[error("{mode} snapshot is missing `{field}`")]
    MissingField {
        /// Mode of the snapshot.
        mode: GameMode,
        /// Wire name of the absent field.
        field: &'static str,
    },
    /// The playing area cannot be partitioned.
    #[error("invalid playing area")]
    Grid(#[from] GridError),
    /// The target list is inconsistent.
    #[error("invalid target list")]
    Registry(#[from] RegistryError),
    /// The capture radius is not a positive, finite number of meters.
    #[error("proximity threshold {0} must be a positive number of meters")]
    InvalidProximity(f64),
    /// A cell record or path entry lies outside the grid.
    #[error("cell ({x}, {y}) lies outside the grid")]
    CellOutOfRange {
        /// Column of the offending cell.
        x: u32,
        /// Row of the offending cell.
        y: u32,
    },
    /// A player's path names a target that does not exist.
    #[error("path of {email} visits unknown target `{target_id}`")]
    UnknownPathTarget {
        /// Player whose path is inconsistent.
        email: String,
        /// Identifier that matched no target.
        target_id: String,
    },
    /// A path entry has the shape used by the other mode.
    #[error("path of {email} contains an entry that does not belong to a {mode} game")]
    MismatchedPathEntry {
        /// Player whose path is inconsistent.
        email: String,
        /// Mode of the snapshot.
        mode: GameMode,
    },
}

/// Capture engine chosen for a session.
#[derive(Clone, Debug)]
pub enum Engine {
    /// Grid cells are claimed by walking through them.
    Area(AreaCapture),
    /// Targets are claimed by walking near them.
    Target(TargetCapture),
}

impl Engine {
    /// Mode the engine implements.
    #[must_use]
    pub const fn mode(&self) -> GameMode {
        match self {
            Self::Area(_) => GameMode::Area,
            Self::Target(_) => GameMode::Target,
        }
    }

    fn as_dyn(&self) -> &dyn CaptureEngine {
        match self {
            Self::Area(engine) => engine,
            Self::Target(engine) => engine,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn CaptureEngine {
        match self {
            Self::Area(engine) => engine,
            Self::Target(engine) => engine,
        }
    }
}

impl CaptureEngine for Engine {
    fn handle_own_movement(&mut self, position: Position, out: &mut Vec<Command>) {
        self.as_dyn_mut().handle_own_movement(position, out);
    }

    fn handle_peer_event(&mut self, event: &Event) -> bool {
        self.as_dyn_mut().handle_peer_event(event)
    }

    fn score_of(&self, team: Team) -> usize {
        self.as_dyn().score_of(team)
    }

    fn unclaimed_count(&self) -> usize {
        self.as_dyn().unclaimed_count()
    }

    fn capturable_count(&self) -> usize {
        self.as_dyn().capturable_count()
    }
}

/// Running game as seen by the local player.
#[derive(Clone, Debug)]
pub struct GameSession {
    email: String,
    role: Role,
    lifecycle: LifecycleState,
    engine: Engine,
}

impl GameSession {
    /// Builds a session for the player identified by `email`.
    ///
    /// Players missing from the snapshot join as observers. The lifecycle
    /// defaults to running when the snapshot does not report one.
    pub fn from_snapshot(email: &str, snapshot: &Snapshot) -> Result<Self, SessionError> {
        let role = snapshot.player(email).map_or(Role::Observer, |player| player.team);
        let engine = match snapshot.mode {
            GameMode::Area => Engine::Area(build_area(email, role, snapshot)?),
            GameMode::Target => Engine::Target(build_target(email, role, snapshot)?),
        };
        let lifecycle = snapshot.state.unwrap_or_default();
        info!(
            email,
            mode = %snapshot.mode,
            role = role.id(),
            ?lifecycle,
            "session created"
        );

        Ok(Self {
            email: email.to_owned(),
            role,
            lifecycle,
            engine,
        })
    }

    /// Email of the local player.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Role of the local player.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Mode of the game.
    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.engine.mode()
    }

    /// Lifecycle state last broadcast by the server.
    #[must_use]
    pub const fn lifecycle(&self) -> LifecycleState {
        self.lifecycle
    }

    /// Engine holding the ownership state.
    #[must_use]
    pub const fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Processes a vetted location sample of the local player.
    ///
    /// Nothing happens for observers or while the game is not running.
    /// Otherwise the location update is emitted first, followed by every
    /// capture the position triggers.
    pub fn handle_location(&mut self, position: Position, out: &mut Vec<Command>) {
        if self.role == Role::Observer {
            return;
        }
        if self.lifecycle != LifecycleState::Running {
            debug!(lifecycle = ?self.lifecycle, "location ignored while not running");
            return;
        }

        out.push(Command::LocationUpdate {
            latitude: position.latitude,
            longitude: position.longitude,
        });
        self.engine.handle_own_movement(position, out);
    }

    /// Applies an event received from the server.
    ///
    /// Returns whether the event was meant for this session.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        match event {
            Event::GameState { state } => {
                if *state != self.lifecycle {
                    info!(from = ?self.lifecycle, to = ?state, "lifecycle changed");
                    self.lifecycle = *state;
                }
                true
            }
            Event::Unknown => {
                debug!("unknown event ignored");
                false
            }
            _ => {
                let handled = self.engine.handle_peer_event(event);
                if !handled {
                    debug!(mode = %self.mode(), "event for another mode ignored");
                }
                handled
            }
        }
    }

    /// Number of cells or targets owned by `team`.
    #[must_use]
    pub fn score_of(&self, team: Team) -> usize {
        self.engine.score_of(team)
    }

    /// Number of cells or targets nobody owns.
    #[must_use]
    pub fn unclaimed_count(&self) -> usize {
        self.engine.unclaimed_count()
    }

    /// Every competing team with its score, in wire-identifier order.
    #[must_use]
    pub fn scoreboard(&self) -> Vec<(Team, usize)> {
        Team::ALL
            .iter()
            .map(|team| (*team, self.score_of(*team)))
            .collect()
    }

    /// Teams sharing the highest positive score.
    #[must_use]
    pub fn leaders(&self) -> Vec<Team> {
        let scoreboard = self.scoreboard();
        let best = scoreboard.iter().map(|(_, score)| *score).max().unwrap_or(0);
        if best == 0 {
            return Vec::new();
        }
        scoreboard
            .into_iter()
            .filter(|(_, score)| *score == best)
            .map(|(team, _)| team)
            .collect()
    }

    /// Sole leader once the game has ended.
    #[must_use]
    pub fn winner(&self) -> Option<Team> {
        if self.lifecycle != LifecycleState::Ended {
            return None;
        }
        match self.leaders().as_slice() {
            [team] => Some(*team),
            _ => None,
        }
    }
}

fn build_area(email: &str, role: Role, snapshot: &Snapshot) -> Result<AreaCapture, SessionError> {
    let missing = |field| SessionError::MissingField {
        mode: GameMode::Area,
        field,
    };
    let edge = |value: Option<f64>, field| value.ok_or_else(|| missing(field));
    let bounds = Bounds::new(
        edge(snapshot.north, "areaNorth")?,
        edge(snapshot.south, "areaSouth")?,
        edge(snapshot.east, "areaEast")?,
        edge(snapshot.west, "areaWest")?,
    );
    let cell_size = snapshot.cell_size.ok_or_else(|| missing("cellSize"))?;
    let grid = GridSpec::new(bounds, cell_size)?;
    let mut engine = AreaCapture::new(grid, email, role);

    for record in &snapshot.cells {
        let cell = CellCoord::new(record.x, record.y);
        if !engine.grid().contains(cell) {
            return Err(SessionError::CellOutOfRange {
                x: record.x,
                y: record.y,
            });
        }
        if let Some(team) = record.team.team() {
            let _ = engine.claim(cell, team);
        }
    }

    for player in &snapshot.players {
        let mut last = None;
        for entry in &player.path {
            let PathEntry::Cell { x, y } = entry else {
                return Err(SessionError::MismatchedPathEntry {
                    email: player.email.clone(),
                    mode: GameMode::Area,
                });
            };
            let cell = CellCoord::new(*x, *y);
            if !engine.grid().contains(cell) {
                return Err(SessionError::CellOutOfRange { x: *x, y: *y });
            }
            last = Some(cell);
        }
        if let Some(cell) = last {
            engine.set_cursor(player.email.as_str(), cell);
        }
    }

    Ok(engine)
}

fn build_target(
    email: &str,
    role: Role,
    snapshot: &Snapshot,
) -> Result<TargetCapture, SessionError> {
    let proximity = snapshot
        .proximity_threshold
        .ok_or(SessionError::MissingField {
            mode: GameMode::Target,
            field: "proximityThreshold",
        })?;
    if !proximity.is_finite() || proximity <= 0.0 {
        return Err(SessionError::InvalidProximity(proximity));
    }

    let targets = snapshot.targets.iter().map(|record| {
        Target::new(
            record.id.as_str(),
            Position::new(record.latitude, record.longitude),
            record.team.and_then(Role::team),
        )
    });
    let mut engine = TargetCapture::new(targets, email, role, proximity)?;

    for player in &snapshot.players {
        if player.team == Role::Observer && !player.path.is_empty() {
            warn!(email = %player.email, "observer listed with a path");
        }
        for entry in &player.path {
            let Some(target_id) = entry.target_id() else {
                return Err(SessionError::MismatchedPathEntry {
                    email: player.email.clone(),
                    mode: GameMode::Target,
                });
            };
            if engine.target(target_id).is_none() {
                return Err(SessionError::UnknownPathTarget {
                    email: player.email.clone(),
                    target_id: target_id.to_owned(),
                });
            }
            if !engine.extend_path(&player.email, target_id) {
                warn!(email = %player.email, target_id, "target already on another path");
            }
        }
    }

    Ok(engine)
}
