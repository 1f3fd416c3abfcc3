#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Target-mode capture system.
//!
//! Players claim fixed targets by walking within the proximity threshold of
//! them. Each player's captures, in order, form a path; the segments joining
//! consecutive captures of every player make up a shared network in which no
//! two segments may cross. A target belongs to at most one team and appears in
//! at most one path.

use std::collections::HashMap;

use claimfield_core::{CaptureEngine, Command, Event, Position, Role, Team};
use claimfield_crossing::{crosses_any, Segment};
use thiserror::Error;
use tracing::debug;

/// Reasons a target registry cannot be built.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two targets were given the same identifier.
    #[error("target `{0}` is listed more than once")]
    DuplicateTarget(String),
}

/// Fixed waypoint players can capture.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    id: String,
    position: Position,
    owner: Option<Team>,
}

impl Target {
    /// Creates a target description.
    #[must_use]
    pub fn new(id: impl Into<String>, position: Position, owner: Option<Team>) -> Self {
        Self {
            id: id.into(),
            position,
            owner,
        }
    }

    /// Identifier shared with the server.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Location of the target.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Team currently owning the target.
    #[must_use]
    pub const fn owner(&self) -> Option<Team> {
        self.owner
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct TargetIndex(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PlayerIndex(usize);

#[derive(Clone, Debug)]
struct TargetSlot {
    target: Target,
    visited_by: Option<PlayerIndex>,
}

#[derive(Clone, Debug)]
struct PlayerPath {
    email: String,
    visited: Vec<TargetIndex>,
}

/// Target ownership and every player's capture path for one target game.
#[derive(Clone, Debug)]
pub struct TargetCapture {
    email: String,
    role: Role,
    proximity_threshold: f64,
    targets: Vec<TargetSlot>,
    target_ids: HashMap<String, TargetIndex>,
    players: Vec<PlayerPath>,
    player_ids: HashMap<String, PlayerIndex>,
}

impl TargetCapture {
    /// Builds the registry from the game's targets.
    ///
    /// `email` and `role` describe the local player. Movements within
    /// `proximity_threshold` meters of a target attempt to capture it.
    pub fn new<I>(
        targets: I,
        email: impl Into<String>,
        role: Role,
        proximity_threshold: f64,
    ) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Target>,
    {
        let mut slots = Vec::new();
        let mut target_ids = HashMap::new();
        for target in targets {
            let index = TargetIndex(slots.len());
            if target_ids.insert(target.id.clone(), index).is_some() {
                return Err(RegistryError::DuplicateTarget(target.id));
            }
            slots.push(TargetSlot {
                target,
                visited_by: None,
            });
        }

        Ok(Self {
            email: email.into(),
            role,
            proximity_threshold,
            targets: slots,
            target_ids,
            players: Vec::new(),
            player_ids: HashMap::new(),
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

    /// Capture radius in meters.
    #[must_use]
    pub const fn proximity_threshold(&self) -> f64 {
        self.proximity_threshold
    }

    /// Looks up a target by identifier.
    #[must_use]
    pub fn target(&self, id: &str) -> Option<&Target> {
        self.index_of(id).map(|index| self.slot(index).target_ref())
    }

    /// Every target in registry order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter().map(TargetSlot::target_ref)
    }

    /// Team owning the target, if any.
    #[must_use]
    pub fn owner_of(&self, id: &str) -> Option<Team> {
        self.target(id).and_then(Target::owner)
    }

    /// Appends a visit to a player's path while loading a snapshot.
    ///
    /// Returns `false` if the target is unknown or already on a path.
    pub fn extend_path(&mut self, email: &str, target_id: &str) -> bool {
        let Some(target) = self.index_of(target_id) else {
            return false;
        };
        if self.slot(target).visited_by.is_some() {
            return false;
        }
        let player = self.player_entry(email);
        self.append_visit(player, target)
    }

    /// Targets of a player's path in capture order.
    #[must_use]
    pub fn path_of(&self, email: &str) -> Vec<&str> {
        self.player_ids
            .get(email)
            .and_then(|player| self.players.get(player.0))
            .map(|path| {
                path.visited
                    .iter()
                    .map(|index| self.slot(*index).target.id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Emails of every player with a path, in the order they were first seen.
    pub fn players(&self) -> impl Iterator<Item = &str> {
        self.players.iter().map(|path| path.email.as_str())
    }

    /// Segments joining consecutive captures across every player's path.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.players.iter().flat_map(move |path| {
            path.visited.windows(2).map(move |pair| {
                Segment::new(
                    self.slot(pair[0]).target.position,
                    self.slot(pair[1]).target.position,
                )
            })
        })
    }

    /// Targets within the capture radius of `position`, in registry order.
    pub fn targets_within(&self, position: Position) -> impl Iterator<Item = &Target> + '_ {
        self.nearby(position).map(move |index| self.slot(index).target_ref())
    }

    /// Attempts to claim the target for the local player.
    ///
    /// Returns the capture intent to send to the server, or `None` when the
    /// capture is not allowed, in which case nothing changes.
    pub fn attempt_own_capture(&mut self, target_id: &str) -> Option<Command> {
        let Some(index) = self.index_of(target_id) else {
            debug!(target_id, "capture of unknown target ignored");
            return None;
        };
        self.capture(index)
    }

    /// Applies a capture another client already validated.
    ///
    /// Returns whether any state changed. The server's word is final: the
    /// target takes `team` as its owner and moves onto the reporting player's
    /// path, leaving any path it was on. Replaying an event is a no-op.
    pub fn apply_peer_capture(&mut self, email: &str, target_id: &str, team: Team) -> bool {
        let Some(index) = self.index_of(target_id) else {
            debug!(email, target_id, "peer capture of unknown target ignored");
            return false;
        };

        let player = self.player_entry(email);
        let slot = self.slot(index);
        let (visited_by, owner) = (slot.visited_by, slot.target.owner);
        if visited_by == Some(player) {
            if owner == Some(team) {
                debug!(email, target_id, "peer capture already applied");
                return false;
            }
            self.slot_mut(index).target.owner = Some(team);
            return true;
        }

        if visited_by.is_some() {
            debug!(email, target_id, "target reassigned by the server");
            self.detach(index);
        }
        self.slot_mut(index).target.owner = Some(team);
        self.append_visit(player, index)
    }

    /// Number of targets owned by `team`.
    #[must_use]
    pub fn score_of(&self, team: Team) -> usize {
        self.targets
            .iter()
            .filter(|slot| slot.target.owner == Some(team))
            .count()
    }

    /// Number of targets nobody owns.
    #[must_use]
    pub fn unclaimed_count(&self) -> usize {
        self.targets
            .iter()
            .filter(|slot| slot.target.owner.is_none())
            .count()
    }

    /// Total number of targets.
    #[must_use]
    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    fn capture(&mut self, index: TargetIndex) -> Option<Command> {
        let team = self.role.team()?;
        let target = &self.slot(index).target;
        if let Some(owner) = target.owner {
            debug!(target_id = %target.id, %owner, "target already claimed");
            return None;
        }

        let last = self
            .player_ids
            .get(&self.email)
            .and_then(|player| self.players.get(player.0))
            .and_then(|path| path.visited.last().copied());
        if let Some(last) = last {
            let candidate = Segment::new(self.slot(last).target.position, target.position);
            if crosses_any(&candidate, self.segments()) {
                debug!(target_id = %target.id, "path would cross an existing line");
                return None;
            }
        }

        let target_id = target.id.clone();
        let email = self.email.clone();
        let player = self.player_entry(&email);
        self.slot_mut(index).target.owner = Some(team);
        let _ = self.append_visit(player, index);
        Some(Command::TargetVisit { target_id })
    }

    fn append_visit(&mut self, player: PlayerIndex, target: TargetIndex) -> bool {
        let slot = self.slot_mut(target);
        if slot.visited_by.is_some() {
            return false;
        }
        slot.visited_by = Some(player);
        if let Some(path) = self.players.get_mut(player.0) {
            path.visited.push(target);
        }
        true
    }

    fn detach(&mut self, target: TargetIndex) {
        let Some(player) = self.slot_mut(target).visited_by.take() else {
            return;
        };
        if let Some(path) = self.players.get_mut(player.0) {
            path.visited.retain(|visited| *visited != target);
        }
    }

    fn nearby(&self, position: Position) -> impl Iterator<Item = TargetIndex> + '_ {
        self.targets
            .iter()
            .enumerate()
            .filter(move |(_, slot)| {
                position.distance_to(slot.target.position) <= self.proximity_threshold
            })
            .map(|(index, _)| TargetIndex(index))
    }

    fn player_entry(&mut self, email: &str) -> PlayerIndex {
        if let Some(index) = self.player_ids.get(email) {
            return *index;
        }
        let index = PlayerIndex(self.players.len());
        self.players.push(PlayerPath {
            email: email.to_owned(),
            visited: Vec::new(),
        });
        let _ = self.player_ids.insert(email.to_owned(), index);
        index
    }

    fn index_of(&self, id: &str) -> Option<TargetIndex> {
        self.target_ids.get(id).copied()
    }

    // Indices are only minted by `new`, so they always name a slot.
    fn slot(&self, index: TargetIndex) -> &TargetSlot {
        &self.targets[index.0]
    }

    fn slot_mut(&mut self, index: TargetIndex) -> &mut TargetSlot {
        &mut self.targets[index.0]
    }
}

impl TargetSlot {
    fn target_ref(&self) -> &Target {
        &self.target
    }
}

impl CaptureEngine for TargetCapture {
    fn handle_own_movement(&mut self, position: Position, out: &mut Vec<Command>) {
        let nearby: Vec<TargetIndex> = self.nearby(position).collect();
        for index in nearby {
            out.extend(self.capture(index));
        }
    }

    fn handle_peer_event(&mut self, event: &Event) -> bool {
        let Event::PlayerTargetVisit {
            email,
            team,
            target_id,
        } = event
        else {
            return false;
        };
        match team.team() {
            Some(team) => {
                let _ = self.apply_peer_capture(email, target_id, team);
            }
            None => debug!(email = %email, target_id = %target_id, "observer capture ignored"),
        }
        true
    }

    fn score_of(&self, team: Team) -> usize {
        TargetCapture::score_of(self, team)
    }

    fn unclaimed_count(&self) -> usize {
        TargetCapture::unclaimed_count(self)
    }

    fn capturable_count(&self) -> usize {
        self.target_count()
    }
}
