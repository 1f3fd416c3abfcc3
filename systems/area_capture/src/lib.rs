#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Area-mode capture system.
//!
//! Players claim grid cells by walking through them. After a player's first
//! capture, every further capture must be orthogonally adjacent to the
//! previous one, and cells that already belong to any team stay with that
//! team. Captures made by other players arrive from the server already
//! validated and are applied without re-checking adjacency.

use std::collections::HashMap;

use claimfield_core::{CaptureEngine, CellCoord, Command, Event, Position, Role, Team};
use claimfield_partition::GridSpec;
use tracing::debug;

/// Cell ownership and per-player capture cursors for one area game.
#[derive(Clone, Debug)]
pub struct AreaCapture {
    grid: GridSpec,
    email: String,
    role: Role,
    owners: OwnershipGrid,
    cursors: HashMap<String, CellCoord>,
}

impl AreaCapture {
    /// Creates an engine with every cell unclaimed and no cursors.
    ///
    /// `email` and `role` describe the local player whose movements are
    /// validated by [`AreaCapture::attempt_own_capture`].
    #[must_use]
    pub fn new(grid: GridSpec, email: impl Into<String>, role: Role) -> Self {
        let owners = OwnershipGrid::new(grid.cell_count());
        Self {
            grid,
            email: email.into(),
            role,
            owners,
            cursors: HashMap::new(),
        }
    }

    /// Partition the game is played on.
    #[must_use]
    pub const fn grid(&self) -> &GridSpec {
        &self.grid
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

    /// Records existing ownership while loading a snapshot.
    ///
    /// Returns `false` when the cell lies outside the grid.
    pub fn claim(&mut self, cell: CellCoord, team: Team) -> bool {
        match self.grid.index_of(cell) {
            Some(index) => {
                self.owners.set(index, team);
                true
            }
            None => false,
        }
    }

    /// Records a player's most recent capture while loading a snapshot.
    pub fn set_cursor(&mut self, email: impl Into<String>, cell: CellCoord) {
        let _ = self.cursors.insert(email.into(), cell);
    }

    /// Attempts to claim `cell` for the local player.
    ///
    /// Returns the capture intent to send to the server, or `None` when the
    /// move is not a valid capture, in which case nothing changes.
    pub fn attempt_own_capture(&mut self, cell: CellCoord) -> Option<Command> {
        let team = self.role.team()?;
        let Some(index) = self.grid.index_of(cell) else {
            debug!(?cell, "capture outside the grid ignored");
            return None;
        };
        if let Some(owner) = self.owners.get(index) {
            debug!(?cell, %owner, "cell already claimed");
            return None;
        }
        if let Some(previous) = self.cursors.get(&self.email) {
            if previous.manhattan_distance(cell) != 1 {
                debug!(?cell, ?previous, "cell not adjacent to previous capture");
                return None;
            }
        }

        self.owners.set(index, team);
        let _ = self.cursors.insert(self.email.clone(), cell);
        Some(Command::CellCapture {
            x: cell.x(),
            y: cell.y(),
        })
    }

    /// Applies a capture another client already validated.
    ///
    /// Returns whether any state changed; replaying a capture is a no-op.
    pub fn apply_peer_capture(&mut self, email: &str, cell: CellCoord, team: Team) -> bool {
        let Some(index) = self.grid.index_of(cell) else {
            debug!(email, ?cell, "peer capture outside the grid ignored");
            return false;
        };

        let owner_changed = self.owners.get(index) != Some(team);
        self.owners.set(index, team);
        let cursor_changed = self.cursors.get(email) != Some(&cell);
        if cursor_changed {
            let _ = self.cursors.insert(email.to_owned(), cell);
        }
        owner_changed || cursor_changed
    }

    /// Team owning `cell`, if any.
    #[must_use]
    pub fn owner_of(&self, cell: CellCoord) -> Option<Team> {
        self.grid
            .index_of(cell)
            .and_then(|index| self.owners.get(index))
    }

    /// Most recent capture made by the player identified by `email`.
    #[must_use]
    pub fn cursor_of(&self, email: &str) -> Option<CellCoord> {
        self.cursors.get(email).copied()
    }

    /// Number of cells owned by `team`.
    #[must_use]
    pub fn score_of(&self, team: Team) -> usize {
        self.owners.count(Some(team))
    }

    /// Number of cells nobody owns.
    #[must_use]
    pub fn unclaimed_count(&self) -> usize {
        self.owners.count(None)
    }

    /// Total number of cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.owners.len()
    }

    /// Every claimed cell with its owner, in row-major order.
    pub fn claimed_cells(&self) -> impl Iterator<Item = (CellCoord, Team)> + '_ {
        self.grid
            .cells()
            .zip(self.owners.iter())
            .filter_map(|(cell, owner)| owner.map(|team| (cell, team)))
    }
}

impl CaptureEngine for AreaCapture {
    fn handle_own_movement(&mut self, position: Position, out: &mut Vec<Command>) {
        if let Some(cell) = self.grid.locate(position) {
            out.extend(self.attempt_own_capture(cell));
        }
    }

    fn handle_peer_event(&mut self, event: &Event) -> bool {
        let Event::PlayerCellCapture { email, team, x, y } = event else {
            return false;
        };
        match team.team() {
            Some(team) => {
                let _ = self.apply_peer_capture(email, CellCoord::new(*x, *y), team);
            }
            None => debug!(email = %email, "observer capture ignored"),
        }
        true
    }

    fn score_of(&self, team: Team) -> usize {
        AreaCapture::score_of(self, team)
    }

    fn unclaimed_count(&self) -> usize {
        AreaCapture::unclaimed_count(self)
    }

    fn capturable_count(&self) -> usize {
        self.cell_count()
    }
}

#[derive(Clone, Debug)]
struct OwnershipGrid {
    cells: Vec<Option<Team>>,
}

impl OwnershipGrid {
    fn new(capacity: usize) -> Self {
        Self {
            cells: vec![None; capacity],
        }
    }

    fn get(&self, index: usize) -> Option<Team> {
        self.cells.get(index).copied().flatten()
    }

    fn set(&mut self, index: usize, team: Team) {
        if let Some(slot) = self.cells.get_mut(index) {
            *slot = Some(team);
        }
    }

    fn count(&self, owner: Option<Team>) -> usize {
        self.cells.iter().filter(|cell| **cell == owner).count()
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn iter(&self) -> impl Iterator<Item = Option<Team>> + '_ {
        self.cells.iter().copied()
    }
}
