//! Move engine: slide every tile toward one edge, one tick at a time, merging
//! equal neighbours at most once per tile per move.

use crate::board::{Board, BoardConfig, Cell, Status, TileId};
use crate::tile::{Snap, Tile};
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

/// Everything a move needs to know about its direction: sort order, per-tick
/// delta, the edge, the neighbour to look at and the gap thresholds.
#[derive(Debug, Clone, Copy)]
pub struct Travel {
    direction: Direction,
    axis: Axis,
    /// Toward row/col 0.
    backward: bool,
    velocity: i32,
    /// Tile size along the travel axis.
    extent: i32,
    /// Last row/col index along the travel axis.
    last: usize,
}

impl Travel {
    pub fn new(direction: Direction, config: &BoardConfig) -> Self {
        let (axis, backward) = match direction {
            Direction::Left => (Axis::Horizontal, true),
            Direction::Right => (Axis::Horizontal, false),
            Direction::Up => (Axis::Vertical, true),
            Direction::Down => (Axis::Vertical, false),
        };
        let (extent, last) = match axis {
            Axis::Horizontal => (config.cell_width(), config.cols() - 1),
            Axis::Vertical => (config.cell_height(), config.rows() - 1),
        };
        Self {
            direction,
            axis,
            backward,
            velocity: config.velocity(),
            extent,
            last,
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    fn index(&self, tile: &Tile) -> usize {
        match self.axis {
            Axis::Horizontal => tile.col,
            Axis::Vertical => tile.row,
        }
    }

    /// Row for horizontal travel, column for vertical.
    #[inline]
    fn line(&self, tile: &Tile) -> usize {
        match self.axis {
            Axis::Horizontal => tile.row,
            Axis::Vertical => tile.col,
        }
    }

    #[inline]
    fn pos(&self, tile: &Tile) -> i32 {
        match self.axis {
            Axis::Horizontal => tile.x,
            Axis::Vertical => tile.y,
        }
    }

    /// Tiles nearest the destination edge sort first.
    pub fn order(&self, ids: &mut [TileId], board: &Board) {
        let key = |id: &TileId| board.get(*id).map_or(0, |t| self.index(t));
        if self.backward {
            ids.sort_by_key(key);
        } else {
            ids.sort_by_key(|id| std::cmp::Reverse(key(id)));
        }
    }

    /// Pixel step applied to a moving tile each tick.
    pub fn delta(&self) -> (i32, i32) {
        let d = if self.backward {
            -self.velocity
        } else {
            self.velocity
        };
        match self.axis {
            Axis::Horizontal => (d, 0),
            Axis::Vertical => (0, d),
        }
    }

    pub fn at_boundary(&self, tile: &Tile) -> bool {
        let i = self.index(tile);
        if self.backward { i == 0 } else { i >= self.last }
    }

    /// Cell one step closer to the edge, if it is on the grid.
    pub fn neighbor_cell(&self, tile: &Tile) -> Option<Cell> {
        if self.at_boundary(tile) {
            return None;
        }
        let step = |i: usize| if self.backward { i - 1 } else { i + 1 };
        Some(match self.axis {
            Axis::Horizontal => Cell::new(tile.row, step(tile.col)),
            Axis::Vertical => Cell::new(step(tile.row), tile.col),
        })
    }

    /// Distance from `next` to `tile` measured against the direction of travel.
    #[inline]
    fn gap(&self, tile: &Tile, next: &Tile) -> i32 {
        if self.backward {
            self.pos(tile) - self.pos(next)
        } else {
            self.pos(next) - self.pos(tile)
        }
    }

    /// Close enough to merge: the next tick would reach `next`.
    pub fn within_tick(&self, tile: &Tile, next: &Tile) -> bool {
        self.gap(tile, next) <= self.velocity
    }

    /// There is more than a tile plus one tick of space before `next`.
    pub fn has_room(&self, tile: &Tile, next: &Tile) -> bool {
        self.gap(tile, next) > self.extent + self.velocity
    }

    pub fn snap(&self) -> Snap {
        if self.backward { Snap::Ceil } else { Snap::Floor }
    }

    /// Merge pairs for the whole move, follower -> leader. Each line is walked
    /// from the destination edge; a tile pairs with the nearest tile ahead of
    /// it when the values match and that tile is still unpaired.
    pub fn plan_merges(&self, board: &Board) -> HashMap<TileId, TileId> {
        let mut ids = board.live_ids();
        self.order(&mut ids, board);
        let mut ahead: HashMap<usize, Option<TileId>> = HashMap::new();
        let mut pairs = HashMap::new();
        for id in ids {
            let Some(tile) = board.get(id) else {
                continue;
            };
            let slot = ahead.entry(self.line(tile)).or_default();
            match *slot {
                Some(lead) if board.get(lead).is_some_and(|t| t.value == tile.value) => {
                    pairs.insert(id, lead);
                    *slot = None;
                }
                _ => *slot = Some(id),
            }
        }
        pairs
    }
}

/// What happens after a move that left every tile where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoopPolicy {
    /// Nothing moved, nothing spawns.
    #[default]
    Skip,
    /// Spawn regardless, as long as the board is not full.
    Spawn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReport {
    pub direction: Direction,
    /// Ticks that produced movement.
    pub ticks: u32,
    pub moved: bool,
    pub merges: u32,
    pub spawned: Option<Cell>,
    pub status: Status,
}

/// One move in progress. Drive it with [`Slide::step`] until it settles,
/// drawing between steps, then close it with [`Slide::finish`].
pub struct Slide<'a> {
    board: &'a mut Board,
    travel: Travel,
    /// Follower -> leader, fixed when the move starts.
    partners: HashMap<TileId, TileId>,
    /// Tiles that already merged this move.
    consumed: HashSet<TileId>,
    /// Tiles merged away this tick. They keep blocking until the tick ends.
    merged: Vec<TileId>,
    ticks: u32,
    merges: u32,
    settled: bool,
}

impl<'a> Slide<'a> {
    pub fn new(board: &'a mut Board, direction: Direction) -> Self {
        let travel = Travel::new(direction, board.config());
        let partners = travel.plan_merges(board);
        Self {
            board,
            travel,
            partners,
            consumed: HashSet::new(),
            merged: Vec::new(),
            ticks: 0,
            merges: 0,
            settled: false,
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &*self.board
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Advance every tile by one tick. Returns whether anything moved; the
    /// first tick that returns `false` settles the move.
    pub fn step(&mut self) -> bool {
        if self.settled {
            return false;
        }
        let mut order = self.board.live_ids();
        self.travel.order(&mut order, &*self.board);

        let mut updated = false;
        for id in order {
            if self.advance(id) {
                updated = true;
            }
        }
        for id in self.merged.drain(..) {
            self.board.remove(id);
        }
        self.board.reindex();

        if updated {
            self.ticks += 1;
            log::trace!("{} tick {}", self.travel.direction(), self.ticks);
        } else {
            self.settled = true;
        }
        updated
    }

    /// Process one tile for the current tick.
    fn advance(&mut self, id: TileId) -> bool {
        let travel = self.travel;
        let config = *self.board.config();
        let Some(tile) = self.board.get(id) else {
            return false;
        };
        if travel.at_boundary(tile) {
            return false;
        }
        let next = travel
            .neighbor_cell(tile)
            .and_then(|cell| self.board.lookup(cell))
            .and_then(|nid| self.board.get(nid).map(|n| (nid, n)));

        let moves = match next {
            None => true,
            Some((nid, next))
                if self.partners.get(&id) == Some(&nid)
                    && !self.consumed.contains(&id)
                    && !self.consumed.contains(&nid) =>
            {
                if travel.within_tick(tile, next) {
                    self.merge(id, nid);
                    return true;
                }
                // Overlapping is only safe against a tile parked on its cell.
                next.is_snapped(&config) || travel.has_room(tile, next)
            }
            Some((_, next)) => travel.has_room(tile, next),
        };
        if !moves {
            return false;
        }

        let (dx, dy) = travel.delta();
        if let Some(tile) = self.board.get_mut(id) {
            tile.translate(dx, dy);
            tile.set_position(travel.snap(), &config);
        }
        true
    }

    fn merge(&mut self, id: TileId, into: TileId) {
        if let Some(target) = self.board.get_mut(into) {
            target.double();
        }
        self.merged.push(id);
        self.consumed.insert(id);
        self.consumed.insert(into);
        self.merges += 1;
    }

    /// Run any remaining ticks, then the terminal/spawn check.
    pub fn finish<R: Rng + ?Sized>(mut self, rng: &mut R, policy: NoopPolicy) -> MoveReport {
        while self.step() {}
        self.board.compact();
        let moved = self.ticks > 0;
        let spawn = moved || policy == NoopPolicy::Spawn;
        let (status, spawned) = self.board.after_move(rng, spawn);
        MoveReport {
            direction: self.travel.direction(),
            ticks: self.ticks,
            moved,
            merges: self.merges,
            spawned,
            status,
        }
    }
}

/// Play a whole move without intermediate frames.
pub fn slide<R: Rng + ?Sized>(
    board: &mut Board,
    direction: Direction,
    rng: &mut R,
    policy: NoopPolicy,
) -> MoveReport {
    Slide::new(board, direction).finish(rng, policy)
}
