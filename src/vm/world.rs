//! A concrete tile world.
//!
//! `World` is a background grid plus a table of sprites, at most one sprite
//! per tile. It implements both `TileGrid` and `GameEngine`, so it can be
//! driven directly by `Simulation`.
//!
//! ## Motion
//!
//! Sprites carry a motion (`None` when resting). Move commands only change
//! it; positions change in `advance()`, which commits every mover at once:
//!
//! - a mover heading off the grid stops
//! - a mover heading into a tile that stays occupied stops
//! - two movers contesting one tile: the lower id moves, the other stops
//! - two movers swapping tiles both stop
//!
//! Stopping can block movers behind, so resolution repeats until stable.
//! Movers that make it keep their motion for the next tick.
//!
//! Uses `im` for the sprite table so snapshots of the world are cheap.

use im::OrdMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{EntityId, KindCounts, VmConfig, WorldRng};
use crate::rules::{GameArg, MoveDirection};

use super::engine::{GameEngine, TileGrid};

/// Win/lose state driven by `GameArg` commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Playing,
    Won,
    Lost,
}

/// A sprite instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    pub id: EntityId,
    pub kind: usize,
    pub col: i32,
    pub row: i32,
    pub motion: Option<MoveDirection>,
}

/// Grid, sprites and game counters.
#[derive(Clone, Debug)]
pub struct World {
    width: i32,
    height: i32,
    kinds: KindCounts,
    /// Row-major background kinds.
    backgrounds: Vec<usize>,
    sprites: OrdMap<EntityId, Sprite>,
    occupancy: FxHashMap<(i32, i32), EntityId>,
    next_id: u32,
    /// Kinds whose rules are skipped this round.
    blocked: FxHashSet<usize>,
    /// Kinds to block once the current round ends.
    pending_blocks: FxHashSet<usize>,
    rejected: Vec<EntityId>,
    rng: WorldRng,
    status: GameStatus,
    score: i64,
    score_step: i64,
    level: u32,
    tick: u64,
}

impl World {
    /// A `width`×`height` world filled with background `fill`.
    ///
    /// Panics if `fill` is not a background kind or the size is not
    /// positive.
    #[must_use]
    pub fn new(width: i32, height: i32, fill: usize, kinds: KindCounts, config: &VmConfig) -> Self {
        assert!(width > 0 && height > 0, "world must have at least one tile");
        assert!(fill < kinds.backgrounds, "background {fill} out of range");
        Self {
            width,
            height,
            kinds,
            backgrounds: vec![fill; (width * height) as usize],
            sprites: OrdMap::new(),
            occupancy: FxHashMap::default(),
            next_id: 0,
            blocked: FxHashSet::default(),
            pending_blocks: FxHashSet::default(),
            rejected: Vec::new(),
            rng: WorldRng::new(config.seed),
            status: GameStatus::Playing,
            score: 0,
            score_step: config.score_step,
            level: 0,
            tick: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[must_use]
    pub fn kinds(&self) -> KindCounts {
        self.kinds
    }

    #[must_use]
    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        (0..self.width).contains(&col) && (0..self.height).contains(&row)
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        self.in_bounds(col, row)
            .then(|| (row * self.width + col) as usize)
    }

    /// Set a tile's background. Returns `false` off-grid or for an unknown
    /// kind.
    pub fn set_background(&mut self, col: i32, row: i32, kind: usize) -> bool {
        match self.index(col, row) {
            Some(i) if kind < self.kinds.backgrounds => {
                self.backgrounds[i] = kind;
                true
            }
            _ => false,
        }
    }

    /// Place a sprite. Returns `None` off-grid, for an unknown kind or on an
    /// occupied tile.
    pub fn spawn(&mut self, col: i32, row: i32, kind: usize, motion: Option<MoveDirection>) -> Option<EntityId> {
        if !self.in_bounds(col, row) || kind >= self.kinds.sprites || self.occupancy.contains_key(&(col, row)) {
            return None;
        }
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.sprites.insert(id, Sprite { id, kind, col, row, motion });
        self.occupancy.insert((col, row), id);
        trace!(sprite = %id, kind, col, row, "spawned");
        Some(id)
    }

    #[must_use]
    pub fn sprite(&self, id: EntityId) -> Option<&Sprite> {
        self.sprites.get(&id)
    }

    /// Sprites in id order.
    pub fn sprites(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.values()
    }

    #[must_use]
    pub fn sprite_count(&self) -> usize {
        self.sprites.len()
    }

    /// The sprite on a tile, of any kind.
    #[must_use]
    pub fn occupant(&self, col: i32, row: i32) -> Option<EntityId> {
        self.occupancy.get(&(col, row)).copied()
    }

    /// Whether rules for sprite `kind` are suppressed this round.
    #[must_use]
    pub fn is_blocked(&self, kind: usize) -> bool {
        self.blocked.contains(&kind)
    }

    /// Movers stopped by the last `advance()`.
    #[must_use]
    pub fn rejected_moves(&self) -> &[EntityId] {
        &self.rejected
    }

    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.status
    }

    #[must_use]
    pub fn score(&self) -> i64 {
        self.score
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Number of completed `advance()` calls.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    fn update_sprite(&mut self, id: EntityId, f: impl FnOnce(&mut Sprite)) -> bool {
        match self.sprites.get_mut(&id) {
            Some(sprite) => {
                f(sprite);
                true
            }
            None => {
                trace!(sprite = %id, "command on missing sprite");
                false
            }
        }
    }

    fn relocate(&mut self, id: EntityId, col: i32, row: i32) {
        if let Some(sprite) = self.sprites.get_mut(&id) {
            self.occupancy.remove(&(sprite.col, sprite.row));
            sprite.col = col;
            sprite.row = row;
            self.occupancy.insert((col, row), id);
        }
    }

    /// Decide which movers commit this tick.
    fn resolve_moves(&self) -> (Vec<(EntityId, (i32, i32))>, Vec<EntityId>) {
        let mut movers: Vec<(EntityId, (i32, i32), (i32, i32))> = Vec::new();
        let mut rejected = Vec::new();
        for sprite in self.sprites.values() {
            let Some(dir) = sprite.motion else { continue };
            let target = (sprite.col + dir.dx(), sprite.row + dir.dy());
            if self.in_bounds(target.0, target.1) {
                movers.push((sprite.id, (sprite.col, sprite.row), target));
            } else {
                rejected.push(sprite.id);
            }
        }

        loop {
            let moving: FxHashSet<EntityId> = movers.iter().map(|(id, _, _)| *id).collect();
            let staying: FxHashSet<(i32, i32)> = self
                .occupancy
                .iter()
                .filter(|(_, id)| !moving.contains(*id))
                .map(|(pos, _)| *pos)
                .collect();
            let origins: FxHashMap<(i32, i32), (i32, i32)> =
                movers.iter().map(|(_, from, to)| (*from, *to)).collect();
            let mut winners: FxHashMap<(i32, i32), EntityId> = FxHashMap::default();
            for (id, _, to) in &movers {
                // Ids ascend, so the first claim on a tile is the lowest id.
                winners.entry(*to).or_insert(*id);
            }

            let before = movers.len();
            movers.retain(|(id, from, to)| {
                let swap = origins.get(to) == Some(from);
                let keep = !staying.contains(to) && winners.get(to) == Some(id) && !swap;
                if !keep {
                    rejected.push(*id);
                }
                keep
            });
            if movers.len() == before {
                break;
            }
        }

        (movers.into_iter().map(|(id, _, to)| (id, to)).collect(), rejected)
    }
}

impl TileGrid for World {
    type Entity = EntityId;

    fn background_at(&self, col: i32, row: i32) -> Option<usize> {
        self.index(col, row).map(|i| self.backgrounds[i])
    }

    fn sprite_at(&self, col: i32, row: i32, kind: usize) -> Option<EntityId> {
        let id = self.occupant(col, row)?;
        self.sprites.get(&id).filter(|s| s.kind == kind).map(|s| s.id)
    }

    fn position(&self, entity: EntityId) -> Option<(i32, i32)> {
        self.sprites.get(&entity).map(|s| (s.col, s.row))
    }

    fn motion(&self, entity: EntityId) -> Option<MoveDirection> {
        self.sprites.get(&entity).and_then(|s| s.motion)
    }
}

impl GameEngine for World {
    type Entity = EntityId;

    fn create_entity(&mut self, col: i32, row: i32, kind: usize, dir: Option<MoveDirection>) -> Option<EntityId> {
        self.spawn(col, row, kind, dir)
    }

    fn move_entity(&mut self, entity: EntityId, dir: MoveDirection) {
        self.update_sprite(entity, |s| s.motion = Some(dir));
    }

    fn reverse_entity(&mut self, entity: EntityId, dir: MoveDirection) {
        self.update_sprite(entity, |s| s.motion = Some(dir));
    }

    fn stop_entity(&mut self, entity: EntityId) {
        self.update_sprite(entity, |s| s.motion = None);
    }

    fn destroy_entity(&mut self, entity: EntityId) {
        if let Some(sprite) = self.sprites.remove(&entity) {
            self.occupancy.remove(&(sprite.col, sprite.row));
            trace!(sprite = %entity, "destroyed");
        }
    }

    fn advance(&mut self) {
        let (moves, rejected) = self.resolve_moves();

        for id in &rejected {
            self.update_sprite(*id, |s| s.motion = None);
        }
        // Vacate every origin first so chains of movers can follow each other.
        for (id, _) in &moves {
            if let Some(s) = self.sprites.get(id) {
                self.occupancy.remove(&(s.col, s.row));
            }
        }
        for (id, (col, row)) in &moves {
            if let Some(sprite) = self.sprites.get_mut(id) {
                sprite.col = *col;
                sprite.row = *row;
                self.occupancy.insert((*col, *row), *id);
            }
        }

        self.blocked = std::mem::take(&mut self.pending_blocks);
        self.tick += 1;
        if !rejected.is_empty() {
            debug!(tick = self.tick, rejected = rejected.len(), "moves rejected");
        }
        self.rejected = rejected;
    }

    fn paint(&mut self, col: i32, row: i32, background: usize) {
        self.set_background(col, row, background);
    }

    fn portal(&mut self, entity: EntityId, background: usize) {
        let Some(&Sprite { col, row, .. }) = self.sprites.get(&entity) else {
            return;
        };
        let free: Vec<(i32, i32)> = (0..self.height)
            .flat_map(|r| (0..self.width).map(move |c| (c, r)))
            .filter(|&(c, r)| (c, r) != (col, row))
            .filter(|&(c, r)| self.background_at(c, r) == Some(background))
            .filter(|pos| !self.occupancy.contains_key(pos))
            .collect();
        let Some(&(to_col, to_row)) = self.rng.choose(&free) else {
            trace!(sprite = %entity, background, "no free portal destination");
            return;
        };
        self.relocate(entity, to_col, to_row);
        self.update_sprite(entity, |s| s.motion = None);
        trace!(sprite = %entity, to_col, to_row, "portal");
    }

    fn block_rules(&mut self, kind: usize) {
        self.pending_blocks.insert(kind);
    }

    fn game_event(&mut self, event: GameArg) {
        match event {
            GameArg::Win => self.status = GameStatus::Won,
            GameArg::Lose => self.status = GameStatus::Lost,
            GameArg::ScoreUp10 => self.score += self.score_step,
            GameArg::NextLevel => self.level += 1,
        }
        debug!(?event, status = ?self.status, score = self.score, level = self.level, "game event");
    }
}
