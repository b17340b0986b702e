//! The per-tick driver.
//!
//! One call to `Simulation::step` runs four phases over a `World`, then
//! commits the tick:
//!
//! 1. moving sprites: `ContextChange` rules, plus `ButtonPress` rules for
//!    the pressed button
//! 2. resting sprites: the same rule types
//! 3. collisions: `Collision` rules for each mover whose next tile is
//!    occupied
//! 4. negation checks: every matching `NegationCheck` rule is reported as a
//!    violation; its commands do not run
//!
//! When the project names a player kind, `ButtonPress` rules only run for
//! sprites of that kind.
//!
//! Moving and resting sets are fixed when the tick starts. Within a phase,
//! every rule view is matched against the same world before any command
//! runs. A rule is a candidate for a sprite when its centre entry includes
//! the sprite's kind and its centre direction accepts the sprite's motion.
//! Every stored rule contributes its base view and all derived views.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::{EntityId, RuleId, VmConfig};
use crate::project::Project;
use crate::rules::{ButtonArg, Direction, MoveDirection, Rule, RuleType, RuleView, Transform};

use super::engine::GameEngine;
use super::matcher::{dispatch, Evaluator, Firing};
use super::world::{GameStatus, World};

/// Phase of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Moving,
    Resting,
    Collision,
    Negation,
}

/// A rule view that matched and ran.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FiredRule {
    pub phase: Phase,
    pub rule: RuleId,
    pub transform: Option<Transform>,
    pub sprite: EntityId,
    /// Commands that reached the engine.
    pub commands: usize,
}

/// A `NegationCheck` rule that matched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub rule: RuleId,
    pub transform: Option<Transform>,
    pub sprite: EntityId,
}

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// World tick after the step.
    pub tick: u64,
    pub fired: Vec<FiredRule>,
    /// Total commands that reached the engine.
    pub commands: usize,
    pub violations: Vec<Violation>,
    /// Movers stopped when the tick was committed.
    pub rejected: Vec<EntityId>,
}

/// Runs a project's rules against a world.
///
/// Borrows the project read-only: evaluation never edits rules.
#[derive(Clone, Debug)]
pub struct Simulation<'p> {
    project: &'p Project,
    evaluator: Evaluator,
}

impl<'p> Simulation<'p> {
    #[must_use]
    pub fn new(project: &'p Project, config: &VmConfig) -> Self {
        Self {
            project,
            evaluator: Evaluator::new(project.kinds(), config),
        }
    }

    /// Base and derived views of every live rule.
    fn views(&self) -> Vec<RuleView<&'p Rule>> {
        self.project.views().flat_map(|view| view.all_views()).collect()
    }

    /// Match one phase against `world` without running anything.
    pub fn match_phase(
        &self,
        world: &World,
        phase: Phase,
        sprites: &[EntityId],
        button: Option<ButtonArg>,
    ) -> Vec<Firing<EntityId>> {
        let views = self.views();
        let player = self.project.player();
        let mut firings = Vec::new();
        for &id in sprites {
            let Some(sprite) = world.sprite(id) else {
                continue;
            };
            if world.is_blocked(sprite.kind) {
                trace!(sprite = %id, kind = sprite.kind, "rules blocked");
                continue;
            }
            for view in views
                .iter()
                .filter(|view| accepts(view, phase, button))
                .filter(|view| controls(view, player, sprite.kind))
                .filter(|view| selects(view, sprite.kind, sprite.motion))
            {
                firings.extend(self.evaluator.evaluate(world, id, view));
            }
        }
        firings
    }

    fn run_phase(
        &self,
        world: &mut World,
        phase: Phase,
        sprites: &[EntityId],
        button: Option<ButtonArg>,
        report: &mut TickReport,
    ) {
        let firings = self.match_phase(world, phase, sprites, button);
        for firing in &firings {
            let Some(rule) = firing.rule else { continue };
            let commands = dispatch(world, firing);
            debug!(?phase, %rule, transform = ?firing.transform, sprite = %firing.sprite, commands, "rule fired");
            report.commands += commands;
            report.fired.push(FiredRule {
                phase,
                rule,
                transform: firing.transform,
                sprite: firing.sprite,
                commands,
            });
        }
    }

    /// Run one tick and commit it.
    ///
    /// Does nothing once the game is won or lost.
    pub fn step(&self, world: &mut World, button: Option<ButtonArg>) -> TickReport {
        let mut report = TickReport {
            tick: world.tick(),
            ..TickReport::default()
        };
        if world.status() != GameStatus::Playing {
            trace!(status = ?world.status(), "game over, tick skipped");
            return report;
        }

        let (moving, resting): (Vec<_>, Vec<_>) = world
            .sprites()
            .map(|s| (s.id, s.motion.is_some()))
            .partition(|(_, moves)| *moves);
        let moving: Vec<EntityId> = moving.into_iter().map(|(id, _)| id).collect();
        let resting: Vec<EntityId> = resting.into_iter().map(|(id, _)| id).collect();

        self.run_phase(world, Phase::Moving, &moving, button, &mut report);
        self.run_phase(world, Phase::Resting, &resting, button, &mut report);

        let colliding: Vec<EntityId> = world
            .sprites()
            .filter(|s| {
                s.motion
                    .is_some_and(|d| world.occupant(s.col + d.dx(), s.row + d.dy()).is_some())
            })
            .map(|s| s.id)
            .collect();
        self.run_phase(world, Phase::Collision, &colliding, None, &mut report);

        let everyone: Vec<EntityId> = world.sprites().map(|s| s.id).collect();
        for firing in self.match_phase(world, Phase::Negation, &everyone, None) {
            if let Some(rule) = firing.rule {
                debug!(%rule, sprite = %firing.sprite, "negation check violated");
                report.violations.push(Violation {
                    rule,
                    transform: firing.transform,
                    sprite: firing.sprite,
                });
            }
        }

        world.advance();
        report.tick = world.tick();
        report.rejected = world.rejected_moves().to_vec();
        debug!(
            tick = report.tick,
            fired = report.fired.len(),
            commands = report.commands,
            violations = report.violations.len(),
            rejected = report.rejected.len(),
            "tick complete"
        );
        report
    }
}

/// Whether a view's rule type (and button) belongs in `phase`.
fn accepts(view: &RuleView<&Rule>, phase: Phase, button: Option<ButtonArg>) -> bool {
    match (phase, view.rule_type()) {
        (Phase::Moving | Phase::Resting, RuleType::ContextChange) => true,
        (Phase::Moving | Phase::Resting, RuleType::ButtonPress) => {
            button.is_some() && view.button() == button
        }
        (Phase::Collision, RuleType::Collision) => true,
        (Phase::Negation, RuleType::NegationCheck) => true,
        _ => false,
    }
}

/// Button rules drive the player kind only, when one is set.
fn controls(view: &RuleView<&Rule>, player: Option<usize>, kind: usize) -> bool {
    view.rule_type() != RuleType::ButtonPress || player.map_or(true, |p| p == kind)
}

/// Whether a view's centre entry selects a sprite of `kind` with `motion`.
fn selects(view: &RuleView<&Rule>, kind: usize, motion: Option<MoveDirection>) -> bool {
    let direction = view
        .when_do(2, 2)
        .and_then(|wd| view.witness_direction(wd))
        .unwrap_or(Direction::AnyDir);
    view.has_sprite_kind(kind) && direction.matches(motion)
}
