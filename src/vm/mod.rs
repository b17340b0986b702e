//! The evaluation VM.
//!
//! - `TileGrid`/`GameEngine`: what the interpreter reads and writes
//! - `Evaluator`: matches one rule view around one sprite
//! - `dispatch`: runs a matched view's commands against an engine
//! - `World`: a concrete grid and sprite table
//! - `Simulation`: the phased per-tick driver over a `World`
//!
//! Evaluation only reads rules. The world is only changed by dispatched
//! commands and `advance()`.

pub mod engine;
pub mod matcher;
pub mod sim;
pub mod world;

pub use engine::{GameEngine, TileGrid};
pub use matcher::{dispatch, dispatch_command, Evaluator, Firing, Guard, PendingCommand};
pub use sim::{FiredRule, Phase, Simulation, TickReport, Violation};
pub use world::{GameStatus, Sprite, World};
