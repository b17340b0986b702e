//! Core types: identifiers, configuration, errors, RNG.
//!
//! These are shared by the codec, the rule views and the interpreter.

pub mod entity;
pub mod config;
pub mod error;
pub mod rng;

pub use entity::{EntityId, RuleId};
pub use config::{AlternateInclusion, KindCounts, ProjectConfig, VmConfig};
pub use error::{FormatError, FormatResult, ProjectError};
pub use rng::WorldRng;
