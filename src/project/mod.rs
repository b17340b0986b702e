//! Rule table owned by a project.
//!
//! Rules are only ever mutated here (directly or through an editable
//! `RuleView`); the interpreter borrows the project read-only.

pub mod registry;
pub mod table;

pub use registry::Project;
pub use table::{RuleTable, Slot};
