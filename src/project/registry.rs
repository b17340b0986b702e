//! The project: kind counts plus the rule table.
//!
//! `Project` is the collaborator the rule views and the interpreter read
//! from. It supplies kind counts, looks rules up by id and appends new ones.
//! Persistence is left to the caller: `export_rules` hands out packed
//! records and `import_rule` takes them back.
//!
//! ## Example
//!
//! ```
//! use tile_rules::core::ProjectConfig;
//! use tile_rules::project::Project;
//! use tile_rules::rules::{Direction, RuleType};
//!
//! let mut project = Project::new(ProjectConfig::new(2, 3));
//! let id = project.make_rule(1, RuleType::ContextChange, Direction::Right.bits()).unwrap();
//!
//! let view = project.view(id).unwrap();
//! assert!(view.has_sprite_kind(1));
//! assert_eq!(view.dir_from_rule(), Direction::Right);
//! assert_eq!(project.rules_for_sprite_kind(1), vec![id]);
//! ```

use tracing::debug;

use crate::codec::{pack, unpack};
use crate::core::{KindCounts, ProjectConfig, ProjectError, RuleId};
use crate::rules::{Attribute, Coord, Direction, Rule, RuleType, RuleView, WhenDo};

use super::table::RuleTable;

/// Kind counts and rules of one game.
#[derive(Clone, Debug)]
pub struct Project {
    config: ProjectConfig,
    rules: RuleTable,
}

impl Project {
    /// Create a project with no rules.
    #[must_use]
    pub fn new(config: ProjectConfig) -> Self {
        Self {
            config,
            rules: RuleTable::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Background and sprite kind counts.
    #[must_use]
    pub fn kinds(&self) -> KindCounts {
        self.config.kinds
    }

    #[must_use]
    pub fn background_kind_count(&self) -> usize {
        self.config.kinds.backgrounds
    }

    #[must_use]
    pub fn sprite_kind_count(&self) -> usize {
        self.config.kinds.sprites
    }

    /// Sprite kind driven by the controller, if any.
    #[must_use]
    pub fn player(&self) -> Option<usize> {
        self.config.player
    }

    pub fn set_player(&mut self, kind: Option<usize>) {
        self.config.player = kind;
    }

    /// Append a rule.
    ///
    /// Fails only once every id has been handed out.
    pub fn add_rule(&mut self, rule: Rule) -> Result<RuleId, ProjectError> {
        let id = self
            .rules
            .push(rule)
            .map_err(|_| ProjectError::IdsExhausted)?;
        debug!(rule = %id, "added rule");
        Ok(id)
    }

    /// Append a rule for sprite `kind` with a centre entry that includes it.
    ///
    /// For `ButtonPress` rules `arg` is the button. For other rule types it
    /// is the witness direction of the centre entry; values that are not a
    /// direction leave it at `AnyDir`.
    pub fn make_rule(
        &mut self,
        kind: usize,
        rule_type: RuleType,
        arg: u8,
    ) -> Result<RuleId, ProjectError> {
        let mut center = WhenDo::new(Coord::CENTER, self.kinds());
        center.sprites.set(kind, Attribute::Include);

        let rule_arg = match rule_type {
            RuleType::ButtonPress => arg,
            _ => {
                center.direction = Direction::from_bits(arg).unwrap_or_default();
                0
            }
        };
        let mut rule = Rule::new(rule_type, rule_arg);
        rule.when_dos.push(center);
        self.add_rule(rule)
    }

    /// The underlying rule table.
    #[must_use]
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id)
    }

    pub fn rule_mut(&mut self, id: RuleId) -> Option<&mut Rule> {
        self.rules.get_mut(id)
    }

    /// Base view of rule `id`.
    #[must_use]
    pub fn view(&self, id: RuleId) -> Option<RuleView<&Rule>> {
        let kinds = self.kinds();
        self.rules.get(id).map(|rule| RuleView::new(rule, id, kinds))
    }

    /// Editable base view of rule `id`.
    pub fn view_mut(&mut self, id: RuleId) -> Option<RuleView<&mut Rule>> {
        let kinds = self.kinds();
        self.rules.get_mut(id).map(|rule| RuleView::new(rule, id, kinds))
    }

    /// Tombstone rule `id`. Its id is never reused.
    pub fn remove_rule(&mut self, id: RuleId) -> Option<Rule> {
        let removed = self.rules.remove(id);
        if removed.is_some() {
            debug!(rule = %id, "removed rule");
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, id: RuleId) -> bool {
        self.rules.get(id).is_some()
    }

    /// Number of live rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Ids of live rules, ascending.
    pub fn rule_ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.iter().map(|(id, _)| id)
    }

    /// Base views of live rules, ascending by id.
    pub fn views(&self) -> impl Iterator<Item = RuleView<&Rule>> + '_ {
        let kinds = self.kinds();
        self.rules
            .iter()
            .map(move |(id, rule)| RuleView::new(rule, id, kinds))
    }

    /// Rules whose centre entry includes sprite `kind`.
    #[must_use]
    pub fn rules_for_sprite_kind(&self, kind: usize) -> Vec<RuleId> {
        self.views()
            .filter(|view| view.has_sprite_kind(kind))
            .filter_map(|view| view.rule_id())
            .collect()
    }

    /// Every live rule packed with its id.
    #[must_use]
    pub fn export_rules(&self) -> Vec<(RuleId, Vec<u8>)> {
        let kinds = self.kinds();
        self.rules
            .iter()
            .map(|(id, rule)| (id, pack(rule, kinds)))
            .collect()
    }

    /// Decode and install a persisted rule at `id`.
    ///
    /// Ids past the end of the table leave vacant ids behind that later
    /// imports may fill; nothing is allocated for them. Live and removed ids
    /// are refused, as is the last representable id, which would leave no id
    /// for the next `add_rule`.
    pub fn import_rule(&mut self, id: RuleId, bytes: &[u8]) -> Result<(), ProjectError> {
        if id == RuleId::MAX {
            return Err(ProjectError::IdOutOfRange(id));
        }
        let rule = unpack(bytes, self.kinds()).map_err(|source| ProjectError::Format { id, source })?;
        self.rules
            .insert_at(id, rule)
            .map_err(|_| ProjectError::IdInUse(id))?;
        debug!(rule = %id, bytes = bytes.len(), "imported rule");
        Ok(())
    }
}
