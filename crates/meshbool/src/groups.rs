//! Boolean and helper group lifecycle.

use meshbool_scene::{GroupId, GroupPurpose, Scene};
use tracing::{debug, info};

use crate::context::BoolContext;
use crate::error::Result;
use crate::kernel::GeometryKernel;

/// Outcome of [`BoolContext::delete_group_if_empty`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupReclaim {
    /// The group was empty and has been removed.
    Deleted,
    /// The group still holds entities and was kept.
    Kept {
        /// Number of entities still linked.
        remaining: usize,
    },
    /// The handle no longer resolved.
    Missing,
}

/// Force-shows a group and remembers its prior viewport flag.
///
/// Entities in a hidden group cannot be deleted, so reclamation shows the
/// group first and calls [`ForceShown::restore`] if the group survives.
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct ForceShown {
    group: GroupId,
    was_hidden: bool,
}

impl ForceShown {
    /// Show `group`, remembering whether it was hidden.
    pub fn show(scene: &mut Scene, group: GroupId) -> Option<Self> {
        let g = scene.group_mut(group)?;
        let was_hidden = g.hide_viewport;
        g.hide_viewport = false;
        Some(Self { group, was_hidden })
    }

    /// Whether the group was hidden before [`ForceShown::show`].
    pub fn was_hidden(&self) -> bool {
        self.was_hidden
    }

    /// Put the prior flag back if the group still exists.
    pub fn restore(self, scene: &mut Scene) {
        if let Some(g) = scene.group_mut(self.group) {
            g.hide_viewport = self.was_hidden;
        }
    }
}

impl<K: GeometryKernel> BoolContext<K> {
    /// The shared boolean group, created on first use.
    ///
    /// A stale cached handle is dropped; an existing boolean group with the
    /// configured name is adopted before a new one is created.
    pub fn boolean_group(&mut self) -> Result<GroupId> {
        if let Some(id) = self.current_boolean_group() {
            return Ok(id);
        }
        let id = self.scene.create_group(
            &self.config.boolean_group,
            GroupPurpose::Boolean,
            None,
        )?;
        if let Some(g) = self.scene.group_mut(id) {
            g.exclude_from_render = true;
        }
        info!(group = %self.config.boolean_group, "created boolean group");
        self.boolean_group = Some(id);
        Ok(id)
    }

    /// The boolean group if one exists, without creating it.
    pub fn current_boolean_group(&mut self) -> Option<GroupId> {
        self.boolean_group = self
            .boolean_group
            .filter(|id| self.scene.group(*id).is_some())
            .or_else(|| self.adopt_group(&self.config.boolean_group, GroupPurpose::Boolean));
        self.boolean_group
    }

    /// The helpers group, created on first use.
    pub fn helpers_group(&mut self) -> Result<GroupId> {
        let cached = self
            .helpers_group
            .filter(|id| self.scene.group(*id).is_some())
            .or_else(|| self.adopt_group(&self.config.helpers_group, GroupPurpose::Helpers));
        if let Some(id) = cached {
            self.helpers_group = Some(id);
            return Ok(id);
        }
        let id = self.scene.create_group(
            &self.config.helpers_group,
            GroupPurpose::Helpers,
            None,
        )?;
        if let Some(g) = self.scene.group_mut(id) {
            g.exclude_from_render = true;
        }
        debug!(group = %self.config.helpers_group, "created helpers group");
        self.helpers_group = Some(id);
        Ok(id)
    }

    fn adopt_group(&self, name: &str, purpose: GroupPurpose) -> Option<GroupId> {
        self.scene
            .groups()
            .find(|(_, g)| g.name == name && g.purpose == purpose)
            .map(|(id, _)| id)
    }

    /// Run `f` with `groups` force-shown, then put every viewport flag back
    /// whether `f` succeeded or not.
    pub(crate) fn with_groups_shown<T>(
        &mut self,
        groups: &[GroupId],
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let shown: Vec<ForceShown> = groups
            .iter()
            .filter_map(|g| ForceShown::show(&mut self.scene, *g))
            .collect();
        let outcome = f(self);
        for guard in shown {
            guard.restore(&mut self.scene);
        }
        outcome
    }

    /// Remove `group` if no entity is linked into it or any nested group.
    pub fn delete_group_if_empty(&mut self, group: GroupId) -> Result<GroupReclaim> {
        let Some(g) = self.scene.group(group) else {
            return Ok(GroupReclaim::Missing);
        };
        let remaining = self.scene.all_group_entities(group).len();
        if remaining > 0 {
            debug!(group = %g.name, remaining, "keeping group");
            return Ok(GroupReclaim::Kept { remaining });
        }
        let removed = self.scene.delete_group(group)?;
        info!(group = %removed.name, "removed empty group");
        if self.boolean_group == Some(group) {
            self.boolean_group = None;
        }
        if self.helpers_group == Some(group) {
            self.helpers_group = None;
        }
        Ok(GroupReclaim::Deleted)
    }
}
