//! Selection state.

use crate::EntityId;

/// Interaction mode of the active entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Whole-entity selection.
    #[default]
    Object,
    /// Editing the active entity's geometry.
    Edit,
}

/// Active entity and ordered entity selection.
///
/// Order matters: the trailing selected entity is the boolean source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Entity receiving edit-mode and single-target commands.
    pub active: Option<EntityId>,
    /// Selected entities in selection order.
    pub selected: Vec<EntityId>,
    /// Current mode.
    pub mode: Mode,
}

impl Selection {
    /// Append `id` to the selection if not already selected.
    pub fn select(&mut self, id: EntityId) {
        if !self.selected.contains(&id) {
            self.selected.push(id);
        }
    }

    /// Remove `id` from the selection (and clear it as active).
    pub fn deselect(&mut self, id: EntityId) {
        self.selected.retain(|s| *s != id);
        if self.active == Some(id) {
            self.active = None;
        }
    }

    /// Deselect everything.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.active = None;
    }

    /// Replace the selection with `ids`, the last one active.
    pub fn set(&mut self, ids: &[EntityId]) {
        self.selected.clear();
        for &id in ids {
            self.select(id);
        }
        self.active = ids.last().copied();
    }

    /// Whether `id` is selected.
    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    /// Whether the active entity is in edit mode.
    pub fn is_edit_mode(&self) -> bool {
        self.mode == Mode::Edit
    }
}
