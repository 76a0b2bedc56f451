//! Grouping containers.

use crate::{EntityId, GroupId};

/// Why a group exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupPurpose {
    /// The scene root container.
    Scene,
    /// Created by the user.
    User,
    /// Holds boolean cutters.
    Boolean,
    /// Holds helper empties.
    Helpers,
}

/// Named container referencing entities (non-owning).
#[derive(Debug, Clone)]
pub struct Group {
    /// Group name.
    pub name: String,
    /// Why the group exists.
    pub purpose: GroupPurpose,
    /// Linked entities, in link order.
    pub entities: Vec<EntityId>,
    /// Child groups.
    pub children: Vec<GroupId>,
    /// Parent group (`None` only for the scene root).
    pub parent: Option<GroupId>,
    /// Hidden from viewport evaluation.
    pub hide_viewport: bool,
    /// Excluded from final renders.
    pub exclude_from_render: bool,
}

impl Group {
    pub(crate) fn new(name: String, purpose: GroupPurpose, parent: Option<GroupId>) -> Self {
        Self {
            name,
            purpose,
            entities: Vec::new(),
            children: Vec::new(),
            parent,
            hide_viewport: false,
            exclude_from_render: false,
        }
    }

    /// Whether `entity` is linked here.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains(&entity)
    }

    /// Whether no entity is linked here.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
