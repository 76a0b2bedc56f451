//! Live (non-destructive) boolean attachment.

use meshbool_scene::{
    BooleanOperator, EntityId, EntityKind, GroupPurpose, Mode, Operation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::context::BoolContext;
use crate::cutter::PreparedCutter;
use crate::error::{PreconditionError, Result};
use crate::kernel::GeometryKernel;
use crate::ordering;

/// Parameters of a live boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanParams {
    /// Combination mode.
    pub operator: BooleanOperator,
    /// Add a thin solidify shell to the cutter.
    #[serde(default)]
    pub cutline: bool,
    /// Create a shrunk inset the cutter follows.
    #[serde(default)]
    pub inset: bool,
}

impl BooleanParams {
    /// Plain boolean without cutline or inset.
    pub fn new(operator: BooleanOperator) -> Self {
        Self {
            operator,
            cutline: false,
            inset: false,
        }
    }
}

/// What [`BoolContext::live_add`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveOutcome {
    /// Entities that received a boolean, in selection order.
    pub targets: Vec<EntityId>,
    /// The prepared cutter.
    pub cutter: PreparedCutter,
    /// Entity split off the active mesh in edit mode.
    pub separated: Option<EntityId>,
    /// Stack index of the new boolean on each target.
    pub indices: Vec<usize>,
}

impl<K: GeometryKernel> BoolContext<K> {
    /// Attach the trailing selected mesh as a live boolean to every other
    /// selected mesh.
    ///
    /// In edit mode the selected geometry of the active mesh is first split
    /// off and becomes the cutter.
    #[instrument(skip(self), fields(operator = %params.operator))]
    pub fn live_add(&mut self, params: BooleanParams) -> Result<LiveOutcome> {
        let selected = self.scene.list_selected(&[EntityKind::Mesh]);
        let separate_from = self.separation_candidate();
        if selected.len() + usize::from(separate_from.is_some()) < 2 {
            return Err(PreconditionError::InsufficientSelection.into());
        }

        let separated = match separate_from {
            Some(active) => Some(self.separate_into_entity(active)?),
            None => {
                if !self.scene.selection().is_edit_mode() {
                    for id in &selected {
                        self.unify_entity_winding(*id)?;
                    }
                }
                None
            }
        };
        self.scene.selection_mut().mode = Mode::Object;

        let selected = self.scene.list_selected(&[EntityKind::Mesh]);
        let Some((&source, targets)) = selected.split_last() else {
            return Err(PreconditionError::InsufficientSelection.into());
        };
        if targets.is_empty() {
            return Err(PreconditionError::InsufficientSelection.into());
        }
        let targets = targets.to_vec();

        self.scene.get_mut(source)?.stack.clear();
        let cutter = self.prepare_cutter(source, params.cutline, params.inset)?;
        let source_name = self.scene.get(source)?.name.clone();

        let mut indices = Vec::with_capacity(targets.len());
        for &target in &targets {
            let entity = self.scene.get_mut(target)?;
            let index = ordering::insert_boolean(
                &mut entity.stack,
                Operation::boolean(source_name.clone(), params.operator, source),
            );
            debug!(entity = %entity.full_name(), index, "added boolean");
            indices.push(index);
        }

        self.file_cutter(source)?;

        let first_target = targets[0];
        if let Some(inset) = cutter.inset {
            let home = self.scene.home_group(first_target)?;
            self.scene.move_to_group(inset, home)?;
        }
        self.scene.select(&[first_target]);

        info!(
            source = %source_name,
            targets = targets.len(),
            "attached live boolean"
        );
        Ok(LiveOutcome {
            targets,
            cutter,
            separated,
            indices,
        })
    }

    /// Active mesh whose edit-mode selection would be split off.
    pub(crate) fn separation_candidate(&self) -> Option<EntityId> {
        let selection = self.scene.selection();
        if !selection.is_edit_mode() {
            return None;
        }
        let active = selection.active.filter(|id| selection.is_selected(*id))?;
        let entity = self.scene.entity(active)?;
        (entity.is_mesh() && entity.mesh.selected_vertex_count() > 0).then_some(active)
    }

    /// Split the linked edit selection of `active` into a new entity.
    ///
    /// The new entity shares the active entity's groups and transform and is
    /// appended to the selection.
    pub(crate) fn separate_into_entity(&mut self, active: EntityId) -> Result<EntityId> {
        let entity = self.scene.get_mut(active)?;
        let mut mesh = std::mem::take(&mut entity.mesh);
        mesh.select_linked();
        let reversed = self.kernel.unify_winding(&mut mesh);
        let split = mesh.separate_selected();

        let entity = self.scene.get_mut(active)?;
        entity.mesh = mesh;
        let name = entity.name.clone();
        let transform = entity.transform;
        let groups: Vec<_> = entity.groups.iter().copied().collect();

        let home = groups.first().copied();
        let id = self.scene.add_entity(&name, EntityKind::Mesh, split, home)?;
        for group in groups {
            self.scene.link_entity(group, id)?;
        }
        self.scene.get_mut(id)?.transform = transform;
        self.scene.selection_mut().select(id);
        debug!(
            from = %name,
            to = %self.scene.get(id)?.full_name(),
            reversed,
            "separated selection"
        );
        Ok(id)
    }

    pub(crate) fn unify_entity_winding(&mut self, id: EntityId) -> Result<usize> {
        let entity = self.scene.get_mut(id)?;
        Ok(self.kernel.unify_winding(&mut entity.mesh))
    }

    /// Link the cutter into the boolean group, taking it out of its previous
    /// home unless it already lived in a boolean group.
    fn file_cutter(&mut self, source: EntityId) -> Result<()> {
        let was_filed = self.scene.get(source)?.groups.iter().any(|g| {
            self.scene
                .group(*g)
                .is_some_and(|g| g.purpose == GroupPurpose::Boolean)
        });
        let group = self.boolean_group()?;
        self.scene.link_entity(group, source)?;
        if !was_filed {
            let previous: Vec<_> = self
                .scene
                .get(source)?
                .groups
                .iter()
                .copied()
                .filter(|g| *g != group)
                .collect();
            for g in previous {
                self.scene.unlink_entity(g, source)?;
            }
        }
        Ok(())
    }
}
