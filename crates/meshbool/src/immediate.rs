//! One-shot (destructive) booleans.

use meshbool_scene::{BooleanOperator, EntityId, EntityKind, Operation};
use tracing::{debug, info, instrument, warn};

use crate::context::BoolContext;
use crate::error::{EvaluationError, PreconditionError, Result};
use crate::kernel::GeometryKernel;
use crate::ordering;

/// What [`BoolContext::immediate_boolean`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum ImmediateOutcome {
    /// Edit-mode boolean on the active mesh; carries the kernel result.
    Edit(std::result::Result<(), EvaluationError>),
    /// Object-mode boolean against the trailing selected mesh.
    Object {
        /// Targets the boolean was baked into.
        baked: Vec<EntityId>,
        /// Targets whose bake failed; their boolean was discarded.
        failed: Vec<EntityId>,
        /// Name of the consumed source.
        source: String,
    },
}

impl<K: GeometryKernel> BoolContext<K> {
    /// Evaluate a boolean immediately instead of keeping it live.
    ///
    /// In edit mode the linked selection of the active mesh is combined with
    /// the rest of that mesh. In object mode the trailing selected mesh is
    /// baked into every other selected mesh and then removed.
    #[instrument(skip(self))]
    pub fn immediate_boolean(&mut self, operator: BooleanOperator) -> Result<ImmediateOutcome> {
        if self.scene.selection().is_edit_mode() {
            self.immediate_edit(operator)
        } else {
            self.immediate_object(operator)
        }
    }

    fn immediate_edit(&mut self, operator: BooleanOperator) -> Result<ImmediateOutcome> {
        let active = self
            .scene
            .selection()
            .active
            .filter(|id| self.scene.entity(*id).is_some_and(|e| e.is_mesh()))
            .ok_or(PreconditionError::NoActiveMesh)?;

        let entity = self.scene.get_mut(active)?;
        if entity.mesh.selected_face_count() == 0 {
            return Err(PreconditionError::NothingSelected.into());
        }
        let previous = entity.mesh.selected.clone();
        entity.mesh.select_linked();
        if entity.mesh.is_fully_selected() {
            entity.mesh.selected = previous;
            return Err(PreconditionError::AllVerticesSelected.into());
        }

        self.kernel.unify_winding(&mut entity.mesh);
        let result = self.kernel.intersect_selected(&mut entity.mesh, operator);
        match &result {
            Ok(()) => debug!(entity = %entity.full_name(), "intersected selection"),
            Err(err) => warn!(entity = %entity.full_name(), error = %err, "edit-mode boolean failed"),
        }
        Ok(ImmediateOutcome::Edit(result))
    }

    fn immediate_object(&mut self, operator: BooleanOperator) -> Result<ImmediateOutcome> {
        let selected = self.scene.list_selected(&[EntityKind::Mesh]);
        let Some((&source, targets)) = selected.split_last() else {
            return Err(PreconditionError::InsufficientSelection.into());
        };
        if targets.is_empty() {
            return Err(PreconditionError::InsufficientSelection.into());
        }
        let targets = targets.to_vec();

        self.normalize_source(source)?;
        let source_name = self.scene.get(source)?.name.clone();

        let mut baked = Vec::new();
        let mut failed = Vec::new();
        for &target in &targets {
            let entity = self.scene.get_mut(target)?;
            ordering::insert_top(
                &mut entity.stack,
                Operation::boolean(source_name.clone(), operator, source),
            );
            match self.bake_operation(target, 0) {
                Ok(()) => baked.push(target),
                Err(_) => failed.push(target),
            }
        }

        let groups: Vec<_> = self.scene.get(source)?.groups.iter().copied().collect();
        let boolean_group = self
            .current_boolean_group()
            .filter(|g| groups.contains(g));
        let stripped = self.with_groups_shown(&groups, |ctx| {
            let (_, stripped) = ctx.scene.purge_entity(source)?;
            if let Some(group) = boolean_group {
                ctx.delete_group_if_empty(group)?;
            }
            Ok(stripped)
        })?;
        if stripped > 0 {
            warn!(
                source = %source_name,
                stripped,
                "removed live booleans other entities had on the source"
            );
        }
        self.scene.selection_mut().clear();

        info!(
            source = %source_name,
            baked = baked.len(),
            failed = failed.len(),
            stripped,
            "applied immediate boolean"
        );
        Ok(ImmediateOutcome::Object {
            baked,
            failed,
            source: source_name,
        })
    }

    /// Bake the source's own stack so it is plain geometry.
    fn normalize_source(&mut self, source: EntityId) -> Result<()> {
        while !self.scene.get(source)?.stack.is_empty() {
            // Failures are logged and the entry dropped.
            let _ = self.bake_operation(source, 0);
        }
        self.unify_entity_winding(source)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::BooleanParams;
    use crate::BoolError;
    use meshbool_scene::{GroupPurpose, MeshData, Mode, OperationKind, Scene};
    use nalgebra::Vector3;

    fn cube(size: f64) -> MeshData {
        MeshData::cuboid(Vector3::new(size, size, size))
    }

    #[test]
    fn test_object_mode_bakes_and_removes_source() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", cube(2.0));
        let b = scene.add_mesh("B", cube(2.0));
        let source = scene.add_mesh("S", cube(1.0));
        scene.get_mut(a).unwrap().stack.push(Operation::new(
            "Bevel",
            OperationKind::Other {
                label: "BEVEL".into(),
            },
        ));
        scene.select(&[a, b, source]);
        let mut ctx = BoolContext::with_scene(scene);

        let outcome = ctx.immediate_boolean(BooleanOperator::Union).unwrap();
        assert_eq!(
            outcome,
            ImmediateOutcome::Object {
                baked: vec![a, b],
                failed: vec![],
                source: "S".into(),
            }
        );
        assert!(!ctx.scene.contains(source));

        let target = ctx.scene.get(a).unwrap();
        assert_eq!(target.stack.len(), 1);
        assert_eq!(target.stack[0].name, "Bevel");
        assert_eq!(target.mesh.history.len(), 1);
        assert_eq!(target.mesh.history[0].operator, Some(BooleanOperator::Union));
        assert!(ctx.scene.selection().selected.is_empty());
    }

    #[test]
    fn test_failed_bake_is_discarded() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", cube(2.0));
        let source = scene.add_mesh("S", cube(1.0));
        scene.get_mut(source).unwrap().transform.translation = Vector3::new(50.0, 0.0, 0.0);
        scene.select(&[a, source]);
        let mut ctx = BoolContext::with_scene(scene);

        let outcome = ctx.immediate_boolean(BooleanOperator::Intersect).unwrap();
        assert!(matches!(outcome, ImmediateOutcome::Object { ref failed, .. } if failed == &vec![a]));
        assert!(ctx.scene.get(a).unwrap().stack.is_empty());
        assert!(ctx.scene.get(a).unwrap().mesh.history.is_empty());
        assert!(!ctx.scene.contains(source));
    }

    #[test]
    fn test_source_in_hidden_group_is_removed() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", cube(2.0));
        let source = scene.add_mesh("S", cube(1.0));
        let hidden = scene
            .create_group("Hidden", GroupPurpose::User, None)
            .unwrap();
        scene.move_to_group(source, hidden).unwrap();
        scene.group_mut(hidden).unwrap().hide_viewport = true;
        scene.select(&[a, source]);
        let mut ctx = BoolContext::with_scene(scene);

        ctx.immediate_boolean(BooleanOperator::Difference).unwrap();
        assert!(!ctx.scene.contains(source));
        assert!(ctx.scene.group(hidden).unwrap().hide_viewport);
    }

    #[test]
    fn test_live_cutter_source_reclaims_boolean_group() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", cube(2.0));
        let b = scene.add_mesh("B", cube(2.0));
        let cutter = scene.add_mesh("C", cube(1.0));
        scene.select(&[a, cutter]);
        let mut ctx = BoolContext::with_scene(scene);
        ctx.live_add(BooleanParams::new(BooleanOperator::Difference))
            .unwrap();
        let group = ctx.current_boolean_group().unwrap();

        ctx.scene.select(&[b, cutter]);
        ctx.immediate_boolean(BooleanOperator::Difference).unwrap();

        assert!(!ctx.scene.contains(cutter));
        assert!(ctx.scene.get(a).unwrap().stack.is_empty());
        assert_eq!(ctx.scene.get(b).unwrap().mesh.history.len(), 1);
        assert!(ctx.scene.group(group).is_none());
        assert_eq!(ctx.current_boolean_group(), None);
    }

    #[test]
    fn test_edit_mode_full_selection_aborts() {
        let mut mesh = cube(1.0);
        mesh.select_all();
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", mesh);
        scene.select(&[a]);
        scene.selection_mut().mode = Mode::Edit;
        let mut ctx = BoolContext::with_scene(scene);

        let err = ctx.immediate_boolean(BooleanOperator::Difference).unwrap_err();
        assert!(matches!(
            err,
            BoolError::Precondition(PreconditionError::AllVerticesSelected)
        ));
        assert!(ctx.scene.get(a).unwrap().mesh.history.is_empty());
    }

    #[test]
    fn test_edit_mode_restores_selection_on_abort() {
        let mut mesh = cube(1.0);
        // One face selected; select-linked grows it to the whole cube.
        mesh.selected = [0, 1, 2, 3].into_iter().collect();
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", mesh);
        scene.select(&[a]);
        scene.selection_mut().mode = Mode::Edit;
        let mut ctx = BoolContext::with_scene(scene);

        assert!(ctx.immediate_boolean(BooleanOperator::Union).is_err());
        assert_eq!(ctx.scene.get(a).unwrap().mesh.selected_vertex_count(), 4);
    }

    #[test]
    fn test_edit_mode_intersects_linked_part() {
        let mut mesh = cube(2.0);
        mesh.merge(&cube(1.0).translated(Vector3::new(0.5, 0.0, 0.0)));
        mesh.selected = (8..12).collect();
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", mesh);
        scene.select(&[a]);
        scene.selection_mut().mode = Mode::Edit;
        let mut ctx = BoolContext::with_scene(scene);

        let outcome = ctx.immediate_boolean(BooleanOperator::Difference).unwrap();
        assert_eq!(outcome, ImmediateOutcome::Edit(Ok(())));
        let entity = ctx.scene.get(a).unwrap();
        assert_eq!(entity.mesh.history[0].source_faces, 6);
        assert_eq!(ctx.scene.entity_count(), 1);
    }

    #[test]
    fn test_edit_mode_requires_selected_faces() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", cube(1.0));
        scene.select(&[a]);
        scene.selection_mut().mode = Mode::Edit;
        let mut ctx = BoolContext::with_scene(scene);

        assert!(matches!(
            ctx.immediate_boolean(BooleanOperator::Difference),
            Err(BoolError::Precondition(PreconditionError::NothingSelected))
        ));
    }
}
