//! Baking live booleans and reclaiming their cutters.

use meshbool_scene::{EntityId, EntityKind, GroupId, SceneError};
use tracing::{debug, info, instrument, warn};

use crate::context::BoolContext;
use crate::error::{PreconditionError, Result};
use crate::groups::GroupReclaim;
use crate::kernel::GeometryKernel;
use crate::ordering;

/// What [`BoolContext::apply`] did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Operations baked successfully, across all targets.
    pub baked: usize,
    /// Names of operations whose bake failed and were removed.
    pub dropped: Vec<String>,
    /// Names of cutters deleted because nothing referenced them anymore.
    pub deleted: Vec<String>,
    /// Cutters still referenced elsewhere and therefore kept.
    pub kept: Vec<EntityId>,
    /// What happened to the boolean group, if there was one.
    pub group: Option<GroupReclaim>,
}

impl<K: GeometryKernel> BoolContext<K> {
    /// Bake every selected mesh's stack through its last boolean, then
    /// delete cutters left without references.
    ///
    /// Entries are baked in stack order; a failing entry is removed and the
    /// rest still bake. Entries after the last boolean are left live.
    #[instrument(skip(self))]
    pub fn apply(&mut self) -> Result<ApplyReport> {
        if self.scene.selection().is_edit_mode() {
            return Err(PreconditionError::NotInObjectMode.into());
        }
        let targets = self.scene.list_selected(&[EntityKind::Mesh]);
        if targets.is_empty() {
            return Err(PreconditionError::NoActiveMesh.into());
        }

        let mut report = ApplyReport::default();
        let mut candidates: Vec<EntityId> = Vec::new();
        for &target in &targets {
            let entity = self.scene.get(target)?;
            let count = ordering::apply_count(&entity.stack);
            debug!(
                entity = %entity.full_name(),
                count,
                total = entity.stack.len(),
                "applying operations"
            );

            for _ in 0..count {
                let op = self.scene.get(target)?.stack[0].clone();
                if let Some(source) = op.boolean_source() {
                    if !candidates.contains(&source) {
                        candidates.push(source);
                    }
                }
                match self.bake_operation(target, 0) {
                    Ok(()) => report.baked += 1,
                    Err(_) => report.dropped.push(op.name),
                }
            }
        }

        let group = self.current_boolean_group();
        self.with_groups_shown(group.as_slice(), |ctx| {
            ctx.reclaim_cutters(candidates, group, &mut report)
        })?;

        info!(
            targets = targets.len(),
            baked = report.baked,
            dropped = report.dropped.len(),
            deleted = report.deleted.len(),
            kept = report.kept.len(),
            "applied booleans"
        );
        Ok(report)
    }

    /// Delete cutters nothing references anymore, then the boolean group if
    /// it ended up empty.
    fn reclaim_cutters(
        &mut self,
        candidates: Vec<EntityId>,
        group: Option<GroupId>,
        report: &mut ApplyReport,
    ) -> Result<()> {
        for candidate in candidates {
            if !self.scene.contains(candidate) {
                continue;
            }
            if self.scene.is_referenced(candidate) {
                debug!(
                    cutter = %self.scene.get(candidate)?.full_name(),
                    references = self.scene.references(candidate),
                    "keeping shared cutter"
                );
                report.kept.push(candidate);
                continue;
            }
            match self.scene.delete_entity(candidate) {
                Ok(removed) => {
                    debug!(cutter = %removed.full_name(), "deleted orphaned cutter");
                    report.deleted.push(removed.name);
                }
                Err(SceneError::GroupHidden { entity, group }) => {
                    warn!(cutter = %entity, group = %group, "orphan sits in a hidden group, keeping it");
                    report.kept.push(candidate);
                }
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(group) = group {
            report.group = Some(self.delete_group_if_empty(group)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::BooleanParams;
    use crate::BoolError;
    use meshbool_scene::{Axis, BooleanOperator, MeshData, Mode, Operation, OperationKind, Scene};
    use nalgebra::Vector3;

    fn cube(size: f64) -> MeshData {
        MeshData::cuboid(Vector3::new(size, size, size))
    }

    fn mirror() -> Operation {
        Operation::new(
            "Mirror",
            OperationKind::Mirror {
                axis: Axis::X,
                bisect: false,
                flip: false,
                local: false,
                mirror_object: None,
            },
        )
    }

    #[test]
    fn test_prefix_collapse() {
        let mut scene = Scene::new();
        let target = scene.add_mesh("T", cube(2.0));
        let s1 = scene.add_mesh("S1", cube(1.0));
        let s2 = scene.add_mesh("S2", cube(1.0));
        {
            let stack = &mut scene.get_mut(target).unwrap().stack;
            stack.push(mirror());
            stack.push(Operation::boolean("S1", BooleanOperator::Union, s1));
            stack.push(Operation::boolean("S2", BooleanOperator::Difference, s2));
            stack.push(Operation::new(
                "Weld",
                OperationKind::Other {
                    label: "WELD".into(),
                },
            ));
        }
        scene.select(&[target]);
        let mut ctx = BoolContext::with_scene(scene);

        let report = ctx.apply().unwrap();
        assert_eq!(report.baked, 3);
        assert!(report.dropped.is_empty());
        assert_eq!(report.deleted, vec!["S1".to_string(), "S2".to_string()]);
        assert_eq!(report.group, None);

        let entity = ctx.scene.get(target).unwrap();
        assert_eq!(entity.stack.len(), 1);
        assert_eq!(entity.stack[0].name, "Weld");
        let labels: Vec<_> = entity.mesh.history.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["MIRROR", "BOOLEAN", "BOOLEAN"]);
    }

    #[test]
    fn test_shared_cutter_survives_partial_apply() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", cube(2.0));
        let b = scene.add_mesh("B", cube(2.0));
        let c = scene.add_mesh("C", cube(1.0));
        scene.select(&[a, b, c]);
        let mut ctx = BoolContext::with_scene(scene);
        ctx.live_add(BooleanParams::new(BooleanOperator::Difference))
            .unwrap();
        let group = ctx.current_boolean_group().unwrap();

        ctx.scene.select(&[a]);
        let report = ctx.apply().unwrap();
        assert_eq!(report.kept, vec![c]);
        assert_eq!(report.group, Some(GroupReclaim::Kept { remaining: 1 }));
        assert!(ctx.scene.group(group).unwrap().contains(c));

        ctx.scene.select(&[b]);
        let report = ctx.apply().unwrap();
        assert_eq!(report.deleted, vec!["dc_bool_obj".to_string()]);
        assert_eq!(report.group, Some(GroupReclaim::Deleted));
        assert!(!ctx.scene.contains(c));
        assert_eq!(ctx.current_boolean_group(), None);
    }

    #[test]
    fn test_requires_object_mode() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", cube(1.0));
        scene.select(&[a]);
        scene.selection_mut().mode = Mode::Edit;
        let mut ctx = BoolContext::with_scene(scene);
        assert!(matches!(
            ctx.apply(),
            Err(BoolError::Precondition(PreconditionError::NotInObjectMode))
        ));
    }

    #[test]
    fn test_hidden_group_visibility_restored() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", cube(2.0));
        let c = scene.add_mesh("C", cube(1.0));
        let extra = scene.add_mesh("Extra", cube(1.0));
        scene.select(&[a, c]);
        let mut ctx = BoolContext::with_scene(scene);
        ctx.live_add(BooleanParams::new(BooleanOperator::Union)).unwrap();

        let group = ctx.current_boolean_group().unwrap();
        ctx.scene.move_to_group(extra, group).unwrap();
        ctx.scene.group_mut(group).unwrap().hide_viewport = true;

        ctx.scene.select(&[a]);
        let report = ctx.apply().unwrap();
        assert_eq!(report.deleted, vec!["dc_bool_obj".to_string()]);
        assert_eq!(report.group, Some(GroupReclaim::Kept { remaining: 1 }));
        assert!(ctx.scene.group(group).unwrap().hide_viewport);
    }
}
