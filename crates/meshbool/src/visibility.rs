//! Cutter visibility.

use meshbool_scene::EntityId;
use tracing::{debug, instrument};

use crate::context::BoolContext;
use crate::error::{PreconditionError, Result};
use crate::kernel::GeometryKernel;

impl<K: GeometryKernel> BoolContext<K> {
    /// Active entity if it is a mesh.
    pub(crate) fn active_mesh(&self) -> Result<EntityId> {
        self.scene
            .selection()
            .active
            .filter(|id| self.scene.entity(*id).is_some_and(|e| e.is_mesh()))
            .ok_or_else(|| PreconditionError::NoActiveMesh.into())
    }

    /// Flip viewport visibility of the boolean group.
    ///
    /// Returns the new `hide_viewport` flag, or `None` when there is no
    /// boolean group.
    #[instrument(skip(self))]
    pub fn toggle_visibility(&mut self) -> Result<Option<bool>> {
        self.active_mesh()?;
        let Some(group) = self.current_boolean_group() else {
            debug!("no boolean group to toggle");
            return Ok(None);
        };
        let Some(g) = self.scene.group_mut(group) else {
            return Ok(None);
        };
        g.hide_viewport = !g.hide_viewport;
        debug!(group = %g.name, hidden = g.hide_viewport, "toggled cutters");
        Ok(Some(g.hide_viewport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::live::BooleanParams;
    use crate::BoolError;
    use meshbool_scene::{BooleanOperator, MeshData, Scene};
    use nalgebra::Vector3;

    #[test]
    fn test_toggle_flips_group() {
        let mut scene = Scene::new();
        let a = scene.add_mesh("A", MeshData::cuboid(Vector3::new(2.0, 2.0, 2.0)));
        let b = scene.add_mesh("B", MeshData::cuboid(Vector3::new(1.0, 1.0, 1.0)));
        scene.select(&[a, b]);
        let mut ctx = BoolContext::with_scene(scene);

        assert_eq!(ctx.toggle_visibility().unwrap(), None);

        ctx.live_add(BooleanParams::new(BooleanOperator::Difference))
            .unwrap();
        assert_eq!(ctx.toggle_visibility().unwrap(), Some(true));
        assert_eq!(ctx.toggle_visibility().unwrap(), Some(false));
    }

    #[test]
    fn test_toggle_requires_active_mesh() {
        let mut ctx = BoolContext::with_scene(Scene::new());
        assert!(matches!(
            ctx.toggle_visibility(),
            Err(BoolError::Precondition(PreconditionError::NoActiveMesh))
        ));
    }
}
