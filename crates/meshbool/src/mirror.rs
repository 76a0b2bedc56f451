//! Mirror modifiers in local and world space.

use meshbool_scene::{Axis, EntityId, EntityKind, MeshData, Operation, OperationKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::context::BoolContext;
use crate::error::Result;
use crate::kernel::GeometryKernel;
use crate::ordering;

/// Name of local mirror entries.
pub const LOCAL_MIRROR: &str = "dc_local_mirror";
/// Name of world mirror entries.
pub const WORLD_MIRROR: &str = "dc_world_mirror";
/// Name of the shared world-origin helper.
pub const WORLD_ORIGIN: &str = "dc_world_origin";

/// Parameters of [`BoolContext::add_mirror`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorParams {
    /// Mirror in the entity's own frame instead of about the world origin.
    pub local: bool,
    /// Mirror axis.
    pub axis: Axis,
    /// Copy from the negative side instead of the positive one. Only
    /// bisecting (local) mirrors honour this.
    #[serde(default)]
    pub negative: bool,
}

/// What [`BoolContext::add_mirror`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOutcome {
    /// Entity the mirror was added to.
    pub target: EntityId,
    /// Final name of the new entry.
    pub operation: String,
    /// Stack index of the new entry.
    pub index: usize,
    /// World-origin helper, for world mirrors.
    pub origin: Option<EntityId>,
}

impl<K: GeometryKernel> BoolContext<K> {
    /// Add a mirror to the active mesh.
    ///
    /// Local mirrors sit right after the boolean block. World mirrors go to
    /// the bottom of the stack and mirror about a shared hidden helper at the
    /// world origin.
    #[instrument(skip(self))]
    pub fn add_mirror(&mut self, params: MirrorParams) -> Result<MirrorOutcome> {
        let target = self.active_mesh()?;

        let (origin, name, kind) = if params.local {
            let kind = OperationKind::Mirror {
                axis: params.axis,
                bisect: true,
                flip: params.negative,
                local: true,
                mirror_object: None,
            };
            (None, LOCAL_MIRROR, kind)
        } else {
            let origin = self.world_origin()?;
            let kind = OperationKind::Mirror {
                axis: params.axis,
                bisect: false,
                flip: false,
                local: false,
                mirror_object: Some(origin),
            };
            (Some(origin), WORLD_MIRROR, kind)
        };

        let entity = self.scene.get_mut(target)?;
        let op = Operation::new(name, kind);
        let index = if params.local {
            ordering::insert_local_mirror(&mut entity.stack, op)
        } else {
            ordering::insert_bottom(&mut entity.stack, op)
        };
        let operation = entity.stack[index].name.clone();
        debug!(entity = %entity.full_name(), operation = %operation, index, "added mirror");

        Ok(MirrorOutcome {
            target,
            operation,
            index,
            origin,
        })
    }

    /// The hidden world-origin empty, created in the helpers group if missing.
    fn world_origin(&mut self) -> Result<EntityId> {
        let helpers = self.helpers_group()?;
        let existing = self.scene.get_group(helpers)?.entities.iter().copied().find(|id| {
            self.scene
                .entity(*id)
                .is_some_and(|e| e.name == WORLD_ORIGIN)
        });
        if let Some(origin) = existing {
            return Ok(origin);
        }
        let origin = self.scene.add_entity(
            WORLD_ORIGIN,
            EntityKind::Empty,
            MeshData::default(),
            Some(helpers),
        )?;
        self.scene.get_mut(origin)?.hide_viewport = true;
        debug!("created world origin helper");
        Ok(origin)
    }
}
