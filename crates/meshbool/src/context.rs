//! The manager's mutable state.

use meshbool_scene::{EntityId, GroupId, OperationKind, Scene};
use tracing::warn;

use crate::config::BoolConfig;
use crate::error::EvaluationError;
use crate::kernel::{GeometryKernel, HistoryKernel, Operand};

/// Scene, kernel and configuration that every command runs against.
///
/// Holds the cached handles of the shared boolean and helpers groups.
/// Commands take `&mut self`; a context is never shared between threads.
#[derive(Debug)]
pub struct BoolContext<K = HistoryKernel> {
    /// Scene being edited.
    pub scene: Scene,
    /// Geometry backend.
    pub kernel: K,
    /// Names and defaults.
    pub config: BoolConfig,
    pub(crate) boolean_group: Option<GroupId>,
    pub(crate) helpers_group: Option<GroupId>,
}

impl BoolContext<HistoryKernel> {
    /// Context with the reference kernel and default configuration.
    pub fn with_scene(scene: Scene) -> Self {
        Self::new(scene, HistoryKernel, BoolConfig::default())
    }
}

impl<K: GeometryKernel> BoolContext<K> {
    /// Create a context.
    pub fn new(scene: Scene, kernel: K, config: BoolConfig) -> Self {
        Self {
            scene,
            kernel,
            config,
            boolean_group: None,
            helpers_group: None,
        }
    }

    /// Give the scene back.
    pub fn into_scene(self) -> Scene {
        self.scene
    }

    /// Bake stack entry `index` of `target` into its mesh and remove it.
    ///
    /// The entry is removed whether or not the bake succeeds.
    pub(crate) fn bake_operation(
        &mut self,
        target: EntityId,
        index: usize,
    ) -> Result<(), EvaluationError> {
        let Some(entity) = self.scene.entity_mut(target) else {
            return Err(EvaluationError::MissingSource);
        };
        if index >= entity.stack.len() {
            return Err(EvaluationError::Unsupported(format!(
                "no stack entry at index {index}"
            )));
        }
        let op = entity.stack.remove(index);
        let placement = entity.transform;
        let mut mesh = std::mem::take(&mut entity.mesh);

        let result = {
            let source = match &op.kind {
                OperationKind::Boolean { source, .. } if *source != target => {
                    self.scene.entity(*source).map(|e| Operand {
                        mesh: &e.mesh,
                        transform: &e.transform,
                    })
                }
                _ => None,
            };
            self.kernel
                .apply_operation(&mut mesh, &placement, &op.kind, source)
        };

        if let Some(entity) = self.scene.entity_mut(target) {
            entity.mesh = mesh;
            if let Err(err) = &result {
                warn!(
                    entity = %entity.full_name(),
                    operation = %op.name,
                    kind = op.kind.type_name(),
                    error = %err,
                    "failed to apply operation, removing it"
                );
            }
        }
        result
    }
}
