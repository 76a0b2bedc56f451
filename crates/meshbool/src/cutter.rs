//! Turning a selected mesh into a boolean cutter.

use meshbool_scene::{Constraint, DisplayStyle, EntityId, Operation, OperationKind};
use tracing::{debug, instrument};

use crate::context::BoolContext;
use crate::error::Result;
use crate::kernel::GeometryKernel;
use crate::ordering;

/// Name of the solidify entry added in cutline mode.
pub const CUTLINE_OPERATION: &str = "Cutline";

/// Result of [`BoolContext::prepare_cutter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedCutter {
    /// The cutter itself.
    pub source: EntityId,
    /// Shrunk duplicate the cutter follows, when one was created.
    pub inset: Option<EntityId>,
    /// Whether the source was renamed and decorated by this call.
    pub first_use: bool,
}

impl<K: GeometryKernel> BoolContext<K> {
    /// Rename and decorate `source` as a cutter.
    ///
    /// A source already carrying the cutter name is shared between targets:
    /// it keeps its name and decorations and is only set to wireframe.
    #[instrument(skip(self))]
    pub fn prepare_cutter(
        &mut self,
        source: EntityId,
        cutline: bool,
        inset: bool,
    ) -> Result<PreparedCutter> {
        let first_use = !self
            .scene
            .get(source)?
            .name
            .starts_with(&self.config.cutter_name);

        let mut inset_id = None;
        if first_use {
            let cutter_name = self.config.cutter_name.clone();
            let name = self.scene.rename(source, &cutter_name)?;
            debug!(name = %name, "renamed cutter");

            if cutline {
                let thickness = self.config.cutline_thickness;
                let entity = self.scene.get_mut(source)?;
                ordering::insert_bottom(
                    &mut entity.stack,
                    Operation::new(CUTLINE_OPERATION, OperationKind::Solidify { thickness }),
                );
            }

            if inset {
                inset_id = Some(self.create_inset(source)?);
            }
        }

        self.scene.get_mut(source)?.display = DisplayStyle::Wireframe;
        Ok(PreparedCutter {
            source,
            inset: inset_id,
            first_use,
        })
    }

    fn create_inset(&mut self, source: EntityId) -> Result<EntityId> {
        let inset = self.scene.duplicate_entity(source)?;
        let inset_name = self.config.inset_name.clone();
        self.scene.rename(inset, &inset_name)?;

        let factor = self.config.inset_factor;
        let entity = self.scene.get_mut(inset)?;
        entity.mesh.scale_individual_origins(factor);
        entity.display = DisplayStyle::Solid;
        debug!(inset = %entity.full_name(), factor, "created inset");

        self.scene
            .get_mut(source)?
            .constraints
            .push(Constraint::CopyTransforms { target: inset });
        Ok(inset)
    }
}
