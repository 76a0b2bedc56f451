//! Interactive operators driven by input events.
//!
//! A modal operator is invoked once, previews its effect while events
//! arrive, and ends either committed or cancelled. Cancel restores exactly
//! what the operator changed since invoke.

use meshbool_scene::{Axis, Entity, EntityId, EntityKind, MeshData, Operation, OperationKind};
use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info, instrument};

use crate::command::CommandStatus;
use crate::config::MAX_RADIAL_COUNT;
use crate::context::BoolContext;
use crate::error::{BoolError, PreconditionError, Result};
use crate::kernel::GeometryKernel;
use crate::ordering;

/// Name prefix of the displace entry driven by [`RadialArray`].
pub const RADIAL_OFFSET: &str = "dc_offset";
/// Name prefix of the array entry driven by [`RadialArray`].
pub const RADIAL_ARRAY: &str = "dc_radial";

/// Lifecycle of a modal operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalState {
    /// Not yet invoked.
    Idle,
    /// Invoked; events adjust the preview.
    Previewing,
    /// Ended, keeping the changes.
    Committed,
    /// Ended, all changes rolled back.
    Cancelled,
}

impl ModalState {
    /// Whether no further events are accepted.
    pub fn is_finished(&self) -> bool {
        matches!(self, ModalState::Committed | ModalState::Cancelled)
    }

    /// Command status for a finished operator.
    pub fn status(&self) -> Option<CommandStatus> {
        match self {
            ModalState::Committed => Some(CommandStatus::Finished),
            ModalState::Cancelled => Some(CommandStatus::Cancelled),
            ModalState::Idle | ModalState::Previewing => None,
        }
    }
}

/// Input delivered to a modal operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Pointer moved to horizontal position `x`.
    PointerMove {
        /// Horizontal pointer position.
        x: f64,
        /// Ctrl held.
        ctrl: bool,
        /// Shift held.
        shift: bool,
    },
    /// Wheel scrolled up.
    WheelUp,
    /// Wheel scrolled down.
    WheelDown,
    /// Axis key released.
    KeyRelease(Axis),
    /// Primary button clicked.
    LeftClick,
    /// Right click or escape.
    Cancel,
}

/// An operator that consumes [`InputEvent`]s until it finishes.
pub trait ModalOperator {
    /// Current state.
    fn state(&self) -> ModalState;

    /// Handle one event, returning the new state.
    fn handle<K: GeometryKernel>(
        &mut self,
        ctx: &mut BoolContext<K>,
        event: InputEvent,
    ) -> Result<ModalState>;
}

/// Feed `events` to `op` until it finishes or the events run out.
pub fn drive<K, M>(
    op: &mut M,
    ctx: &mut BoolContext<K>,
    events: impl IntoIterator<Item = InputEvent>,
) -> Result<ModalState>
where
    K: GeometryKernel,
    M: ModalOperator,
{
    for event in events {
        if op.handle(ctx, event)?.is_finished() {
            break;
        }
    }
    Ok(op.state())
}

fn stack_entry<'a>(entity: &'a mut Entity, name: &str) -> Result<&'a mut OperationKind> {
    let full_name = entity.full_name();
    entity
        .stack
        .iter_mut()
        .find(|op| op.name == name)
        .map(|op| &mut op.kind)
        .ok_or_else(|| BoolError::MissingOperation {
            entity: full_name,
            operation: name.to_string(),
        })
}

// =============================================================================
// Radial array
// =============================================================================

/// Parameters an adopted radial array had at invoke.
#[derive(Debug, Clone, Copy, PartialEq)]
struct RadialSnapshot {
    strength: f64,
    direction: Axis,
    count: u32,
    pivot_rotation: UnitQuaternion<f64>,
    pivot_hidden: bool,
}

/// Spread copies of the active mesh around a pivot.
///
/// Creates (or adopts) a displace entry that pushes geometry away from the
/// pivot and an array entry that repeats it `count` times, each copy rotated
/// by `360° / count` about the view axis.
#[derive(Debug, Clone)]
pub struct RadialArray {
    target: EntityId,
    pivot: EntityId,
    offset: String,
    radial: String,
    axis: Axis,
    snapshot: Option<RadialSnapshot>,
    created_helpers: bool,
    last_x: Option<f64>,
    state: ModalState,
}

impl RadialArray {
    /// Start on the active mesh, rotating about Z.
    pub fn invoke<K: GeometryKernel>(ctx: &mut BoolContext<K>) -> Result<Self> {
        Self::invoke_about(ctx, Axis::Z)
    }

    /// Start on the active mesh, rotating about `axis`.
    #[instrument(skip(ctx))]
    pub fn invoke_about<K: GeometryKernel>(ctx: &mut BoolContext<K>, axis: Axis) -> Result<Self> {
        let target = ctx.active_mesh()?;
        if let Some(op) = Self::adopt(ctx, target, axis)? {
            return Ok(op);
        }

        let had_helpers = ctx.helpers_group.is_some_and(|g| ctx.scene.group(g).is_some())
            || ctx
                .scene
                .find_group(&ctx.config.helpers_group)
                .is_some();
        let helpers = ctx.helpers_group()?;

        let entity = ctx.scene.get(target)?;
        let pivot_name = format!("{}_world_radial", entity.name);
        let centre = entity
            .mesh
            .centroid()
            .map(|c| entity.transform.transform_point(&c))
            .unwrap_or_else(|| entity.transform.translation.into());

        let pivot = ctx.scene.add_entity(
            &pivot_name,
            EntityKind::Empty,
            MeshData::default(),
            Some(helpers),
        )?;
        {
            let p = ctx.scene.get_mut(pivot)?;
            p.parent = Some(target);
            p.transform.translation = centre.coords;
        }

        let count = ctx.config.radial_count;
        let threshold = ctx.config.radial_merge_threshold;
        let entity = ctx.scene.get_mut(target)?;
        let offset_index = ordering::insert_bottom(
            &mut entity.stack,
            Operation::new(
                RADIAL_OFFSET,
                OperationKind::Displace {
                    strength: 0.0,
                    direction: Axis::Y,
                },
            ),
        );
        let offset = entity.stack[offset_index].name.clone();
        let radial_index = ordering::insert_bottom(
            &mut entity.stack,
            Operation::new(
                RADIAL_ARRAY,
                OperationKind::Array {
                    count,
                    offset_object: Some(pivot),
                    merge_threshold: threshold,
                },
            ),
        );
        let radial = entity.stack[radial_index].name.clone();

        let op = Self {
            target,
            pivot,
            offset,
            radial,
            axis,
            snapshot: None,
            created_helpers: !had_helpers,
            last_x: None,
            state: ModalState::Previewing,
        };
        op.rotate_pivot(ctx, 0, count)?;
        info!(pivot = %pivot_name, count, "started radial array");
        Ok(op)
    }

    fn adopt<K: GeometryKernel>(
        ctx: &mut BoolContext<K>,
        target: EntityId,
        axis: Axis,
    ) -> Result<Option<Self>> {
        let entity = ctx.scene.get(target)?;
        let offset = entity.stack.iter().rev().find_map(|op| match op.kind {
            OperationKind::Displace {
                strength,
                direction,
            } if op.name.starts_with(RADIAL_OFFSET) => Some((op.name.clone(), strength, direction)),
            _ => None,
        });
        let radial = entity.stack.iter().rev().find_map(|op| match op.kind {
            OperationKind::Array {
                count,
                offset_object: Some(pivot),
                ..
            } if op.name.starts_with(RADIAL_ARRAY) => Some((op.name.clone(), count, pivot)),
            _ => None,
        });
        let (Some((offset, strength, direction)), Some((radial, count, pivot))) = (offset, radial)
        else {
            return Ok(None);
        };
        let Some(p) = ctx.scene.entity_mut(pivot) else {
            return Ok(None);
        };

        let snapshot = RadialSnapshot {
            strength,
            direction,
            count,
            pivot_rotation: p.transform.rotation,
            pivot_hidden: p.hide_viewport,
        };
        p.hide_viewport = false;
        debug!(radial = %radial, count, "adopted existing radial array");
        Ok(Some(Self {
            target,
            pivot,
            offset,
            radial,
            axis,
            snapshot: Some(snapshot),
            created_helpers: false,
            last_x: None,
            state: ModalState::Previewing,
        }))
    }

    /// Entity the array is applied to.
    pub fn target(&self) -> EntityId {
        self.target
    }

    /// Pivot helper driving the array step.
    pub fn pivot(&self) -> EntityId {
        self.pivot
    }

    /// Whether the operator adopted an existing radial array.
    pub fn adopted(&self) -> bool {
        self.snapshot.is_some()
    }

    fn count<K: GeometryKernel>(&self, ctx: &mut BoolContext<K>) -> Result<u32> {
        match stack_entry(ctx.scene.get_mut(self.target)?, &self.radial)? {
            OperationKind::Array { count, .. } => Ok(*count),
            _ => Ok(1),
        }
    }

    fn set_count<K: GeometryKernel>(&mut self, ctx: &mut BoolContext<K>, new: u32) -> Result<()> {
        let old = self.count(ctx)?;
        if let OperationKind::Array { count, .. } =
            stack_entry(ctx.scene.get_mut(self.target)?, &self.radial)?
        {
            *count = new;
        }
        self.rotate_pivot(ctx, old, new)
    }

    /// Turn the pivot from a `360 / old` step to a `360 / new` step.
    /// `old == 0` means the pivot has not been turned yet.
    fn rotate_pivot<K: GeometryKernel>(
        &self,
        ctx: &mut BoolContext<K>,
        old: u32,
        new: u32,
    ) -> Result<()> {
        let step = |n: u32| {
            if n == 0 {
                0.0
            } else {
                std::f64::consts::TAU / f64::from(n)
            }
        };
        let delta = step(old) - step(new);
        let axis = match self.axis {
            Axis::X => Vector3::x_axis(),
            Axis::Y => Vector3::y_axis(),
            Axis::Z => Vector3::z_axis(),
        };
        let pivot = ctx.scene.get_mut(self.pivot)?;
        pivot.transform.rotation = UnitQuaternion::from_axis_angle(&axis, delta) * pivot.transform.rotation;
        Ok(())
    }

    fn displace<K: GeometryKernel>(
        &self,
        ctx: &mut BoolContext<K>,
        edit: impl FnOnce(&mut f64, &mut Axis),
    ) -> Result<()> {
        if let OperationKind::Displace {
            strength,
            direction,
        } = stack_entry(ctx.scene.get_mut(self.target)?, &self.offset)?
        {
            edit(strength, direction);
        }
        Ok(())
    }

    fn rollback<K: GeometryKernel>(&mut self, ctx: &mut BoolContext<K>) -> Result<()> {
        match self.snapshot {
            Some(snapshot) => {
                self.displace(ctx, |strength, direction| {
                    *strength = snapshot.strength;
                    *direction = snapshot.direction;
                })?;
                if let OperationKind::Array { count, .. } =
                    stack_entry(ctx.scene.get_mut(self.target)?, &self.radial)?
                {
                    *count = snapshot.count;
                }
                let pivot = ctx.scene.get_mut(self.pivot)?;
                pivot.transform.rotation = snapshot.pivot_rotation;
                pivot.hide_viewport = snapshot.pivot_hidden;
            }
            None => {
                let entity = ctx.scene.get_mut(self.target)?;
                entity
                    .stack
                    .retain(|op| op.name != self.offset && op.name != self.radial);
                ctx.scene.delete_entity(self.pivot)?;
                if self.created_helpers {
                    if let Some(helpers) = ctx.helpers_group {
                        let reclaim = ctx.delete_group_if_empty(helpers)?;
                        debug!(?reclaim, "reclaimed helpers group");
                    }
                }
            }
        }
        Ok(())
    }
}

impl ModalOperator for RadialArray {
    fn state(&self) -> ModalState {
        self.state
    }

    fn handle<K: GeometryKernel>(
        &mut self,
        ctx: &mut BoolContext<K>,
        event: InputEvent,
    ) -> Result<ModalState> {
        if self.state != ModalState::Previewing {
            return Ok(self.state);
        }
        match event {
            InputEvent::PointerMove { x, ctrl, shift } => {
                if !ctrl {
                    self.last_x = None;
                    return Ok(self.state);
                }
                if let Some(last) = self.last_x {
                    let scale = if shift { 100.0 } else { 10.0 };
                    let delta = (x - last) / scale;
                    self.displace(ctx, |strength, _| *strength += delta)?;
                }
                self.last_x = Some(x);
            }
            InputEvent::WheelUp => {
                let count = self.count(ctx)?;
                if count < MAX_RADIAL_COUNT {
                    self.set_count(ctx, count + 1)?;
                }
            }
            InputEvent::WheelDown => {
                let count = self.count(ctx)?;
                if count > 1 {
                    self.set_count(ctx, count - 1)?;
                }
            }
            InputEvent::KeyRelease(axis) => {
                self.displace(ctx, |_, direction| *direction = axis)?;
            }
            InputEvent::LeftClick => {
                ctx.scene.get_mut(self.pivot)?.hide_viewport = true;
                self.state = ModalState::Committed;
                debug!(radial = %self.radial, "committed radial array");
            }
            InputEvent::Cancel => {
                self.rollback(ctx)?;
                self.state = ModalState::Cancelled;
                debug!(radial = %self.radial, "cancelled radial array");
            }
        }
        Ok(self.state)
    }
}

// =============================================================================
// Inset radius
// =============================================================================

/// Interactively grow or shrink an inset.
#[derive(Debug, Clone)]
pub struct InsetRadius {
    inset: EntityId,
    original: MeshData,
    factor: f64,
    state: ModalState,
}

impl InsetRadius {
    /// Start on `entity`, or on the inset it follows when it is a cutter.
    #[instrument(skip(ctx))]
    pub fn invoke<K: GeometryKernel>(ctx: &mut BoolContext<K>, entity: EntityId) -> Result<Self> {
        let e = ctx.scene.get(entity)?;
        let inset = e
            .constraints
            .iter()
            .map(|c| c.target())
            .find(|t| {
                ctx.scene
                    .entity(*t)
                    .is_some_and(|t| t.name.starts_with(&ctx.config.inset_name))
            })
            .unwrap_or(entity);
        let inset_entity = ctx.scene.get(inset)?;
        if !inset_entity.is_mesh() {
            return Err(PreconditionError::NoActiveMesh.into());
        }
        Ok(Self {
            inset,
            original: inset_entity.mesh.clone(),
            factor: 1.0,
            state: ModalState::Previewing,
        })
    }

    /// Entity being scaled.
    pub fn inset(&self) -> EntityId {
        self.inset
    }

    /// Accumulated scale relative to invoke.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    fn scale<K: GeometryKernel>(&mut self, ctx: &mut BoolContext<K>, by: f64) -> Result<()> {
        ctx.scene
            .get_mut(self.inset)?
            .mesh
            .scale_individual_origins(by);
        self.factor *= by;
        Ok(())
    }
}

impl ModalOperator for InsetRadius {
    fn state(&self) -> ModalState {
        self.state
    }

    fn handle<K: GeometryKernel>(
        &mut self,
        ctx: &mut BoolContext<K>,
        event: InputEvent,
    ) -> Result<ModalState> {
        if self.state != ModalState::Previewing {
            return Ok(self.state);
        }
        let step = ctx.config.inset_step;
        match event {
            InputEvent::WheelUp => self.scale(ctx, 1.0 + step)?,
            InputEvent::WheelDown => self.scale(ctx, 1.0 - step)?,
            InputEvent::LeftClick => {
                self.state = ModalState::Committed;
                debug!(factor = self.factor, "committed inset");
            }
            InputEvent::Cancel => {
                ctx.scene.get_mut(self.inset)?.mesh = self.original.clone();
                self.factor = 1.0;
                self.state = ModalState::Cancelled;
            }
            InputEvent::PointerMove { .. } | InputEvent::KeyRelease(_) => {}
        }
        Ok(self.state)
    }
}
