//! TOML scene scripts.
//!
//! A script declares box-shaped entities and a list of steps. Each step may
//! change the selection and mode before running one command.
//!
//! ```toml
//! [[entity]]
//! name = "Base"
//! size = [4.0, 4.0, 4.0]
//!
//! [[entity]]
//! name = "Hole"
//! size = [1.0, 1.0, 6.0]
//!
//! [[step]]
//! select = ["Base", "Hole"]
//! command = "live_add"
//! operator = "difference"
//! ```

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use meshbool::{
    drive, BoolConfig, BoolContext, BooleanParams, Command, CommandStatus, InputEvent,
    InsetRadius, MirrorParams, ModalState, PreconditionError, RadialArray,
};
use meshbool_scene::{
    Axis, BooleanOperator, EntityId, EntityKind, GroupPurpose, MeshData, Mode, Scene,
};
use nalgebra::Vector3;
use serde::Deserialize;
use tracing::{debug, info};

/// A parsed script.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Configuration overrides.
    #[serde(default)]
    pub config: Option<BoolConfig>,
    /// Entities created before the first step.
    #[serde(default, rename = "entity")]
    pub entities: Vec<EntitySpec>,
    /// Steps, run in order.
    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

/// A box-shaped mesh entity.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitySpec {
    pub name: String,
    #[serde(default = "unit_size")]
    pub size: [f64; 3],
    #[serde(default)]
    pub position: [f64; 3],
    /// User group to place the entity in, created on demand.
    #[serde(default)]
    pub group: Option<String>,
    /// Extra disconnected boxes merged into the mesh.
    #[serde(default, rename = "part")]
    pub parts: Vec<PartSpec>,
}

/// A disconnected box inside an entity's mesh.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartSpec {
    #[serde(default = "unit_size")]
    pub size: [f64; 3],
    #[serde(default)]
    pub offset: [f64; 3],
    /// Select the part's vertices for edit mode.
    #[serde(default)]
    pub selected: bool,
}

fn unit_size() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    LiveAdd,
    Immediate,
    Toggle,
    Apply,
    Mirror,
    RadialArray,
    InsetRadius,
    /// Only change selection and mode.
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeSpec {
    Object,
    Edit,
}

/// One modal input event: a name or a pointer move.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventSpec {
    Named(String),
    Move {
        x: f64,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
    },
}

impl EventSpec {
    fn to_event(&self) -> Result<InputEvent> {
        Ok(match self {
            EventSpec::Move { x, ctrl, shift } => InputEvent::PointerMove {
                x: *x,
                ctrl: *ctrl,
                shift: *shift,
            },
            EventSpec::Named(name) => match name.as_str() {
                "wheel_up" => InputEvent::WheelUp,
                "wheel_down" => InputEvent::WheelDown,
                "left_click" | "commit" => InputEvent::LeftClick,
                "cancel" | "esc" => InputEvent::Cancel,
                other => InputEvent::KeyRelease(
                    other
                        .parse::<Axis>()
                        .map_err(|_| anyhow!("unknown event: {other}"))?,
                ),
            },
        })
    }
}

/// One script step.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    pub command: StepKind,
    /// Replace the selection (last name becomes active).
    #[serde(default)]
    pub select: Option<Vec<String>>,
    #[serde(default)]
    pub mode: Option<ModeSpec>,
    #[serde(default)]
    pub operator: Option<BooleanOperator>,
    #[serde(default)]
    pub cutline: bool,
    #[serde(default)]
    pub inset: bool,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub axis: Option<Axis>,
    #[serde(default)]
    pub negative: bool,
    /// Entity for `inset_radius` (defaults to the active one).
    #[serde(default)]
    pub entity: Option<String>,
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

/// Result of one step, for the report.
#[derive(Debug, Clone)]
pub struct StepResult {
    pub index: usize,
    pub command: StepKind,
    pub status: CommandStatus,
}

impl Script {
    /// Parse a script from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("failed to parse script")
    }

    /// Read and parse a script file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Build the initial scene.
    pub fn build_scene(&self) -> Result<Scene> {
        let mut scene = Scene::new();
        for spec in &self.entities {
            let group = match &spec.group {
                Some(name) => Some(match scene.find_group(name) {
                    Some(id) => id,
                    None => scene.create_group(name, GroupPurpose::User, None)?,
                }),
                None => None,
            };

            let mut mesh = MeshData::cuboid(Vector3::from(spec.size));
            for part in &spec.parts {
                let base = mesh.vertex_count() as u32;
                mesh.merge(
                    &MeshData::cuboid(Vector3::from(part.size))
                        .translated(Vector3::from(part.offset)),
                );
                if part.selected {
                    mesh.selected.extend(base..mesh.vertex_count() as u32);
                }
            }

            let id = scene.add_entity(&spec.name, EntityKind::Mesh, mesh, group)?;
            let entity = scene.get_mut(id)?;
            if entity.name != spec.name {
                bail!("duplicate entity name: {}", spec.name);
            }
            entity.transform.translation = Vector3::from(spec.position);
            debug!(entity = %spec.name, "created entity");
        }
        Ok(scene)
    }

    /// Run every step against `ctx`.
    pub fn run(&self, ctx: &mut BoolContext) -> Result<Vec<StepResult>> {
        let mut results = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            let status = step
                .run(ctx)
                .with_context(|| format!("step {} ({:?}) failed", index + 1, step.command))?;
            info!(step = index + 1, command = ?step.command, ?status, "step done");
            results.push(StepResult {
                index: index + 1,
                command: step.command,
                status,
            });
        }
        Ok(results)
    }
}

impl Step {
    fn resolve(scene: &Scene, name: &str) -> Result<EntityId> {
        scene
            .find(name)
            .ok_or_else(|| anyhow!("no entity named {name:?}"))
    }

    fn operator(&self) -> Result<BooleanOperator> {
        self.operator
            .ok_or_else(|| anyhow!("{:?} needs an operator", self.command))
    }

    fn run(&self, ctx: &mut BoolContext) -> Result<CommandStatus> {
        if let Some(names) = &self.select {
            let ids = names
                .iter()
                .map(|n| Self::resolve(&ctx.scene, n))
                .collect::<Result<Vec<_>>>()?;
            ctx.scene.select(&ids);
        }
        if let Some(mode) = self.mode {
            ctx.scene.selection_mut().mode = match mode {
                ModeSpec::Object => Mode::Object,
                ModeSpec::Edit => Mode::Edit,
            };
        }

        let command = match self.command {
            StepKind::Select => return Ok(CommandStatus::Finished),
            StepKind::LiveAdd => Command::LiveAdd(BooleanParams {
                operator: self.operator()?,
                cutline: self.cutline,
                inset: self.inset,
            }),
            StepKind::Immediate => Command::ImmediateBoolean(self.operator()?),
            StepKind::Toggle => Command::ToggleVisibility,
            StepKind::Apply => Command::Apply,
            StepKind::Mirror => Command::AddMirror(MirrorParams {
                local: self.local,
                axis: self.axis.unwrap_or(Axis::X),
                negative: self.negative,
            }),
            StepKind::RadialArray => {
                let mut op = match RadialArray::invoke_about(ctx, self.axis.unwrap_or(Axis::Z)) {
                    Ok(op) => op,
                    Err(meshbool::BoolError::Precondition(reason)) => {
                        return Ok(CommandStatus::Warning(reason.to_string()))
                    }
                    Err(err) => return Err(err.into()),
                };
                return self.drive_modal(&mut op, ctx);
            }
            StepKind::InsetRadius => {
                let entity = match &self.entity {
                    Some(name) => Self::resolve(&ctx.scene, name)?,
                    None => match ctx.scene.selection().active {
                        Some(active) => active,
                        None => {
                            return Ok(CommandStatus::Warning(
                                PreconditionError::NoActiveMesh.to_string(),
                            ))
                        }
                    },
                };
                let mut op = match InsetRadius::invoke(ctx, entity) {
                    Ok(op) => op,
                    Err(meshbool::BoolError::Precondition(reason)) => {
                        return Ok(CommandStatus::Warning(reason.to_string()))
                    }
                    Err(err) => return Err(err.into()),
                };
                return self.drive_modal(&mut op, ctx);
            }
        };
        Ok(ctx.execute(command)?)
    }

    fn drive_modal<M: meshbool::ModalOperator>(
        &self,
        op: &mut M,
        ctx: &mut BoolContext,
    ) -> Result<CommandStatus> {
        let events = self
            .events
            .iter()
            .map(EventSpec::to_event)
            .collect::<Result<Vec<_>>>()?;
        let mut state = drive(op, ctx, events)?;
        if state == ModalState::Previewing {
            // Scripts end interaction implicitly.
            state = op.handle(ctx, InputEvent::LeftClick)?;
        }
        Ok(state.status().unwrap_or(CommandStatus::Finished))
    }
}
