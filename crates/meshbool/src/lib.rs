#![warn(missing_docs)]

//! Non-destructive boolean (CSG) modifier management.
//!
//! `meshbool` attaches union, intersect and difference operations to mesh
//! entities as live stack entries, keeps their cutters organized in a shared
//! boolean group, and bakes them on demand while reclaiming cutters that
//! nothing refers to anymore. Geometry evaluation is delegated to a
//! [`GeometryKernel`]; the scene itself lives in [`meshbool_scene`].
//!
//! # Example
//!
//! ```
//! use meshbool::{BoolContext, BooleanParams, Command, CommandStatus};
//! use meshbool_scene::{BooleanOperator, MeshData, Scene};
//! use nalgebra::Vector3;
//!
//! let mut scene = Scene::new();
//! let base = scene.add_mesh("Base", MeshData::cuboid(Vector3::new(4.0, 4.0, 4.0)));
//! let hole = scene.add_mesh("Hole", MeshData::cuboid(Vector3::new(1.0, 1.0, 6.0)));
//! scene.select(&[base, hole]);
//!
//! let mut ctx = BoolContext::with_scene(scene);
//! let status = ctx
//!     .execute(Command::LiveAdd(BooleanParams::new(BooleanOperator::Difference)))
//!     .unwrap();
//! assert_eq!(status, CommandStatus::Finished);
//! assert_eq!(ctx.scene.get(hole).unwrap().name, "dc_bool_obj");
//!
//! // Baking the boolean removes the now unused cutter.
//! ctx.execute(Command::Apply).unwrap();
//! assert!(!ctx.scene.contains(hole));
//! ```

pub mod apply;
pub mod command;
pub mod config;
pub mod context;
pub mod cutter;
pub mod error;
pub mod groups;
pub mod immediate;
pub mod kernel;
pub mod live;
pub mod mirror;
pub mod modal;
pub mod ordering;
pub mod visibility;

pub use apply::ApplyReport;
pub use command::{Command, CommandStatus};
pub use config::BoolConfig;
pub use context::BoolContext;
pub use cutter::PreparedCutter;
pub use error::{BoolError, ConfigError, EvaluationError, PreconditionError, Result};
pub use groups::{ForceShown, GroupReclaim};
pub use immediate::ImmediateOutcome;
pub use kernel::{GeometryKernel, HistoryKernel, Operand};
pub use live::{BooleanParams, LiveOutcome};
pub use mirror::{MirrorOutcome, MirrorParams};
pub use modal::{drive, InputEvent, InsetRadius, ModalOperator, ModalState, RadialArray};
