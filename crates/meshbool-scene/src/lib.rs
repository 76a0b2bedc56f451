#![warn(missing_docs)]

//! Scene store for the meshbool modifier-graph manager.
//!
//! This crate is the host side of the boolean manager: it owns mesh entities,
//! their modifier stacks, the grouping containers they live in, and the
//! current selection. It enforces the structural invariants every caller
//! relies on (unique names, no operation pointing at a removed entity) but
//! knows nothing about how booleans are attached or applied; that lives in
//! the `meshbool` crate.
//!
//! Entities and groups are addressed by generational [`slotmap`] keys, so an
//! operation can refer to its source entity without owning it.
//!
//! ```
//! use meshbool_scene::{BooleanOperator, MeshData, Operation, Scene};
//! use nalgebra::Vector3;
//!
//! let mut scene = Scene::new();
//! let target = scene.add_mesh("Base", MeshData::cuboid(Vector3::new(2.0, 2.0, 2.0)));
//! let cutter = scene.add_mesh("Hole", MeshData::cuboid(Vector3::new(0.5, 0.5, 3.0)));
//!
//! scene.get_mut(target).unwrap().stack.push(Operation::boolean(
//!     "Hole",
//!     BooleanOperator::Difference,
//!     cutter,
//! ));
//!
//! assert_eq!(scene.boolean_references(cutter), 1);
//! assert!(scene.delete_entity(cutter).is_err());
//! ```

mod entity;
mod error;
mod group;
mod mesh;
mod operation;
mod scene;
mod selection;

pub use entity::{Constraint, DisplayStyle, Entity, EntityKind, Transform};
pub use error::{Result, SceneError};
pub use group::{Group, GroupPurpose};
pub use mesh::{BakedOp, MeshData};
pub use operation::{Axis, BooleanOperator, Operation, OperationKind};
pub use scene::{ROOT_GROUP_NAME, Scene};
pub use selection::{Mode, Selection};

slotmap::new_key_type! {
    /// Non-owning handle to an [`Entity`] in a [`Scene`].
    pub struct EntityId;

    /// Non-owning handle to a [`Group`] in a [`Scene`].
    pub struct GroupId;
}
