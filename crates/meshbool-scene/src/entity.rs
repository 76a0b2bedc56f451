//! Scene entities.

use std::collections::BTreeSet;

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::{EntityId, GroupId, MeshData, Operation};

/// What an entity carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Polygon mesh; eligible as a boolean target or source.
    Mesh,
    /// Transform-only helper (mirror origin, radial pivot).
    Empty,
}

/// Viewport drawing style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStyle {
    /// Shaded surfaces.
    #[default]
    Solid,
    /// Edges only; marks non-rendered boolean inputs.
    Wireframe,
}

/// Local transform: scale, then rotation, then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation.
    pub translation: Vector3<f64>,
    /// Rotation.
    pub rotation: UnitQuaternion<f64>,
    /// Per-axis scale.
    pub scale: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Pure translation.
    pub fn from_translation(translation: Vector3<f64>) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Homogeneous matrix.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }

    /// Map a local point into the parent frame.
    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        let scaled = Point3::from(p.coords.component_mul(&self.scale));
        self.rotation * scaled + self.translation
    }
}

/// Relation owned by the constrained entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Track the target's transform exactly.
    CopyTransforms {
        /// Entity whose transform is copied.
        target: EntityId,
    },
}

impl Constraint {
    /// Entity this constraint reads from.
    pub fn target(&self) -> EntityId {
        match self {
            Constraint::CopyTransforms { target } => *target,
        }
    }
}

/// A mesh or helper in the scene.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Object name, unique in the scene.
    pub name: String,
    /// Name of the underlying mesh data; always renamed with `name`.
    pub data_name: String,
    /// Mesh or helper.
    pub kind: EntityKind,
    /// Geometry.
    pub mesh: MeshData,
    /// Modifier stack, evaluated from index 0 upward.
    pub stack: Vec<Operation>,
    /// Groups this entity is linked into.
    pub groups: BTreeSet<GroupId>,
    /// Viewport style.
    pub display: DisplayStyle,
    /// Local transform.
    pub transform: Transform,
    /// Constraints driving the transform.
    pub constraints: Vec<Constraint>,
    /// Parent entity.
    pub parent: Option<EntityId>,
    /// Hidden in the viewport.
    pub hide_viewport: bool,
}

impl Entity {
    pub(crate) fn new(name: String, kind: EntityKind, mesh: MeshData) -> Self {
        Self {
            data_name: name.clone(),
            name,
            kind,
            mesh,
            stack: Vec::new(),
            groups: BTreeSet::new(),
            display: DisplayStyle::default(),
            transform: Transform::default(),
            constraints: Vec::new(),
            parent: None,
            hide_viewport: false,
        }
    }

    /// `name(data_name)`, for log lines.
    pub fn full_name(&self) -> String {
        format!("{}({})", self.name, self.data_name)
    }

    /// Whether this is a mesh entity.
    pub fn is_mesh(&self) -> bool {
        self.kind == EntityKind::Mesh
    }

    /// Whether any stack entry is a boolean.
    pub fn has_booleans(&self) -> bool {
        self.stack.iter().any(Operation::is_boolean)
    }

    /// Index of the stack entry called `name`.
    pub fn operation_index(&self, name: &str) -> Option<usize> {
        self.stack.iter().position(|op| op.name == name)
    }

    /// Bounds of the mesh after applying this entity's own transform.
    pub fn world_bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut points = self
            .mesh
            .vertices
            .iter()
            .map(|v| self.transform.transform_point(v));
        let first = points.next()?;
        Some(points.fold((first, first), |(mut min, mut max), p| {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
            (min, max)
        }))
    }
}
