//! Modifier-stack entries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EntityId;

/// Boolean combination applied by a [`OperationKind::Boolean`] entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanOperator {
    /// Keep the volume of either operand.
    Union,
    /// Keep the volume shared by both operands.
    Intersect,
    /// Remove the source volume from the target.
    Difference,
}

impl BooleanOperator {
    /// Host-style upper-case tag (`UNION`, `INTERSECT`, `DIFFERENCE`).
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanOperator::Union => "UNION",
            BooleanOperator::Intersect => "INTERSECT",
            BooleanOperator::Difference => "DIFFERENCE",
        }
    }
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BooleanOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "union" | "add" => Ok(BooleanOperator::Union),
            "intersect" | "intersection" => Ok(BooleanOperator::Intersect),
            "difference" | "subtract" => Ok(BooleanOperator::Difference),
            other => Err(format!("unknown boolean operator: {other}")),
        }
    }
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// X axis.
    X,
    /// Y axis.
    Y,
    /// Z axis.
    Z,
}

impl Axis {
    /// Component index (0, 1, 2).
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Axis::X),
            "y" => Ok(Axis::Y),
            "z" => Ok(Axis::Z),
            other => Err(format!("unknown axis: {other}")),
        }
    }
}

/// What a stack entry does, with its parameters.
///
/// The variants form a closed set; stack semantics (ordering, apply count)
/// match on them exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationKind {
    /// CSG combination with another entity.
    Boolean {
        /// Combination mode.
        operator: BooleanOperator,
        /// Entity supplying the second operand.
        source: EntityId,
    },
    /// Mirror across an axis, either in local space or about a helper object.
    Mirror {
        /// Mirror axis.
        axis: Axis,
        /// Cut the mesh at the mirror plane before mirroring.
        bisect: bool,
        /// Keep the negative side when bisecting.
        flip: bool,
        /// Local-mirror marker: local mirrors sit directly after booleans.
        local: bool,
        /// Helper object defining the mirror frame (world mirrors).
        mirror_object: Option<EntityId>,
    },
    /// Constant-thickness shell.
    Solidify {
        /// Shell thickness.
        thickness: f64,
    },
    /// Offset along an axis.
    Displace {
        /// Offset distance.
        strength: f64,
        /// Offset axis.
        direction: Axis,
    },
    /// Repeated copies, optionally driven by an offset object.
    Array {
        /// Number of copies.
        count: u32,
        /// Object whose transform defines the step between copies.
        offset_object: Option<EntityId>,
        /// Vertex weld distance between neighbouring copies.
        merge_threshold: f64,
    },
    /// Any other host modifier the manager only needs to keep in order.
    Other {
        /// Host type tag.
        label: String,
    },
}

impl OperationKind {
    /// Host-style type tag.
    pub fn type_name(&self) -> &str {
        match self {
            OperationKind::Boolean { .. } => "BOOLEAN",
            OperationKind::Mirror { .. } => "MIRROR",
            OperationKind::Solidify { .. } => "SOLIDIFY",
            OperationKind::Displace { .. } => "DISPLACE",
            OperationKind::Array { .. } => "ARRAY",
            OperationKind::Other { label } => label,
        }
    }

    /// Entity this entry refers to, if any.
    pub fn referenced_entity(&self) -> Option<EntityId> {
        match self {
            OperationKind::Boolean { source, .. } => Some(*source),
            OperationKind::Mirror { mirror_object, .. } => *mirror_object,
            OperationKind::Array { offset_object, .. } => *offset_object,
            OperationKind::Solidify { .. }
            | OperationKind::Displace { .. }
            | OperationKind::Other { .. } => None,
        }
    }
}

/// One named entry in an entity's modifier stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// Name, unique within its stack.
    pub name: String,
    /// Behaviour and parameters.
    pub kind: OperationKind,
}

impl Operation {
    /// Create a stack entry.
    pub fn new(name: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a boolean entry.
    pub fn boolean(name: impl Into<String>, operator: BooleanOperator, source: EntityId) -> Self {
        Self::new(name, OperationKind::Boolean { operator, source })
    }

    /// Whether this is a boolean entry.
    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, OperationKind::Boolean { .. })
    }

    /// Whether this carries the local-mirror marker.
    pub fn is_local_mirror(&self) -> bool {
        matches!(self.kind, OperationKind::Mirror { local: true, .. })
    }

    /// Source entity of a boolean entry.
    pub fn boolean_source(&self) -> Option<EntityId> {
        match self.kind {
            OperationKind::Boolean { source, .. } => Some(source),
            _ => None,
        }
    }
}
