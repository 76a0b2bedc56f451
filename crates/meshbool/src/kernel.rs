//! Geometry kernel seam.
//!
//! The manager never computes CSG itself. Everything that touches actual
//! geometry goes through [`GeometryKernel`], so hosts can plug in a real
//! mesh-boolean backend and tests can inject failures.

use meshbool_scene::{BakedOp, BooleanOperator, MeshData, OperationKind, Transform};
use nalgebra::Point3;
use tracing::trace;

use crate::error::EvaluationError;

/// Geometry plus placement of a boolean source operand.
#[derive(Debug, Clone, Copy)]
pub struct Operand<'a> {
    /// Source geometry in its local frame.
    pub mesh: &'a MeshData,
    /// Source placement.
    pub transform: &'a Transform,
}

/// Evaluates operations into mesh geometry.
pub trait GeometryKernel {
    /// Bake one stack entry into `target`.
    ///
    /// `placement` is the target's own transform. `source` is `Some` for
    /// boolean entries whose source resolved.
    fn apply_operation(
        &mut self,
        target: &mut MeshData,
        placement: &Transform,
        kind: &OperationKind,
        source: Option<Operand<'_>>,
    ) -> Result<(), EvaluationError>;

    /// Edit-mode boolean between the selected and unselected parts of `mesh`.
    fn intersect_selected(
        &mut self,
        mesh: &mut MeshData,
        operator: BooleanOperator,
    ) -> Result<(), EvaluationError>;

    /// Make face winding consistent. Returns the number of reversed faces.
    fn unify_winding(&mut self, mesh: &mut MeshData) -> usize {
        mesh.make_winding_consistent()
    }
}

/// Reference kernel that records bakes instead of computing geometry.
///
/// Each successful bake appends a [`BakedOp`] to the mesh history. It fails
/// deterministically on input a real kernel could not handle: a boolean
/// source without faces, a boolean into an empty target, or an intersection
/// whose operands do not overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryKernel;

fn world_bounds(mesh: &MeshData, transform: &Transform) -> Option<(Point3<f64>, Point3<f64>)> {
    let mut points = mesh.vertices.iter().map(|v| transform.transform_point(v));
    let first = points.next()?;
    Some(points.fold((first, first), |(mut min, mut max), p| {
        for i in 0..3 {
            min[i] = min[i].min(p[i]);
            max[i] = max[i].max(p[i]);
        }
        (min, max)
    }))
}

fn overlaps(a: (Point3<f64>, Point3<f64>), b: (Point3<f64>, Point3<f64>)) -> bool {
    (0..3).all(|i| a.0[i] <= b.1[i] && b.0[i] <= a.1[i])
}

impl GeometryKernel for HistoryKernel {
    fn apply_operation(
        &mut self,
        target: &mut MeshData,
        placement: &Transform,
        kind: &OperationKind,
        source: Option<Operand<'_>>,
    ) -> Result<(), EvaluationError> {
        let baked = match kind {
            OperationKind::Boolean { operator, .. } => {
                let source = source.ok_or(EvaluationError::MissingSource)?;
                if source.mesh.is_empty() {
                    return Err(EvaluationError::Degenerate(
                        "boolean source has no faces".into(),
                    ));
                }
                if target.is_empty() {
                    return Err(EvaluationError::EmptyResult);
                }
                if *operator == BooleanOperator::Intersect {
                    let a = world_bounds(target, placement);
                    let b = world_bounds(source.mesh, source.transform);
                    if !matches!((a, b), (Some(a), Some(b)) if overlaps(a, b)) {
                        return Err(EvaluationError::EmptyResult);
                    }
                }
                BakedOp {
                    label: kind.type_name().to_string(),
                    operator: Some(*operator),
                    source_faces: source.mesh.face_count(),
                }
            }
            OperationKind::Mirror { .. }
            | OperationKind::Solidify { .. }
            | OperationKind::Displace { .. }
            | OperationKind::Array { .. }
            | OperationKind::Other { .. } => BakedOp {
                label: kind.type_name().to_string(),
                operator: None,
                source_faces: 0,
            },
        };
        trace!(label = %baked.label, "baked operation");
        target.history.push(baked);
        Ok(())
    }

    fn intersect_selected(
        &mut self,
        mesh: &mut MeshData,
        operator: BooleanOperator,
    ) -> Result<(), EvaluationError> {
        let selected_faces = mesh.selected_face_count();
        if selected_faces == 0 {
            return Err(EvaluationError::Degenerate("no faces selected".into()));
        }
        if selected_faces == mesh.face_count() {
            return Err(EvaluationError::EmptyResult);
        }
        mesh.history.push(BakedOp {
            label: "INTERSECT_EDIT".to_string(),
            operator: Some(operator),
            source_faces: selected_faces,
        });
        mesh.deselect_all();
        Ok(())
    }
}
