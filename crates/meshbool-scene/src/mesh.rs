//! Polygon mesh data attached to an entity.

use std::collections::{BTreeSet, HashMap, VecDeque};

use nalgebra::{Point3, Vector3};

use crate::BooleanOperator;

/// Record of one stack entry baked into a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct BakedOp {
    /// Host type tag or operation name of the baked entry.
    pub label: String,
    /// Boolean operator, for boolean bakes.
    pub operator: Option<BooleanOperator>,
    /// Face count of the source operand at bake time (0 when there is none).
    pub source_faces: usize,
}

/// Polygon mesh with an edit-mode vertex selection.
///
/// Faces are vertex-index loops, counter-clockwise when seen from outside.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions in local space.
    pub vertices: Vec<Point3<f64>>,
    /// Polygon faces as vertex-index loops.
    pub faces: Vec<Vec<u32>>,
    /// Edit-mode vertex selection.
    pub selected: BTreeSet<u32>,
    /// Operations baked into this geometry, oldest first.
    pub history: Vec<BakedOp>,
}

impl MeshData {
    /// Create a mesh from raw vertices and faces.
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<Vec<u32>>) -> Self {
        Self {
            vertices,
            faces,
            ..Self::default()
        }
    }

    /// Axis-aligned box centered at origin.
    pub fn cuboid(size: Vector3<f64>) -> Self {
        let h = size / 2.0;
        let vertices = (0..8)
            .map(|i| {
                Point3::new(
                    if i & 1 == 0 { -h.x } else { h.x },
                    if i & 2 == 0 { -h.y } else { h.y },
                    if i & 4 == 0 { -h.z } else { h.z },
                )
            })
            .collect();
        let faces = vec![
            vec![0, 2, 3, 1],
            vec![4, 5, 7, 6],
            vec![0, 1, 5, 4],
            vec![2, 6, 7, 3],
            vec![0, 4, 6, 2],
            vec![1, 3, 7, 5],
        ];
        Self::new(vertices, faces)
    }

    /// Translate every vertex.
    pub fn translated(mut self, offset: Vector3<f64>) -> Self {
        for v in &mut self.vertices {
            *v += offset;
        }
        self
    }

    /// Append another mesh as a disconnected component.
    pub fn merge(&mut self, other: &MeshData) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|f| f.iter().map(|i| i + base).collect::<Vec<_>>()),
        );
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// A mesh without faces has no volume to combine.
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    // =========================================================================
    // Selection
    // =========================================================================

    /// Select every vertex.
    pub fn select_all(&mut self) {
        self.selected = (0..self.vertices.len() as u32).collect();
    }

    /// Clear the vertex selection.
    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// Number of selected vertices.
    pub fn selected_vertex_count(&self) -> usize {
        self.selected.len()
    }

    /// Number of faces whose vertices are all selected.
    pub fn selected_face_count(&self) -> usize {
        self.faces
            .iter()
            .filter(|f| f.iter().all(|i| self.selected.contains(i)))
            .count()
    }

    /// Whether every vertex is selected.
    pub fn is_fully_selected(&self) -> bool {
        !self.vertices.is_empty() && self.selected.len() == self.vertices.len()
    }

    /// Grow the selection to every connected component it touches.
    pub fn select_linked(&mut self) {
        let mut grown = BTreeSet::new();
        for component in self.components() {
            if component.iter().any(|i| self.selected.contains(i)) {
                grown.extend(component);
            }
        }
        self.selected = grown;
    }

    /// Split the selected geometry off into a new mesh.
    ///
    /// Selected vertices and the faces built only from them move to the
    /// returned mesh; faces that touch a selected vertex are removed from
    /// `self`. Both selections are cleared.
    pub fn separate_selected(&mut self) -> MeshData {
        let mut taken = MeshData::default();
        let mut kept = MeshData::default();
        let mut remap_taken = HashMap::new();
        let mut remap_kept = HashMap::new();

        for (i, v) in self.vertices.iter().enumerate() {
            let i = i as u32;
            if self.selected.contains(&i) {
                remap_taken.insert(i, taken.vertices.len() as u32);
                taken.vertices.push(*v);
            } else {
                remap_kept.insert(i, kept.vertices.len() as u32);
                kept.vertices.push(*v);
            }
        }

        for face in &self.faces {
            if let Some(f) = face
                .iter()
                .map(|i| remap_taken.get(i).copied())
                .collect::<Option<Vec<u32>>>()
            {
                taken.faces.push(f);
            } else if let Some(f) = face
                .iter()
                .map(|i| remap_kept.get(i).copied())
                .collect::<Option<Vec<u32>>>()
            {
                kept.faces.push(f);
            }
        }

        kept.history = std::mem::take(&mut self.history);
        *self = kept;
        taken
    }

    // =========================================================================
    // Topology
    // =========================================================================

    /// Connected components as sorted vertex-index lists.
    ///
    /// Vertices not used by any face form their own component.
    pub fn components(&self) -> Vec<Vec<u32>> {
        let n = self.vertices.len();
        let mut parent: Vec<usize> = (0..n).collect();

        fn root(parent: &mut [usize], mut i: usize) -> usize {
            while parent[i] != i {
                parent[i] = parent[parent[i]];
                i = parent[i];
            }
            i
        }

        for face in &self.faces {
            if let Some((&first, rest)) = face.split_first() {
                for &other in rest {
                    let a = root(&mut parent, first as usize);
                    let b = root(&mut parent, other as usize);
                    if a != b {
                        parent[b] = a;
                    }
                }
            }
        }

        let mut groups: Vec<(usize, Vec<u32>)> = Vec::new();
        let mut slot: HashMap<usize, usize> = HashMap::new();
        for i in 0..n {
            let r = root(&mut parent, i);
            let idx = *slot.entry(r).or_insert_with(|| {
                groups.push((r, Vec::new()));
                groups.len() - 1
            });
            groups[idx].1.push(i as u32);
        }
        groups.into_iter().map(|(_, verts)| verts).collect()
    }

    /// Mean of all vertex positions.
    pub fn centroid(&self) -> Option<Point3<f64>> {
        centroid_of(self.vertices.iter())
    }

    /// Axis-aligned bounds in local space.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = *first;
        let mut max = *first;
        for v in &self.vertices[1..] {
            for i in 0..3 {
                min[i] = min[i].min(v[i]);
                max[i] = max[i].max(v[i]);
            }
        }
        Some((min, max))
    }

    /// Scale each connected component about its own centroid.
    pub fn scale_individual_origins(&mut self, factor: f64) {
        for component in self.components() {
            let Some(center) = centroid_of(component.iter().map(|&i| &self.vertices[i as usize]))
            else {
                continue;
            };
            for &i in &component {
                let v = &mut self.vertices[i as usize];
                *v = center + (*v - center) * factor;
            }
        }
    }

    /// Signed volume enclosed by the faces (positive for outward winding).
    pub fn signed_volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| self.face_signed_volume(f))
            .sum()
    }

    fn face_signed_volume(&self, face: &[u32]) -> f64 {
        if face.len() < 3 {
            return 0.0;
        }
        let p0 = self.vertices[face[0] as usize].coords;
        face[1..]
            .windows(2)
            .map(|w| {
                let p1 = self.vertices[w[0] as usize].coords;
                let p2 = self.vertices[w[1] as usize].coords;
                p0.dot(&p1.cross(&p2)) / 6.0
            })
            .sum()
    }

    /// Make face winding consistent across shared edges, outward-facing.
    ///
    /// Returns the number of face reversals performed.
    pub fn make_winding_consistent(&mut self) -> usize {
        let mut edge_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();
        for (fi, face) in self.faces.iter().enumerate() {
            for (a, b) in loop_edges(face) {
                edge_faces.entry((a.min(b), a.max(b))).or_default().push(fi);
            }
        }

        let mut reversals = 0;
        let mut visited = vec![false; self.faces.len()];
        for seed in 0..self.faces.len() {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;
            let mut shell = vec![seed];
            let mut queue = VecDeque::from([seed]);

            while let Some(f) = queue.pop_front() {
                let edges: Vec<(u32, u32)> = loop_edges(&self.faces[f]).collect();
                for (a, b) in edges {
                    let Some(neighbours) = edge_faces.get(&(a.min(b), a.max(b))) else {
                        continue;
                    };
                    for &g in neighbours {
                        if g == f || visited[g] {
                            continue;
                        }
                        visited[g] = true;
                        // A consistent neighbour walks the shared edge b -> a.
                        if loop_edges(&self.faces[g]).any(|e| e == (a, b)) {
                            self.faces[g].reverse();
                            reversals += 1;
                        }
                        shell.push(g);
                        queue.push_back(g);
                    }
                }
            }

            let volume: f64 = shell
                .iter()
                .map(|&f| self.face_signed_volume(&self.faces[f]))
                .sum();
            if volume < 0.0 {
                for &f in &shell {
                    self.faces[f].reverse();
                }
                reversals += shell.len();
            }
        }
        reversals
    }
}

fn loop_edges(face: &[u32]) -> impl Iterator<Item = (u32, u32)> + '_ {
    face.iter()
        .zip(face.iter().cycle().skip(1))
        .map(|(&a, &b)| (a, b))
}

fn centroid_of<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Option<Point3<f64>> {
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for p in points {
        sum += p.coords;
        count += 1;
    }
    (count > 0).then(|| Point3::from(sum / count as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn two_cubes() -> MeshData {
        let mut mesh = MeshData::cuboid(Vector3::new(2.0, 2.0, 2.0));
        mesh.merge(
            &MeshData::cuboid(Vector3::new(1.0, 1.0, 1.0)).translated(Vector3::new(5.0, 0.0, 0.0)),
        );
        mesh
    }

    #[test]
    fn test_cuboid_volume() {
        let cube = MeshData::cuboid(Vector3::new(2.0, 3.0, 4.0));
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.face_count(), 6);
        assert_relative_eq!(cube.signed_volume(), 24.0, epsilon = 1e-9);
    }

    #[test]
    fn test_components() {
        let mesh = two_cubes();
        let components = mesh.components();
        assert_eq!(components.len(), 2);
        assert_eq!(components[0], (0..8).collect::<Vec<_>>());
        assert_eq!(components[1], (8..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_select_linked_grows_to_component() {
        let mut mesh = two_cubes();
        mesh.selected.insert(9);
        mesh.select_linked();
        assert_eq!(mesh.selected_vertex_count(), 8);
        assert_eq!(mesh.selected_face_count(), 6);
        assert!(!mesh.is_fully_selected());

        mesh.selected.insert(0);
        mesh.select_linked();
        assert!(mesh.is_fully_selected());
    }

    #[test]
    fn test_separate_selected() {
        let mut mesh = two_cubes();
        mesh.selected.insert(8);
        mesh.select_linked();

        let taken = mesh.separate_selected();
        assert_eq!(taken.vertex_count(), 8);
        assert_eq!(taken.face_count(), 6);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.selected.is_empty());
        assert!(taken.selected.is_empty());
        assert_relative_eq!(taken.signed_volume(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(mesh.signed_volume(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_scale_individual_origins() {
        let mut mesh = two_cubes();
        mesh.scale_individual_origins(0.5);

        let (min, max) = mesh.bounds().unwrap();
        assert_relative_eq!(min.x, -0.5, epsilon = 1e-9);
        assert_relative_eq!(max.x, 5.25, epsilon = 1e-9);
        // Each cube shrinks about its own centre.
        assert_relative_eq!(mesh.signed_volume(), 1.0 + 0.125, epsilon = 1e-9);
    }

    #[test]
    fn test_winding_repairs_single_flipped_face() {
        let mut mesh = MeshData::cuboid(Vector3::new(1.0, 1.0, 1.0));
        let reference = mesh.clone();
        mesh.faces[3].reverse();

        let reversals = mesh.make_winding_consistent();
        assert_eq!(reversals, 1);
        assert_eq!(mesh.faces, reference.faces);
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_winding_turns_inside_out_shell() {
        let mut mesh = MeshData::cuboid(Vector3::new(1.0, 1.0, 1.0));
        for f in &mut mesh.faces {
            f.reverse();
        }
        assert!(mesh.signed_volume() < 0.0);

        let reversals = mesh.make_winding_consistent();
        assert_eq!(reversals, 6);
        assert_relative_eq!(mesh.signed_volume(), 1.0, epsilon = 1e-9);
    }
}
