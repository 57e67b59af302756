//! Region-of-interest selection.
//!
//! Selection grows the region of interest (ROI) from a seed point and a
//! radius, marks part of it as the handle, then derives the anchor ring that
//! pins the deformation in place.
//!
//! Selection only ever augments: picking a second seed adds to the current
//! selection. Starting over is an explicit [`clear_selection`] call.
//!
//! # Example
//!
//! ```
//! use deformesh::prelude::*;
//! use deformesh::algo::select::{compute_anchor, select_sphere, AnchorPolicy, SelectionIntent};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 3], [0, 3, 2]];
//! let mut mesh: TriangleMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! select_sphere(&mut mesh, &Point3::origin(), 0.1, SelectionIntent::Handle).unwrap();
//! compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();
//!
//! assert_eq!(mesh.handle().len(), 1);
//! assert_eq!(mesh.anchor().len(), 3);
//! ```

use std::collections::VecDeque;

use nalgebra::Point3;
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{TriangleMesh, VertexId, VertexRole};

/// What a selection marks vertices as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionIntent {
    /// Add to the region of interest as free vertices.
    Interest,
    /// Add to the region of interest as handle vertices.
    Handle,
}

/// How the anchor set is derived from the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPolicy {
    /// Rings of graph distance around the handle.
    ///
    /// Vertices at distance `1..depth` join the ROI as free vertices and the
    /// vertices at distance exactly `depth` become the anchor. With
    /// `depth = 1` the anchor is the one-ring of the handle.
    HandleRing {
        /// Ring index of the anchor, at least 1.
        depth: usize,
    },
    /// The one-ring just outside the ROI: unselected vertices adjacent to a
    /// free or handle vertex.
    RegionBorder,
}

impl Default for AnchorPolicy {
    fn default() -> Self {
        AnchorPolicy::HandleRing { depth: 1 }
    }
}

impl AnchorPolicy {
    /// Anchor ring at the given graph distance from the handle.
    pub fn handle_ring(depth: usize) -> Self {
        AnchorPolicy::HandleRing { depth }
    }
}

/// Apply `intent` to one vertex; returns whether its role changed.
fn mark(mesh: &mut TriangleMesh, v: VertexId, intent: SelectionIntent) -> bool {
    let current = mesh.role(v);
    let next = match (intent, current) {
        (SelectionIntent::Handle, _) => VertexRole::Handle,
        (SelectionIntent::Interest, VertexRole::Handle) => VertexRole::Handle,
        (SelectionIntent::Interest, _) => VertexRole::Interest,
    };
    if next == current {
        return false;
    }
    mesh.set_role(v, next);
    true
}

/// Select every vertex within `radius` of `center`.
///
/// Returns the number of vertices whose role changed. A zero radius or a
/// seed far from the mesh selects nothing and returns `Ok(0)`.
///
/// # Errors
///
/// [`MeshError::InvalidParameter`] if `radius` is negative or not finite.
pub fn select_sphere(
    mesh: &mut TriangleMesh,
    center: &Point3<f64>,
    radius: f64,
    intent: SelectionIntent,
) -> Result<usize> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(MeshError::invalid_param(
            "radius",
            radius,
            "must be finite and non-negative",
        ));
    }
    if !(center.x.is_finite() && center.y.is_finite() && center.z.is_finite()) {
        return Err(MeshError::invalid_param("center", center, "must be finite"));
    }

    let radius_sq = radius * radius;
    let hits: Vec<VertexId> = mesh
        .vertex_ids()
        .filter(|&v| (mesh.position(v) - center).norm_squared() <= radius_sq)
        .collect();

    let changed = hits.iter().filter(|&&v| mark(mesh, v, intent)).count();

    debug!(
        ?intent,
        radius,
        hits = hits.len(),
        changed,
        "sphere selection"
    );
    Ok(changed)
}

/// Select vertices by id.
///
/// # Errors
///
/// [`MeshError::VertexOutOfRange`] if any id is outside the mesh; no role is
/// changed in that case.
pub fn select_vertices(
    mesh: &mut TriangleMesh,
    ids: &[VertexId],
    intent: SelectionIntent,
) -> Result<usize> {
    let n = mesh.num_vertices();
    if let Some(bad) = ids.iter().find(|v| v.index() >= n) {
        return Err(MeshError::VertexOutOfRange {
            vertex: bad.index(),
            num_vertices: n,
        });
    }
    Ok(ids.iter().filter(|&&v| mark(mesh, v, intent)).count())
}

/// Reset every vertex to [`VertexRole::Unselected`].
///
/// Returns how many vertices were selected before.
pub fn clear_selection(mesh: &mut TriangleMesh) -> usize {
    let mut cleared = 0;
    for vertex in &mut mesh.vertices {
        if vertex.role.in_roi() {
            vertex.role = VertexRole::Unselected;
            cleared += 1;
        }
    }
    cleared
}

/// Recompute the anchor set from the current handle and ROI.
///
/// Existing anchors are dropped first. Each vertex becomes an anchor at most
/// once, and handle vertices are never anchors. Returns the anchor count;
/// an empty handle (or an empty ROI for [`AnchorPolicy::RegionBorder`])
/// yields 0.
///
/// # Errors
///
/// [`MeshError::InvalidParameter`] for `HandleRing { depth: 0 }`.
pub fn compute_anchor(mesh: &mut TriangleMesh, policy: AnchorPolicy) -> Result<usize> {
    if let AnchorPolicy::HandleRing { depth: 0 } = policy {
        return Err(MeshError::invalid_param(
            "depth",
            0,
            "anchor ring depth must be at least 1",
        ));
    }

    for vertex in &mut mesh.vertices {
        if vertex.role == VertexRole::Anchor {
            vertex.role = VertexRole::Unselected;
        }
    }

    let count = match policy {
        AnchorPolicy::HandleRing { depth } => anchor_handle_ring(mesh, depth),
        AnchorPolicy::RegionBorder => anchor_region_border(mesh),
    };

    debug!(?policy, anchors = count, "computed anchor set");
    Ok(count)
}

fn anchor_handle_ring(mesh: &mut TriangleMesh, depth: usize) -> usize {
    let mut distance = vec![usize::MAX; mesh.num_vertices()];
    let mut queue = VecDeque::new();

    for v in mesh.handle() {
        distance[v.index()] = 0;
        queue.push_back(v);
    }

    let mut anchors = 0;
    while let Some(v) = queue.pop_front() {
        let d = distance[v.index()];
        if d == depth {
            continue;
        }
        for &u in mesh.neighbors(v) {
            if distance[u.index()] != usize::MAX {
                continue;
            }
            distance[u.index()] = d + 1;
            queue.push_back(u);
        }
    }

    for (i, &d) in distance.iter().enumerate() {
        let v = VertexId::new(i);
        if d == 0 || d == usize::MAX {
            continue;
        }
        if d == depth {
            mesh.set_role(v, VertexRole::Anchor);
            anchors += 1;
        } else if mesh.role(v) == VertexRole::Unselected {
            mesh.set_role(v, VertexRole::Interest);
        }
    }

    anchors
}

fn anchor_region_border(mesh: &mut TriangleMesh) -> usize {
    let border: Vec<VertexId> = mesh
        .vertex_ids()
        .filter(|&v| {
            mesh.role(v) == VertexRole::Unselected
                && mesh.neighbors(v).iter().any(|&u| {
                    matches!(mesh.role(u), VertexRole::Interest | VertexRole::Handle)
                })
        })
        .collect();

    for &v in &border {
        mesh.set_role(v, VertexRole::Anchor);
    }
    border.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;

    /// Regular `n x n` grid in the z = 0 plane with unit spacing.
    fn grid(n: usize) -> TriangleMesh {
        let mut vertices = Vec::with_capacity(n * n);
        for j in 0..n {
            for i in 0..n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..n - 1 {
            for i in 0..n - 1 {
                let v00 = j * n + i;
                let v10 = v00 + 1;
                let v01 = v00 + n;
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_sphere_selection_is_idempotent() {
        let mut mesh = grid(5);
        let center = Point3::new(2.0, 2.0, 0.0);

        let first = select_sphere(&mut mesh, &center, 1.0, SelectionIntent::Interest).unwrap();
        assert_eq!(first, 5);
        let again = select_sphere(&mut mesh, &center, 1.0, SelectionIntent::Interest).unwrap();
        assert_eq!(again, 0);
        assert_eq!(mesh.interests().len(), 5);
    }

    #[test]
    fn test_second_seed_augments() {
        let mut mesh = grid(5);
        select_sphere(&mut mesh, &Point3::new(0.0, 0.0, 0.0), 0.5, SelectionIntent::Interest)
            .unwrap();
        select_sphere(&mut mesh, &Point3::new(4.0, 4.0, 0.0), 0.5, SelectionIntent::Interest)
            .unwrap();
        assert_eq!(mesh.interests(), vec![VertexId::new(0), VertexId::new(24)]);
    }

    #[test]
    fn test_interest_does_not_downgrade_handle() {
        let mut mesh = grid(3);
        let center = Point3::new(1.0, 1.0, 0.0);
        select_sphere(&mut mesh, &center, 0.0, SelectionIntent::Handle).unwrap();
        select_sphere(&mut mesh, &center, 2.0, SelectionIntent::Interest).unwrap();

        assert_eq!(mesh.handle(), vec![VertexId::new(4)]);
        assert_eq!(mesh.interests().len(), 8);
    }

    #[test]
    fn test_empty_selection_is_not_an_error() {
        let mut mesh = grid(3);
        let far = Point3::new(100.0, 100.0, 100.0);
        assert_eq!(select_sphere(&mut mesh, &far, 1.0, SelectionIntent::Handle).unwrap(), 0);
        assert_eq!(compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap(), 0);
        assert!(mesh.roi().is_empty());
    }

    #[test]
    fn test_negative_radius_rejected() {
        let mut mesh = grid(3);
        let result = select_sphere(&mut mesh, &Point3::origin(), -1.0, SelectionIntent::Interest);
        assert!(matches!(result, Err(MeshError::InvalidParameter { name: "radius", .. })));

        let result = select_sphere(&mut mesh, &Point3::origin(), f64::NAN, SelectionIntent::Interest);
        assert!(result.is_err());
    }

    #[test]
    fn test_one_ring_anchor_matches_neighbors() {
        let mut mesh = grid(5);
        let center = VertexId::new(12);
        select_vertices(&mut mesh, &[center], SelectionIntent::Handle).unwrap();
        let count = compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();

        let mut expected: Vec<VertexId> = mesh.neighbors(center).to_vec();
        expected.sort();
        assert_eq!(count, expected.len());
        assert_eq!(mesh.anchor(), expected);
    }

    #[test]
    fn test_anchor_excludes_handle_and_has_no_duplicates() {
        let mut mesh = grid(5);
        // A 2x2 block of handle vertices touches many anchors from several sides.
        let block = [6, 7, 11, 12].map(VertexId::new);
        select_vertices(&mut mesh, &block, SelectionIntent::Handle).unwrap();
        compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();

        let handle = mesh.handle();
        let anchor = mesh.anchor();
        assert!(anchor.iter().all(|a| !handle.contains(a)));

        let mut dedup = anchor.clone();
        dedup.dedup();
        assert_eq!(dedup, anchor);

        // Every non-handle neighbor of the handle is an anchor: no gaps.
        for &h in &handle {
            for &n in mesh.neighbors(h) {
                if !handle.contains(&n) {
                    assert!(anchor.contains(&n), "{:?} missing from anchor", n);
                }
            }
        }
    }

    #[test]
    fn test_deeper_ring_adds_free_band() {
        let mut mesh = grid(5);
        select_vertices(&mut mesh, &[VertexId::new(12)], SelectionIntent::Handle).unwrap();
        compute_anchor(&mut mesh, AnchorPolicy::handle_ring(2)).unwrap();

        let one_ring = mesh.neighbors(VertexId::new(12)).to_vec();
        for v in &one_ring {
            assert_eq!(mesh.role(*v), VertexRole::Interest);
        }
        assert!(!mesh.anchor().is_empty());
        for a in mesh.anchor() {
            assert!(!one_ring.contains(&a));
        }
    }

    #[test]
    fn test_zero_depth_rejected() {
        let mut mesh = grid(3);
        let result = compute_anchor(&mut mesh, AnchorPolicy::handle_ring(0));
        assert!(matches!(result, Err(MeshError::InvalidParameter { .. })));
    }

    #[test]
    fn test_region_border_surrounds_roi() {
        let mut mesh = grid(5);
        let center = Point3::new(2.0, 2.0, 0.0);
        select_sphere(&mut mesh, &center, 1.0, SelectionIntent::Interest).unwrap();
        select_sphere(&mut mesh, &center, 0.0, SelectionIntent::Handle).unwrap();
        compute_anchor(&mut mesh, AnchorPolicy::RegionBorder).unwrap();

        let counts = mesh.selection_counts();
        assert_eq!(counts.handle, 1);
        assert_eq!(counts.interests, 4);
        for a in mesh.anchor() {
            assert!(mesh
                .neighbors(a)
                .iter()
                .any(|&u| matches!(mesh.role(u), VertexRole::Interest | VertexRole::Handle)));
        }
    }

    #[test]
    fn test_recompute_replaces_old_anchor() {
        let mut mesh = grid(5);
        select_vertices(&mut mesh, &[VertexId::new(0)], SelectionIntent::Handle).unwrap();
        compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();
        let first = mesh.anchor();

        select_vertices(&mut mesh, &[VertexId::new(24)], SelectionIntent::Handle).unwrap();
        compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();
        let second = mesh.anchor();

        assert!(second.len() > first.len());
        assert!(second.iter().all(|&a| mesh.role(a) == VertexRole::Anchor));
    }

    #[test]
    fn test_out_of_range_ids_rejected_without_change() {
        let mut mesh = grid(3);
        let ids = [VertexId::new(0), VertexId::new(99)];
        let result = select_vertices(&mut mesh, &ids, SelectionIntent::Handle);
        assert!(matches!(result, Err(MeshError::VertexOutOfRange { vertex: 99, .. })));
        assert!(mesh.roi().is_empty());
    }

    #[test]
    fn test_clear_selection() {
        let mut mesh = grid(3);
        select_sphere(&mut mesh, &Point3::origin(), 10.0, SelectionIntent::Interest).unwrap();
        assert_eq!(clear_selection(&mut mesh), 9);
        assert!(mesh.roi().is_empty());
    }
}
