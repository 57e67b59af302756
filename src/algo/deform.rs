//! Laplacian surface deformation.
//!
//! Moves the handle by a rigid transform while the anchor stays fixed, and
//! lets the free vertices of the region of interest follow so that every
//! vertex keeps its differential coordinate (its offset from the centroid of
//! its neighbors) as closely as possible.
//!
//! # Formulation
//!
//! With uniform weights, the Laplacian of a vertex `v` with neighbors `N(v)` is
//!
//! ```text
//! L(v) = p_v - (1 / |N(v)|) * Σ_{u ∈ N(v)} p_u
//! ```
//!
//! and `δ(v)` is the same expression over the positions before the edit.
//! Handle vertices are pinned to their transformed positions and anchor
//! vertices to their current ones; both are eliminated from the unknowns.
//! The free vertices then minimize `Σ_v |L(v) - δ(v)|²` over every vertex of
//! the solve domain, constrained ones included, which is how the handle's
//! motion reaches past the anchor ring into the rest of the region.
//!
//! The least-squares problem becomes `AᵀA x = Aᵀb`, one right-hand side per
//! axis, solved with conjugate gradient (see [`super::sparse`]).
//!
//! # Solve domain
//!
//! The connected pieces of the region of interest (edges between ROI
//! vertices only) that contain a handle vertex. Selected pieces without a
//! handle vertex are left where they are. A piece with a handle but no
//! anchor vertex would move rigidly with the handle, so the solve rejects
//! it as [`MeshError::Underconstrained`].
//!
//! # Example
//!
//! ```
//! use deformesh::prelude::*;
//! use deformesh::algo::deform::{laplacian_deform, DeformOptions, HandleTransform};
//! use deformesh::algo::select::{compute_anchor, select_sphere, AnchorPolicy, SelectionIntent};
//! use nalgebra::{Point3, Vector3};
//!
//! let mut vertices = Vec::new();
//! for j in 0..5 {
//!     for i in 0..5 {
//!         vertices.push(Point3::new(i as f64, j as f64, 0.0));
//!     }
//! }
//! let mut faces = Vec::new();
//! for j in 0..4 {
//!     for i in 0..4 {
//!         let v = j * 5 + i;
//!         faces.push([v, v + 1, v + 6]);
//!         faces.push([v, v + 6, v + 5]);
//!     }
//! }
//! let mut mesh: TriangleMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let center = Point3::new(2.0, 2.0, 0.0);
//! select_sphere(&mut mesh, &center, 10.0, SelectionIntent::Interest).unwrap();
//! select_sphere(&mut mesh, &center, 0.1, SelectionIntent::Handle).unwrap();
//! compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();
//!
//! let lift = HandleTransform::translation(Vector3::new(0.0, 0.0, 1.0));
//! let report = laplacian_deform(&mut mesh, &lift, &DeformOptions::default()).unwrap();
//!
//! assert_eq!(report.handle, 1);
//! assert!((mesh.position(VertexId::new(12)).z - 1.0).abs() < 1e-9);
//! ```

use std::collections::VecDeque;

use nalgebra::{DVector, Point3, UnitQuaternion, Vector3};
use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

use super::sparse::{conjugate_gradient, CgSolution, NormalEquations, SparseRow};
use crate::error::{MeshError, Result};
use crate::mesh::{TriangleMesh, VertexId, VertexRole};

const AXES: [char; 3] = ['x', 'y', 'z'];

/// Rigid motion applied to the handle vertices.
///
/// A handle vertex at `p` is sent to `pivot + R (p - pivot) + t`. Without an
/// explicit pivot the handle centroid is used, so a pure rotation spins the
/// handle in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleTransform {
    /// Rotation `R`.
    pub rotation: UnitQuaternion<f64>,
    /// Translation `t`, applied after the rotation.
    pub translation: Vector3<f64>,
    /// Center of rotation; `None` means the handle centroid.
    pub pivot: Option<Point3<f64>>,
}

impl Default for HandleTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl HandleTransform {
    /// Leave the handle where it is.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
            pivot: None,
        }
    }

    /// Pure translation.
    pub fn translation(translation: Vector3<f64>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// Pure rotation about the pivot.
    pub fn rotation(rotation: UnitQuaternion<f64>) -> Self {
        Self {
            rotation,
            ..Self::identity()
        }
    }

    /// Set the translation applied after the rotation.
    pub fn with_translation(mut self, translation: Vector3<f64>) -> Self {
        self.translation = translation;
        self
    }

    /// Rotate about `pivot` instead of the handle centroid.
    pub fn with_pivot(mut self, pivot: Point3<f64>) -> Self {
        self.pivot = Some(pivot);
        self
    }

    /// Target of a handle vertex at `p` for the given pivot.
    pub fn apply(&self, p: &Point3<f64>, pivot: &Point3<f64>) -> Point3<f64> {
        pivot + self.rotation * (p - pivot) + self.translation
    }

    fn is_finite(&self) -> bool {
        let q = self.rotation.coords;
        let finite = |v: &Vector3<f64>| v.iter().all(|c| c.is_finite());
        q.iter().all(|c| c.is_finite())
            && finite(&self.translation)
            && self.pivot.map_or(true, |p| finite(&p.coords))
    }
}

/// Options for the deformation solve.
#[derive(Debug, Clone)]
pub struct DeformOptions {
    /// Maximum conjugate gradient iterations per axis.
    pub max_iterations: usize,

    /// Conjugate gradient convergence tolerance (relative residual).
    pub tolerance: f64,

    /// Largest relative residual of the normal equations accepted after the
    /// solve; anything above is reported as a singular system.
    pub residual_tolerance: f64,

    /// Whether to solve the three axes in parallel (default: true).
    pub parallel: bool,
}

impl Default for DeformOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-10,
            residual_tolerance: 1e-6,
            parallel: true,
        }
    }
}

impl DeformOptions {
    /// Set the maximum conjugate gradient iterations per axis.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the conjugate gradient tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the accepted residual of the final solution.
    pub fn with_residual_tolerance(mut self, residual_tolerance: f64) -> Self {
        self.residual_tolerance = residual_tolerance;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(MeshError::invalid_param("max_iterations", 0, "must be positive"));
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(MeshError::invalid_param(
                "tolerance",
                self.tolerance,
                "must be positive and finite",
            ));
        }
        if !(self.residual_tolerance > 0.0 && self.residual_tolerance.is_finite()) {
            return Err(MeshError::invalid_param(
                "residual_tolerance",
                self.residual_tolerance,
                "must be positive and finite",
            ));
        }
        Ok(())
    }
}

/// The handle, anchor and free vertex sets handed to the solver.
///
/// The sets must be disjoint. [`RoiSets::from_mesh`] reads them from the
/// vertex roles, which are disjoint by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoiSets {
    /// Vertices moved by the transform.
    pub handle: Vec<VertexId>,
    /// Vertices held in place.
    pub anchor: Vec<VertexId>,
    /// Free vertices of the region.
    pub interests: Vec<VertexId>,
}

impl RoiSets {
    /// Read the sets from the mesh's vertex roles.
    pub fn from_mesh(mesh: &TriangleMesh) -> Self {
        Self {
            handle: mesh.handle(),
            anchor: mesh.anchor(),
            interests: mesh.interests(),
        }
    }

    /// One role per vertex, validating range and disjointness.
    fn roles(&self, num_vertices: usize) -> Result<Vec<VertexRole>> {
        let mut roles = vec![VertexRole::Unselected; num_vertices];
        let groups = [
            (&self.handle, VertexRole::Handle),
            (&self.anchor, VertexRole::Anchor),
            (&self.interests, VertexRole::Interest),
        ];
        for (ids, role) in groups {
            for &v in ids.iter() {
                let slot = roles.get_mut(v.index()).ok_or(MeshError::VertexOutOfRange {
                    vertex: v.index(),
                    num_vertices,
                })?;
                if *slot != VertexRole::Unselected && *slot != role {
                    return Err(MeshError::invalid_param(
                        "roi_sets",
                        v,
                        "vertex appears in more than one set",
                    ));
                }
                *slot = role;
            }
        }
        Ok(roles)
    }
}

/// Summary of a deformation solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeformReport {
    /// Handle vertices moved to their targets.
    pub handle: usize,
    /// Anchor vertices held in place.
    pub anchor: usize,
    /// Free vertices solved for.
    pub free: usize,
    /// Selected vertices outside the solve domain.
    pub skipped: usize,
    /// Conjugate gradient iterations for the x, y and z systems.
    pub iterations: [usize; 3],
    /// Largest distance any vertex moved.
    pub max_displacement: f64,
}

impl DeformReport {
    /// Whether the solve changed nothing (empty handle).
    pub fn is_noop(&self) -> bool {
        self.handle == 0
    }
}

/// New positions computed by [`solve_deformation`], not yet written back.
#[derive(Debug, Clone, Default)]
pub struct Deformation {
    positions: Vec<(VertexId, Point3<f64>)>,
    report: DeformReport,
}

impl Deformation {
    /// A deformation that moves nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether no vertex is moved.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// The solved positions, sorted by vertex id.
    pub fn positions(&self) -> &[(VertexId, Point3<f64>)] {
        &self.positions
    }

    /// Summary of the solve.
    pub fn report(&self) -> &DeformReport {
        &self.report
    }

    /// Write the positions into `mesh` and recompute its normals.
    ///
    /// # Errors
    ///
    /// [`MeshError::VertexOutOfRange`] if the deformation was computed for a
    /// larger mesh; nothing is written in that case.
    pub fn apply(self, mesh: &mut TriangleMesh) -> Result<DeformReport> {
        let n = mesh.num_vertices();
        if let Some((v, _)) = self.positions.iter().find(|(v, _)| v.index() >= n) {
            return Err(MeshError::VertexOutOfRange {
                vertex: v.index(),
                num_vertices: n,
            });
        }
        if self.positions.is_empty() {
            return Ok(self.report);
        }

        for &(v, p) in &self.positions {
            mesh.set_position(v, p);
        }
        mesh.recompute_normals();
        Ok(self.report)
    }
}

/// Solve a deformation from the mesh's current selection.
///
/// Pure: the mesh is only read. See the module documentation for the
/// formulation.
///
/// # Errors
///
/// - [`MeshError::Underconstrained`] if the handle is non-empty but there is
///   no anchor, or some connected piece of the handle's region reaches no
///   anchor vertex
/// - [`MeshError::SingularSystem`] if the linear solve fails or produces an
///   unusable solution
/// - [`MeshError::InvalidParameter`] for non-finite transforms or bad options
pub fn solve_deformation(
    mesh: &TriangleMesh,
    transform: &HandleTransform,
    options: &DeformOptions,
) -> Result<Deformation> {
    solve_with_sets(mesh, &RoiSets::from_mesh(mesh), transform, options)
}

/// Solve a deformation for explicit vertex sets, ignoring the vertex roles.
///
/// # Errors
///
/// Same as [`solve_deformation`], plus [`MeshError::VertexOutOfRange`] and
/// [`MeshError::InvalidParameter`] for sets that are out of range or overlap.
pub fn solve_with_sets(
    mesh: &TriangleMesh,
    sets: &RoiSets,
    transform: &HandleTransform,
    options: &DeformOptions,
) -> Result<Deformation> {
    options.validate()?;
    if !transform.is_finite() {
        return Err(MeshError::invalid_param(
            "transform",
            format!("{:?}", transform),
            "must be finite",
        ));
    }

    let roles = sets.roles(mesh.num_vertices())?;

    if sets.handle.is_empty() {
        debug!("empty handle, deformation skipped");
        return Ok(Deformation::empty());
    }
    if sets.anchor.is_empty() {
        return Err(MeshError::Underconstrained {
            handle: sets.handle.len(),
        });
    }

    let span = info_span!(
        "laplacian_deform",
        handle = sets.handle.len(),
        anchor = sets.anchor.len(),
        interests = sets.interests.len()
    );
    let _enter = span.enter();

    let domain = solve_domain(mesh, &roles, &sets.handle)?;
    let roi_size = roles.iter().filter(|r| r.in_roi()).count();
    let skipped = roi_size - domain.len();
    if skipped > 0 {
        warn!(skipped, "selected vertices not connected to the handle are left in place");
    }

    let pivot = match transform.pivot {
        Some(p) => p,
        None => centroid(mesh, &sets.handle),
    };

    // Unknowns are the free vertices of the domain, numbered in id order.
    let mut column = vec![usize::MAX; mesh.num_vertices()];
    let mut free: Vec<VertexId> = Vec::new();
    for &v in &domain {
        if !roles[v.index()].is_constrained() {
            column[v.index()] = free.len();
            free.push(v);
        }
    }

    // Positions of everything that is not an unknown.
    let known = |v: VertexId| -> Point3<f64> {
        match roles[v.index()] {
            VertexRole::Handle => transform.apply(mesh.position(v), &pivot),
            _ => *mesh.position(v),
        }
    };

    let mut report = DeformReport {
        handle: sets.handle.len(),
        anchor: domain
            .iter()
            .filter(|v| roles[v.index()] == VertexRole::Anchor)
            .count(),
        free: free.len(),
        skipped,
        ..DeformReport::default()
    };

    let mut positions: Vec<(VertexId, Point3<f64>)> = domain
        .iter()
        .filter(|v| roles[v.index()] == VertexRole::Handle)
        .map(|&v| (v, known(v)))
        .collect();

    if !free.is_empty() {
        let rows = laplacian_rows(mesh, &domain, &column, &known);
        let system = NormalEquations::assemble(free.len(), &rows);
        debug!(
            unknowns = free.len(),
            rows = rows.len(),
            nnz = system.matrix.nnz(),
            "assembled normal equations"
        );

        let initial: [DVector<f64>; 3] = std::array::from_fn(|axis| {
            DVector::from_iterator(free.len(), free.iter().map(|&v| mesh.position(v)[axis]))
        });

        let solve = |axis: usize| solve_axis(&system, axis, &initial[axis], options);
        let solutions: Vec<Result<CgSolution>> = if options.parallel {
            (0..3).into_par_iter().map(solve).collect()
        } else {
            (0..3).map(solve).collect()
        };

        let mut coords: Vec<DVector<f64>> = Vec::with_capacity(3);
        for (axis, solution) in solutions.into_iter().enumerate() {
            let solution = solution?;
            report.iterations[axis] = solution.iterations;
            coords.push(solution.x);
        }

        positions.extend(
            free.iter()
                .enumerate()
                .map(|(k, &v)| (v, Point3::new(coords[0][k], coords[1][k], coords[2][k]))),
        );
    }

    positions.sort_by_key(|&(v, _)| v);
    report.max_displacement = positions
        .iter()
        .map(|(v, p)| (p - mesh.position(*v)).norm())
        .fold(0.0, f64::max);

    info!(
        handle = report.handle,
        anchor = report.anchor,
        free = report.free,
        iterations = ?report.iterations,
        max_displacement = report.max_displacement,
        "deformation solved"
    );

    Ok(Deformation { positions, report })
}

/// Solve the mesh's current selection and write the result back.
///
/// On error the mesh is left exactly as it was.
///
/// # Errors
///
/// See [`solve_deformation`].
pub fn laplacian_deform(
    mesh: &mut TriangleMesh,
    transform: &HandleTransform,
    options: &DeformOptions,
) -> Result<DeformReport> {
    let deformation = solve_deformation(mesh, transform, options)?;
    deformation.apply(mesh)
}

/// ROI vertices reachable from the handle through ROI-only edges, sorted.
fn solve_domain(
    mesh: &TriangleMesh,
    roles: &[VertexRole],
    handle: &[VertexId],
) -> Result<Vec<VertexId>> {
    let mut visited = vec![false; mesh.num_vertices()];
    let mut domain = Vec::new();
    let mut queue: VecDeque<VertexId> = VecDeque::new();

    for &seed in handle {
        if visited[seed.index()] {
            continue;
        }
        visited[seed.index()] = true;
        queue.push_back(seed);

        let start = domain.len();
        while let Some(v) = queue.pop_front() {
            domain.push(v);
            for &u in mesh.neighbors(v) {
                if !visited[u.index()] && roles[u.index()].in_roi() {
                    visited[u.index()] = true;
                    queue.push_back(u);
                }
            }
        }

        // Every piece the handle drags must be pinned somewhere.
        let component = &domain[start..];
        if !component.iter().any(|v| roles[v.index()] == VertexRole::Anchor) {
            let handle = component
                .iter()
                .filter(|v| roles[v.index()] == VertexRole::Handle)
                .count();
            warn!(handle, "handle component has no anchor");
            return Err(MeshError::Underconstrained { handle });
        }
    }

    domain.sort();
    Ok(domain)
}

/// One row `L(v) = δ(v)` per domain vertex, with known positions moved to
/// the right-hand side.
fn laplacian_rows<F>(
    mesh: &TriangleMesh,
    domain: &[VertexId],
    column: &[usize],
    known: &F,
) -> Vec<SparseRow>
where
    F: Fn(VertexId) -> Point3<f64>,
{
    let mut rows = Vec::with_capacity(domain.len());

    for &v in domain {
        let neighbors = mesh.neighbors(v);
        let mut row = SparseRow::default();

        if neighbors.is_empty() {
            // Isolated vertex: L(v) is p_v itself, so it keeps its position.
            if column[v.index()] != usize::MAX {
                row.entries.push((column[v.index()], 1.0));
                row.rhs = mesh.position(v).coords;
                rows.push(row);
            }
            continue;
        }

        let w = 1.0 / neighbors.len() as f64;
        let neighbor_sum: Vector3<f64> = neighbors.iter().map(|&u| mesh.position(u).coords).sum();
        let delta = mesh.position(v).coords - w * neighbor_sum;

        let mut rhs = delta;
        let terms = std::iter::once((v, 1.0)).chain(neighbors.iter().map(|&u| (u, -w)));
        for (u, coeff) in terms {
            match column[u.index()] {
                usize::MAX => rhs -= coeff * known(u).coords,
                col => row.entries.push((col, coeff)),
            }
        }

        if row.entries.is_empty() {
            continue;
        }
        row.rhs = rhs;
        rows.push(row);
    }

    rows
}

fn solve_axis(
    system: &NormalEquations,
    axis: usize,
    initial: &DVector<f64>,
    options: &DeformOptions,
) -> Result<CgSolution> {
    let name = AXES[axis];
    let b = &system.rhs[axis];

    let solution = conjugate_gradient(
        &system.matrix,
        b,
        Some(initial),
        options.max_iterations,
        options.tolerance,
    )
    .map_err(|e| match e {
        MeshError::ConvergenceFailed { iterations } => MeshError::SingularSystem {
            axis: name,
            reason: format!("conjugate gradient did not converge in {} iterations", iterations),
        },
        other => other,
    })?;

    if solution.x.iter().any(|c| !c.is_finite()) {
        return Err(MeshError::SingularSystem {
            axis: name,
            reason: "solution contains non-finite values".to_string(),
        });
    }

    let b_norm = b.norm();
    if b_norm > 0.0 {
        let residual = (b - system.matrix.mul_vec(&solution.x)).norm() / b_norm;
        if residual > options.residual_tolerance {
            return Err(MeshError::SingularSystem {
                axis: name,
                reason: format!("relative residual {:.3e} above tolerance", residual),
            });
        }
    }

    debug!(axis = %name, iterations = solution.iterations, "axis solved");
    Ok(solution)
}

fn centroid(mesh: &TriangleMesh, ids: &[VertexId]) -> Point3<f64> {
    mesh.centroid(ids).unwrap_or_else(Point3::origin)
}
