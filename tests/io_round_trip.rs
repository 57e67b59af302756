//! File-level workflow: load, select, persist the selection, deform, save.

use deformesh::io;
use deformesh::prelude::*;
use nalgebra::{Point3, Vector3};
use tempfile::tempdir;

const PYRAMID_OFF: &str = "\
OFF
# square pyramid with a quad base
5 5 0
0 0 0
1 0 0
1 1 0
0 1 0
0.5 0.5 1
4 0 3 2 1
3 0 1 4
3 1 2 4
3 2 3 4
3 3 0 4
";

#[test]
fn off_to_obj_preserves_geometry() {
    let dir = tempdir().unwrap();
    let off = dir.path().join("pyramid.off");
    let obj = dir.path().join("pyramid.obj");
    std::fs::write(&off, PYRAMID_OFF).unwrap();

    let mesh = io::load(&off).unwrap();
    assert_eq!(mesh.num_vertices(), 5);
    assert_eq!(mesh.num_faces(), 6);

    io::save(&mesh, &obj).unwrap();
    let copy = io::load(&obj).unwrap();

    // OBJ ids follow first use in a face, so compare triangle by triangle.
    assert_eq!(copy.num_vertices(), mesh.num_vertices());
    assert_eq!(copy.num_faces(), mesh.num_faces());
    for f in mesh.face_ids() {
        assert_eq!(copy.face_positions(f), mesh.face_positions(f));
    }

    let apex = copy
        .vertex_ids()
        .find(|&v| copy.position(v).z == 1.0)
        .unwrap();
    assert!(copy.normal(apex).z > 0.0);
}

#[test]
fn selection_file_drives_a_later_edit() {
    let dir = tempdir().unwrap();
    let off = dir.path().join("pyramid.off");
    let sel = dir.path().join("pyramid.sel");
    let out = dir.path().join("edited.off");
    std::fs::write(&off, PYRAMID_OFF).unwrap();

    let mut mesh = io::load(&off).unwrap();
    select_sphere(&mut mesh, &Point3::new(0.5, 0.5, 1.0), 0.01, SelectionIntent::Handle).unwrap();
    compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();
    io::selection::save(&mesh, &sel).unwrap();

    // A fresh session picks the selection back up.
    let mut mesh = io::load(&off).unwrap();
    let counts = io::selection::load(&mut mesh, &sel).unwrap();
    assert_eq!(counts.handle, 1);
    assert_eq!(counts.anchor, 4);

    let pull = HandleTransform::translation(Vector3::new(0.0, 0.0, 1.0));
    laplacian_deform(&mut mesh, &pull, &DeformOptions::default()).unwrap();
    io::save(&mesh, &out).unwrap();

    let edited = io::load(&out).unwrap();
    assert_eq!(*edited.position(VertexId::new(4)), Point3::new(0.5, 0.5, 2.0));
    assert_eq!(*edited.position(VertexId::new(0)), Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn selection_for_another_mesh_is_rejected() {
    let dir = tempdir().unwrap();
    let off = dir.path().join("pyramid.off");
    let sel = dir.path().join("other.sel");
    std::fs::write(&off, PYRAMID_OFF).unwrap();
    std::fs::write(&sel, "selection 8\n0 handle\n").unwrap();

    let mut mesh = io::load(&off).unwrap();
    let err = io::selection::load(&mut mesh, &sel).unwrap_err();
    assert!(matches!(err, MeshError::LoadError { .. }));
    assert_eq!(mesh.selection_counts(), SelectionCounts::default());
}

#[test]
fn missing_file_is_reported() {
    let dir = tempdir().unwrap();
    let err = io::load(dir.path().join("nope.off")).unwrap_err();
    assert!(matches!(err, MeshError::Io(_)));

    // tobj reports open failures itself.
    let err = io::load(dir.path().join("nope.obj")).unwrap_err();
    assert!(matches!(err, MeshError::LoadError { .. }));
}
