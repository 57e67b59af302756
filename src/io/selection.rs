//! Plain-text persistence of the vertex roles.
//!
//! ```text
//! selection 25
//! 7 interest
//! 12 handle
//! 13 anchor
//! ```
//!
//! The header records the vertex count of the mesh the selection was made
//! on. Unselected vertices are not listed.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{MeshError, Result};
use crate::mesh::{SelectionCounts, TriangleMesh, VertexId, VertexRole};

/// Write every selected vertex and its role to `path`.
///
/// # Errors
///
/// [`MeshError::SaveError`] if the file cannot be created or written.
pub fn save<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    write_selection(mesh, path).map_err(|e| MeshError::save(path, e.to_string()))
}

fn write_selection(mesh: &TriangleMesh, path: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    writeln!(writer, "selection {}", mesh.num_vertices())?;
    for v in mesh.roi() {
        writeln!(writer, "{} {}", v.index(), mesh.role(v).as_str())?;
    }
    writer.flush()
}

/// Replace the mesh's roles with the selection stored in `path`.
///
/// The whole file is validated before any role changes: on error the
/// current selection is kept.
///
/// # Errors
///
/// [`MeshError::LoadError`] if the header is missing, the vertex count
/// differs from the mesh, an index is out of range or listed twice, or a
/// role name is unknown.
pub fn load<P: AsRef<Path>>(mesh: &mut TriangleMesh, path: P) -> Result<SelectionCounts> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let entries = parse(BufReader::new(file), mesh.num_vertices())
        .map_err(|message| MeshError::load(path, message))?;

    for v in mesh.vertex_ids().collect::<Vec<_>>() {
        mesh.set_role(v, VertexRole::Unselected);
    }
    for &(v, role) in &entries {
        mesh.set_role(v, role);
    }

    let counts = mesh.selection_counts();
    debug!(
        path = %path.display(),
        interests = counts.interests,
        handle = counts.handle,
        anchor = counts.anchor,
        "loaded selection"
    );
    Ok(counts)
}

fn parse<R: BufRead>(reader: R, num_vertices: usize) -> std::result::Result<Vec<(VertexId, VertexRole)>, String> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line.map_err(|e| e.to_string())?,
        None => return Err("empty file".to_string()),
    };
    let mut tokens = header.split_whitespace();
    if tokens.next() != Some("selection") {
        return Err("expected `selection <num_vertices>` header".to_string());
    }
    let declared: usize = tokens
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or("header is missing the vertex count")?;
    if declared != num_vertices {
        return Err(format!(
            "selection is for {} vertices but the mesh has {}",
            declared, num_vertices
        ));
    }

    let mut seen = vec![false; num_vertices];
    let mut entries = Vec::new();
    for (i, line) in lines {
        let line = line.map_err(|e| e.to_string())?;
        let lineno = i + 1;
        let mut tokens = line.split_whitespace();
        let Some(index) = tokens.next() else {
            continue;
        };

        let index: usize = index
            .parse()
            .map_err(|_| format!("line {}: invalid vertex index {:?}", lineno, index))?;
        if index >= num_vertices {
            return Err(format!("line {}: vertex {} out of range", lineno, index));
        }
        if std::mem::replace(&mut seen[index], true) {
            return Err(format!("line {}: vertex {} listed twice", lineno, index));
        }

        let name = tokens.next().unwrap_or("");
        let role = VertexRole::parse(name)
            .ok_or_else(|| format!("line {}: unknown role {:?}", lineno, name))?;
        entries.push((VertexId::new(index), role));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::select::{compute_anchor, select_sphere, AnchorPolicy, SelectionIntent};
    use crate::mesh::build_from_triangles;
    use nalgebra::Point3;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn fan() -> TriangleMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_save_then_load_restores_roles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fan.sel");

        let mut mesh = fan();
        select_sphere(&mut mesh, &Point3::origin(), 0.1, SelectionIntent::Handle).unwrap();
        compute_anchor(&mut mesh, AnchorPolicy::default()).unwrap();
        save(&mesh, &path).unwrap();

        let mut other = fan();
        let counts = load(&mut other, &path).unwrap();

        assert_eq!(counts, mesh.selection_counts());
        for v in mesh.vertex_ids() {
            assert_eq!(other.role(v), mesh.role(v));
        }
    }

    #[test]
    fn test_load_replaces_previous_selection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("one.sel");
        std::fs::write(&path, "selection 5\n2 interest\n").unwrap();

        let mut mesh = fan();
        select_sphere(&mut mesh, &Point3::origin(), 10.0, SelectionIntent::Handle).unwrap();
        load(&mut mesh, &path).unwrap();

        assert_eq!(mesh.roi(), vec![VertexId::new(2)]);
        assert_eq!(mesh.role(VertexId::new(2)), VertexRole::Interest);
    }

    #[test]
    fn test_invalid_files_keep_current_selection() {
        let dir = tempdir().unwrap();
        let mut mesh = fan();
        select_sphere(&mut mesh, &Point3::origin(), 0.1, SelectionIntent::Handle).unwrap();

        for (name, text) in [
            ("count.sel", "selection 4\n0 handle\n"),
            ("range.sel", "selection 5\n9 handle\n"),
            ("role.sel", "selection 5\n1 pinned\n"),
            ("twice.sel", "selection 5\n1 anchor\n1 interest\n"),
            ("header.sel", "5\n1 anchor\n"),
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, text).unwrap();
            let err = load(&mut mesh, &path).unwrap_err();
            assert!(matches!(err, MeshError::LoadError { .. }), "{}: {:?}", name, err);
        }

        assert_eq!(mesh.handle(), vec![VertexId::new(0)]);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let entries = parse(Cursor::new("selection 3\n\n1 anchor\n"), 3).unwrap();
        assert_eq!(entries, vec![(VertexId::new(1), VertexRole::Anchor)]);
    }

    #[test]
    fn test_save_into_missing_directory_is_save_error() {
        let dir = tempdir().unwrap();
        let mesh = fan();
        let err = save(&mesh, dir.path().join("missing").join("fan.sel")).unwrap_err();
        assert!(matches!(err, MeshError::SaveError { .. }));
        assert!(!err.is_recoverable());
    }
}
