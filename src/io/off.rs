//! OFF (Object File Format) support.
//!
//! ```text
//! OFF
//! # comment
//! 4 2 0
//! 0 0 0
//! 1 0 0
//! 1 1 0
//! 0 1 0
//! 3 0 1 2
//! 3 0 2 3
//! ```
//!
//! The counts may also follow `OFF` on the header line. Trailing values on
//! vertex and face lines (colors) are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use tracing::debug;

use super::fan_triangulate;
use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, TriangleMesh};

/// Load a mesh from an OFF file.
///
/// # Errors
///
/// [`MeshError::LoadError`] for a missing header, unparsable or non-finite
/// numbers or a vertex/face count that does not match the header;
/// [`MeshError::InvalidVertexIndex`] for face indices out of range.
///
/// # Example
///
/// ```no_run
/// use deformesh::io::off;
/// use deformesh::mesh::TriangleMesh;
///
/// let mesh: TriangleMesh = off::load("model.off").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let (vertices, faces) = parse(BufReader::new(file)).map_err(|message| MeshError::load(path, message))?;

    debug!(
        path = %path.display(),
        vertices = vertices.len(),
        triangles = faces.len(),
        "parsed OFF"
    );
    build_from_triangles(&vertices, &faces)
}

type Parsed = (Vec<Point3<f64>>, Vec<[usize; 3]>);

/// Content lines with comments stripped, paired with 1-based line numbers.
fn content_lines<R: BufRead>(reader: R) -> impl Iterator<Item = std::io::Result<(usize, String)>> {
    reader.lines().enumerate().filter_map(|(i, line)| match line {
        Ok(line) => {
            let content = match line.find('#') {
                Some(pos) => &line[..pos],
                None => &line[..],
            };
            let content = content.trim();
            if content.is_empty() {
                None
            } else {
                Some(Ok((i + 1, content.to_string())))
            }
        }
        Err(e) => Some(Err(e)),
    })
}

fn parse<R: BufRead>(reader: R) -> std::result::Result<Parsed, String> {
    let mut lines = content_lines(reader);
    let mut next = || -> std::result::Result<Option<(usize, String)>, String> {
        lines.next().transpose().map_err(|e| e.to_string())
    };

    let (_, header) = next()?.ok_or("empty file")?;
    let mut tokens = header.split_whitespace();
    match tokens.next() {
        Some("OFF") => {}
        other => return Err(format!("expected OFF header, found {:?}", other.unwrap_or(""))),
    }

    let mut counts: Vec<String> = tokens.map(str::to_string).collect();
    if counts.is_empty() {
        let (_, line) = next()?.ok_or("missing element counts")?;
        counts = line.split_whitespace().map(str::to_string).collect();
    }
    if counts.len() < 2 {
        return Err("expected vertex and face counts".to_string());
    }
    let nv: usize = parse_number(&counts[0], 0)?;
    let nf: usize = parse_number(&counts[1], 0)?;

    let mut vertices = Vec::with_capacity(nv);
    for found in 0..nv {
        let (lineno, line) = next()?.ok_or_else(|| format!("expected {} vertices, found {}", nv, found))?;
        let coords: Vec<f64> = line
            .split_whitespace()
            .take(3)
            .map(|t| parse_number(t, lineno))
            .collect::<std::result::Result<_, _>>()?;
        if coords.len() < 3 {
            return Err(format!("line {}: vertex needs three coordinates", lineno));
        }
        if !coords.iter().all(|c| c.is_finite()) {
            return Err(format!("line {}: non-finite vertex coordinate", lineno));
        }
        vertices.push(Point3::new(coords[0], coords[1], coords[2]));
    }

    let mut faces = Vec::with_capacity(nf);
    for found in 0..nf {
        let (lineno, line) = next()?.ok_or_else(|| format!("expected {} faces, found {}", nf, found))?;
        let mut tokens = line.split_whitespace();
        let k: usize = match tokens.next() {
            Some(t) => parse_number(t, lineno)?,
            None => return Err(format!("line {}: empty face", lineno)),
        };
        if k < 3 {
            return Err(format!("line {}: face with {} corners", lineno, k));
        }
        let polygon: Vec<usize> = tokens
            .take(k)
            .map(|t| parse_number(t, lineno))
            .collect::<std::result::Result<_, _>>()?;
        if polygon.len() < k {
            return Err(format!(
                "line {}: face declares {} corners but lists {}",
                lineno,
                k,
                polygon.len()
            ));
        }
        fan_triangulate(&polygon, &mut faces);
    }

    if let Some((lineno, _)) = next()? {
        return Err(format!(
            "line {}: data after the declared {} vertices and {} faces",
            lineno, nv, nf
        ));
    }

    Ok((vertices, faces))
}

fn parse_number<T: std::str::FromStr>(token: &str, lineno: usize) -> std::result::Result<T, String> {
    token
        .parse()
        .map_err(|_| format!("line {}: invalid number {:?}", lineno, token))
}

/// Save a mesh to an OFF file.
///
/// # Errors
///
/// [`MeshError::SaveError`] if the file cannot be created or written.
///
/// # Example
///
/// ```no_run
/// use deformesh::io::off;
/// use deformesh::mesh::TriangleMesh;
///
/// let mesh: TriangleMesh = deformesh::io::load("in.obj").unwrap();
/// off::save(&mesh, "output.off").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
    let path = path.as_ref();
    write_off(mesh, path).map_err(|e| MeshError::save(path, e.to_string()))
}

fn write_off(mesh: &TriangleMesh, path: &Path) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "OFF")?;
    writeln!(writer, "{} {} 0", vertices.len(), faces.len())?;
    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }
    for [a, b, c] in &faces {
        writeln!(writer, "3 {} {} {}", a, b, c)?;
    }

    writer.flush()
}
