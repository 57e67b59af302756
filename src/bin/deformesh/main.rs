//! Deformesh CLI - select a region of a mesh and drag it with a Laplacian solve.
//!
//! Usage: deformesh <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! A typical session selects a region, stores it next to the mesh and then
//! deforms with that selection:
//!
//! ```bash
//! deformesh select bunny.off bunny.sel --center 0,0.4,0 --radius 0.3 \
//!     --handle-center 0,0.4,0 --handle-radius 0.05 --normalized
//! deformesh deform bunny.off bunny_edited.off --selection bunny.sel \
//!     --translate 0,0.1,0 --normalized
//! ```
//!
//! Set `RUST_LOG` or pass `-v`/`-vv` to see what the library is doing.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use nalgebra::{Point3, Unit, UnitQuaternion, Vector3};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use deformesh::algo::deform::{laplacian_deform, DeformOptions, HandleTransform};
use deformesh::algo::normalize::{center_and_scale_to_unit, Normalization};
use deformesh::algo::select::{compute_anchor, select_sphere, AnchorPolicy, SelectionIntent};
use deformesh::io;
use deformesh::mesh::TriangleMesh;

#[derive(Parser)]
#[command(name = "deformesh")]
#[command(author, version, about = "Laplacian mesh editing CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,

        /// Also report a stored selection
        #[arg(long)]
        selection: Option<PathBuf>,
    },

    /// Center a mesh at the origin and scale it into the unit box
    Normalize {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,
    },

    /// Select a region of interest and a handle, derive the anchor and save
    Select {
        /// Input mesh file
        input: PathBuf,

        /// Selection file to write
        output: PathBuf,

        /// Center of the region of interest (x,y,z)
        #[arg(long, value_parser = parse_triple)]
        center: Option<Vector3<f64>>,

        /// Radius of the region of interest
        #[arg(long, default_value = "0")]
        radius: f64,

        /// Center of the handle (x,y,z)
        #[arg(long, value_parser = parse_triple)]
        handle_center: Vector3<f64>,

        /// Radius of the handle
        #[arg(long, default_value = "0")]
        handle_radius: f64,

        /// How the anchor is derived
        #[arg(long, value_enum, default_value = "ring")]
        anchor: AnchorMode,

        /// Ring depth for `--anchor ring`
        #[arg(long, default_value = "1")]
        depth: usize,

        /// Interpret centers and radii in the unit-box frame
        #[arg(long)]
        normalized: bool,
    },

    /// Deform a mesh by moving the handle of a stored selection
    Deform {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Selection file written by `select`
        #[arg(short, long)]
        selection: PathBuf,

        /// Handle translation (x,y,z)
        #[arg(short, long, value_parser = parse_triple, default_value = "0,0,0")]
        translate: Vector3<f64>,

        /// Rotation axis (x,y,z)
        #[arg(long, value_parser = parse_triple, requires = "degrees")]
        axis: Option<Vector3<f64>>,

        /// Rotation angle in degrees
        #[arg(long, requires = "axis")]
        degrees: Option<f64>,

        /// Rotation pivot (x,y,z); defaults to the handle centroid
        #[arg(long, value_parser = parse_triple)]
        pivot: Option<Vector3<f64>>,

        /// Interpret the translation and pivot in the unit-box frame
        #[arg(long)]
        normalized: bool,

        /// Maximum solver iterations per axis
        #[arg(long, default_value = "10000")]
        max_iterations: usize,

        /// Solver tolerance
        #[arg(long, default_value = "1e-10")]
        tolerance: f64,

        /// Use single-threaded execution (for benchmarking)
        #[arg(long)]
        sequential: bool,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum AnchorMode {
    /// Rings around the handle (see --depth)
    Ring,
    /// One-ring just outside the region of interest
    Border,
}

fn parse_triple(s: &str) -> Result<Vector3<f64>, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 3 {
        return Err(format!("expected x,y,z but got {:?}", s));
    }
    let mut v = Vector3::zeros();
    for (i, part) in parts.iter().enumerate() {
        v[i] = part
            .trim()
            .parse()
            .map_err(|_| format!("invalid number {:?}", part))?;
    }
    Ok(v)
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8) {
    // RUST_LOG wins over -v flags
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "deformesh=info",
            2 => "deformesh=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input, selection } => {
            cmd_info(&input, selection.as_deref())?;
        }

        Commands::Normalize { input, output } => {
            cmd_normalize(&input, &output)?;
        }

        Commands::Select {
            input,
            output,
            center,
            radius,
            handle_center,
            handle_radius,
            anchor,
            depth,
            normalized,
        } => {
            let policy = match anchor {
                AnchorMode::Ring => AnchorPolicy::handle_ring(depth),
                AnchorMode::Border => AnchorPolicy::RegionBorder,
            };
            let region = center.map(|c| (Point3::from(c), radius));
            let handle = (Point3::from(handle_center), handle_radius);
            cmd_select(&input, &output, region, handle, policy, normalized)?;
        }

        Commands::Deform {
            input,
            output,
            selection,
            translate,
            axis,
            degrees,
            pivot,
            normalized,
            max_iterations,
            tolerance,
            sequential,
        } => {
            let rotation = match (axis, degrees) {
                (Some(axis), Some(degrees)) => {
                    let axis = Unit::try_new(axis, 1e-12).ok_or("rotation axis must be non-zero")?;
                    UnitQuaternion::from_axis_angle(&axis, degrees.to_radians())
                }
                _ => UnitQuaternion::identity(),
            };
            let transform = HandleTransform {
                rotation,
                translation: translate,
                pivot: pivot.map(Point3::from),
            };
            let options = DeformOptions::default()
                .with_max_iterations(max_iterations)
                .with_tolerance(tolerance)
                .with_parallel(!sequential);
            cmd_deform(&input, &output, &selection, transform, &options, normalized)?;
        }
    }

    Ok(())
}

fn cmd_info(input: &Path, selection: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: TriangleMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", mesh.adjacency().num_edges());
    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    let isolated = mesh.vertex_ids().filter(|&v| mesh.neighbors(v).is_empty()).count();
    if isolated > 0 {
        println!("Isolated vertices: {}", isolated);
    }
    let degenerate = mesh.triangles().iter().filter(|t| t.is_degenerate()).count();
    if degenerate > 0 {
        println!("Degenerate triangles: {}", degenerate);
    }

    if let Some(path) = selection {
        let counts = io::selection::load(&mut mesh, path)?;
        println!("\nSelection: {}", path.display());
        println!("  Interest: {}", counts.interests);
        println!("  Handle:   {}", counts.handle);
        println!("  Anchor:   {}", counts.anchor);
    }

    Ok(())
}

fn cmd_normalize(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: TriangleMesh = io::load(input)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    match center_and_scale_to_unit(&mut mesh) {
        Some(n) => println!(
            "Centered at ({:.4}, {:.4}, {:.4}), scaled by {:.6}",
            n.center.x, n.center.y, n.center.z, n.scale
        ),
        None => println!("Mesh too small to normalize, written unchanged"),
    }

    io::save(&mesh, output)?;
    println!("Saved to: {}", output.display());
    Ok(())
}

fn cmd_select(
    input: &Path,
    output: &Path,
    region: Option<(Point3<f64>, f64)>,
    handle: (Point3<f64>, f64),
    policy: AnchorPolicy,
    normalized: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: TriangleMesh = io::load(input)?;

    // Bring unit-box coordinates back to the file's frame.
    let frame = if normalized { Normalization::for_mesh(&mesh) } else { None };
    let to_mesh = |(center, radius): (Point3<f64>, f64)| match &frame {
        Some(n) => (n.invert(&center), radius / n.scale),
        None => (center, radius),
    };

    if let Some(region) = region {
        let (center, radius) = to_mesh(region);
        select_sphere(&mut mesh, &center, radius, SelectionIntent::Interest)?;
    }
    let (center, radius) = to_mesh(handle);
    select_sphere(&mut mesh, &center, radius, SelectionIntent::Handle)?;
    compute_anchor(&mut mesh, policy)?;

    let counts = mesh.selection_counts();
    println!(
        "Selected {} interest, {} handle, {} anchor vertices",
        counts.interests, counts.handle, counts.anchor
    );
    if counts.handle == 0 {
        eprintln!("Warning: the handle is empty, nothing will move");
    } else if counts.anchor == 0 {
        eprintln!("Warning: no anchor, deformation will be rejected");
    }

    io::selection::save(&mesh, output)?;
    println!("Saved to: {}", output.display());
    Ok(())
}

fn cmd_deform(
    input: &Path,
    output: &Path,
    selection: &Path,
    mut transform: HandleTransform,
    options: &DeformOptions,
    normalized: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: TriangleMesh = io::load(input)?;
    io::selection::load(&mut mesh, selection)?;
    println!("Loaded: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());

    if normalized {
        if let Some(n) = Normalization::for_mesh(&mesh) {
            transform.translation /= n.scale;
            transform.pivot = transform.pivot.map(|p| n.invert(&p));
        }
    }

    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!("Solving ({})...", mode);

    let start = Instant::now();
    let report = laplacian_deform(&mut mesh, &transform, options)?;
    let elapsed = start.elapsed();

    if report.is_noop() {
        println!("Empty handle, mesh unchanged");
    } else {
        println!(
            "Handle: {}, anchor: {}, free: {}",
            report.handle, report.anchor, report.free
        );
        if report.skipped > 0 {
            println!("Left in place (not connected to the handle): {}", report.skipped);
        }
        println!(
            "Iterations: x={}, y={}, z={}",
            report.iterations[0], report.iterations[1], report.iterations[2]
        );
        println!("Max displacement: {:.6}", report.max_displacement);
    }
    println!("Time: {:.2?}", elapsed);

    io::save(&mesh, output)?;
    println!("Saved to: {}", output.display());
    Ok(())
}
