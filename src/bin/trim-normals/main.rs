//! trim-normals CLI - trim-sheet normal adjustment from the command line.
//!
//! Usage: trim-normals <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Meshes are read from PLY files carrying an `edge` element with seam,
//! sharp and select flags. Results can be written as PLY (keeps flags and
//! custom normals) or OBJ (one normal per loop).
//!
//! Run `trim-normals --help` for available commands. Set `RUST_LOG=debug`
//! for pass summaries.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};

use trim_normals::algo::{AdjustOptions, DegenerateAxis, NormalBase, Progress, SeamSource};
use trim_normals::host::{self, Document, Host, SAVED_SELECTION_ATTRIBUTE};
use trim_normals::io;
use trim_normals::mesh::PolyMesh;

#[derive(Parser)]
#[command(name = "trim-normals")]
#[command(author, version, about = "Trim-sheet normal adjustment CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh and edge flag information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Replace the edge selection
    Select {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Which edges to select
        #[arg(short, long, value_enum)]
        by: SelectBy,
    },

    /// Store the edge selection in the mesh's saved-selection attribute
    SaveSelection {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,
    },

    /// Adjust loop normals around the seam edges
    Adjust {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Use edges marked as seams instead of the selected edges
        #[arg(long)]
        use_seams: bool,

        /// Start each loop from its face normal instead of its split normal
        #[arg(long)]
        face_base: bool,

        /// Rotate about the seam edge where face normals are parallel
        #[arg(long)]
        edge_axis: bool,

        /// Skip the smoothing pass
        #[arg(long)]
        no_smooth: bool,

        /// Smoothing threshold in degrees (default: the mesh auto-smooth angle)
        #[arg(long, value_name = "DEG")]
        smooth_angle: Option<f64>,

        /// Keep averaged normals at their mean length
        #[arg(long)]
        no_renormalize: bool,

        /// Use single-threaded execution
        #[arg(long)]
        sequential: bool,
    },

    /// Clear all custom normals
    Reset {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SelectBy {
    /// Edges marked as seams
    Seams,
    /// Edges marked as sharp
    Sharp,
    /// The saved selection
    Saved,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Select { input, output, by } => {
            cmd_select(&input, &output, by)?;
        }

        Commands::SaveSelection { input, output } => {
            cmd_save_selection(&input, &output)?;
        }

        Commands::Adjust {
            input,
            output,
            use_seams,
            face_base,
            edge_axis,
            no_smooth,
            smooth_angle,
            no_renormalize,
            sequential,
        } => {
            let mut options = AdjustOptions {
                seam_source: if use_seams {
                    SeamSource::Seams
                } else {
                    SeamSource::Selected
                },
                base: if face_base {
                    NormalBase::Face
                } else {
                    NormalBase::Loop
                },
                degenerate: if edge_axis {
                    DegenerateAxis::SharedEdge
                } else {
                    DegenerateAxis::Skip
                },
                smoothing: !no_smooth,
                smooth_angle: None,
                renormalize: !no_renormalize,
                parallel: !sequential,
            };
            if let Some(degrees) = smooth_angle {
                options = options.with_smooth_angle(degrees.to_radians());
            }
            cmd_adjust(&input, &output, &options)?;
        }

        Commands::Reset { input, output } => {
            cmd_reset(&input, &output)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let percent = if current >= total {
            100
        } else {
            (current * 100) / total
        };

        // Only move forward
        let previous = max_percent.fetch_max(percent, Ordering::Relaxed);
        if percent < previous {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {:<24}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn load(input: &PathBuf) -> Result<Document, Box<dyn std::error::Error>> {
    let mesh: PolyMesh = io::load(input)?;
    println!(
        "Loaded: {} vertices, {} edges, {} polygons, {} loops",
        mesh.num_vertices(),
        mesh.num_edges(),
        mesh.num_polygons(),
        mesh.num_loops()
    );
    Ok(Document::new(mesh))
}

fn save(doc: Document, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = doc.into_mesh()?;
    io::save(&mesh, output)?;
    println!("Saved: {}", output.display());
    Ok(())
}

fn cmd_info(input: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: PolyMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Edges: {}", mesh.num_edges());
    println!("Polygons: {}", mesh.num_polygons());
    println!("Loops: {}", mesh.num_loops());

    if mesh.is_quad_mesh() {
        println!("Mesh type: Quad mesh");
    } else {
        println!("Mesh type: Mixed polygon mesh");
    }

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }

    let count = |f: fn(&trim_normals::mesh::EdgeFlags) -> bool| {
        mesh.edge_ids().filter(|&e| f(&mesh.edge_flags(e))).count()
    };
    println!("Seam edges: {}", count(|f| f.seam));
    println!("Sharp edges: {}", count(|f| f.sharp));
    println!("Selected edges: {}", count(|f| f.select));

    match mesh.edge_attribute(SAVED_SELECTION_ATTRIBUTE) {
        Some(saved) => println!("Saved selection: {} edges", saved.iter().filter(|&&s| s).count()),
        None => println!("Saved selection: none"),
    }

    println!("Auto-smooth angle: {:.1} deg", mesh.auto_smooth_angle().to_degrees());
    let custom = mesh
        .loop_ids()
        .filter(|&l| mesh.custom_normal(l).is_some())
        .count();
    println!("Custom normals: {} of {} loops", custom, mesh.num_loops());

    Ok(())
}

fn cmd_select(
    input: &PathBuf,
    output: &PathBuf,
    by: SelectBy,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = load(input)?;

    let count = match by {
        SelectBy::Seams => host::select_seams(&mut doc)?,
        SelectBy::Sharp => host::select_sharp(&mut doc)?,
        SelectBy::Saved => host::restore_selection(&mut doc)?,
    };
    println!("Selected {} edges", count);

    doc.set_mode(host::Mode::Object)?;
    save(doc, output)
}

fn cmd_save_selection(input: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = load(input)?;
    let count = host::save_selection(&mut doc)?;
    println!("Saved {} selected edges", count);
    save(doc, output)
}

fn cmd_adjust(
    input: &PathBuf,
    output: &PathBuf,
    options: &AdjustOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = load(input)?;

    let mode = if options.parallel { "parallel" } else { "sequential" };
    println!("Adjusting trim normals ({})...", mode);

    let progress = create_progress();
    let start = Instant::now();
    let report = host::adjust_trim_normals(&mut doc, options, &progress)?;
    let elapsed = start.elapsed();

    println!(
        "Adjusted {} of {} loops around {} seam edges ({:.2?})",
        report.affected_loops, report.total_loops, report.seam_edges, elapsed
    );
    if report.seam_edges == 0 {
        println!("No seam edges found; select edges or pass --use-seams");
    }

    save(doc, output)
}

fn cmd_reset(input: &PathBuf, output: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = load(input)?;
    host::reset_normals(&mut doc)?;
    println!("Custom normals cleared");
    save(doc, output)
}
