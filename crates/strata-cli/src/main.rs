//! Import a model document and write the flattened scene as JSON.
//!
//! ```text
//! strata house.json -o house.scene.json --threshold 3 --hide-layer Trees
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use strata_import::{import_with_observer, read_model_file, ImportOptions, InstancingStyle, LogObserver};
use strata_scene::SceneGraph;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Instancing {
    Points,
    Billboards,
}

#[derive(Debug, Parser)]
#[command(name = "strata", version, about = "Import a model into a flattened scene")]
struct Args {
    /// Model document to import.
    input: PathBuf,

    /// Where to write the scene JSON. Prints to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON file with import options. Flags below override it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Minimum occurrences before a component is shared.
    #[arg(short, long)]
    threshold: Option<usize>,

    /// How depth-1 components are instanced.
    #[arg(long, value_enum)]
    instancing: Option<Instancing>,

    /// Exclude entities on this layer. Repeatable.
    #[arg(long = "hide-layer", value_name = "LAYER")]
    hide_layers: Vec<String>,

    /// Import one scene preset: its camera and hidden layers.
    #[arg(long)]
    scene: Option<String>,

    /// Also import the last active view as a camera.
    #[arg(long)]
    last_view: bool,

    /// Do not turn scene presets into cameras.
    #[arg(long)]
    no_scene_cameras: bool,

    /// Only write instance groups.
    #[arg(long)]
    groups_only: bool,

    /// Reuse instance groups that already exist in the output.
    #[arg(long)]
    reuse_groups: bool,

    /// Print the import report as JSON to stderr.
    #[arg(long)]
    report: bool,

    /// More logging; repeat for more detail.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn options(&self) -> Result<ImportOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))?
            }
            None => ImportOptions::default(),
        };

        if let Some(threshold) = self.threshold {
            options = options.with_threshold(threshold);
        }
        if let Some(instancing) = self.instancing {
            options = options.with_instancing(match instancing {
                Instancing::Points => InstancingStyle::PointCloud,
                Instancing::Billboards => InstancingStyle::BillboardQuad,
            });
        }
        for layer in &self.hide_layers {
            options = options.hiding_layer(layer.as_str());
        }
        if let Some(scene) = &self.scene {
            options = options.with_scene(scene.as_str());
        }
        if self.last_view {
            options = options.with_last_view();
        }
        if self.no_scene_cameras {
            options = options.without_scene_cameras();
        }
        if self.groups_only {
            options = options.groups_only();
        }
        if self.reuse_groups {
            options = options.reusing_groups();
        }
        Ok(options)
    }

    fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter())).init();

    let options = args.options()?;
    let model = read_model_file(&args.input).with_context(|| format!("reading {}", args.input.display()))?;

    let mut scene = SceneGraph::new();
    let report = import_with_observer(&model, &mut scene, &options, &mut LogObserver)
        .with_context(|| format!("importing {}", args.input.display()))?;

    let bounds = scene.compute_bounds();
    log::info!(
        "{} nodes, {} meshes, {} groups, {} instancers",
        scene.node_count(),
        scene.mesh_count(),
        scene.groups.len(),
        report.clusters
    );
    if !bounds.is_empty() {
        log::info!("Bounds {:?} to {:?}", bounds.min, bounds.max);
    }

    let json = serde_json::to_string_pretty(&scene)?;
    match &args.output {
        Some(path) => std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }

    if args.report {
        eprintln!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
