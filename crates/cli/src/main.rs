//! Epiphany single-tile simulator CLI.
//!
//! This binary opens one simulator instance and brings it to the point of execution. It performs:
//! 1. **Configuration:** Built-in defaults or a JSON file, with the substrate directory overridable.
//! 2. **Bootstrap:** Opens a mesh instance (or a standalone core) from the trailing simulator arguments.
//! 3. **Launch:** Creates the inferior, which in mesh mode blocks until every sibling core is ready.

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use esim_core::config::Config;
use esim_core::core::ReferenceEngine;
use esim_core::mesh::MeshSubstrate;
use esim_core::sim::options;
use esim_core::sim::{Collaborators, Coordination, Meshed, OpenKind, SimulatorInstance, Standalone};
use esim_core::soc::RegionMap;
use esim_core::{SimResult, stats};

#[derive(Parser, Debug)]
#[command(
    name = "esim",
    author,
    version,
    about = "Epiphany single-tile simulator",
    long_about = "Open one simulated core of an Epiphany mesh and start it once every sibling is ready.\n\nSimulator arguments follow the launcher's own flags (use `--` to separate them if needed).\n\nExamples:\n  esim --coreid 0x808 hello.elf\n  esim --substrate /tmp/mesh -- --coreid 0x809 --external-memory=off hello.elf\n  esim --standalone-core hello.elf"
)]
struct Cli {
    /// JSON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run a single core without mesh coordination.
    #[arg(long)]
    standalone_core: bool,

    /// Directory shared with sibling processes.
    #[arg(long)]
    substrate: Option<PathBuf>,

    /// Log filter (overrides RUST_LOG), e.g. `debug` or `esim_core=trace`.
    #[arg(long)]
    log: Option<String>,

    /// Print the simulator options and exit.
    #[arg(long)]
    list_options: bool,

    /// Simulator options, then the program and its arguments.
    #[arg(allow_hyphen_values = true, trailing_var_arg = true)]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    if cli.list_options {
        if cli.standalone_core {
            print!("{}", options::usage::<Standalone>());
        } else {
            print!("{}", options::usage::<Meshed>());
        }
        return;
    }

    if let Err(e) = run(&cli) {
        error!(kind = ?e.kind(), "{e}");
        eprintln!("esim: {e}");
        process::exit(1);
    }
}

/// Installs the global subscriber. `--log` wins over `RUST_LOG`; the default is `info`.
fn init_logging(filter: Option<&str>) {
    let filter = filter.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        EnvFilter::new,
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> SimResult<()> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.substrate {
        config.mesh.substrate_dir = Some(dir.clone());
    }

    let collaborators = Collaborators {
        engine: Box::new(ReferenceEngine::new(&config.engine)),
        memory: Box::new(RegionMap::new()),
    };

    if cli.standalone_core {
        let sim = SimulatorInstance::<Standalone>::open(
            OpenKind::Standalone,
            config,
            &cli.args,
            collaborators,
            (),
        )?;
        launch(sim)
    } else {
        let substrate = substrate_for(&config);
        let sim = SimulatorInstance::<Meshed>::open(
            OpenKind::Standalone,
            config,
            &cli.args,
            collaborators,
            substrate,
        )?;
        launch(sim)
    }
}

#[cfg(unix)]
fn substrate_for(config: &Config) -> Arc<dyn MeshSubstrate> {
    let root = config
        .mesh
        .substrate_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("esim-mesh"));
    Arc::new(esim_core::mesh::DirSubstrate::new(root))
}

#[cfg(not(unix))]
fn substrate_for(_config: &Config) -> Arc<dyn MeshSubstrate> {
    Arc::new(esim_core::mesh::LocalSubstrate::new())
}

/// Creates the inferior, prints a summary, and closes the instance.
fn launch<M: Coordination>(mut sim: SimulatorInstance<M>) -> SimResult<()> {
    sim.create_inferior()?;

    println!("Engine: {}", sim.engine().name());
    if let Some(mesh) = sim.coordination().mesh() {
        if let Some(coreid) = mesh.coreid() {
            println!("  Coreid: {coreid} (row {}, col {})", coreid.row(), coreid.col());
        }
    }
    match sim.program() {
        Some(program) => println!(
            "  Program: {}  Entry: {:#x}  Size: {} bytes",
            program.path.display(),
            program.entry,
            stats::add_commas(program.size as u64)
        ),
        None => println!("  Program: none"),
    }
    for region in sim.memory().regions() {
        println!("  Memory: {:#010x} +{:#x}", region.base, region.len);
    }
    if let Some(report) = sim.profile_report() {
        print!("\n{report}");
    }

    sim.close();
    Ok(())
}
