//! btvm - behavior tree blob tool.
//!
//! - `btvm inspect <blob>` - validate a blob and print its node layout
//! - `btvm run <blob>` - tick a blob with the built-in node library
//! - `btvm demo <out>` - write a sample blob
//!
//! Blobs are MessagePack, or JSON when the file extension is `.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use bt_core::{wire, BlackboardExt, MapBlackboard, NodeBlob, NodeDef, NodeState};
use bt_tools::{TraceLog, TRACE_LOG};
use bt_vm::nodes::{delay_timer, inverter, parallel, repeat, sequence, state};
use bt_vm::{BehaviorTree, VirtualMachine, VmConfig, DELTA_TIME};

#[derive(Parser)]
#[command(name = "btvm")]
#[command(about = "Inspect and run behavior tree blobs", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a blob and print its layout
    Inspect {
        blob: PathBuf,
    },

    /// Tick a blob and print the root state per tick
    Run {
        blob: PathBuf,

        /// Number of ticks
        #[arg(long, default_value_t = 10)]
        ticks: u32,

        /// Delta time written to the blackboard before every tick, in seconds
        #[arg(long, default_value_t = 0.1)]
        dt: f32,

        /// VM config (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the tick trace as JSON lines
        #[arg(long)]
        trace: bool,
    },

    /// Write a sample blob built from the built-in nodes
    Demo {
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { blob } => inspect(&blob),
        Commands::Run {
            blob,
            ticks,
            dt,
            config,
            trace,
        } => run(&blob, ticks, dt, config.as_deref(), trace),
        Commands::Demo { out } => demo(&out),
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn read_blob(path: &Path) -> Result<NodeBlob> {
    let blob = if is_json(path) {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read blob from {}", path.display()))?;
        wire::from_json(&content)
    } else {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read blob from {}", path.display()))?;
        wire::from_msgpack(&bytes)
    };
    blob.with_context(|| format!("Invalid blob {}", path.display()))
}

fn write_blob(path: &Path, blob: &NodeBlob) -> Result<()> {
    let bytes = if is_json(path) {
        wire::to_json(blob)?.into_bytes()
    } else {
        wire::to_msgpack(blob)?
    };
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to write blob to {}", path.display()))
}

fn inspect(path: &Path) -> Result<()> {
    let blob = read_blob(path)?;
    let vm = VirtualMachine::with_builtin_nodes()?;

    println!("nodes: {}", blob.len());
    println!("hash:  {:016x}", wire::blob_hash(&blob)?);
    println!();
    println!("{:>5}  {:>5}  {:>5}  {:>5}  NODE", "INDEX", "TYPE", "END", "DATA");
    for (index, depth) in blob.depths().into_iter().enumerate() {
        let id = blob.type_id(index);
        let name = vm.name_of(id).unwrap_or("?");
        println!(
            "{:>5}  {:>5}  {:>5}  {:>5}  {}{}",
            index,
            id.get(),
            blob.end_index(index),
            blob.data_size(index),
            "  ".repeat(depth),
            name
        );
    }
    Ok(())
}

fn run(path: &Path, ticks: u32, dt: f32, config: Option<&Path>, trace: bool) -> Result<()> {
    let mut config = match config {
        Some(path) => VmConfig::load(path)?,
        None => VmConfig::default(),
    };
    config.trace |= trace;

    let mut builder = VirtualMachine::builder();
    builder.with_builtin_nodes()?;
    builder.config(config.clone());
    let vm = builder.build();

    let blob = Arc::new(read_blob(path)?);
    // Fail before ticking if the blob uses node types this tool cannot run.
    vm.component_access(&blob)?;
    let mut tree = BehaviorTree::new(blob);

    let mut bb = MapBlackboard::new();
    if config.trace {
        bb.set(TRACE_LOG, TraceLog::default());
    }

    info!(path = %path.display(), ticks, dt, "running blob");
    for tick in 1..=ticks {
        bb.set(DELTA_TIME, dt);
        let state = tree
            .tick(&vm, &mut bb)
            .with_context(|| format!("tick {tick} failed"))?;
        println!("{tick:>5}  {}", state_label(state));
    }

    if config.trace {
        for event in &bb.get(TRACE_LOG)?.events {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    Ok(())
}

fn state_label(state: NodeState) -> &'static str {
    match state {
        NodeState::Success => "success",
        NodeState::Failure => "failure",
        NodeState::Running => "running",
    }
}

fn demo_tree() -> Result<NodeDef> {
    Ok(parallel::def([
        repeat::def(3, 0, state::def(NodeState::Success)),
        delay_timer::def(0.5, DELTA_TIME)?,
        sequence::def([
            state::def(NodeState::Success),
            inverter::def(state::def(NodeState::Failure)),
        ]),
    ]))
}

fn demo(out: &Path) -> Result<()> {
    let blob = NodeBlob::build(&demo_tree()?)?;
    write_blob(out, &blob)?;
    println!("wrote {} nodes to {}", blob.len(), out.display());
    Ok(())
}
