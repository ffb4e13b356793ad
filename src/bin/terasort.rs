//! Command-line entry point (spec §6, §10.1): spawns one peer per line in the nodes
//! file and runs the pipeline in-process via `LocalRuntime`. `anyhow` adds file/flag
//! context to errors surfaced here; the library crate itself only ever returns
//! `TeraSortError`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use argh::FromArgs;

use terasort::config::{self, Config};
use terasort::runtime;
use terasort::worker;

#[derive(FromArgs)]
/// Distributed sample-sort engine for fixed-length 100-byte records (10-byte key,
/// 90-byte value).
struct Args {
    /// path to the input file, or a directory of `part*` files
    #[argh(positional)]
    input_path: String,

    /// path the sorted output is written to
    #[argh(positional)]
    output_path: String,

    /// path to a file listing one peer host per line (peer count = line count)
    #[argh(positional)]
    nodes_file: PathBuf,

    /// total number of sample records contributed across all peers
    #[argh(positional)]
    sample_size: u64,

    /// output placement: "shared-file" (default), "per-peer-file", or "sequential"
    #[argh(option)]
    placement: Option<String>,

    /// shuffle transport: "batch" (default) or "streamed"
    #[argh(option)]
    shuffle: Option<String>,

    /// optional terasort.toml override file
    #[argh(option, default = "PathBuf::from(\"terasort.toml\")")]
    config: PathBuf,

    /// log verbosity (error, warn, info, debug, trace); falls back to RUST_LOG
    #[argh(option)]
    log_level: Option<String>,
}

fn init_logging(log_level: Option<&str>) {
    match log_level {
        Some(level) => env_logger::Builder::new().parse_filters(level).init(),
        None => env_logger::init(),
    }
}

fn resolve_config(args: Args) -> anyhow::Result<Config> {
    let nodes = config::read_nodes_file(&args.nodes_file)
        .with_context(|| format!("reading nodes file {}", args.nodes_file.display()))?;
    let file_config = config::FileConfig::load(&args.config)
        .with_context(|| format!("reading {}", args.config.display()))?;

    let cli_placement = args
        .placement
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("--placement")?;
    let cli_shuffle = args
        .shuffle
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("--shuffle")?;

    Config::resolve(
        args.input_path,
        args.output_path,
        args.sample_size,
        nodes,
        cli_placement,
        cli_shuffle,
        file_config,
    )
    .context("resolving configuration")
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = resolve_config(args)?;
    let peer_count = config.peer_count();
    log::info!("starting {peer_count} peers");

    let runtimes = runtime::spawn_local_runtimes(peer_count);
    let handles: Vec<_> = runtimes
        .into_iter()
        .map(|rt| {
            let config = config.clone();
            std::thread::spawn(move || worker::run(&rt, &config))
        })
        .collect();

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow::anyhow!("a peer thread panicked"))??;
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    init_logging(args.log_level.as_deref());
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("terasort: {e:#}");
            ExitCode::FAILURE
        }
    }
}
