//! Implements the three output placement variants named in spec §4.6: a shared
//! pre-sized file addressed by disjoint byte ranges, one file per peer, and a single
//! file written by peers in turn (sequential token-passing, modeled here as
//! lock-step barrier rounds rather than an explicit token message, since every peer
//! already meets at a `PeerRuntime` barrier between phases).

use std::path::{Path, PathBuf};

use crate::config::{Config, PlacementMode};
use crate::error::Result;
use crate::record::{Record, RECORD_LEN};
use crate::record_io::{AppendFileWriter, RecordWriter, SharedFileWriter};
use crate::runtime::PeerRuntime;

/// Creates (or truncates) `path` and extends it to `total_records * 100` bytes so that
/// every peer's `SharedFileWriter` can later map a disjoint sub-range of it.
pub fn pre_size_shared_file(path: &Path, total_records: u64) -> Result<()> {
    let file = std::fs::File::create(path)?;
    file.set_len(total_records * RECORD_LEN as u64)?;
    Ok(())
}

fn per_peer_file_name(output_path: &Path) -> &str {
    output_path.file_name().and_then(|n| n.to_str()).unwrap_or("output")
}

fn per_peer_dir(output_path: &Path) -> PathBuf {
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn per_peer_path(output_path: &Path, id: u32) -> PathBuf {
    let file_name = format!("{}-part-{:05}", per_peer_file_name(output_path), id);
    per_peer_dir(output_path).join(file_name)
}

/// Removes every `<prefix>-part-*` file left over from a previous run (spec §4.6, §7:
/// "peer 0 deletes stale outputs at start"). Only peer 0 calls this, before any peer
/// opens its own part file, so a re-run with fewer peers than last time can't leave
/// higher-numbered files behind to silently corrupt a lexicographic concatenation.
fn cleanup_stale_per_peer_files(output_path: &Path) -> Result<()> {
    let dir = per_peer_dir(output_path);
    if !dir.exists() {
        return Ok(());
    }
    let prefix = format!("{}-part-", per_peer_file_name(output_path));
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with(&prefix))
            .unwrap_or(false);
        if matches {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Writes one peer's fully sorted run to the configured output location.
pub fn place(runtime: &dyn PeerRuntime, config: &Config, sorted: &[Record]) -> Result<()> {
    match config.placement {
        PlacementMode::SharedFile => place_shared_file(runtime, config, sorted),
        PlacementMode::PerPeerFile => place_per_peer_file(runtime, config, sorted),
        PlacementMode::Sequential => place_sequential(runtime, config, sorted),
    }
}

fn place_shared_file(runtime: &dyn PeerRuntime, config: &Config, sorted: &[Record]) -> Result<()> {
    let output_path = Path::new(&config.output_path);
    let run_lengths = runtime.broadcast_run_length(sorted.len() as u64);
    let total_records: u64 = run_lengths.iter().sum();
    let start_offset_records: u64 = run_lengths[..runtime.id() as usize].iter().sum();

    if runtime.id() == 0 {
        pre_size_shared_file(output_path, total_records)?;
    }
    runtime.barrier();

    if !sorted.is_empty() {
        let mut writer = SharedFileWriter::open(
            output_path,
            start_offset_records * RECORD_LEN as u64,
            sorted.len() as u64,
        )?;
        writer.write_all(sorted)?;
        writer.close()?;
    }
    runtime.barrier();
    Ok(())
}

fn place_per_peer_file(runtime: &dyn PeerRuntime, config: &Config, sorted: &[Record]) -> Result<()> {
    let output_path = Path::new(&config.output_path);
    if runtime.id() == 0 {
        cleanup_stale_per_peer_files(output_path)?;
    }
    runtime.barrier();

    let path = per_peer_path(output_path, runtime.id());
    let mut writer = AppendFileWriter::create(&path)?;
    writer.write_all(sorted)?;
    writer.close()
}

fn place_sequential(runtime: &dyn PeerRuntime, config: &Config, sorted: &[Record]) -> Result<()> {
    let output_path = Path::new(&config.output_path);
    for turn in 0..runtime.peer_count() {
        if runtime.id() == turn {
            let mut writer = if turn == 0 {
                AppendFileWriter::create(output_path)?
            } else {
                AppendFileWriter::open_append(output_path)?
            };
            writer.write_all(sorted)?;
            writer.close()?;
        }
        runtime.barrier();
    }
    Ok(())
}
