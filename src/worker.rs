//! Drives one peer through the full pipeline: read its slice of the input, sample and
//! agree on pivots, classify, shuffle, locally sort, and place the result. Each phase
//! emits a stable `TL:<id>\t<phase>\t<seconds>` line on stdout (spec §10.2) so a driver
//! script can track progress without scraping the `log`-backed diagnostic output.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::classify;
use crate::config::{Config, ShuffleMode};
use crate::error::Result;
use crate::partition_plan;
use crate::placement;
use crate::radix::sorter;
use crate::record::Record;
use crate::record_io::{MmapWindowReader, PartitionedDirectoryReader, RecordReader};
use crate::runtime::PeerRuntime;
use crate::sample;
use crate::shuffle;
use crate::PrettyDuration;

fn run_phase<T>(id: u32, phase: &str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    println!("TL:{id}\t{phase}\t{:.3}", elapsed.as_secs_f64());
    log::debug!("peer {id} phase '{phase}' took {}", PrettyDuration(elapsed));
    result
}

fn open_reader(config: &Config) -> Result<Box<dyn RecordReader>> {
    let path = Path::new(&config.input_path);
    if path.is_dir() {
        Ok(Box::new(PartitionedDirectoryReader::open(
            path,
            config.mmap_element_count,
        )?))
    } else {
        Ok(Box::new(MmapWindowReader::open(path, config.mmap_element_count)?))
    }
}

fn read_local_slice(config: &Config, t: u32, id: u32) -> Result<Vec<Record>> {
    let mut reader = open_reader(config)?;
    let total = reader.record_count();
    let (start, end) = partition_plan::plan(total, t, id);
    reader.seek(start)?;
    let mut records = Vec::with_capacity((end - start) as usize);
    for _ in start..end {
        records.push(reader.read_record()?);
    }
    Ok(records)
}

fn agree_on_pivots(runtime: &dyn PeerRuntime, config: &Config, local: &[Record]) -> Arc<Vec<Record>> {
    let t = runtime.peer_count();
    let count = sample::sample_count(config.sample_size, runtime.id(), t);
    let samples = sample::local_samples(local, count);
    runtime.submit_samples(samples);
    if runtime.id() == 0 {
        let all = runtime.reduce_samples_as_coordinator();
        let pivots = sample::select_pivots(all, t);
        runtime.publish_pivots(pivots);
    }
    runtime.wait_pivots()
}

/// Runs one peer's full share of the sort. `id` must match `runtime.id()`.
pub fn run(runtime: &dyn PeerRuntime, config: &Config) -> Result<()> {
    let id = runtime.id();
    let t = runtime.peer_count();
    log::info!("peer {id}/{t} starting");

    let local = run_phase(id, "read", || read_local_slice(config, t, id))?;
    log::debug!("peer {id} holds {} input records", local.len());

    let pivots = run_phase(id, "sample", || Ok(agree_on_pivots(runtime, config, &local)))?;
    let bucket_count = pivots.len() + 1;

    let mut gathered = match config.shuffle {
        ShuffleMode::Batch => {
            let buckets = run_phase(id, "classify", || {
                Ok(classify::classify(&local, &pivots, bucket_count))
            })?;
            run_phase(id, "shuffle", || {
                Ok(shuffle::batch_shuffle(runtime, buckets, bucket_count))
            })?
        }
        ShuffleMode::Streamed => {
            // Classification and shipping happen inside one phase here: each sub-bucket
            // is flushed to its target as soon as it reaches `concur_send_bucket_size`
            // records, instead of waiting for `local` to be fully classified first.
            run_phase(id, "classify_shuffle", || {
                Ok(classify::classify_streamed(
                    runtime,
                    &local,
                    &pivots,
                    bucket_count,
                    config.concur_send_bucket_size,
                ))
            })?
        }
    };
    log::debug!("peer {id} received {} records to sort", gathered.len());

    run_phase(id, "sort", || {
        sorter::sort(&mut gathered);
        Ok(())
    })?;

    run_phase(id, "place", || placement::place(runtime, config, &gathered))?;

    log::info!("peer {id} finished");
    Ok(())
}
