//! The `RecordIO` collaborator (spec §4.7): a windowed memory-mapped reader, a
//! disjoint-offset memory-mapped writer for the shared-file placement variant, a plain
//! append writer for the per-peer-file and sequential variants, and a remote-filesystem
//! adapter that concatenates `part*` files into one logical stream. All storage
//! back-ends are alternate implementations of the same two traits (spec §9 "Dynamic
//! dispatch") so the engine above never cares which one it is talking to.

use crate::error::{Result, TeraSortError};
use crate::record::{Record, RECORD_LEN};
use mmap_rs::{Mmap, MmapMut, MmapOptions};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub trait RecordReader: Send {
    fn record_count(&self) -> u64;
    fn seek(&mut self, record_index: u64) -> Result<()>;
    fn read_record(&mut self) -> Result<Record>;
}

pub trait RecordWriter: Send {
    fn write_record(&mut self, record: &Record) -> Result<()>;

    fn write_all(&mut self, records: &[Record]) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        Ok(())
    }

    /// Guarantees durability of everything written so far.
    fn close(&mut self) -> Result<()>;
}

fn record_count_for_len(byte_len: u64, path: &Path) -> Result<u64> {
    if byte_len % RECORD_LEN as u64 != 0 {
        return Err(TeraSortError::Invariant(format!(
            "{}: {} bytes is not a multiple of the {}-byte record length",
            path.display(),
            byte_len,
            RECORD_LEN
        )));
    }
    Ok(byte_len / RECORD_LEN as u64)
}

/// Reads a local file through a sliding memory-mapped window, re-mapping whenever the
/// read or seek cursor leaves the currently mapped range. `window_records` is the
/// `memoryMap.elementCount` tunable (default 1,000,000 records ≈ 100 MB).
pub struct MmapWindowReader {
    file: File,
    path: PathBuf,
    total_records: u64,
    window_records: u64,
    window_start: u64,
    window: Option<Mmap>,
    cursor: u64,
}

impl MmapWindowReader {
    pub fn open(path: impl AsRef<Path>, window_records: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let byte_len = file.metadata()?.len();
        let total_records = record_count_for_len(byte_len, &path)?;
        Ok(MmapWindowReader {
            file,
            path,
            total_records,
            window_records: window_records.max(1),
            window_start: 0,
            window: None,
            cursor: 0,
        })
    }

    fn ensure_window_covers(&mut self, record_index: u64) -> Result<()> {
        let in_window = self.window.is_some()
            && record_index >= self.window_start
            && record_index < self.window_start + self.window_records;
        if in_window {
            return Ok(());
        }
        let window_start = (record_index / self.window_records) * self.window_records;
        let window_len_records = self.window_records.min(self.total_records - window_start);
        let offset = window_start * RECORD_LEN as u64;
        let len = (window_len_records * RECORD_LEN as u64) as usize;
        let mmap = unsafe {
            MmapOptions::new(len)
                .map_err(|e| TeraSortError::Io(std::io::Error::other(e)))?
                .with_file(&self.file, offset)
                .map()
                .map_err(|e| TeraSortError::Io(std::io::Error::other(e)))?
        };
        self.window = Some(mmap);
        self.window_start = window_start;
        Ok(())
    }
}

impl RecordReader for MmapWindowReader {
    fn record_count(&self) -> u64 {
        self.total_records
    }

    fn seek(&mut self, record_index: u64) -> Result<()> {
        self.cursor = record_index;
        Ok(())
    }

    fn read_record(&mut self) -> Result<Record> {
        if self.cursor >= self.total_records {
            return Err(TeraSortError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("{}: read past end of {} records", self.path.display(), self.total_records),
            )));
        }
        self.ensure_window_covers(self.cursor)?;
        let local_index = (self.cursor - self.window_start) as usize;
        let window = self.window.as_ref().expect("window just ensured");
        let start = local_index * RECORD_LEN;
        let record = Record::from_bytes(&window[start..start + RECORD_LEN]);
        self.cursor += 1;
        Ok(record)
    }
}

/// Writes a sorted run into a disjoint byte range of a pre-sized shared output file
/// (spec §4.6 "Shared-file placement"). The caller is responsible for pre-sizing the
/// file (see `placement::pre_size_shared_file`) and for computing a `start_offset`
/// that does not overlap any other peer's range.
pub struct SharedFileWriter {
    mmap: MmapMut,
    cursor: usize,
}

impl SharedFileWriter {
    pub fn open(path: impl AsRef<Path>, start_offset_bytes: u64, element_count: u64) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = (element_count * RECORD_LEN as u64) as usize;
        let mmap = unsafe {
            MmapOptions::new(len)
                .map_err(|e| TeraSortError::Io(std::io::Error::other(e)))?
                .with_file(&file, start_offset_bytes)
                .map_mut()
                .map_err(|e| TeraSortError::Io(std::io::Error::other(e)))?
        };
        Ok(SharedFileWriter { mmap, cursor: 0 })
    }
}

impl RecordWriter for SharedFileWriter {
    fn write_record(&mut self, record: &Record) -> Result<()> {
        let start = self.cursor * RECORD_LEN;
        self.mmap[start..start + RECORD_LEN].copy_from_slice(record.as_bytes());
        self.cursor += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.mmap
            .flush()
            .map_err(|e| TeraSortError::Io(std::io::Error::other(e)))
    }
}

/// Plain sequential append writer, used for the per-peer-file variant (spec §4.6) and
/// as the building block the sequential token-passing variant appends through once it
/// holds the token (coordination for that lives in `placement`, not here).
pub struct AppendFileWriter {
    file: File,
}

impl AppendFileWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
        Ok(AppendFileWriter { file })
    }

    pub fn open_append(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(AppendFileWriter { file })
    }
}

impl RecordWriter for AppendFileWriter {
    fn write_record(&mut self, record: &Record) -> Result<()> {
        self.file.write_all(record.as_bytes())?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}

/// Remote-filesystem adapter (spec §6): when the input is a directory, its `part*`
/// entries are ordered lexicographically and treated as one concatenated stream. Each
/// file's size must be a multiple of 100 bytes and the total size modulo 100 must be
/// zero (checked in `open`).
pub struct PartitionedDirectoryReader {
    readers: Vec<MmapWindowReader>,
    offsets: Vec<u64>, // cumulative record offset at which each file starts
    total_records: u64,
    cursor: u64,
}

impl PartitionedDirectoryReader {
    pub fn open(dir: impl AsRef<Path>, window_records: u64) -> Result<Self> {
        let dir = dir.as_ref();
        let mut names: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.starts_with("part"))
                    .unwrap_or(false)
            })
            .collect();
        names.sort();
        if names.is_empty() {
            return Err(TeraSortError::Configuration(format!(
                "{}: no part* files found",
                dir.display()
            )));
        }

        let mut readers = Vec::with_capacity(names.len());
        let mut offsets = Vec::with_capacity(names.len());
        let mut total_records = 0u64;
        for name in names {
            let reader = MmapWindowReader::open(&name, window_records)?;
            offsets.push(total_records);
            total_records += reader.record_count();
            readers.push(reader);
        }
        Ok(PartitionedDirectoryReader {
            readers,
            offsets,
            total_records,
            cursor: 0,
        })
    }

    fn locate(&self, record_index: u64) -> (usize, u64) {
        let file_index = match self.offsets.binary_search(&record_index) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        (file_index, record_index - self.offsets[file_index])
    }
}

impl RecordReader for PartitionedDirectoryReader {
    fn record_count(&self) -> u64 {
        self.total_records
    }

    fn seek(&mut self, record_index: u64) -> Result<()> {
        self.cursor = record_index;
        Ok(())
    }

    fn read_record(&mut self) -> Result<Record> {
        if self.cursor >= self.total_records {
            return Err(TeraSortError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "read past end of partitioned input",
            )));
        }
        let (file_index, local_index) = self.locate(self.cursor);
        self.readers[file_index].seek(local_index)?;
        let record = self.readers[file_index].read_record()?;
        self.cursor += 1;
        Ok(record)
    }
}
