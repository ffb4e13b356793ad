//! Tunables from spec §6, plus the `terasort.toml` fallback layer from §10.4.

use crate::error::{Result, TeraSortError};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_MMAP_ELEMENT_COUNT: u64 = 1_000_000;
pub const DEFAULT_CONCUR_SEND_BUCKET_SIZE: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlacementMode {
    #[default]
    SharedFile,
    PerPeerFile,
    Sequential,
}

impl FromStr for PlacementMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "shared-file" => Ok(Self::SharedFile),
            "per-peer-file" => Ok(Self::PerPeerFile),
            "sequential" => Ok(Self::Sequential),
            _ => Err(format!(
                "unknown placement mode: '{s}', valid modes: 'shared-file', 'per-peer-file', 'sequential'"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShuffleMode {
    #[default]
    Batch,
    Streamed,
}

impl FromStr for ShuffleMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "batch" => Ok(Self::Batch),
            "streamed" => Ok(Self::Streamed),
            _ => Err(format!(
                "unknown shuffle mode: '{s}', valid modes: 'batch', 'streamed'"
            )),
        }
    }
}

/// Optional overrides loaded from a `terasort.toml` file in the working directory.
/// Any field the CLI did not set falls back to this, then to the hardcoded default.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(rename = "memoryMap.elementCount")]
    pub mmap_element_count: Option<u64>,
    #[serde(rename = "concurSendBucketSize")]
    pub concur_send_bucket_size: Option<usize>,
    #[serde(rename = "hdfsConf")]
    pub hdfs_conf: Option<String>,
    pub placement: Option<String>,
    pub shuffle: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            TeraSortError::Configuration(format!("failed to parse {}: {e}", path.display()))
        })
    }
}

/// Fully resolved configuration for a run: positional arguments plus tunables, with the
/// CLI > `terasort.toml` > hardcoded-default precedence from spec §10.4.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_path: String,
    pub output_path: String,
    pub sample_size: u64,
    pub nodes: Vec<String>,
    pub mmap_element_count: u64,
    pub concur_send_bucket_size: usize,
    pub hdfs_conf: Vec<String>,
    pub placement: PlacementMode,
    pub shuffle: ShuffleMode,
}

impl Config {
    pub fn peer_count(&self) -> u32 {
        self.nodes.len() as u32
    }

    #[cfg(test)]
    pub fn for_test(output_path: std::path::PathBuf) -> Self {
        Config {
            input_path: String::new(),
            output_path: output_path.to_string_lossy().into_owned(),
            sample_size: 0,
            nodes: vec!["localhost".to_owned()],
            mmap_element_count: DEFAULT_MMAP_ELEMENT_COUNT,
            concur_send_bucket_size: DEFAULT_CONCUR_SEND_BUCKET_SIZE,
            hdfs_conf: Vec::new(),
            placement: PlacementMode::default(),
            shuffle: ShuffleMode::default(),
        }
    }

    pub fn resolve(
        input_path: String,
        output_path: String,
        sample_size: u64,
        nodes: Vec<String>,
        cli_placement: Option<PlacementMode>,
        cli_shuffle: Option<ShuffleMode>,
        file: FileConfig,
    ) -> Result<Self> {
        if nodes.is_empty() {
            return Err(TeraSortError::Configuration(
                "nodes file must list at least one peer".into(),
            ));
        }
        let placement = cli_placement
            .or_else(|| file.placement.as_deref().and_then(|s| s.parse().ok()))
            .unwrap_or_default();
        let shuffle = cli_shuffle
            .or_else(|| file.shuffle.as_deref().and_then(|s| s.parse().ok()))
            .unwrap_or_default();
        let hdfs_conf = file
            .hdfs_conf
            .map(|s| s.split(':').map(str::to_owned).collect())
            .unwrap_or_default();
        Ok(Config {
            input_path,
            output_path,
            sample_size,
            nodes,
            mmap_element_count: file
                .mmap_element_count
                .unwrap_or(DEFAULT_MMAP_ELEMENT_COUNT),
            concur_send_bucket_size: file
                .concur_send_bucket_size
                .unwrap_or(DEFAULT_CONCUR_SEND_BUCKET_SIZE),
            hdfs_conf,
            placement,
            shuffle,
        })
    }
}

pub fn read_nodes_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    let nodes: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect();
    if nodes.is_empty() {
        return Err(TeraSortError::Configuration(format!(
            "nodes file {} has no host lines",
            path.display()
        )));
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_mode_parses_known_values() {
        assert_eq!(
            "per-peer-file".parse::<PlacementMode>().unwrap(),
            PlacementMode::PerPeerFile
        );
        assert!("bogus".parse::<PlacementMode>().is_err());
    }

    #[test]
    fn file_config_defaults_when_missing() {
        let cfg = FileConfig::load(Path::new("/nonexistent/terasort.toml")).unwrap();
        assert!(cfg.mmap_element_count.is_none());
    }
}
