use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use threatcore::scheduler::SchedulerConfig;

/// Daemon settings: where the collaborators live plus the engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// JSON array of track points.
    pub tracks: PathBuf,
    /// JSON array of smuggling areas. Without it the scheduler's fallback areas apply.
    pub areas: Option<PathBuf>,
    /// Append-only JSON-lines result file.
    pub results: PathBuf,
    pub scheduler: SchedulerConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tracks: PathBuf::from("tools/data/tracks.json"),
            areas: None,
            results: PathBuf::from("tools/data/threat_results.jsonl"),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl DaemonConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading daemon config {}", path_ref.display()))?;
        let config: DaemonConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing daemon config {}", path_ref.display()))?;
        Ok(config)
    }

    /// Command-line values win over the file.
    pub fn with_overrides(
        mut self,
        tracks: Option<PathBuf>,
        areas: Option<PathBuf>,
        results: Option<PathBuf>,
        interval_minutes: Option<u64>,
    ) -> Self {
        if let Some(tracks) = tracks {
            self.tracks = tracks;
        }
        if areas.is_some() {
            self.areas = areas;
        }
        if let Some(results) = results {
            self.results = results;
        }
        if let Some(minutes) = interval_minutes {
            self.scheduler.interval_minutes = minutes;
        }
        self
    }
}
