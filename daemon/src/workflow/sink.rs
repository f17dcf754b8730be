use log::debug;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use threatcore::interface::{ResultSink, ThreatResult};
use threatcore::prelude::{DetectorKind, StoreError, StoreResult};

/// One line of the results file.
#[derive(Serialize)]
struct ResultLine<'a> {
    collection: DetectorKind,
    mmsi: &'a str,
    result: &'a ThreatResult,
}

/// Appends every result as one JSON object per line.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonLinesSink {
    fn persist_result(
        &self,
        kind: DetectorKind,
        mmsi: &str,
        result: &ThreatResult,
    ) -> StoreResult<()> {
        let mut line = serde_json::to_string(&ResultLine {
            collection: kind,
            mmsi,
            result,
        })
        .map_err(|err| StoreError::Malformed(err.to_string()))?;
        line.push('\n');

        let mut file = self
            .file
            .lock()
            .map_err(|_| StoreError::Unavailable("result file lock poisoned".into()))?;
        file.write_all(line.as_bytes())?;
        debug!("persisted {} result for {} to {}", kind, mmsi, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use threatcore::interface::result::{LoiteringDetails, ThreatDetails, TimeWindow};

    fn sample(mmsi: &str) -> ThreatResult {
        ThreatResult::new(
            mmsi,
            0.4,
            TimeWindow::default(),
            "Loitering detected",
            ThreatDetails::Loitering(LoiteringDetails {
                start_time: None,
                loiter_time_minutes: 30.0,
                t0: 10.0,
                t1: 60.0,
                loiter_area: None,
            }),
        )
    }

    #[test]
    fn results_are_appended_as_json_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/results.jsonl");
        let sink = JsonLinesSink::open(&path).unwrap();

        sink.persist_result(DetectorKind::Loitering, "416000001", &sample("416000001"))
            .unwrap();
        sink.persist_result(DetectorKind::Loitering, "416000002", &sample("416000002"))
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["collection"], "loitering");
        assert_eq!(lines[1]["mmsi"], "416000002");
        assert_eq!(lines[0]["result"]["riskScore"], 0.4);
        assert_eq!(lines[0]["result"]["details"]["detector"], "loitering");
    }

    #[test]
    fn reopening_keeps_earlier_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("results.jsonl");

        JsonLinesSink::open(&path)
            .unwrap()
            .persist_result(DetectorKind::Loitering, "1", &sample("1"))
            .unwrap();
        JsonLinesSink::open(&path)
            .unwrap()
            .persist_result(DetectorKind::Loitering, "2", &sample("2"))
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
