use crate::client::SnapshotClient;
use crate::services::mock;
use crate::snapshot::Snapshot;
use log::info;
use std::path::PathBuf;

/// Anything that can hand over a complete snapshot.
pub trait SnapshotSource {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<Snapshot, String>;
}

pub struct MockSource;

impl SnapshotSource for MockSource {
    fn describe(&self) -> String {
        "mock NH44 fleet".to_string()
    }

    fn fetch(&self) -> Result<Snapshot, String> {
        Ok(mock::snapshot())
    }
}

pub struct FileSource {
    pub path: PathBuf,
}

impl SnapshotSource for FileSource {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn fetch(&self) -> Result<Snapshot, String> {
        Snapshot::load(&self.path).map_err(|e| e.to_string())
    }
}

pub struct HttpSource {
    pub client: SnapshotClient,
}

impl SnapshotSource for HttpSource {
    fn describe(&self) -> String {
        format!("http {}", self.client.url())
    }

    fn fetch(&self) -> Result<Snapshot, String> {
        self.client
            .fetch_snapshot()
            .map_err(|e| format!("fetch snapshot from {} failed: {}", self.client.url(), e))
    }
}

/// Fetch from `source`, logging where the snapshot came from and how big it is.
pub fn fetch_logged(source: &dyn SnapshotSource) -> Result<Snapshot, String> {
    let snapshot = source.fetch()?;
    info!(
        "Snapshot loaded from {} (zones={}, poles={}, readings={}, faults={}, tickets={}, energy_rows={})",
        source.describe(),
        snapshot.zones.len(),
        snapshot.assets.len(),
        snapshot.telemetry.len(),
        snapshot.faults.len(),
        snapshot.maintenance_tickets.len(),
        snapshot.energy_summary.len()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_source_reads_fixture() {
        let source = FileSource {
            path: PathBuf::from("tests/data/snapshot.json"),
        };
        let snapshot = fetch_logged(&source).expect("fixture");
        assert_eq!(snapshot.zones.len(), 2);
    }

    #[test]
    fn missing_file_is_an_error_not_a_panic() {
        let source = FileSource {
            path: PathBuf::from("tests/data/does-not-exist.json"),
        };
        let err = source.fetch().expect_err("missing file");
        assert!(err.contains("does-not-exist.json"), "{err}");
    }

    #[test]
    fn mock_source_is_deterministic() {
        assert_eq!(MockSource.fetch(), MockSource.fetch());
    }
}
