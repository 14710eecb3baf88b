//! Snapshot save/load
//!
//! Features:
//! - Versioned JSON envelope
//! - Parameter and topology verification on load
//! - Write to a temporary file, then rename over the target

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::validate_bounds;
use crate::error::{ConfigError, SnapshotError};
use crate::sim::{Actuator, Surface};

/// Format version written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

/// Full deep copy of a running surface and its actuator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub surface: Surface,
    pub actuator: Actuator,
}

/// Reads only the version so a newer layout fails with a clear error
#[derive(Deserialize)]
struct VersionHeader {
    version: u32,
}

impl Snapshot {
    pub fn new(surface: Surface, actuator: Actuator) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            surface,
            actuator,
        }
    }

    pub fn into_parts(self) -> (Surface, Actuator) {
        (self.surface, self.actuator)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let header: VersionHeader = serde_json::from_str(json)?;
        if header.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.verify()?;
        Ok(snapshot)
    }

    /// Reject decoded state that a step or score could not run on
    fn verify(&self) -> Result<(), SnapshotError> {
        let invalid = |e: ConfigError| SnapshotError::Inconsistent(e.to_string());
        self.surface.config().validate().map_err(invalid)?;
        validate_bounds(&self.surface.bounds()).map_err(invalid)?;
        validate_bounds(&self.actuator.bounds()).map_err(invalid)?;

        // Topology first: the partition check trusts ids to match slots
        if !self.surface.check_topology() {
            return Err(SnapshotError::Inconsistent(
                "point ids, link partners or incoming counts are wrong".into(),
            ));
        }
        if !self.surface.check_partition() {
            return Err(SnapshotError::Inconsistent(
                "region lists do not match live points".into(),
            ));
        }
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, self.to_json()?)?;
        fs::rename(&tmp, path)?;
        log::info!(
            "Snapshot saved to {} (step {}, {} points)",
            path.display(),
            self.surface.steps(),
            self.surface.live_count()
        );
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let snapshot = Self::from_json(&json)?;
        log::info!("Loaded snapshot from {}", path.display());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;
    use crate::config::ClothConfig;
    use crate::sim::{PointId, TargetShape};
    use glam::Vec2;

    fn snapshot() -> Snapshot {
        let config = ClothConfig::grid(6, 5, 10.0);
        let shape = TargetShape::annulus(Vec2::new(75.0, 70.0), 15.0);
        let mut surface = Surface::new(&config, Bounds::default(), &shape).unwrap();
        let mut actuator = Actuator::new(Vec2::new(80.0, 70.0), Bounds::default());
        surface.pin_position(60.0, 60.0, Some(3.0));
        surface.sever_all_links(PointId(8));
        for _ in 0..5 {
            surface.step(&mut actuator).unwrap();
        }
        Snapshot::new(surface, actuator)
    }

    #[test]
    fn test_json_round_trip() {
        let snap = snapshot();
        let json = snap.to_json().unwrap();
        let back = Snapshot::from_json(&json).unwrap();
        assert_eq!(back, snap);
        assert_eq!(back.surface.removed().len(), 1);
    }

    #[test]
    fn test_truncated_json_is_corrupt() {
        let json = snapshot().to_json().unwrap();
        let err = Snapshot::from_json(&json[..json.len() / 2]).unwrap_err();
        assert!(matches!(err, SnapshotError::Corrupt(_)));
    }

    #[test]
    fn test_version_mismatch() {
        let mut snap = snapshot();
        snap.version = SNAPSHOT_VERSION + 1;
        let json = serde_json::to_string(&snap).unwrap();
        let err = Snapshot::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnsupportedVersion { found: 2, expected: 1 }
        ));
    }

    #[test]
    fn test_inconsistent_topology_rejected() {
        let mut snap = snapshot();
        snap.surface.target.clear();
        let json = serde_json::to_string(&snap).unwrap();
        assert!(matches!(
            Snapshot::from_json(&json),
            Err(SnapshotError::Inconsistent(_))
        ));
    }

    /// Serialize `snap`, let `edit` corrupt the JSON tree, then load it back
    fn load_edited(
        snap: &Snapshot,
        edit: impl FnOnce(&mut serde_json::Value),
    ) -> Result<Snapshot, SnapshotError> {
        let mut value = serde_json::to_value(snap).unwrap();
        edit(&mut value);
        Snapshot::from_json(&value.to_string())
    }

    #[test]
    fn test_out_of_range_point_id_rejected() {
        let err = load_edited(&snapshot(), |v| {
            v["surface"]["points"][0]["id"] = 9999.into();
        })
        .unwrap_err();
        assert!(matches!(err, SnapshotError::Inconsistent(_)));
    }

    #[test]
    fn test_swapped_point_ids_rejected() {
        let err = load_edited(&snapshot(), |v| {
            v["surface"]["points"][0]["id"] = 1.into();
            v["surface"]["points"][1]["id"] = 0.into();
        })
        .unwrap_err();
        assert!(matches!(err, SnapshotError::Inconsistent(_)));
    }

    #[test]
    fn test_dangling_link_partner_rejected() {
        let err = load_edited(&snapshot(), |v| {
            v["surface"]["points"][7]["links"][0]["partner"] = 4000.into();
        })
        .unwrap_err();
        assert!(matches!(err, SnapshotError::Inconsistent(_)));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let snap = snapshot();
        let edits: [fn(&mut serde_json::Value); 4] = [
            |v| v["surface"]["config"]["iterations"] = 0.into(),
            |v| v["surface"]["config"]["dt"] = (-1.0).into(),
            |v| v["surface"]["bounds"]["x"] = (-5.0).into(),
            |v| v["actuator"]["bounds"]["y"] = 0.0.into(),
        ];
        for edit in edits {
            let err = load_edited(&snap, edit).unwrap_err();
            assert!(matches!(err, SnapshotError::Inconsistent(_)));
        }
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("cloth-snapshot-{}.json", std::process::id()));
        let snap = snapshot();
        snap.save(&path).unwrap();
        let back = Snapshot::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(back, snap);
    }
}
