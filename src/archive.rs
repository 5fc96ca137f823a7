//! Optional local archival of results as timestamped JSON files.
//!
//! Files are named `{prefix}_{YYYYmmdd_HHMMSS}.json` and written atomically
//! (temp file + rename) so a reader never sees a partial report. Archival is
//! best-effort from the caller's point of view: [`Archive::save_logged`]
//! turns failures into a warning and `None`.

use crate::config::PipelineConfig;
use crate::error::ComplianceError;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which archive directory a record belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Templates and pipeline runs.
    Output,
    /// Quality-check reports.
    QualityCheck,
}

#[derive(Debug, Clone)]
pub struct Archive {
    outputs_dir: PathBuf,
    quality_checks_dir: PathBuf,
}

impl Archive {
    pub fn new(outputs_dir: impl Into<PathBuf>, quality_checks_dir: impl Into<PathBuf>) -> Self {
        Self {
            outputs_dir: outputs_dir.into(),
            quality_checks_dir: quality_checks_dir.into(),
        }
    }

    /// An archive when `save_local_copies` is on, else `None`.
    pub fn from_config(config: &PipelineConfig) -> Option<Self> {
        config
            .save_local_copies
            .then(|| Self::new(&config.outputs_dir, &config.quality_checks_dir))
    }

    fn dir(&self, kind: ArchiveKind) -> &Path {
        match kind {
            ArchiveKind::Output => &self.outputs_dir,
            ArchiveKind::QualityCheck => &self.quality_checks_dir,
        }
    }

    /// Write `record` as pretty JSON and return the final path.
    pub async fn save<T: Serialize>(
        &self,
        kind: ArchiveKind,
        prefix: &str,
        record: &T,
        at: DateTime<Local>,
    ) -> Result<PathBuf, ComplianceError> {
        let dir = self.dir(kind);
        let path = dir.join(archive_file_name(prefix, at));
        let write_err = |e: std::io::Error| ComplianceError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        };

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| ComplianceError::Internal(format!("Failed to serialise record: {}", e)))?;

        tokio::fs::create_dir_all(dir).await.map_err(write_err)?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &path).await.map_err(write_err)?;

        info!("Archived {} bytes to {}", json.len(), path.display());
        Ok(path)
    }

    /// [`Archive::save`], logging failures instead of returning them.
    pub async fn save_logged<T: Serialize>(
        &self,
        kind: ArchiveKind,
        prefix: &str,
        record: &T,
        at: DateTime<Local>,
    ) -> Option<String> {
        match self.save(kind, prefix, record, at).await {
            Ok(path) => Some(path.display().to_string()),
            Err(e) => {
                warn!("Could not archive '{}': {}", prefix, e);
                None
            }
        }
    }
}

/// `{prefix}_{YYYYmmdd_HHMMSS}.json`, with path-unsafe characters in the
/// prefix replaced by `_`.
pub fn archive_file_name(prefix: &str, at: DateTime<Local>) -> String {
    let prefix: String = prefix
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}.json", prefix, at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn file_names() {
        assert_eq!(
            archive_file_name("iso_template_sop", at()),
            "iso_template_sop_20260314_092653.json"
        );
        assert_eq!(
            archive_file_name("quality_check_../etc x", at()),
            "quality_check____etc_x_20260314_092653.json"
        );
    }

    #[test]
    fn disabled_by_default() {
        assert!(Archive::from_config(&PipelineConfig::default()).is_none());
    }

    #[tokio::test]
    async fn writes_pretty_json_into_kind_directory() {
        let root = tempfile::tempdir().unwrap();
        let archive = Archive::new(root.path().join("out"), root.path().join("qc"));

        let path = archive
            .save(ArchiveKind::QualityCheck, "quality_check_sop", &json!({"score": 90}), at())
            .await
            .unwrap();
        assert!(path.starts_with(root.path().join("qc")));
        let body = std::fs::read_to_string(&path).unwrap();
        assert_eq!(serde_json::from_str::<serde_json::Value>(&body).unwrap(), json!({"score": 90}));
        assert!(body.contains('\n'));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn failures_are_logged_not_returned() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // A regular file where the directory should be.
        let archive = Archive::new(&blocker, &blocker);
        let saved = archive
            .save_logged(ArchiveKind::Output, "iso_template_sop", &json!({}), at())
            .await;
        assert!(saved.is_none());
    }
}
