use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::errors::PipelineError;
use crate::models::report::Report;

/// Where a report ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLocation {
    Primary(PathBuf),
    /// The report directory was not writable.
    Fallback(PathBuf),
    /// Neither location was writable; the JSON went to stdout.
    Console,
}

impl ReportLocation {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Primary(p) | Self::Fallback(p) => Some(p),
            Self::Console => None,
        }
    }
}

/// Last-resort directory: `$TMPDIR/stagecraft`.
pub fn fallback_dir() -> PathBuf {
    std::env::temp_dir().join("stagecraft")
}

/// Atomic file write: write `<file>.tmp`, then rename over the target.
pub async fn atomic_write(path: &Path, content: &str) -> Result<(), PipelineError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| PipelineError::Report(format!("Not a file path: {}", path.display())))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    tokio::fs::write(&tmp, content).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

async fn write_into(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, PipelineError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    atomic_write(&path, content).await?;
    Ok(path)
}

/// Persist a report. Never fails: the report directory, then the fallback
/// directory, then stdout. An `unknown` status is finalized to `failed`.
pub async fn write_report(report: &mut Report, report_dir: &Path, file_name: &str) -> ReportLocation {
    report.finalize();

    let json = match serde_json::to_string_pretty(&*report) {
        Ok(json) => json,
        Err(e) => {
            // Only the flattened stage fields can fail; drop them and keep the verdict
            error!(error = %e, "Report not serializable, dropping stage fields");
            report.stage_fields.clear();
            serde_json::to_string_pretty(&*report).unwrap_or_else(|_| {
                format!("{{\"status\": \"{}\", \"issues\": [], \"mitigations\": []}}", report.status)
            })
        }
    };

    match write_into(report_dir, file_name, &json).await {
        Ok(path) => {
            info!(path = %path.display(), status = %report.status, "Report written");
            return ReportLocation::Primary(path);
        }
        Err(e) => warn!(dir = %report_dir.display(), error = %e, "Report directory not writable, trying fallback"),
    }

    let fallback = fallback_dir();
    match write_into(&fallback, file_name, &json).await {
        Ok(path) => {
            warn!(path = %path.display(), "Report written to fallback location");
            ReportLocation::Fallback(path)
        }
        Err(e) => {
            error!(error = %e, "No writable report location, printing report");
            println!("{}", json);
            ReportLocation::Console
        }
    }
}

/// Write a side artifact (e.g. a markdown rendering) next to the reports.
pub async fn write_artifact(report_dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, PipelineError> {
    write_into(report_dir, file_name, content).await
}

/// The last report written to `report_dir`, `None` if there is none.
pub async fn read_report(report_dir: &Path, file_name: &str) -> Result<Option<Report>, PipelineError> {
    let path = report_dir.join(file_name);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => {
            let report = serde_json::from_str(&content)
                .map_err(|e| PipelineError::Report(format!("Malformed report {}: {}", path.display(), e)))?;
            Ok(Some(report))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::ReportStatus;

    #[tokio::test]
    async fn test_write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = Report::new("build");
        report.set_status(ReportStatus::Success);
        report.set_field("image", "ghcr.io/me/myimage:latest");

        let location = write_report(&mut report, dir.path(), "build_report.json").await;
        assert_eq!(location, ReportLocation::Primary(dir.path().join("build_report.json")));
        assert!(!dir.path().join("build_report.json.tmp").exists());

        let back = read_report(dir.path(), "build_report.json").await.unwrap().unwrap();
        assert_eq!(back.status, ReportStatus::Success);
        assert_eq!(back.field("image"), report.field("image"));
    }

    #[tokio::test]
    async fn test_unknown_is_never_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = Report::new("deploy");
        write_report(&mut report, dir.path(), "deploy_report.json").await;

        let raw = std::fs::read_to_string(dir.path().join("deploy_report.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["status"], "failed");
    }

    #[tokio::test]
    async fn test_unwritable_dir_uses_fallback() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the report directory should be
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let mut report = Report::new("test");
        report.set_status(ReportStatus::Skipped);
        let name = format!("fallback_{}.json", uuid::Uuid::new_v4());
        let location = write_report(&mut report, &blocker, &name).await;

        let path = location.path().unwrap().to_path_buf();
        assert_eq!(location, ReportLocation::Fallback(fallback_dir().join(&name)));
        assert!(path.exists());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_missing_report_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_report(dir.path(), "test_report.json").await.unwrap().is_none());
    }
}
