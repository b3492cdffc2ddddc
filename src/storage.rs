use crate::types::Result;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Persist the rendered report to a timestamped path under `dir`.
///
/// Runs before any network delivery so a failed upload or email never loses
/// the content.
pub fn save_report(dir: &Path, content: &str, now: DateTime<Utc>) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("news_report_{}.md", now.format("%Y%m%d_%H%M")));
    fs::write(&path, content)?;
    info!(path = %path.display(), "Report saved");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn report_is_written_to_timestamped_path() {
        let dir = std::env::temp_dir().join("news-digest-storage-test");
        let _ = fs::remove_dir_all(&dir);
        let now = Utc.with_ymd_and_hms(2025, 8, 25, 14, 30, 0).unwrap();

        let path = save_report(&dir, "# report", now).unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "news_report_20250825_1430.md"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "# report");
        let _ = fs::remove_dir_all(&dir);
    }
}
