use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use tokio::time::interval;

pub const OPTIMIZED_PREFIX: &str = "optimized_";
pub const TEMP_FILE_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Removes optimizer leftovers older than `max_age` from `dir`. Returns how
/// many files were deleted.
pub async fn sweep_temp_dir(dir: &Path, max_age: Duration, now: SystemTime) -> std::io::Result<usize> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(OPTIMIZED_PREFIX) {
            continue;
        }

        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();

        if metadata.is_file() && age > max_age {
            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %entry.path().display(), error = %e, "Failed to remove stale temp file"),
            }
        }
    }
    Ok(removed)
}

pub async fn start_temp_sweep_task(temp_dir: PathBuf, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;

        match sweep_temp_dir(&temp_dir, TEMP_FILE_MAX_AGE, SystemTime::now()).await {
            Ok(0) => {}
            Ok(count) => tracing::info!("Removed {} stale optimized images", count),
            Err(e) => tracing::error!("Temp directory sweep failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn only_old_optimized_files_are_removed() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("optimized_a.jpg"), b"a").unwrap();
        std::fs::write(dir.path().join("keep.jpg"), b"k").unwrap();

        let fresh = sweep_temp_dir(dir.path(), TEMP_FILE_MAX_AGE, SystemTime::now()).await.unwrap();
        assert_eq!(fresh, 0);

        let later = SystemTime::now() + Duration::from_secs(2 * 60 * 60);
        let removed = sweep_temp_dir(dir.path(), TEMP_FILE_MAX_AGE, later).await.unwrap();

        assert_eq!(removed, 1);
        assert!(!dir.path().join("optimized_a.jpg").exists());
        assert!(dir.path().join("keep.jpg").exists());
    }

    #[tokio::test]
    async fn missing_directory_is_not_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(sweep_temp_dir(&missing, TEMP_FILE_MAX_AGE, SystemTime::now()).await.unwrap(), 0);
    }
}
