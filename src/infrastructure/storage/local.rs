use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tokio::{fs, io::AsyncWriteExt};

use crate::{
    entities::generation::GenerationType,
    processing_errors::ProcessingError,
    utils::sanitize::{file_stem_slug, is_safe_file_name},
};

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Files of the media library, kept in one flat uploads directory and
/// served under `/uploads/`.
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    public_base_url: String,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        MediaStorage {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!("{}/uploads/{}", self.public_base_url, file_name)
    }

    /// Writes `bytes` under `desired_name`, or under `stem-1.ext`, `stem-2.ext`
    /// and so on if the name is taken. Returns the name actually used.
    pub async fn write_unique(&self, desired_name: &str, bytes: &[u8]) -> Result<String, ProcessingError> {
        if !is_safe_file_name(desired_name) {
            return Err(ProcessingError::StorageWriteError(format!("unsafe file name: {}", desired_name)));
        }

        fs::create_dir_all(&self.root).await.map_err(|e| {
            ProcessingError::StorageWriteError(format!("{}: {}", self.root.display(), e))
        })?;

        let (stem, ext) = split_name(desired_name);

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let candidate = unique_candidate(stem, ext, attempt);
            let path = self.root.join(&candidate);

            let mut file = match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(ProcessingError::StorageWriteError(e.to_string())),
            };

            let written = async {
                file.write_all(bytes).await?;
                file.flush().await
            }
            .await;

            if let Err(e) = written {
                let _ = fs::remove_file(&path).await;
                return Err(ProcessingError::StorageWriteError(e.to_string()));
            }

            return Ok(candidate);
        }

        Err(ProcessingError::StorageWriteError(format!(
            "no free file name for {}",
            desired_name
        )))
    }

    /// Replaces the content of an existing name.
    pub async fn overwrite(&self, file_name: &str, bytes: &[u8]) -> Result<(), ProcessingError> {
        if !is_safe_file_name(file_name) {
            return Err(ProcessingError::StorageWriteError(format!("unsafe file name: {}", file_name)));
        }
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ProcessingError::StorageWriteError(e.to_string()))?;
        fs::write(self.path_for(file_name), bytes)
            .await
            .map_err(|e| ProcessingError::StorageWriteError(e.to_string()))
    }

    pub async fn read(&self, file_name: &str) -> std::io::Result<Vec<u8>> {
        if !is_safe_file_name(file_name) {
            return Err(std::io::Error::new(ErrorKind::InvalidInput, "unsafe file name"));
        }
        fs::read(self.path_for(file_name)).await
    }

    pub async fn exists(&self, file_name: &str) -> bool {
        is_safe_file_name(file_name) && fs::try_exists(self.path_for(file_name)).await.unwrap_or(false)
    }

    pub async fn remove(&self, file_name: &str) {
        if let Err(e) = fs::remove_file(self.path_for(file_name)).await {
            tracing::warn!(file_name, error = %e, "Failed to remove stored file");
        }
    }
}

fn split_name(name: &str) -> (&str, &str) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (name, ""),
    }
}

pub fn unique_candidate(stem: &str, ext: &str, attempt: u32) -> String {
    match (attempt, ext.is_empty()) {
        (0, true) => stem.to_string(),
        (0, false) => format!("{}.{}", stem, ext),
        (n, true) => format!("{}-{}", stem, n),
        (n, false) => format!("{}-{}.{}", stem, n, ext),
    }
}

/// `{source stem}_{type marker}_{YYYYmmddHHMMSS}.{ext}`
pub fn generated_file_name(
    source_file_name: &str,
    generation_type: GenerationType,
    ext: &str,
    now: DateTime<Utc>,
) -> String {
    format!(
        "{}_{}_{}.{}",
        file_stem_slug(source_file_name),
        generation_type.file_suffix(),
        now.format("%Y%m%d%H%M%S"),
        ext
    )
}

/// Extension matching the sniffed content, `jpg` when unknown.
pub fn extension_for_bytes(bytes: &[u8]) -> &'static str {
    match infer::get(bytes).map(|kind| kind.mime_type()) {
        Some("image/png") => "png",
        Some("image/gif") => "gif",
        Some("image/webp") => "webp",
        _ => "jpg",
    }
}

pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

pub fn thumbnail_file_name(file_name: &str, size: u32) -> String {
    let (stem, _) = split_name(file_name);
    format!("{}-{}x{}.jpg", stem, size, size)
}
