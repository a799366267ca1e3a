#![allow(dead_code)]

use std::{
    io::Cursor,
    path::Path,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    },
};

use ai_images_backend::{
    entities::{
        auth::{AuthContext, Capability},
        brand_kit::{BrandKit, BrandKitChanges, BrandKitInsert},
        history::{GenerationHistoryEntry, GenerationStatus, HistoryInsert},
        media::{MediaAsset, MediaAssetInsert},
    },
    errors::AppError,
    imaging::optimizer::ImageOptimizer,
    processing_errors::ProcessingError,
    repositories::{
        brand_kit::BrandKitRepository,
        history::GenerationHistoryRepository,
        image_generation::{GenerationCall, ImageGenerationService},
        media::MediaRepository,
    },
    settings::GenerationSettings,
    storage::local::MediaStorage,
    use_cases::{
        brand_kit::BrandKitHandler, generation::GenerationHandler, image_processor::ImageProcessor,
        media::MediaHandler,
    },
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use image::{ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use tempfile::TempDir;

pub const PUBLIC_BASE_URL: &str = "http://media.test";

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 40, 90]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}

pub fn png_base64(width: u32, height: u32) -> String {
    STANDARD.encode(png_bytes(width, height))
}

pub fn user(user_id: i64, capabilities: &[Capability]) -> AuthContext {
    AuthContext::new(user_id, format!("user-{}", user_id), capabilities.iter().copied())
}

pub fn generator_user(user_id: i64) -> AuthContext {
    user(
        user_id,
        &[Capability::Generate, Capability::ViewHistory, Capability::ManageBrandKits],
    )
}

/// Settings for a test run rooted in `dir`. Images larger than 64px get an
/// optimized copy in the temp directory.
pub fn test_settings(dir: &Path) -> GenerationSettings {
    GenerationSettings {
        api_key: "test-key".into(),
        max_image_dimension: 64,
        max_generations_per_user: 50,
        ..GenerationSettings::default()
    }
    .normalize(&dir.join("uploads"))
}

// ───── In-memory repositories ──────────────────────────────────────

#[derive(Clone, Default)]
pub struct InMemoryMediaRepo {
    pub assets: Arc<Mutex<Vec<MediaAsset>>>,
    next_id: Arc<AtomicI64>,
    pub fail_inserts: bool,
}

impl InMemoryMediaRepo {
    pub fn new() -> Self {
        InMemoryMediaRepo {
            next_id: Arc::new(AtomicI64::new(1)),
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        InMemoryMediaRepo {
            fail_inserts: true,
            ..InMemoryMediaRepo::new()
        }
    }

    pub fn all(&self) -> Vec<MediaAsset> {
        self.assets.lock().clone()
    }

    pub fn find(&self, id: i64) -> Option<MediaAsset> {
        self.assets.lock().iter().find(|a| a.id == id).cloned()
    }
}

#[async_trait]
impl MediaRepository for InMemoryMediaRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn get_asset(&self, id: i64) -> Result<Option<MediaAsset>, AppError> {
        Ok(self.find(id))
    }

    async fn find_by_file_name(&self, file_name: &str) -> Result<Option<MediaAsset>, AppError> {
        Ok(self
            .assets
            .lock()
            .iter()
            .find(|a| a.file_name == file_name)
            .cloned())
    }

    async fn insert_asset(&self, asset: &MediaAssetInsert) -> Result<MediaAsset, AppError> {
        if self.fail_inserts {
            return Err(AppError::DatabaseError);
        }

        let stored = MediaAsset {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            user_id: asset.user_id,
            parent_id: asset.parent_id,
            file_name: asset.file_name.clone(),
            mime_type: asset.mime_type.clone(),
            file_size: asset.file_size,
            width: asset.width,
            height: asset.height,
            thumbnail_file_name: asset.thumbnail_file_name.clone(),
            generation: asset.generation.clone(),
            created_at: Utc::now(),
        };
        self.assets.lock().push(stored.clone());
        Ok(stored)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryHistoryRepo {
    pub entries: Arc<Mutex<Vec<GenerationHistoryEntry>>>,
}

impl InMemoryHistoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` already-failed attempts for `user_id` dated now.
    pub fn seed_failed(&self, user_id: i64, count: usize) {
        let mut entries = self.entries.lock();
        for _ in 0..count {
            let id = entries.len() as i64 + 1;
            entries.push(GenerationHistoryEntry {
                id,
                user_id,
                original_image_id: None,
                generated_image_id: None,
                prompt: "seeded".into(),
                style_description: String::new(),
                brand_kit_id: None,
                generation_type: Default::default(),
                status: GenerationStatus::Failed,
                error_message: Some("seeded".into()),
                created_at: Utc::now(),
            });
        }
    }

    pub fn all(&self) -> Vec<GenerationHistoryEntry> {
        self.entries.lock().clone()
    }

    fn transition(&self, id: i64, apply: impl FnOnce(&mut GenerationHistoryEntry)) -> Result<(), AppError> {
        let mut entries = self.entries.lock();
        match entries
            .iter_mut()
            .find(|e| e.id == id && e.status == GenerationStatus::Pending)
        {
            Some(entry) => {
                apply(entry);
                Ok(())
            }
            None => Err(AppError::Conflict(format!("history entry {} is not pending", id))),
        }
    }
}

#[async_trait]
impl GenerationHistoryRepository for InMemoryHistoryRepo {
    async fn create_pending(&self, entry: &HistoryInsert) -> Result<i64, AppError> {
        let mut entries = self.entries.lock();
        let id = entries.len() as i64 + 1;
        entries.push(GenerationHistoryEntry {
            id,
            user_id: entry.user_id,
            original_image_id: entry.original_image_id,
            generated_image_id: None,
            prompt: entry.prompt.clone(),
            style_description: entry.style_description.clone(),
            brand_kit_id: entry.brand_kit_id,
            generation_type: entry.generation_type,
            status: GenerationStatus::Pending,
            error_message: None,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn mark_completed(&self, id: i64, generated_image_id: i64) -> Result<(), AppError> {
        self.transition(id, |e| {
            e.status = GenerationStatus::Completed;
            e.generated_image_id = Some(generated_image_id);
        })
    }

    async fn mark_failed(&self, id: i64, error_message: &str) -> Result<(), AppError> {
        self.transition(id, |e| {
            e.status = GenerationStatus::Failed;
            e.error_message = Some(error_message.to_string());
        })
    }

    async fn count_since(&self, user_id: i64, since: DateTime<Utc>) -> Result<i64, AppError> {
        Ok(self
            .entries
            .lock()
            .iter()
            .filter(|e| e.user_id == user_id && e.created_at >= since)
            .count() as i64)
    }

    async fn count_for_user(&self, user_id: i64) -> Result<i64, AppError> {
        Ok(self.entries.lock().iter().filter(|e| e.user_id == user_id).count() as i64)
    }

    async fn list_for_user(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<GenerationHistoryEntry>, AppError> {
        let mut mine: Vec<_> = self
            .entries
            .lock()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(mine
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBrandKitRepo {
    pub kits: Arc<Mutex<Vec<BrandKit>>>,
}

impl InMemoryBrandKitRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<BrandKit> {
        self.kits.lock().clone()
    }
}

#[async_trait]
impl BrandKitRepository for InMemoryBrandKitRepo {
    async fn list_brand_kits(&self, user_id: i64) -> Result<Vec<BrandKit>, AppError> {
        let mut kits: Vec<_> = self
            .kits
            .lock()
            .iter()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect();
        kits.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(kits)
    }

    async fn get_brand_kit(&self, id: i64) -> Result<Option<BrandKit>, AppError> {
        Ok(self.kits.lock().iter().find(|k| k.id == id).cloned())
    }

    async fn create_brand_kit(&self, kit: &BrandKitInsert) -> Result<BrandKit, AppError> {
        let mut kits = self.kits.lock();
        let now = Utc::now();
        let created = BrandKit {
            id: kits.iter().map(|k| k.id).max().unwrap_or(0) + 1,
            user_id: kit.user_id,
            name: kit.name.clone(),
            colors: kit.colors.clone(),
            fonts: kit.fonts.clone(),
            style_guidelines: kit.style_guidelines.clone(),
            created_at: now,
            updated_at: now,
        };
        kits.push(created.clone());
        Ok(created)
    }

    async fn update_brand_kit(&self, id: i64, changes: &BrandKitChanges) -> Result<BrandKit, AppError> {
        let mut kits = self.kits.lock();
        let kit = kits
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| AppError::NotFound("Brand kit not found".into()))?;

        if let Some(name) = &changes.name {
            kit.name = name.clone();
        }
        if let Some(colors) = &changes.colors {
            kit.colors = colors.clone();
        }
        if let Some(fonts) = &changes.fonts {
            kit.fonts = fonts.clone();
        }
        if let Some(guidelines) = &changes.style_guidelines {
            kit.style_guidelines = guidelines.clone();
        }
        kit.updated_at = Utc::now();
        Ok(kit.clone())
    }

    async fn delete_brand_kit(&self, id: i64) -> Result<(), AppError> {
        let mut kits = self.kits.lock();
        let before = kits.len();
        kits.retain(|k| k.id != id);
        if kits.len() == before {
            return Err(AppError::NotFound("Brand kit not found".into()));
        }
        Ok(())
    }
}

/// Answers every call with the same payload and records what it was asked.
#[derive(Clone)]
pub struct StaticGenerator {
    pub response: Result<String, ProcessingError>,
    pub calls: Arc<Mutex<Vec<GenerationCall>>>,
}

impl StaticGenerator {
    pub fn returning_png() -> Self {
        StaticGenerator {
            response: Ok(png_base64(32, 32)),
            calls: Arc::default(),
        }
    }

    pub fn failing(error: ProcessingError) -> Self {
        StaticGenerator {
            response: Err(error),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> Vec<GenerationCall> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ImageGenerationService for StaticGenerator {
    async fn generate(&self, call: &GenerationCall) -> Result<String, ProcessingError> {
        self.calls.lock().push(call.clone());
        self.response.clone()
    }
}

// ───── Fixtures ──────────────────────────────────────────────────────

/// A temp uploads directory plus the handlers wired to in-memory state.
pub struct Fixture<G: ImageGenerationService + Clone> {
    pub dir: TempDir,
    pub settings: GenerationSettings,
    pub storage: MediaStorage,
    pub media: InMemoryMediaRepo,
    pub history: InMemoryHistoryRepo,
    pub kits: InMemoryBrandKitRepo,
    pub generator: G,
}

impl<G: ImageGenerationService + Clone> Fixture<G> {
    pub fn new(generator: G) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let settings = test_settings(dir.path());
        let storage = MediaStorage::new(dir.path().join("uploads"), PUBLIC_BASE_URL);

        Fixture {
            dir,
            settings,
            storage,
            media: InMemoryMediaRepo::new(),
            history: InMemoryHistoryRepo::new(),
            kits: InMemoryBrandKitRepo::new(),
            generator,
        }
    }

    pub fn processor(&self) -> ImageProcessor<InMemoryMediaRepo, G> {
        self.processor_with(self.generator.clone())
    }

    /// A processor over this fixture's storage that calls `generator`.
    pub fn processor_with<T: ImageGenerationService>(&self, generator: T) -> ImageProcessor<InMemoryMediaRepo, T> {
        ImageProcessor::new(
            self.media.clone(),
            generator,
            self.storage.clone(),
            ImageOptimizer::new(&self.settings.temp_directory, self.settings.decode_memory_budget),
            self.settings.clone(),
        )
    }

    pub fn generation_handler(
        &self,
    ) -> GenerationHandler<InMemoryHistoryRepo, InMemoryBrandKitRepo, InMemoryMediaRepo, G> {
        self.generation_handler_with(self.generator.clone())
    }

    pub fn generation_handler_with<T: ImageGenerationService>(
        &self,
        generator: T,
    ) -> GenerationHandler<InMemoryHistoryRepo, InMemoryBrandKitRepo, InMemoryMediaRepo, T> {
        GenerationHandler::new(
            self.history.clone(),
            self.kits.clone(),
            self.processor_with(generator),
            self.settings.max_generations_per_user,
        )
    }

    pub fn brand_kit_handler(&self) -> BrandKitHandler<InMemoryBrandKitRepo> {
        BrandKitHandler::new(self.kits.clone())
    }

    pub fn media_handler(&self) -> MediaHandler<InMemoryMediaRepo> {
        MediaHandler::new(self.media.clone(), self.storage.clone(), self.settings.clone())
    }

    /// Writes a PNG into the uploads directory and registers it as an asset.
    pub async fn seed_image(&self, user_id: i64, file_name: &str, width: u32, height: u32) -> MediaAsset {
        let bytes = png_bytes(width, height);
        std::fs::create_dir_all(self.storage.root()).expect("create uploads dir");
        std::fs::write(self.storage.path_for(file_name), &bytes).expect("write source image");

        self.media
            .insert_asset(&MediaAssetInsert {
                user_id,
                parent_id: None,
                file_name: file_name.to_string(),
                mime_type: "image/png".into(),
                file_size: bytes.len() as i64,
                width: width as i32,
                height: height as i32,
                thumbnail_file_name: None,
                generation: None,
            })
            .await
            .expect("insert source asset")
    }

    pub fn temp_files(&self) -> Vec<String> {
        match std::fs::read_dir(&self.settings.temp_directory) {
            Ok(entries) => entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}
