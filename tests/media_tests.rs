mod test_utils;

use std::path::Path;

use ai_images_backend::{
    entities::{auth::Capability, media::UploadedFile},
    errors::AppError,
    use_cases::media::MediaHandler,
};
use test_utils::*;

fn spool(dir: &Path, original_name: &str, bytes: &[u8]) -> UploadedFile {
    let path = dir.join(format!("spool-{}", original_name));
    std::fs::write(&path, bytes).unwrap();
    UploadedFile {
        original_name: original_name.to_string(),
        path,
        size: bytes.len() as u64,
    }
}

#[tokio::test]
async fn each_file_is_accepted_or_rejected_on_its_own() {
    let fixture = Fixture::new(StaticGenerator::returning_png());
    let handler = fixture.media_handler();
    let dir = fixture.dir.path();

    let files = vec![
        spool(dir, "Red Mug.png", &png_bytes(40, 20)),
        spool(dir, "notes.txt", b"plain text"),
        spool(dir, "fake.png", b"definitely not an image"),
    ];

    let response = handler.upload(&generator_user(1), &files).await.unwrap();

    assert_eq!(response.uploaded, 1);
    assert_eq!(response.failed, 2);
    assert_eq!(response.results.len(), 3);

    let stored = response.results[0].asset.as_ref().expect("png stored");
    assert_eq!(stored.file_name, "red-mug.png");
    assert_eq!((stored.width, stored.height), (40, 20));
    assert_eq!(stored.mime_type, "image/png");
    assert!(stored.url.ends_with("/uploads/red-mug.png"));
    assert!(fixture.storage.exists("red-mug.png").await);

    assert!(!response.results[1].success);
    assert!(response.results[1].error.is_some());
    assert!(!response.results[2].success);

    assert_eq!(fixture.media.all().len(), 1);
}

#[tokio::test]
async fn same_name_uploads_get_distinct_files() {
    let fixture = Fixture::new(StaticGenerator::returning_png());
    let handler = fixture.media_handler();
    let dir = fixture.dir.path();
    let auth = generator_user(1);

    handler
        .upload(&auth, &[spool(dir, "a.png", &png_bytes(8, 8))])
        .await
        .unwrap();
    let second = handler
        .upload(&auth, &[spool(dir, "a.png", &png_bytes(8, 8))])
        .await
        .unwrap();

    let asset = second.results[0].asset.as_ref().unwrap();
    assert_eq!(asset.file_name, "a-1.png");
}

#[tokio::test]
async fn oversized_file_is_rejected() {
    let fixture = Fixture::new(StaticGenerator::returning_png());
    let mut settings = fixture.settings.clone();
    settings.max_file_size = 16;
    let handler = MediaHandler::new(fixture.media.clone(), fixture.storage.clone(), settings);

    let response = handler
        .upload(&generator_user(1), &[spool(fixture.dir.path(), "big.png", &png_bytes(32, 32))])
        .await
        .unwrap();

    assert_eq!(response.uploaded, 0);
    assert_eq!(response.failed, 1);
}

#[tokio::test]
async fn empty_and_oversized_batches_are_bad_requests() {
    let fixture = Fixture::new(StaticGenerator::returning_png());
    let handler = fixture.media_handler();
    let auth = generator_user(1);

    assert!(matches!(handler.upload(&auth, &[]).await, Err(AppError::BadRequest(_))));

    let too_many: Vec<_> = (0..=fixture.settings.max_files_per_upload)
        .map(|i| spool(fixture.dir.path(), &format!("f{}.png", i), &png_bytes(4, 4)))
        .collect();
    assert!(matches!(handler.upload(&auth, &too_many).await, Err(AppError::BadRequest(_))));
    assert!(fixture.media.all().is_empty());
}

#[tokio::test]
async fn failed_insert_leaves_no_files_behind() {
    let fixture = Fixture::new(StaticGenerator::returning_png());
    let handler = MediaHandler::new(
        InMemoryMediaRepo::failing(),
        fixture.storage.clone(),
        fixture.settings.clone(),
    );

    let response = handler
        .upload(&generator_user(1), &[spool(fixture.dir.path(), "lost.png", &png_bytes(8, 8))])
        .await
        .unwrap();

    assert_eq!(response.failed, 1);
    assert!(!fixture.storage.exists("lost.png").await);
}

#[tokio::test]
async fn asset_lookup_and_capability() {
    let fixture = Fixture::new(StaticGenerator::returning_png());
    let handler = fixture.media_handler();
    let seeded = fixture.seed_image(1, "known.png", 8, 8).await;

    let found = handler.get_asset(&generator_user(1), seeded.id).await.unwrap();
    assert_eq!(found.file_name, "known.png");
    assert_eq!(found.thumbnail_url, found.url);

    assert!(matches!(
        handler.get_asset(&generator_user(1), 999).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        handler.upload(&user(1, &[Capability::ViewHistory]), &[]).await,
        Err(AppError::ForbiddenAccess(_))
    ));
}
