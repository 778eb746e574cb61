//! End-to-end scenarios over the service stack: in-memory catalog, real
//! filesystem chunk store.

use bytes::Bytes;
use chrono::Duration;
use cubby_core::catalog::ThumbnailStore as _;
use cubby_core::{
    AccessCredential, AppError, FileCatalog, Identity, RangeSpec, TempTokenStore, ThumbnailTier,
};
use cubby_services::test_helpers::{MemoryCatalog, MemoryThumbnailStore};
use cubby_services::{
    AccessGuard, DeletionCoordinator, IncomingUpload, LinkService, RangeStreamer, Served,
    ThumbnailDeriver, UploadPipeline,
};
use cubby_storage::{ByteSource, ByteStream, ChunkStore, ChunkStores, FilesystemChunkStore};
use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

struct Stack {
    catalog: MemoryCatalog,
    thumbnails: MemoryThumbnailStore,
    tokens: TempTokenStore,
    store: Arc<FilesystemChunkStore>,
    pipeline: UploadPipeline,
    streamer: RangeStreamer,
    deriver: ThumbnailDeriver,
    coordinator: DeletionCoordinator,
    links: LinkService,
    dir: TempDir,
}

async fn stack_with_limit(max_file_size: u64) -> Stack {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FilesystemChunkStore::new(dir.path()).await.unwrap());
    let stores = ChunkStores::single(store.clone());

    let catalog = MemoryCatalog::new();
    let catalog_dyn: Arc<dyn FileCatalog> = Arc::new(catalog.clone());
    let thumbnails = MemoryThumbnailStore::new();
    let thumbnails_dyn: Arc<dyn cubby_core::ThumbnailStore> = Arc::new(thumbnails.clone());
    let tokens = TempTokenStore::new();

    let guard = AccessGuard::new(catalog_dyn.clone(), tokens.clone());
    let deriver = ThumbnailDeriver::new(
        guard.clone(),
        catalog_dyn.clone(),
        stores.clone(),
        thumbnails_dyn.clone(),
    );
    let pipeline = UploadPipeline::new(
        catalog_dyn.clone(),
        stores.clone(),
        deriver.clone(),
        max_file_size,
    );
    let streamer = RangeStreamer::new(guard.clone(), stores.clone());
    let coordinator = DeletionCoordinator::new(
        catalog_dyn.clone(),
        stores.clone(),
        thumbnails_dyn,
        tokens.clone(),
    );
    let links = LinkService::new(catalog_dyn);

    Stack {
        catalog,
        thumbnails,
        tokens,
        store,
        pipeline,
        streamer,
        deriver,
        coordinator,
        links,
        dir,
    }
}

async fn stack() -> Stack {
    stack_with_limit(64 * 1024 * 1024).await
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Source stream delivering data in 64 KiB windows, the way a multipart body
/// arrives.
fn source_of(data: Vec<u8>) -> ByteSource {
    let chunks: Vec<std::io::Result<Bytes>> = data
        .chunks(64 * 1024)
        .map(|c| Ok(Bytes::copy_from_slice(c)))
        .collect();
    Box::pin(futures::stream::iter(chunks))
}

fn upload_meta(filename: &str, content_type: &str) -> IncomingUpload {
    IncomingUpload {
        filename: filename.to_string(),
        declared_content_type: Some(content_type.to_string()),
        folder_id: None,
    }
}

async fn collect(mut stream: ByteStream) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk.unwrap());
    }
    out
}

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
    let mut buffer = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut buffer),
        image::ImageFormat::Png,
    )
    .unwrap();
    buffer
}

#[tokio::test]
async fn test_upload_read_all_round_trip() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let data = pattern(3 * 1024 * 1024);

    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("data.bin", "application/octet-stream"),
            source_of(data.clone()),
        )
        .await
        .unwrap();

    assert_eq!(record.size, data.len() as i64);
    assert_eq!(record.chunk_count, 12); // 3 MiB / 256 KiB
    assert_eq!(
        record.content_hash.as_deref(),
        Some(hex::encode(Sha256::digest(&data)).as_str())
    );

    let opened = stack
        .streamer
        .open(
            &AccessCredential::Owner(owner),
            record.id,
            None,
        )
        .await
        .unwrap();

    assert!(matches!(opened.served, Served::Full { size } if size == data.len() as u64));
    assert_eq!(collect(opened.body).await, data);
}

#[tokio::test]
async fn test_range_read_matches_source_slice() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let data = pattern(3_000_000);

    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("video.mp4", "video/mp4"),
            source_of(data.clone()),
        )
        .await
        .unwrap();

    let cred = AccessCredential::Owner(owner);
    let opened = stack
        .streamer
        .open(
            &cred,
            record.id,
            Some(RangeSpec::Bounded(1_000_000, 1_999_999)),
        )
        .await
        .unwrap();

    match opened.served {
        Served::Partial(range) => {
            assert_eq!(range.start, 1_000_000);
            assert_eq!(range.end, 1_999_999);
            assert_eq!(range.total, 3_000_000);
        }
        Served::Full { .. } => panic!("expected partial content"),
    }

    let body = collect(opened.body).await;
    assert_eq!(body.len(), 1_000_000);
    assert_eq!(body, data[1_000_000..2_000_000]);

    // Open-ended range reaches the last byte
    let opened = stack
        .streamer
        .open(&cred, record.id, Some(RangeSpec::From(2_999_000)))
        .await
        .unwrap();
    let tail = collect(opened.body).await;
    assert_eq!(tail, data[2_999_000..]);

    // Full explicit range equals the whole entity
    let opened = stack
        .streamer
        .open(
            &cred,
            record.id,
            Some(RangeSpec::Bounded(0, data.len() as u64 - 1)),
        )
        .await
        .unwrap();
    assert_eq!(collect(opened.body).await, data);
}

#[tokio::test]
async fn test_range_outside_entity_rejected() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("a.bin", "application/octet-stream"),
            source_of(pattern(1000)),
        )
        .await
        .unwrap();

    let cred = AccessCredential::Owner(owner);
    let result = stack
        .streamer
        .open(&cred, record.id, Some(RangeSpec::Bounded(1000, 1999)))
        .await;
    assert!(matches!(
        result,
        Err(AppError::RangeNotSatisfiable { .. })
    ));

    let result = stack
        .streamer
        .open(&cred, record.id, Some(RangeSpec::Bounded(500, 100)))
        .await;
    assert!(matches!(
        result,
        Err(AppError::RangeNotSatisfiable { .. })
    ));
}

#[tokio::test]
async fn test_aborted_upload_leaves_nothing() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());

    let source: ByteSource = Box::pin(futures::stream::iter(vec![
        Ok(Bytes::from(pattern(300_000))),
        Err(std::io::Error::other("connection reset")),
    ]));

    let ids_before = stack.catalog.record_count();
    let result = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("wip.bin", "application/octet-stream"),
            source,
        )
        .await;

    assert!(matches!(result, Err(AppError::UploadFailed(_))));
    assert_eq!(stack.catalog.record_count(), ids_before);

    // Partial chunks were cleaned up, not orphaned
    let leftovers = std::fs::read_dir(stack.dir.path().join("files"))
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_oversized_upload_rejected_and_cleaned() {
    let stack = stack_with_limit(1000).await;
    let owner = Identity::new(Uuid::new_v4());

    let result = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("big.bin", "application/octet-stream"),
            source_of(pattern(5000)),
        )
        .await;

    assert!(matches!(result, Err(AppError::PayloadTooLarge(_))));
    assert_eq!(stack.catalog.record_count(), 0);
}

#[tokio::test]
async fn test_empty_upload_round_trips() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());

    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("empty.txt", "text/plain"),
            source_of(Vec::new()),
        )
        .await
        .unwrap();

    assert_eq!(record.size, 0);
    assert_eq!(record.chunk_count, 1);

    let opened = stack
        .streamer
        .open(&AccessCredential::Owner(owner), record.id, None)
        .await
        .unwrap();
    assert!(collect(opened.body).await.is_empty());
}

#[tokio::test]
async fn test_one_time_link_authorizes_exactly_once() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("shared.bin", "application/octet-stream"),
            source_of(pattern(2048)),
        )
        .await
        .unwrap();

    let token = stack.links.make_one_time(&owner, record.id).await.unwrap();
    let cred = AccessCredential::Link { token };

    let (first, second) = tokio::join!(
        stack.streamer.open(&cred, record.id, None),
        stack.streamer.open(&cred, record.id, None),
    );

    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(successes, 1, "exactly one concurrent read may win");

    // Any further attempt is denied
    assert!(matches!(
        stack.streamer.open(&cred, record.id, None).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_public_link_survives_reads_until_removed() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("doc.pdf", "application/pdf"),
            source_of(pattern(2048)),
        )
        .await
        .unwrap();

    let token = stack.links.make_public(&owner, record.id).await.unwrap();
    let cred = AccessCredential::Link {
        token: token.clone(),
    };

    for _ in 0..3 {
        assert!(stack.streamer.open(&cred, record.id, None).await.is_ok());
    }

    let info = stack.links.public_info(record.id, &token).await.unwrap();
    assert_eq!(info.filename, "doc.pdf");
    assert_eq!(info.size, 2048);

    stack.links.remove_link(&owner, record.id).await.unwrap();
    assert!(stack.streamer.open(&cred, record.id, None).await.is_err());
    assert!(stack.links.public_info(record.id, &token).await.is_err());
}

#[tokio::test]
async fn test_deletion_is_final_for_every_credential() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("gone.bin", "application/octet-stream"),
            source_of(pattern(4096)),
        )
        .await
        .unwrap();

    let link_token = stack.links.make_public(&owner, record.id).await.unwrap();
    let temp_token = stack.tokens.issue(
        owner.id,
        Some(record.id),
        None,
        Duration::seconds(60),
        false,
    );

    stack.coordinator.delete(&owner, record.id).await.unwrap();

    let owner_cred = AccessCredential::Owner(owner);
    assert!(matches!(
        stack.streamer.open(&owner_cred, record.id, None).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        stack
            .streamer
            .open(
                &AccessCredential::Link { token: link_token },
                record.id,
                None
            )
            .await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        stack
            .streamer
            .open(
                &AccessCredential::Temp { token: temp_token },
                record.id,
                None
            )
            .await,
        Err(AppError::NotFound(_))
    ));

    assert_eq!(stack.catalog.record_count(), 0);
    assert!(matches!(
        stack.store.read_all(record.id).await,
        Err(cubby_storage::StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_only_owner_may_delete() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("mine.bin", "application/octet-stream"),
            source_of(pattern(128)),
        )
        .await
        .unwrap();

    let stranger = Identity::new(Uuid::new_v4());
    assert!(matches!(
        stack.coordinator.delete(&stranger, record.id).await,
        Err(AppError::NotFound(_))
    ));

    // Still readable by the owner
    assert!(stack
        .streamer
        .open(&AccessCredential::Owner(owner), record.id, None)
        .await
        .is_ok());
}

#[tokio::test]
async fn test_image_upload_primes_small_thumbnail() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let png = png_fixture(800, 600);

    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("photo.png", "image/png"),
            source_of(png),
        )
        .await
        .unwrap();

    assert_eq!(stack.thumbnails.entry_count(), 1);
    let refreshed = stack.catalog.get(record.id).await.unwrap().unwrap();
    assert!(refreshed.has_small_thumbnail);

    let small = stack
        .thumbnails
        .get(record.id, ThumbnailTier::Small)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(small.content_type, "image/jpeg");
}

#[tokio::test]
async fn test_full_preview_lazy_and_cached() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("photo.png", "image/png"),
            source_of(png_fixture(640, 480)),
        )
        .await
        .unwrap();

    // Only the small tier was primed at upload
    assert!(stack
        .thumbnails
        .get(record.id, ThumbnailTier::Full)
        .await
        .unwrap()
        .is_none());

    let cred = AccessCredential::Owner(owner);
    let full = stack
        .deriver
        .derive(&cred, record.id, ThumbnailTier::Full)
        .await
        .unwrap();
    assert_eq!(full.content_type, "image/jpeg");

    // Cached: still served after the source chunks are gone
    stack.store.delete(record.id).await.unwrap();
    let again = stack
        .deriver
        .derive(&cred, record.id, ThumbnailTier::Full)
        .await
        .unwrap();
    assert_eq!(again.data, full.data);
}

#[tokio::test]
async fn test_thumbnail_for_non_image_rejected() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("notes.txt", "text/plain"),
            source_of(b"plain text".to_vec()),
        )
        .await
        .unwrap();

    let result = stack
        .deriver
        .derive(
            &AccessCredential::Owner(owner),
            record.id,
            ThumbnailTier::Small,
        )
        .await;
    assert!(matches!(result, Err(AppError::UnsupportedMediaType(_))));
}

#[tokio::test]
async fn test_temp_token_stream_flow() {
    let stack = stack().await;
    let owner = Identity::new(Uuid::new_v4());
    let data = pattern(100_000);
    let record = stack
        .pipeline
        .ingest(
            &owner,
            upload_meta("clip.mp4", "video/mp4"),
            source_of(data.clone()),
        )
        .await
        .unwrap();

    let token = stack.tokens.issue(
        owner.id,
        Some(record.id),
        Some("player-1".to_string()),
        Duration::seconds(60),
        false,
    );
    let cred = AccessCredential::Temp {
        token: token.clone(),
    };

    let opened = stack
        .streamer
        .open(&cred, record.id, Some(RangeSpec::From(50_000)))
        .await
        .unwrap();
    assert_eq!(collect(opened.body).await, data[50_000..]);

    // Revoking from a different client instance leaves the token valid
    stack.tokens.revoke(owner.id, &token, Some("player-2"));
    assert!(stack.streamer.open(&cred, record.id, None).await.is_ok());

    stack.tokens.revoke(owner.id, &token, Some("player-1"));
    assert!(matches!(
        stack.streamer.open(&cred, record.id, None).await,
        Err(AppError::Forbidden(_))
    ));
}
