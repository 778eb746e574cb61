#[path = "helpers/mod.rs"]
mod helpers;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use helpers::auth::{bearer, test_user};
use helpers::{api_path, setup_test_app};
use serde_json::Value;

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn upload_form(name: &str, content_type: &str, data: Vec<u8>) -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(data).file_name(name).mime_type(content_type),
    )
}

fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
    let mut buffer = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut buffer),
        image::ImageFormat::Png,
    )
    .unwrap();
    buffer
}

#[tokio::test]
async fn test_upload_info_download_round_trip() {
    let app = setup_test_app().await;
    let user = test_user();
    let data = pattern(700_000);

    let response = app
        .client()
        .post(&api_path("/files"))
        .add_header("Authorization", bearer(&user))
        .multipart(upload_form("data.bin", "application/octet-stream", data.clone()))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: Value = response.json();
    let id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["filename"], "data.bin");
    assert_eq!(body["size"], data.len() as i64);
    assert_eq!(body["backend"], "filesystem");
    assert_eq!(body["link_state"], "none");

    let info = app
        .client()
        .get(&api_path(&format!("/files/{}", id)))
        .add_header("Authorization", bearer(&user))
        .await;
    info.assert_status_ok();
    assert_eq!(info.json::<Value>()["chunk_count"], 3); // 700000 / 256 KiB

    let download = app
        .client()
        .get(&api_path(&format!("/files/{}/download", id)))
        .add_header("Authorization", bearer(&user))
        .await;
    download.assert_status_ok();
    assert_eq!(download.as_bytes().as_ref(), data.as_slice());
    let disposition = download.header("content-disposition");
    assert!(disposition
        .to_str()
        .unwrap()
        .starts_with("attachment; filename=\"data.bin\""));
}

#[tokio::test]
async fn test_upload_requires_session() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/files"))
        .multipart(upload_form("x.bin", "application/octet-stream", vec![1, 2]))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = app
        .client()
        .post(&api_path("/files"))
        .add_header("Authorization", "Bearer forged-token")
        .multipart(upload_form("x.bin", "application/octet-stream", vec![1, 2]))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stream_range_requests() {
    let app = setup_test_app().await;
    let user = test_user();
    let data = pattern(1_000_000);

    let response = app
        .client()
        .post(&api_path("/files"))
        .add_header("Authorization", bearer(&user))
        .multipart(upload_form("clip.mp4", "video/mp4", data.clone()))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // Bounded range
    let ranged = app
        .client()
        .get(&api_path(&format!("/files/{}/stream", id)))
        .add_header("Authorization", bearer(&user))
        .add_header("Range", "bytes=250000-749999")
        .await;
    ranged.assert_status(StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        ranged.header("content-range").to_str().unwrap(),
        "bytes 250000-749999/1000000"
    );
    assert_eq!(ranged.header("accept-ranges").to_str().unwrap(), "bytes");
    assert_eq!(ranged.as_bytes().as_ref(), &data[250_000..750_000]);

    // Open-ended range
    let tail = app
        .client()
        .get(&api_path(&format!("/files/{}/stream", id)))
        .add_header("Authorization", bearer(&user))
        .add_header("Range", "bytes=999000-")
        .await;
    tail.assert_status(StatusCode::PARTIAL_CONTENT);
    assert_eq!(tail.as_bytes().as_ref(), &data[999_000..]);

    // No range: whole entity
    let whole = app
        .client()
        .get(&api_path(&format!("/files/{}/stream", id)))
        .add_header("Authorization", bearer(&user))
        .await;
    whole.assert_status_ok();
    assert_eq!(whole.as_bytes().len(), data.len());

    // Malformed range header is ignored
    let malformed = app
        .client()
        .get(&api_path(&format!("/files/{}/stream", id)))
        .add_header("Authorization", bearer(&user))
        .add_header("Range", "bytes=abc")
        .await;
    malformed.assert_status_ok();

    // Out-of-bounds range
    let outside = app
        .client()
        .get(&api_path(&format!("/files/{}/stream", id)))
        .add_header("Authorization", bearer(&user))
        .add_header("Range", "bytes=1000000-1000010")
        .await;
    outside.assert_status(StatusCode::RANGE_NOT_SATISFIABLE);
}

#[tokio::test]
async fn test_delete_makes_file_unreachable() {
    let app = setup_test_app().await;
    let user = test_user();

    let response = app
        .client()
        .post(&api_path("/files"))
        .add_header("Authorization", bearer(&user))
        .multipart(upload_form("gone.txt", "text/plain", b"bye".to_vec()))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let deleted = app
        .client()
        .delete(&api_path(&format!("/files/{}", id)))
        .add_header("Authorization", bearer(&user))
        .await;
    deleted.assert_status(StatusCode::NO_CONTENT);

    let info = app
        .client()
        .get(&api_path(&format!("/files/{}", id)))
        .add_header("Authorization", bearer(&user))
        .await;
    info.assert_status(StatusCode::NOT_FOUND);

    let download = app
        .client()
        .get(&api_path(&format!("/files/{}/download", id)))
        .add_header("Authorization", bearer(&user))
        .await;
    download.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stranger_cannot_read_or_delete() {
    let app = setup_test_app().await;
    let owner = test_user();
    let stranger = test_user();

    let response = app
        .client()
        .post(&api_path("/files"))
        .add_header("Authorization", bearer(&owner))
        .multipart(upload_form("private.txt", "text/plain", b"secret".to_vec()))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    // Existence is not leaked to other users
    let info = app
        .client()
        .get(&api_path(&format!("/files/{}", id)))
        .add_header("Authorization", bearer(&stranger))
        .await;
    info.assert_status(StatusCode::NOT_FOUND);

    let delete = app
        .client()
        .delete(&api_path(&format!("/files/{}", id)))
        .add_header("Authorization", bearer(&stranger))
        .await;
    delete.assert_status(StatusCode::NOT_FOUND);

    let still_there = app
        .client()
        .get(&api_path(&format!("/files/{}", id)))
        .add_header("Authorization", bearer(&owner))
        .await;
    still_there.assert_status_ok();
}

#[tokio::test]
async fn test_thumbnail_tiers() {
    let app = setup_test_app().await;
    let user = test_user();

    let response = app
        .client()
        .post(&api_path("/files"))
        .add_header("Authorization", bearer(&user))
        .multipart(upload_form("photo.png", "image/png", png_fixture(1024, 768)))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let small = app
        .client()
        .get(&api_path(&format!("/files/{}/thumbnail", id)))
        .add_header("Authorization", bearer(&user))
        .await;
    small.assert_status_ok();
    assert_eq!(small.header("content-type").to_str().unwrap(), "image/jpeg");
    let decoded = image::load_from_memory(small.as_bytes()).unwrap();
    assert_eq!(decoded.width(), 300);

    let full = app
        .client()
        .get(&api_path(&format!("/files/{}/thumbnail?tier=full", id)))
        .add_header("Authorization", bearer(&user))
        .await;
    full.assert_status_ok();
    let decoded = image::load_from_memory(full.as_bytes()).unwrap();
    assert_eq!(decoded.width(), 1024);
}

#[tokio::test]
async fn test_thumbnail_rejects_non_image() {
    let app = setup_test_app().await;
    let user = test_user();

    let response = app
        .client()
        .post(&api_path("/files"))
        .add_header("Authorization", bearer(&user))
        .multipart(upload_form("notes.txt", "text/plain", b"words".to_vec()))
        .await;
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let thumb = app
        .client()
        .get(&api_path(&format!("/files/{}/thumbnail", id)))
        .add_header("Authorization", bearer(&user))
        .await;
    thumb.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app().await;
    let response = app.client().get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "ok");
}
