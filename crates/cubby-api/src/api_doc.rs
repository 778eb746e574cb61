//! OpenAPI document aggregation.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cubby API",
        description = "Chunked file storage with range streaming and token-scoped sharing"
    ),
    paths(
        crate::handlers::upload::upload_file,
        crate::handlers::files::get_file_info,
        crate::handlers::files::delete_file,
        crate::handlers::download::download_file,
        crate::handlers::stream::stream_file,
        crate::handlers::thumbnail::get_thumbnail,
        crate::handlers::links::create_link,
        crate::handlers::links::remove_link,
        crate::handlers::public::public_download,
        crate::handlers::public::public_info,
        crate::handlers::temp_tokens::issue_temp_token,
        crate::handlers::temp_tokens::revoke_temp_token,
    ),
    components(schemas(
        cubby_core::models::PublicFileInfo,
        cubby_core::models::LinkState,
        cubby_core::models::ThumbnailTier,
        cubby_core::StorageBackend,
        crate::error::ErrorResponse,
        crate::handlers::files::FileInfoResponse,
        crate::handlers::links::CreateLinkRequest,
        crate::handlers::links::CreateLinkKind,
        crate::handlers::links::LinkResponse,
        crate::handlers::temp_tokens::IssueTempTokenRequest,
        crate::handlers::temp_tokens::TempTokenResponse,
    )),
    tags(
        (name = "files", description = "Upload, metadata, content, previews"),
        (name = "links", description = "Public and one-time share links"),
        (name = "public", description = "Unauthenticated link access"),
        (name = "tokens", description = "Temp download/stream tokens")
    )
)]
pub struct ApiDoc;
