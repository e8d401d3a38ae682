//! REST handlers for the two visitor surfaces.
//!
//! Handlers follow the thin-controller pattern: extract and validate
//! request data, build the core services from shared configuration,
//! delegate, and convert the result into the wire envelope. All domain
//! rules (gating, sanitisation, rollback) live in `mural-core`.

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Multipart, Path as AxumPath, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::context::RequestContext;
use crate::error::{ApiError, ErrorBody};
use mural_core::{
    CoreConfig, EditingService, GraffitiService, GraffitiStore, MediaService, PermissionGate,
    PostStore, PostUpdate, Renderer, UpdatedPost,
};

/// Application state shared across REST API handlers.
///
/// Holds the startup-resolved configuration; services are constructed
/// per-request from it, so no handler depends on ambient state.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        update_post,
        upload_image,
        create_drawing,
        rendered_post,
        serve_media,
    ),
    components(schemas(
        HealthRes,
        UpdatePostReq,
        UpdatedPostRes,
        UploadRes,
        CreateDrawingReq,
        DrawingRes,
        ErrorBody,
    ))
)]
pub struct ApiDoc;

/// Builds the full REST router over the given state.
pub fn build_router(state: AppState) -> Router {
    // Leave headroom above the image cap for multipart framing.
    let max_body_bytes = state.cfg.max_upload_bytes() as usize + 64 * 1024;

    Router::new()
        .route("/health", get(health))
        .route("/anybody-editing/v1/posts/:id", post(update_post))
        .route("/anybody-editing/v1/upload", post(upload_image))
        .route("/graffiti/v1/drawings", post(create_drawing))
        .route("/posts/:id/rendered", get(rendered_post))
        .route("/media/:hash", get(serve_media))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Health check response.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Partial field update. Absent fields are left untouched; a present
/// `featured_media` of 0 removes the featured image.
#[derive(Debug, Default, serde::Deserialize, ToSchema)]
pub struct UpdatePostReq {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub featured_media: Option<i64>,
    pub categories: Option<Vec<i64>>,
    pub tags: Option<Vec<String>>,
}

impl UpdatePostReq {
    fn into_update(self) -> PostUpdate {
        PostUpdate {
            title: self.title,
            content: self.content,
            excerpt: self.excerpt,
            featured_media: self.featured_media,
            categories: self.categories,
            tags: self.tags,
        }
    }
}

/// Canonical post-update representation of all editable fields.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct UpdatedPostRes {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub featured_media: u64,
    pub categories: Vec<u64>,
    pub tags: Vec<String>,
}

impl From<UpdatedPost> for UpdatedPostRes {
    fn from(updated: UpdatedPost) -> Self {
        Self {
            id: updated.id,
            title: updated.title,
            content: updated.content,
            excerpt: updated.excerpt,
            featured_media: updated.featured_media,
            categories: updated.categories,
            tags: updated.tags,
        }
    }
}

/// Response after storing an uploaded image.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct UploadRes {
    pub id: u64,
    pub url: String,
}

/// Drawing submission body.
#[derive(Debug, serde::Deserialize, ToSchema)]
pub struct CreateDrawingReq {
    pub post_id: u64,
    pub paragraph_index: usize,
    /// PNG payload as a `data:image/png;base64,...` URI
    pub image_data: String,
}

/// Response after storing a drawing.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct DrawingRes {
    pub success: bool,
    pub graffiti_id: u64,
    pub image_url: String,
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Mural REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/anybody-editing/v1/posts/{id}",
    request_body = UpdatePostReq,
    responses(
        (status = 200, description = "Updated representation of all editable fields", body = UpdatedPostRes),
        (status = 403, description = "Post not published or editing not enabled", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody)
    )
)]
/// Applies a visitor's partial field update to a post.
///
/// The permission gate runs first: the post must exist, be published,
/// and have editing enabled. Fields absent from the body are untouched.
#[axum::debug_handler]
async fn update_post(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
    Json(req): Json<UpdatePostReq>,
) -> Result<Json<UpdatedPostRes>, ApiError> {
    let posts = PostStore::new(state.cfg.clone());
    let gate = PermissionGate::new(posts.clone());
    let post = gate.check_editing(id)?;

    let editing = EditingService::new(posts);
    let updated = editing.apply(post, req.into_update())?;

    Ok(Json(UpdatedPostRes::from(updated)))
}

#[utoipa::path(
    post,
    path = "/anybody-editing/v1/upload",
    responses(
        (status = 200, description = "Stored attachment id and public URL", body = UploadRes),
        (status = 400, description = "Missing file, wrong type, or too large", body = ErrorBody),
        (status = 403, description = "Post not published or editing not enabled", body = ErrorBody),
        (status = 404, description = "Post not found", body = ErrorBody)
    )
)]
/// Accepts a multipart image upload (`file` + `post_id`) for a post.
#[axum::debug_handler]
async fn upload_image(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadRes>, ApiError> {
    let ctx = RequestContext::from_request(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let mut post_id: Option<u64> = None;
    let mut file: Option<(Vec<u8>, String, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation("upload_error", format!("File upload failed: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "post_id" => {
                let text = field.text().await.map_err(|e| {
                    ApiError::validation("upload_error", format!("File upload failed: {}", e))
                })?;
                post_id = text.trim().parse().ok();
            }
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let claimed_mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    ApiError::validation("upload_error", format!("File upload failed: {}", e))
                })?;
                file = Some((bytes.to_vec(), filename, claimed_mime));
            }
            _ => {}
        }
    }

    let Some(post_id) = post_id else {
        return Err(ApiError::validation(
            "missing_post_id",
            "The post_id parameter is required.",
        ));
    };

    let posts = PostStore::new(state.cfg.clone());
    PermissionGate::new(posts).check_editing(post_id)?;

    let Some((bytes, filename, claimed_mime)) = file else {
        return Err(ApiError::validation("no_file", "No file was uploaded."));
    };

    let media = MediaService::new(state.cfg.clone())?;
    let (attachment, url) =
        media.store_image(post_id, &bytes, &filename, &claimed_mime, &ctx.client_ip)?;

    Ok(Json(UploadRes {
        id: attachment.id,
        url,
    }))
}

#[utoipa::path(
    post,
    path = "/graffiti/v1/drawings",
    request_body = CreateDrawingReq,
    responses(
        (status = 200, description = "Stored drawing id and image URL", body = DrawingRes),
        (status = 400, description = "Invalid post or image payload", body = ErrorBody),
        (status = 403, description = "Post not published or graffiti not enabled", body = ErrorBody),
        (status = 500, description = "Media storage failed (record rolled back)", body = ErrorBody)
    )
)]
/// Accepts a drawing anchored between two content blocks.
#[axum::debug_handler]
async fn create_drawing(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<CreateDrawingReq>,
) -> Result<Json<DrawingRes>, ApiError> {
    let ctx = RequestContext::from_request(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    let posts = PostStore::new(state.cfg.clone());
    let store = GraffitiStore::new(state.cfg.clone());
    let media = MediaService::new(state.cfg.clone())?;
    let service = GraffitiService::new(state.cfg.clone(), posts, store, media);

    let created = service.submit(
        req.post_id,
        req.paragraph_index,
        &req.image_data,
        &ctx.client_ip,
    )?;

    Ok(Json(DrawingRes {
        success: true,
        graffiti_id: created.graffiti_id,
        image_url: created.image_url,
    }))
}

#[utoipa::path(
    get,
    path = "/posts/{id}/rendered",
    responses(
        (status = 200, description = "Rendered post body with artifacts interleaved", content_type = "text/html", body = String),
        (status = 404, description = "Post not found", body = ErrorBody)
    )
)]
/// Renders a post body with drawing clusters interleaved and, when the
/// post has editing enabled, block wrappers for the editing overlay.
#[axum::debug_handler]
async fn rendered_post(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<u64>,
) -> Result<Html<String>, ApiError> {
    let posts = PostStore::new(state.cfg.clone());
    let post = posts.load(id)?;

    let drawings = GraffitiStore::new(state.cfg.clone()).list_for_post(id)?;
    let renderer = Renderer::new(state.cfg.clone());

    Ok(Html(renderer.render_page(&post, &drawings)))
}

#[utoipa::path(
    get,
    path = "/media/{hash}",
    responses(
        (status = 200, description = "Stored blob with its detected content type"),
        (status = 404, description = "No blob under this hash", body = ErrorBody)
    )
)]
/// Serves a stored media blob; issued public URLs resolve here.
#[axum::debug_handler]
async fn serve_media(
    State(state): State<AppState>,
    AxumPath(hash): AxumPath<String>,
) -> Result<Response, ApiError> {
    let media = MediaService::new(state.cfg.clone())?;
    let (bytes, mime) = media.read_blob(&hash)?;

    Ok(([(header::CONTENT_TYPE, mime)], bytes).into_response())
}
