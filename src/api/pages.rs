// ==================== PAGE VIEWS ====================
// Dados de cada página do app. Galeria e detalhe são públicos e ficam em cache.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::middleware::auth::Claims;
use crate::models::{find_transformation, CreditBalance, ImageResponse, UserResponse, CREDIT_PLANS};
use crate::services::{ImageService, ListImagesParams, UserService, DEFAULT_PAGE_SIZE};
use crate::utils::{detail_path, gallery_key, AppError, PageCache};

#[derive(Debug, Deserialize)]
pub struct GalleryQuery {
    pub page: Option<u64>,
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u64>,
}

fn cached_or(pages: &PageCache, key: &str) -> Option<HttpResponse> {
    pages.get_cached(key).map(|view| {
        log::debug!("📦 Page cache hit: {} ({} views cached)", key, pages.len());
        HttpResponse::Ok().json(view)
    })
}

/// GET / - Galeria pública com busca
#[utoipa::path(
    get,
    path = "/",
    tag = "Pages",
    params(
        ("page" = Option<u64>, Query, description = "1-based page"),
        ("query" = Option<String>, Query, description = "Asset search query")
    ),
    responses((status = 200, description = "Gallery view"))
)]
pub async fn home(
    pages: web::Data<PageCache>,
    images: web::Data<ImageService>,
    query: web::Query<GalleryQuery>,
) -> Result<HttpResponse, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let search_query = query.query.as_deref().unwrap_or_default().trim().to_string();

    let key = gallery_key(page, &search_query);
    if let Some(hit) = cached_or(&pages, &key) {
        return Ok(hit);
    }

    let params = ListImagesParams {
        page,
        search_query,
        ..Default::default()
    };
    let result = images.get_all_images(&params).await?;

    let view = serde_json::json!({
        "success": true,
        "page": page,
        "images": result.data,
        "totalPage": result.total_page,
        "savedImages": result.saved_images
    });
    pages.set_cache(key, view.clone());

    Ok(HttpResponse::Ok().json(view))
}

/// GET /transformations/{id} - Detalhe público de uma transformação
#[utoipa::path(
    get,
    path = "/transformations/{id}",
    tag = "Pages",
    params(("id" = String, Path, description = "Image id")),
    responses(
        (status = 200, description = "Transformation detail"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn transformation_detail(
    pages: web::Data<PageCache>,
    images: web::Data<ImageService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let image_id = path.into_inner();
    let key = detail_path(&image_id);
    if let Some(hit) = cached_or(&pages, &key) {
        return Ok(hit);
    }

    let image = images.get_image_by_id(&image_id).await?;
    let transformation = find_transformation(&image.image.transformation_type);

    let view = serde_json::json!({
        "success": true,
        "image": ImageResponse::from(image),
        "transformation": transformation
    });
    pages.set_cache(key, view.clone());

    Ok(HttpResponse::Ok().json(view))
}

/// GET /credits - Planos, saldo e painel de admin
#[utoipa::path(
    get,
    path = "/credits",
    tag = "Pages",
    responses(
        (status = 200, description = "Credits view"),
        (status = 401, description = "Missing session")
    ),
    security(("bearer_auth" = []))
)]
pub async fn credits(
    user: web::ReqData<Claims>,
    config: web::Data<AppConfig>,
    users: web::Data<UserService>,
) -> HttpResponse {
    let is_admin = users.is_user_admin(&user.sub).await;
    let balance = users.get_user_credit_balance(&user.sub).await;

    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "plans": CREDIT_PLANS,
        "isAdmin": is_admin.is_admin(),
        "creditBalance": balance,
        "showAdminPanel": config.is_admin_principal(&user.sub)
    }))
}

/// GET /transformations/add/{type} - Formulário de nova transformação
#[utoipa::path(
    get,
    path = "/transformations/add/{type}",
    tag = "Pages",
    params(("type" = String, Path, description = "Transformation type key")),
    responses(
        (status = 200, description = "New transformation view"),
        (status = 404, description = "Unknown transformation type")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_transformation(
    user: web::ReqData<Claims>,
    users: web::Data<UserService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let key = path.into_inner();
    let transformation = find_transformation(&key)
        .ok_or_else(|| AppError::NotFound(format!("Transformation type {}", key)))?;

    let current = users.get_or_create_user(&user.sub).await?;
    let balance = CreditBalance::for_user(&current);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "transformation": transformation,
        "userId": current.id.map(|id| id.to_hex()),
        "creditBalance": balance
    })))
}

/// GET /transformations/{id}/update - Formulário de edição (somente o autor)
#[utoipa::path(
    get,
    path = "/transformations/{id}/update",
    tag = "Pages",
    params(("id" = String, Path, description = "Image id")),
    responses(
        (status = 200, description = "Edit view"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Image or user not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_transformation(
    user: web::ReqData<Claims>,
    users: web::Data<UserService>,
    images: web::Data<ImageService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let current = users.get_user_by_id(&user.sub).await?;
    let image = images.get_image_by_id(&path.into_inner()).await?;

    if image.image.author.is_none() || image.image.author != current.id {
        return Err(AppError::Forbidden("Only the author can edit this image".to_string()));
    }

    let transformation = find_transformation(&image.image.transformation_type);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "image": ImageResponse::from(image),
        "transformation": transformation,
        "userId": current.id.map(|id| id.to_hex()),
        "creditBalance": CreditBalance::for_user(&current)
    })))
}

/// GET /profile - Perfil com as transformações do usuário
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Pages",
    params(("page" = Option<u64>, Query, description = "1-based page")),
    responses(
        (status = 200, description = "Profile view"),
        (status = 401, description = "Missing session")
    ),
    security(("bearer_auth" = []))
)]
pub async fn profile(
    user: web::ReqData<Claims>,
    users: web::Data<UserService>,
    images: web::Data<ImageService>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
    let current = users.get_or_create_user(&user.sub).await?;
    let author_id = current
        .id
        .ok_or_else(|| AppError::DatabaseError("User has no _id".to_string()))?;

    let page = query.page.unwrap_or(1).max(1);
    let result = images.get_user_images(author_id, page, DEFAULT_PAGE_SIZE).await?;
    let balance = CreditBalance::for_user(&current);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "page": page,
        "user": UserResponse::from(current),
        "creditBalance": balance,
        "imageManipulationsDone": result.data.len(),
        "images": result.data,
        "totalPage": result.total_page
    })))
}
