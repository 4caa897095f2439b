use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::middleware::auth::Claims;
use crate::models::{find_transformation, ImageParams, ImageResponse, CREDIT_FEE};
use crate::services::{ImageService, UserService};
use crate::utils::AppError;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ImageActionRequest {
    pub image: ImageParams,
    /// Página a revalidar após a escrita
    #[serde(default = "default_path")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteImageQuery {
    pub path: Option<String>,
}

fn default_path() -> String {
    "/".to_string()
}

/// POST /api/images - Salva uma transformação e debita a taxa
#[utoipa::path(
    post,
    path = "/api/images",
    tag = "Images",
    request_body = ImageActionRequest,
    responses(
        (status = 201, description = "Image saved", body = ImageResponse),
        (status = 402, description = "Insufficient credits"),
        (status = 401, description = "Missing session")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_image(
    user: web::ReqData<Claims>,
    users: web::Data<UserService>,
    images: web::Data<ImageService>,
    request: web::Json<ImageActionRequest>,
) -> Result<HttpResponse, AppError> {
    let ImageActionRequest { image, path } = request.into_inner();
    let fee = find_transformation(&image.transformation_type)
        .map(|t| t.credit_fee)
        .unwrap_or(CREDIT_FEE);

    log::info!("🖼️  POST /api/images - {} ({})", user.sub, image.transformation_type);

    // Garante o usuário e debita antes de salvar; o débito só passa com saldo suficiente
    users.get_or_create_user(&user.sub).await?;
    let charged = users.charge_credits(&user.sub, fee).await?;

    let saved = match images.add_image(image, &user.sub, &path).await {
        Ok(saved) => saved,
        Err(e) => {
            if !charged.is_admin {
                if let Err(refund) = users.refund_credits(&user.sub, fee).await {
                    log::error!("❌ Refund failed for {}: {}", user.sub, refund);
                }
            }
            return Err(e);
        }
    };

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "image": ImageResponse::from(saved),
        "creditBalance": charged.credit_balance
    })))
}

/// PUT /api/images/{id} - Atualiza uma transformação do próprio autor
#[utoipa::path(
    put,
    path = "/api/images/{id}",
    tag = "Images",
    params(("id" = String, Path, description = "Image id")),
    request_body = ImageActionRequest,
    responses(
        (status = 200, description = "Image updated", body = ImageResponse),
        (status = 403, description = "Not the author, or image not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_image(
    user: web::ReqData<Claims>,
    images: web::Data<ImageService>,
    path: web::Path<String>,
    request: web::Json<ImageActionRequest>,
) -> Result<HttpResponse, AppError> {
    let image_id = path.into_inner();
    let ImageActionRequest { image, path } = request.into_inner();

    let updated = images.update_image(&image_id, image, &user.sub, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "image": ImageResponse::from(updated)
    })))
}

/// DELETE /api/images/{id}?path= - Remove uma transformação do próprio autor
#[utoipa::path(
    delete,
    path = "/api/images/{id}",
    tag = "Images",
    params(
        ("id" = String, Path, description = "Image id"),
        ("path" = Option<String>, Query, description = "Page to revalidate")
    ),
    responses(
        (status = 200, description = "Image deleted", body = ImageResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Image not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_image(
    user: web::ReqData<Claims>,
    images: web::Data<ImageService>,
    path: web::Path<String>,
    query: web::Query<DeleteImageQuery>,
) -> Result<HttpResponse, AppError> {
    let image_id = path.into_inner();
    let revalidate = query.path.as_deref().unwrap_or("/");

    let existing = images.get_image_by_id(&image_id).await?;
    let owner = existing.author.as_ref().map(|a| a.clerk_id.as_str());
    if owner != Some(user.sub.as_str()) {
        return Err(AppError::Forbidden("Only the author can delete this image".to_string()));
    }

    match images.delete_image(&image_id, revalidate).await {
        Some(deleted) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "image": ImageResponse::from(deleted)
        }))),
        None => Err(AppError::NotFound(format!("Image {}", image_id))),
    }
}

/// GET /api/images/{id} - Transformação com autor populado
#[utoipa::path(
    get,
    path = "/api/images/{id}",
    tag = "Images",
    params(("id" = String, Path, description = "Image id")),
    responses(
        (status = 200, description = "Image with populated author", body = ImageResponse),
        (status = 404, description = "Image not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_image(
    images: web::Data<ImageService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let image = images.get_image_by_id(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "image": ImageResponse::from(image)
    })))
}
