use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::middleware::auth::Claims;
use crate::models::UserResponse;
use crate::services::UserService;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MakeAdminRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// POST /admin/make-admin - Promove um usuário a admin (somente ADMIN_ID)
#[utoipa::path(
    post,
    path = "/admin/make-admin",
    tag = "Admin",
    request_body = MakeAdminRequest,
    responses(
        (status = 200, description = "User made admin successfully", body = UserResponse),
        (status = 400, description = "User ID is required"),
        (status = 403, description = "Caller is not the configured admin"),
        (status = 404, description = "Target user not found. Deliberately a 404 with {error} rather than a 200 with a null user"),
        (status = 500, description = "Failed to make user admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn make_admin(
    user: web::ReqData<Claims>,
    config: web::Data<AppConfig>,
    users: web::Data<UserService>,
    request: web::Json<MakeAdminRequest>,
) -> HttpResponse {
    if !config.is_admin_principal(&user.sub) {
        log::warn!("🚫 {} tried to promote a user without being admin", user.sub);
        return HttpResponse::Forbidden().json(serde_json::json!({ "error": "Unauthorized" }));
    }

    let Some(target) = request.user_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) else {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": "User ID is required" }));
    };

    log::info!("👑 POST /admin/make-admin - target: {}", target);

    match users.make_user_admin(target).await {
        Ok(promoted) => HttpResponse::Ok().json(serde_json::json!({
            "message": "User made admin successfully",
            "user": UserResponse::from(promoted)
        })),
        Err(e) if e.is_not_found() => HttpResponse::NotFound().json(serde_json::json!({
            "error": "User not found"
        })),
        Err(e) => {
            log::error!("❌ Error making user admin: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to make user admin"
            }))
        }
    }
}
