use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Imagenko Service API",
        version = "1.0.0",
        description = "Backend for the Imagenko AI image editor. \n\n**Authentication:** Session endpoints require the Clerk session JWT, as a Bearer token or the `__session` cookie.\n\n**Features:**\n- Identity webhooks (Clerk via Svix)\n- Admin promotion\n- Transformation jobs with per-use credit fees\n- Public gallery with asset search"
    ),
    paths(
        // Health
        crate::api::health::health_check,

        // Admin
        crate::api::admin::make_admin,

        // Webhooks
        crate::api::webhooks::identity_webhook,

        // Images
        crate::api::images::add_image,
        crate::api::images::update_image,
        crate::api::images::delete_image,
        crate::api::images::get_image,

        // Pages
        crate::api::pages::home,
        crate::api::pages::transformation_detail,
        crate::api::pages::credits,
        crate::api::pages::add_transformation,
        crate::api::pages::update_transformation,
        crate::api::pages::profile,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::admin::MakeAdminRequest,
            crate::api::images::ImageActionRequest,
            crate::models::ImageParams,
            crate::models::ImageResponse,
            crate::models::AuthorResponse,
            crate::models::ImagePage,
            crate::models::UserResponse,
        )
    ),
    tags(
        (name = "Health", description = "Liveness and database connection status."),
        (name = "Admin", description = "Admin-only operations. The caller must be the configured ADMIN_ID."),
        (name = "Webhooks", description = "Signed identity-provider events mirrored into the users collection."),
        (name = "Images", description = "Transformation jobs: create, edit, delete and read."),
        (name = "Pages", description = "Data behind each page of the app. Gallery and detail views are public and cached."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Clerk session token"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/admin/make-admin"));
        assert!(paths.contains_key("/webhooks/identity"));
        assert!(paths.contains_key("/api/images/{id}"));
        assert!(paths.contains_key("/transformations/add/{type}"));
    }
}
