pub mod admin;
pub mod health;
pub mod images;
pub mod pages;
pub mod swagger;
pub mod webhooks;

use actix_web::web;

use crate::middleware::AuthMiddleware;

/// Rotas HTTP. Os serviços chegam via `app_data`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Identity provider events (Svix-signed, no session)
        .route("/webhooks/identity", web::post().to(webhooks::identity_webhook))
        .service(
            web::resource("/admin/make-admin")
                .wrap(AuthMiddleware)
                .route(web::post().to(admin::make_admin)),
        )
        // Image actions
        .service(
            web::scope("/api/images")
                .wrap(AuthMiddleware)
                .route("", web::post().to(images::add_image))
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(images::get_image))
                        .route(web::put().to(images::update_image))
                        .route(web::delete().to(images::delete_image)),
                ),
        )
        // ==================== PAGE VIEWS ====================
        .route("/", web::get().to(pages::home))
        .service(
            web::resource("/credits")
                .wrap(AuthMiddleware)
                .route(web::get().to(pages::credits)),
        )
        .service(
            web::resource("/profile")
                .wrap(AuthMiddleware)
                .route(web::get().to(pages::profile)),
        )
        .service(
            web::resource("/transformations/add/{type}")
                .wrap(AuthMiddleware)
                .route(web::get().to(pages::add_transformation)),
        )
        .service(
            web::resource("/transformations/{id}/update")
                .wrap(AuthMiddleware)
                .route(web::get().to(pages::update_transformation)),
        )
        .route("/transformations/{id}", web::get().to(pages::transformation_detail));
}

#[cfg(test)]
pub mod test_app {
    //! Aplicação completa sobre stores em memória para os testes de handler.

    use crate::config::AppConfig;
    use crate::database::memory::{MemoryImageStore, MemoryUserStore};
    use crate::database::{DatabaseConnector, ImageStore};
    use crate::middleware::auth::test_support::{session_token_for, test_verifier};
    use crate::models::ImageFilter;
    use crate::services::clerk_service::fake::FakeIdentityProvider;
    use crate::services::cloudinary_service::fake::FakeAssetSearch;
    use crate::services::{ImageService, UserService, WebhookService};
    use crate::utils::PageCache;
    use actix_web::{
        body::MessageBody,
        dev::{ServiceFactory, ServiceRequest, ServiceResponse},
        http::header,
        web, App,
    };
    use std::sync::Arc;

    pub struct TestApp {
        pub config: AppConfig,
        pub user_store: Arc<MemoryUserStore>,
        pub image_store: Arc<MemoryImageStore>,
        pub identity: Arc<FakeIdentityProvider>,
        pub assets: Arc<FakeAssetSearch>,
        pub pages: Arc<PageCache>,
        pub users: Arc<UserService>,
        pub images: Arc<ImageService>,
        pub webhooks: Arc<WebhookService>,
    }

    impl TestApp {
        pub const ADMIN_ID: &'static str = "user_admin";
        pub const WEBHOOK_SECRET: &'static str = "whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw";

        pub fn new() -> Self {
            Self::build(AppConfig::for_tests(), FakeAssetSearch::default())
        }

        pub fn with_config(config: AppConfig) -> Self {
            Self::build(config, FakeAssetSearch::default())
        }

        pub fn with_public_ids(public_ids: Vec<String>) -> Self {
            Self::build(
                AppConfig::for_tests(),
                FakeAssetSearch {
                    public_ids,
                    ..Default::default()
                },
            )
        }

        fn build(config: AppConfig, assets: FakeAssetSearch) -> Self {
            let user_store = Arc::new(MemoryUserStore::new());
            let image_store = Arc::new(MemoryImageStore::new(user_store.clone()));
            let identity = Arc::new(FakeIdentityProvider::default());
            let assets = Arc::new(assets);
            let pages = Arc::new(PageCache::new());

            let users = Arc::new(UserService::new(
                user_store.clone(),
                identity.clone(),
                pages.clone(),
                config.default_credit_balance,
            ));
            let images = Arc::new(ImageService::new(
                image_store.clone(),
                users.clone(),
                assets.clone(),
                pages.clone(),
            ));
            let webhooks = Arc::new(WebhookService::new(users.clone(), &config));

            Self {
                config,
                user_store,
                image_store,
                identity,
                assets,
                pages,
                users,
                images,
                webhooks,
            }
        }

        pub fn bearer(sub: &str) -> (header::HeaderName, String) {
            (header::AUTHORIZATION, format!("Bearer {}", session_token_for(sub)))
        }

        pub async fn image_store_count(&self) -> u64 {
            self.image_store.count(&ImageFilter::All).await.unwrap()
        }

        pub fn app(
            &self,
        ) -> App<
            impl ServiceFactory<
                ServiceRequest,
                Config = (),
                Response = ServiceResponse<impl MessageBody>,
                Error = actix_web::Error,
                InitError = (),
            >,
        > {
            App::new()
                .app_data(web::Data::new(self.config.clone()))
                .app_data(web::Data::new(test_verifier()))
                .app_data(web::Data::new(DatabaseConnector::new(None, "imagenko_test")))
                .app_data(web::Data::from(self.pages.clone()))
                .app_data(web::Data::from(self.users.clone()))
                .app_data(web::Data::from(self.images.clone()))
                .app_data(web::Data::from(self.webhooks.clone()))
                .configure(super::configure)
        }
    }
}
