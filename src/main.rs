mod api;
mod config;
mod database;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::database::{DatabaseConnector, MongoImageStore, MongoUserStore};
use crate::middleware::SessionVerifier;
use crate::services::{ClerkClient, CloudinaryClient, ImageService, UserService, WebhookService};
use crate::utils::PageCache;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();
    let host = config.host.clone();
    let port = config.port.clone();

    log::info!("🚀 Starting Imagenko Service...");
    log::info!("📊 Database: {}", config.mongodb_db_name);

    let verifier = SessionVerifier::from_key(config.clerk_jwt_key.as_deref())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    // Conexão preguiçosa: a primeira operação abre o pool
    let connector = Arc::new(DatabaseConnector::new(
        config.mongodb_url.clone(),
        config.mongodb_db_name.clone(),
    ));

    // Pré-aquecer a conexão; uma falha aqui não derruba o servidor
    match connector.get().await {
        Ok(_) => log::info!("✅ MongoDB connected successfully"),
        Err(e) => log::warn!("⚠️  MongoDB warmup failed, will retry on first use: {}", e),
    }

    let pages = Arc::new(PageCache::new());
    let users = Arc::new(UserService::new(
        Arc::new(MongoUserStore::new(connector.clone())),
        Arc::new(ClerkClient::new(config.clerk_secret_key.clone())),
        pages.clone(),
        config.default_credit_balance,
    ));
    let images = Arc::new(ImageService::new(
        Arc::new(MongoImageStore::new(connector.clone())),
        users.clone(),
        Arc::new(CloudinaryClient::new(config.cloudinary.clone())),
        pages.clone(),
    ));
    let webhooks = Arc::new(WebhookService::new(users.clone(), &config));

    let config_data = web::Data::new(config);
    let verifier_data = web::Data::new(verifier);
    let connector_data = web::Data::from(connector);
    let pages_data = web::Data::from(pages);
    let users_data = web::Data::from(users);
    let images_data = web::Data::from(images);
    let webhooks_data = web::Data::from(webhooks);

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&config_data.frontend_url)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(config_data.clone())
            .app_data(verifier_data.clone())
            .app_data(connector_data.clone())
            .app_data(pages_data.clone())
            .app_data(users_data.clone())
            .app_data(images_data.clone())
            .app_data(webhooks_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
            .configure(api::configure)
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
