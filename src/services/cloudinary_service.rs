use crate::{config::CloudinaryConfig, utils::AppError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";
const MAX_RESULTS: u32 = 500;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    expression: &'a str,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    resources: Vec<SearchResource>,
}

#[derive(Debug, Deserialize)]
struct SearchResource {
    public_id: String,
}

/// Índice externo de assets, consultado por expressão de busca
#[async_trait]
pub trait AssetSearch: Send + Sync {
    /// Fails with `Configuration` when credentials are missing
    fn ensure_configured(&self) -> Result<(), AppError>;

    /// Public ids of the assets in the app folder matching `query`
    async fn search_public_ids(&self, query: &str) -> Result<Vec<String>, AppError>;
}

/// `folder=<folder>`, narrowed by the free-text query when present
pub fn search_expression(folder: &str, query: &str) -> String {
    let query = query.trim();
    if query.is_empty() {
        format!("folder={}", folder)
    } else {
        format!("folder={} AND {}", folder, query)
    }
}

pub struct CloudinaryClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

struct Credentials<'a> {
    cloud_name: &'a str,
    api_key: &'a str,
    api_secret: &'a str,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn credentials(&self) -> Result<Credentials<'_>, AppError> {
        match (
            self.config.cloud_name.as_deref(),
            self.config.api_key.as_deref(),
            self.config.api_secret.as_deref(),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(Credentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => Err(AppError::Configuration("Missing Cloudinary credentials".to_string())),
        }
    }
}

#[async_trait]
impl AssetSearch for CloudinaryClient {
    fn ensure_configured(&self) -> Result<(), AppError> {
        self.credentials().map(|_| ())
    }

    async fn search_public_ids(&self, query: &str) -> Result<Vec<String>, AppError> {
        let credentials = self.credentials()?;
        let expression = search_expression(&self.config.folder, query);

        log::info!("☁️  Cloudinary search: {}", expression);

        let url = format!(
            "{}/{}/resources/search",
            CLOUDINARY_API_BASE,
            urlencoding::encode(credentials.cloud_name)
        );

        let response = self
            .http
            .post(&url)
            .basic_auth(credentials.api_key, Some(credentials.api_secret))
            .json(&SearchRequest {
                expression: &expression,
                max_results: MAX_RESULTS,
            })
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to reach Cloudinary: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Cloudinary search error: {}",
                response.status()
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Cloudinary response: {}", e)))?;

        Ok(body.resources.into_iter().map(|r| r.public_id).collect())
    }
}
