// ==================== CLERK (IDENTITY PROVIDER) ====================
// Backend API: leitura de perfil e escrita de public_metadata

use crate::{
    models::{derive_username, UserProfile},
    utils::AppError,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const CLERK_API_BASE: &str = "https://api.clerk.com/v1";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ClerkEmailAddress {
    pub email_address: String,
}

/// Usuário como o Clerk o entrega (API e payload de webhook)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct ClerkUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<ClerkEmailAddress>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ClerkUser {
    pub fn primary_email(&self) -> Option<&str> {
        self.email_addresses.first().map(|e| e.email_address.as_str())
    }

    /// Builds the local profile, falling back on the username precedence
    pub fn to_profile(&self) -> Result<UserProfile, AppError> {
        let email = self
            .primary_email()
            .ok_or_else(|| AppError::Validation(format!("Clerk user {} has no email address", self.id)))?;

        Ok(UserProfile {
            clerk_id: self.id.clone(),
            email: email.to_string(),
            username: derive_username(self.username.as_deref(), email, &self.id),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            photo: self.image_url.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_user(&self, clerk_id: &str) -> Result<ClerkUser, AppError>;

    async fn update_public_metadata(
        &self,
        clerk_id: &str,
        metadata: serde_json::Value,
    ) -> Result<(), AppError>;
}

pub struct ClerkClient {
    http: reqwest::Client,
    secret_key: Option<String>,
    base_url: String,
}

impl ClerkClient {
    pub fn new(secret_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key,
            base_url: CLERK_API_BASE.to_string(),
        }
    }

    fn secret_key(&self) -> Result<&str, AppError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| AppError::Configuration("CLERK_SECRET_KEY must be set".to_string()))
    }

    fn user_url(&self, clerk_id: &str) -> String {
        format!("{}/users/{}", self.base_url, urlencoding::encode(clerk_id))
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn get_user(&self, clerk_id: &str) -> Result<ClerkUser, AppError> {
        log::info!("🔐 Fetching Clerk user {}", clerk_id);

        let response = self
            .http
            .get(self.user_url(clerk_id))
            .bearer_auth(self.secret_key()?)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to fetch from Clerk: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Clerk user {}", clerk_id)));
        }
        if !response.status().is_success() {
            return Err(AppError::Upstream(format!("Clerk API error: {}", response.status())));
        }

        response
            .json::<ClerkUser>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Clerk user: {}", e)))
    }

    async fn update_public_metadata(
        &self,
        clerk_id: &str,
        metadata: serde_json::Value,
    ) -> Result<(), AppError> {
        log::info!("🔐 Updating Clerk metadata for {}", clerk_id);

        let response = self
            .http
            .patch(format!("{}/metadata", self.user_url(clerk_id)))
            .bearer_auth(self.secret_key()?)
            .json(&serde_json::json!({ "public_metadata": metadata }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to reach Clerk: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "Clerk metadata update failed: {}",
                response.status()
            )));
        }

        Ok(())
    }
}
