// ==================== IDENTITY WEBHOOKS ====================
// Eventos do Clerk (via Svix) espelhados na collection de usuários

use crate::{
    config::AppConfig,
    models::{UpdateUserParams, User},
    services::{clerk_service::ClerkUser, user_service::UserService},
    utils::{
        signature::{WebhookHeaders, WebhookVerifier},
        AppError,
    },
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct DeletedObject {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    UserCreated(ClerkUser),
    UserUpdated(ClerkUser),
    UserDeleted { id: Option<String> },
    Other(String),
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, AppError> {
        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| AppError::Validation(format!("Invalid webhook payload: {}", e)))?;

        let invalid = |e: serde_json::Error| {
            AppError::Validation(format!("Invalid {} payload: {}", raw.event_type, e))
        };

        Ok(match raw.event_type.as_str() {
            "user.created" => {
                WebhookEvent::UserCreated(serde_json::from_value(raw.data.clone()).map_err(invalid)?)
            }
            "user.updated" => {
                WebhookEvent::UserUpdated(serde_json::from_value(raw.data.clone()).map_err(invalid)?)
            }
            "user.deleted" => {
                let deleted: DeletedObject = serde_json::from_value(raw.data.clone()).map_err(invalid)?;
                WebhookEvent::UserDeleted { id: deleted.id }
            }
            other => WebhookEvent::Other(other.to_string()),
        })
    }
}

/// Resultado de um evento processado
#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Created(User),
    Updated(User),
    Deleted(User),
    Ignored,
}

impl WebhookOutcome {
    pub fn message(&self) -> Option<&'static str> {
        match self {
            WebhookOutcome::Created(_) => Some("User created"),
            WebhookOutcome::Updated(_) => Some("User updated"),
            WebhookOutcome::Deleted(_) => Some("User deleted"),
            WebhookOutcome::Ignored => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            WebhookOutcome::Created(u) | WebhookOutcome::Updated(u) | WebhookOutcome::Deleted(u) => Some(u),
            WebhookOutcome::Ignored => None,
        }
    }
}

pub struct WebhookService {
    users: Arc<UserService>,
    verifier: Result<WebhookVerifier, AppError>,
}

impl WebhookService {
    /// An absent or malformed secret is reported on every delivery, not at boot.
    pub fn new(users: Arc<UserService>, config: &AppConfig) -> Self {
        let verifier = config.require_webhook_secret().and_then(WebhookVerifier::new);
        if let Err(e) = &verifier {
            log::warn!("⚠️  Identity webhooks disabled: {}", e);
        }
        Self { users, verifier }
    }

    /// Checks the signature, then parses the event. Nothing is read or
    /// written before both succeed.
    pub fn verify(&self, headers: &WebhookHeaders, payload: &[u8]) -> Result<WebhookEvent, AppError> {
        let verifier = self.verifier.as_ref().map_err(Clone::clone)?;
        verifier.verify(headers, payload)?;
        WebhookEvent::parse(payload)
    }

    pub async fn handle(&self, event: WebhookEvent) -> Result<WebhookOutcome, AppError> {
        match event {
            WebhookEvent::UserCreated(clerk_user) => {
                log::info!("📨 user.created {}", clerk_user.id);
                let user = self.users.create_user(clerk_user.to_profile()?).await?;

                if let Some(id) = user.id {
                    self.users
                        .identity()
                        .update_public_metadata(&user.clerk_id, serde_json::json!({ "userId": id.to_hex() }))
                        .await?;
                }

                Ok(WebhookOutcome::Created(user))
            }
            WebhookEvent::UserUpdated(clerk_user) => {
                log::info!("📨 user.updated {}", clerk_user.id);
                let update = UpdateUserParams {
                    first_name: clerk_user.first_name.clone(),
                    last_name: clerk_user.last_name.clone(),
                    username: clerk_user.username.clone(),
                    photo: clerk_user.image_url.clone(),
                };
                let user = self.users.update_user(&clerk_user.id, &update).await?;
                Ok(WebhookOutcome::Updated(user))
            }
            WebhookEvent::UserDeleted { id } => {
                let id = id.ok_or_else(|| AppError::Validation("user.deleted without id".to_string()))?;
                log::info!("📨 user.deleted {}", id);
                let user = self.users.delete_user(&id).await?;
                Ok(WebhookOutcome::Deleted(user))
            }
            WebhookEvent::Other(event_type) => {
                log::info!("📨 Ignoring webhook event {}", event_type);
                Ok(WebhookOutcome::Ignored)
            }
        }
    }
}
