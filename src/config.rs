use crate::utils::AppError;
use std::env;

/// Credenciais do Cloudinary (busca de assets)
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
}

/// Configuração carregada do ambiente (`.env` via dotenv).
///
/// Required values stay optional here and are checked at first use, so a
/// missing secret fails the one operation that needs it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    pub frontend_url: String,
    pub mongodb_url: Option<String>,
    pub mongodb_db_name: String,
    pub admin_id: Option<String>,
    pub webhook_secret: Option<String>,
    pub clerk_secret_key: Option<String>,
    pub clerk_jwt_key: Option<String>,
    pub cloudinary: CloudinaryConfig,
    pub default_credit_balance: i64,
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            mongodb_url: optional("MONGODB_URL"),
            mongodb_db_name: env::var("MONGODB_DB_NAME")
                .unwrap_or_else(|_| "imagenko_db".to_string()),
            admin_id: optional("ADMIN_ID"),
            webhook_secret: optional("WEBHOOK_SECRET"),
            clerk_secret_key: optional("CLERK_SECRET_KEY"),
            clerk_jwt_key: optional("CLERK_JWT_KEY"),
            cloudinary: CloudinaryConfig {
                cloud_name: optional("CLOUDINARY_CLOUD_NAME"),
                api_key: optional("CLOUDINARY_API_KEY"),
                api_secret: optional("CLOUDINARY_API_SECRET"),
                folder: env::var("CLOUDINARY_FOLDER").unwrap_or_else(|_| "imagenko".to_string()),
            },
            default_credit_balance: env::var("DEFAULT_CREDIT_BALANCE")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(10),
        }
    }

    pub fn require_webhook_secret(&self) -> Result<&str, AppError> {
        self.webhook_secret.as_deref().ok_or_else(|| {
            AppError::Configuration("WEBHOOK_SECRET must be set to receive identity webhooks".to_string())
        })
    }

    /// Whether `subject` is the statically configured admin principal.
    /// An unset ADMIN_ID matches nobody.
    pub fn is_admin_principal(&self, subject: &str) -> bool {
        self.admin_id.as_deref() == Some(subject)
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: "0".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            mongodb_url: None,
            mongodb_db_name: "imagenko_test".to_string(),
            admin_id: Some("user_admin".to_string()),
            webhook_secret: Some("whsec_MfKQ9r8GKYqrTwjUPD8ILPZIo2LaLaSw".to_string()),
            clerk_secret_key: None,
            clerk_jwt_key: Some("test-session-secret".to_string()),
            cloudinary: CloudinaryConfig {
                cloud_name: Some("demo".to_string()),
                api_key: Some("key".to_string()),
                api_secret: Some("secret".to_string()),
                folder: "imagenko".to_string(),
            },
            default_credit_balance: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_principal() {
        let mut config = AppConfig::for_tests();
        assert!(config.is_admin_principal("user_admin"));
        assert!(!config.is_admin_principal("user_other"));

        config.admin_id = None;
        assert!(!config.is_admin_principal(""));
    }

    #[test]
    fn test_missing_webhook_secret() {
        let mut config = AppConfig::for_tests();
        config.webhook_secret = None;
        assert!(matches!(
            config.require_webhook_secret(),
            Err(AppError::Configuration(_))
        ));
    }
}
