//! Verificação de webhooks assinados no esquema Svix (usado pelo Clerk)
//!
//! Conteúdo assinado: `{svix-id}.{svix-timestamp}.{corpo bruto}`, HMAC-SHA256
//! com o segredo `whsec_<base64>`. O header `svix-signature` traz uma ou mais
//! entradas `v1,<assinatura base64>` separadas por espaço.
use crate::utils::error::AppError;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1";
pub const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

/// Headers that accompany every signed delivery
#[derive(Debug, Clone)]
pub struct WebhookHeaders {
    pub id: String,
    pub timestamp: String,
    pub signature: String,
}

pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: &str) -> Result<Self, AppError> {
        let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
        let key = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AppError::Configuration(format!("Invalid webhook secret: {}", e)))?;
        Ok(Self { key })
    }

    fn mac(&self, msg_id: &str, timestamp: &str, payload: &[u8]) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| AppError::Configuration(format!("Invalid webhook key: {}", e)))?;
        mac.update(msg_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(mac)
    }

    /// Produces a `v1,<signature>` header value for the given delivery
    pub fn sign(&self, msg_id: &str, timestamp: i64, payload: &[u8]) -> Result<String, AppError> {
        let digest = self
            .mac(msg_id, &timestamp.to_string(), payload)?
            .finalize()
            .into_bytes();
        Ok(format!(
            "{},{}",
            SIGNATURE_VERSION,
            base64::engine::general_purpose::STANDARD.encode(digest)
        ))
    }

    pub fn verify(&self, headers: &WebhookHeaders, payload: &[u8]) -> Result<(), AppError> {
        self.verify_at(headers, payload, chrono::Utc::now().timestamp())
    }

    pub fn verify_at(
        &self,
        headers: &WebhookHeaders,
        payload: &[u8],
        now: i64,
    ) -> Result<(), AppError> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| AppError::Validation("Invalid svix-timestamp header".to_string()))?;

        if now.abs_diff(timestamp) > TIMESTAMP_TOLERANCE_SECS.unsigned_abs() {
            return Err(AppError::Validation(
                "Message timestamp outside tolerance".to_string(),
            ));
        }

        let mac = self.mac(&headers.id, headers.timestamp.trim(), payload)?;

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.split_once(','))
            .filter(|(version, _)| *version == SIGNATURE_VERSION)
            .filter_map(|(_, sig)| base64::engine::general_purpose::STANDARD.decode(sig).ok())
            .any(|sig| mac.clone().verify_slice(&sig).is_ok());

        if matched {
            Ok(())
        } else {
            Err(AppError::Validation("No matching signature found".to_string()))
        }
    }
}
