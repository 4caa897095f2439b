use crate::utils::AppError;
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

pub const SESSION_COOKIE: &str = "__session";

/// Claims do token de sessão do Clerk. `sub` é o clerkId do usuário.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

/// Verifica tokens de sessão: chave PEM → RS256, senão segredo HS256
pub struct SessionVerifier {
    key: Option<(DecodingKey, Validation)>,
}

impl SessionVerifier {
    pub fn from_key(key: Option<&str>) -> Result<Self, AppError> {
        let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
            log::warn!("⚠️  CLERK_JWT_KEY not set, every session will be rejected");
            return Ok(Self { key: None });
        };

        let (decoding_key, algorithm) = if key.starts_with("-----BEGIN") {
            let pem = DecodingKey::from_rsa_pem(key.as_bytes())
                .map_err(|e| AppError::Configuration(format!("Invalid CLERK_JWT_KEY: {}", e)))?;
            (pem, Algorithm::RS256)
        } else {
            (DecodingKey::from_secret(key.as_bytes()), Algorithm::HS256)
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_aud = false;

        Ok(Self {
            key: Some((decoding_key, validation)),
        })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let (key, validation) = self
            .key
            .as_ref()
            .ok_or_else(|| AppError::Configuration("CLERK_JWT_KEY must be set".to_string()))?;

        decode::<Claims>(token, key, validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))
    }
}

/// Bearer header first, then the `__session` cookie
fn session_token(req: &ServiceRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()))
}

pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(token) = session_token(&req) else {
            return Box::pin(async move {
                Err(actix_web::error::ErrorUnauthorized("Missing authorization token"))
            });
        };

        let Some(verifier) = req.app_data::<web::Data<SessionVerifier>>() else {
            log::error!("❌ SessionVerifier missing from app data");
            return Box::pin(async move {
                Err(actix_web::error::ErrorInternalServerError("Session verification unavailable"))
            });
        };

        match verifier.verify(&token) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res)
                })
            }
            Err(e) => {
                log::warn!("🔒 Rejected session on {}: {}", req.path(), e);
                Box::pin(async move { Err(actix_web::error::ErrorUnauthorized("Invalid token")) })
            }
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub const TEST_SESSION_SECRET: &str = "test-session-secret";

    pub fn session_token_for(sub: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as usize,
            sid: Some("sess_test".to_string()),
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SESSION_SECRET.as_bytes()),
        )
        .unwrap()
    }

    pub fn test_verifier() -> SessionVerifier {
        SessionVerifier::from_key(Some(TEST_SESSION_SECRET)).unwrap()
    }
}
