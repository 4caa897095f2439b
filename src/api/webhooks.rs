use actix_web::{web, HttpRequest, HttpResponse};

use crate::models::UserResponse;
use crate::services::WebhookService;
use crate::utils::{signature::WebhookHeaders, AppError};

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|v| !v.is_empty())
}

fn svix_headers(req: &HttpRequest) -> Option<WebhookHeaders> {
    Some(WebhookHeaders {
        id: header(req, "svix-id")?,
        timestamp: header(req, "svix-timestamp")?,
        signature: header(req, "svix-signature")?,
    })
}

/// POST /webhooks/identity - Sincroniza usuários a partir dos eventos do Clerk
#[utoipa::path(
    post,
    path = "/webhooks/identity",
    tag = "Webhooks",
    request_body(content = String, description = "Raw Svix-signed event payload"),
    responses(
        (status = 200, description = "Event applied (empty body for ignored event types)"),
        (status = 400, description = "Missing Svix headers or invalid signature"),
        (status = 500, description = "Webhook secret missing or repository failure")
    )
)]
pub async fn identity_webhook(
    req: HttpRequest,
    body: web::Bytes,
    webhooks: web::Data<WebhookService>,
) -> HttpResponse {
    let Some(headers) = svix_headers(&req) else {
        log::warn!("⚠️  Webhook without svix headers");
        return HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Error occured -- no svix headers"
        }));
    };

    let event = match webhooks.verify(&headers, &body) {
        Ok(event) => event,
        Err(AppError::Configuration(msg)) => {
            log::error!("❌ Webhook configuration error: {}", msg);
            return HttpResponse::InternalServerError().json(serde_json::json!({ "error": msg }));
        }
        Err(e) => {
            log::warn!("⚠️  Error verifying webhook: {}", e);
            return HttpResponse::BadRequest().json(serde_json::json!({ "error": "Error occured" }));
        }
    };

    match webhooks.handle(event).await {
        Ok(outcome) => match (outcome.message(), outcome.user()) {
            (Some(message), Some(user)) => HttpResponse::Ok().json(serde_json::json!({
                "message": message,
                "user": UserResponse::from(user.clone())
            })),
            _ => HttpResponse::Ok().finish(),
        },
        Err(e) => {
            log::error!("❌ Error handling webhook: {}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": e.to_string() }))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::test_app::TestApp;
    use crate::utils::signature::WebhookVerifier;
    use actix_web::{http::StatusCode, test};

    fn created_body(id: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "type": "user.created",
            "data": {
                "id": id,
                "email_addresses": [{ "email_address": format!("{}@example.com", id) }],
                "username": null,
                "first_name": "Caio",
                "last_name": null,
                "image_url": "https://img.clerk.com/caio.png"
            }
        }))
        .unwrap()
    }

    fn signed(body: &[u8]) -> test::TestRequest {
        let ts = chrono::Utc::now().timestamp();
        let signature = WebhookVerifier::new(TestApp::WEBHOOK_SECRET)
            .unwrap()
            .sign("msg_42", ts, body)
            .unwrap();
        test::TestRequest::post()
            .uri("/webhooks/identity")
            .insert_header(("svix-id", "msg_42"))
            .insert_header(("svix-timestamp", ts.to_string()))
            .insert_header(("svix-signature", signature))
            .insert_header(("content-type", "application/json"))
    }

    #[actix_web::test]
    async fn test_missing_headers_rejected() {
        let harness = TestApp::new();
        let app = test::init_service(harness.app()).await;

        let req = test::TestRequest::post()
            .uri("/webhooks/identity")
            .set_payload(created_body("user_1"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(harness.user_store.len(), 0);
    }

    #[actix_web::test]
    async fn test_tampered_signature_never_touches_store() {
        let harness = TestApp::new();
        let app = test::init_service(harness.app()).await;

        let body = created_body("user_1");
        let req = signed(&body).set_payload(created_body("user_2")).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(harness.user_store.len(), 0);
        assert!(harness.identity.metadata.lock().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_user_created_event() {
        let harness = TestApp::new();
        let app = test::init_service(harness.app()).await;

        let body = created_body("user_77");
        let resp = test::call_service(&app, signed(&body).set_payload(body.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["message"], "User created");
        assert_eq!(json["user"]["clerkId"], "user_77");
        assert_eq!(json["user"]["username"], "user_77");

        let metadata = harness.identity.metadata.lock().unwrap();
        assert_eq!(metadata[0].1["userId"], json["user"]["_id"]);
    }

    #[actix_web::test]
    async fn test_unknown_event_returns_empty_ok() {
        let harness = TestApp::new();
        let app = test::init_service(harness.app()).await;

        let body = br#"{"type":"session.ended","data":{"id":"sess_1"}}"#.to_vec();
        let resp = test::call_service(&app, signed(&body).set_payload(body.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = test::read_body(resp).await;
        assert!(bytes.is_empty());
    }

    #[actix_web::test]
    async fn test_delete_of_absent_user_is_server_error() {
        let harness = TestApp::new();
        let app = test::init_service(harness.app()).await;

        let body = br#"{"type":"user.deleted","data":{"id":"ghost","deleted":true}}"#.to_vec();
        let resp = test::call_service(&app, signed(&body).set_payload(body.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn test_missing_secret_is_server_error() {
        let harness = TestApp::with_config(crate::config::AppConfig {
            webhook_secret: None,
            ..crate::config::AppConfig::for_tests()
        });
        let app = test::init_service(harness.app()).await;

        let body = created_body("user_1");
        let resp = test::call_service(&app, signed(&body).set_payload(body.clone()).to_request()).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(harness.user_store.len(), 0);
    }
}
