pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::completion::handlers::handle_complete;
use crate::errors::AppError;
use crate::reports::handlers::{handle_generate, handle_render};
use crate::reports::REPORT_PATH;
use crate::state::AppState;

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/complete",
            post(handle_complete).fallback(method_not_allowed),
        )
        .route(
            "/api/analyze",
            post(handle_generate).fallback(method_not_allowed),
        )
        .route(REPORT_PATH, get(handle_render))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    use crate::test_support::{StubCompleter, TestHarness};

    fn scenario_body() -> String {
        json!({
            "prompt": "x".repeat(25),
            "customer": {"email": "a@b.com", "nombre": "Ana", "empresa": "Acme"},
            "scoresByArea": {"Finance": 80},
            "globalScore": 80
        })
        .to_string()
    }

    fn path_and_query(report_url: &str) -> &str {
        report_url
            .strip_prefix("https://reports.example.com")
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let harness = TestHarness::new(StubCompleter::text("OK"));
        let (status, _, body) = harness.request("GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_complete_returns_text() {
        let harness = TestHarness::new(StubCompleter::text("Respuesta del modelo"));
        let body = json!({"prompt": "Resume este diagnóstico en tres puntos"}).to_string();

        let (status, _, body) = harness.request("POST", "/api/complete", Some(&body)).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body, json!({"text": "Respuesta del modelo"}));
    }

    #[tokio::test]
    async fn test_complete_empty_text_is_success() {
        let harness = TestHarness::new(StubCompleter::text(""));
        let body = json!({"prompt": "y".repeat(30)}).to_string();

        let (status, _, body) = harness.request("POST", "/api/complete", Some(&body)).await;

        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["text"], "");
    }

    #[tokio::test]
    async fn test_complete_rejects_invalid_prompts_without_calling_upstream() {
        let harness = TestHarness::new(StubCompleter::text("OK"));
        for body in [
            json!({}).to_string(),
            json!({"prompt": 42}).to_string(),
            json!({"prompt": "   corto   "}).to_string(),
            String::new(),
        ] {
            let (status, _, resp) = harness.request("POST", "/api/complete", Some(&body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            let resp: Value = serde_json::from_str(&resp).unwrap();
            assert_eq!(resp["error"], "Missing or invalid prompt");
            assert_eq!(resp["kind"], "InvalidInput");
        }
        assert_eq!(harness.completer.calls(), 0);
    }

    #[tokio::test]
    async fn test_complete_forwards_upstream_status_and_body() {
        let harness = TestHarness::new(StubCompleter::upstream_error(
            529,
            r#"{"type":"error","error":{"type":"overloaded_error"}}"#,
        ));
        let body = json!({"prompt": "z".repeat(40)}).to_string();

        let (status, _, resp) = harness.request("POST", "/api/complete", Some(&body)).await;

        assert_eq!(status.as_u16(), 529);
        let resp: Value = serde_json::from_str(&resp).unwrap();
        assert_eq!(resp["error"], "Anthropic error");
        assert_eq!(
            resp["detail"],
            r#"{"type":"error","error":{"type":"overloaded_error"}}"#
        );
    }

    #[tokio::test]
    async fn test_complete_missing_api_key_is_500() {
        let mut harness = TestHarness::new(StubCompleter::text("OK"));
        harness.state.completer = None;
        let body = json!({"prompt": "z".repeat(40)}).to_string();

        let (status, _, resp) = harness.request("POST", "/api/complete", Some(&body)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let resp: Value = serde_json::from_str(&resp).unwrap();
        assert_eq!(resp["error"], "Missing ANTHROPIC_API_KEY");
    }

    #[tokio::test]
    async fn test_wrong_method_is_405_json() {
        let harness = TestHarness::new(StubCompleter::text("OK"));
        for path in ["/api/complete", "/api/analyze"] {
            let (status, headers, body) = harness.request("GET", path, None).await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(headers["allow"], "POST");
            let body: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(body["error"], "Method Not Allowed");
        }
    }

    #[tokio::test]
    async fn test_generate_then_render_round_trip() {
        let harness = TestHarness::new(StubCompleter::text("OK"));

        let (status, _, body) = harness
            .request("POST", "/api/analyze", Some(&scenario_body()))
            .await;
        assert_eq!(status, StatusCode::OK);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["ok"], true);
        assert_eq!(body["expires_days"], 7);
        let report_url = body["report_url"].as_str().unwrap();
        assert!(report_url.contains("?id="));
        assert!(report_url.contains("&token="));

        let sent = harness.mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, "a@b.com");
        assert_eq!(sent[1].to, "admin@example.com");

        let (status, headers, html) = harness
            .request("GET", path_and_query(report_url), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "text/html; charset=utf-8");
        assert!(html.contains(">80/100</div>"));
        assert!(html.contains(">Finance</td>"));
        assert!(html.contains(">80/100</td>"));
        assert!(html.contains("Acme · Ana · "));
        assert!(html.contains("<pre>OK</pre>"));
    }

    #[tokio::test]
    async fn test_generate_empty_completion_is_500() {
        let harness = TestHarness::new(StubCompleter::text(""));

        let (status, _, body) = harness
            .request("POST", "/api/analyze", Some(&scenario_body()))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"], "Empty AI response");
        assert_eq!(body["kind"], "EmptyResult");
    }

    #[tokio::test]
    async fn test_generate_mail_failure_is_server_error_with_detail() {
        let harness = TestHarness::new(StubCompleter::text("OK"));
        harness.mailer.fail_with(401);

        let (status, _, body) = harness
            .request("POST", "/api/analyze", Some(&scenario_body()))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["error"], "Server error");
        assert_eq!(body["detail"], "SendGrid error: 401 rejected by test mailer");
    }

    #[tokio::test]
    async fn test_render_wrong_token_is_403_without_content() {
        let harness = TestHarness::new(StubCompleter::text("Análisis confidencial"));
        let (_, _, body) = harness
            .request("POST", "/api/analyze", Some(&scenario_body()))
            .await;
        let body: Value = serde_json::from_str(&body).unwrap();
        let report_url = body["report_url"].as_str().unwrap();
        let (without_token, _) = report_url.split_once("&token=").unwrap();
        let forged = format!("{}&token={}", path_and_query(without_token), "0".repeat(36));

        let (status, headers, text) = harness.request("GET", &forged, None).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(headers["content-type"].to_str().unwrap().starts_with("text/plain"));
        assert_eq!(text, "Invalid token.");
        assert!(!text.contains("confidencial"));
    }

    #[tokio::test]
    async fn test_render_unknown_or_expired_is_404() {
        let harness = TestHarness::new(StubCompleter::text("OK"));
        let (_, _, body) = harness
            .request("POST", "/api/analyze", Some(&scenario_body()))
            .await;
        let body: Value = serde_json::from_str(&body).unwrap();
        let report_url = body["report_url"].as_str().unwrap().to_string();
        let id = report_url
            .split_once("id=")
            .and_then(|(_, rest)| rest.split_once('&'))
            .map(|(id, _)| id.to_string())
            .unwrap();

        let (status, _, text) = harness
            .request("GET", "/api/report?id=ffffffffffffffffffffffff&token=abc", None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(text, "Report not found or expired.");

        harness.store.expire(&format!("report:{id}"));
        let (status, _, _) = harness
            .request("GET", path_and_query(&report_url), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_render_missing_parameters_is_400() {
        let harness = TestHarness::new(StubCompleter::text("OK"));
        for uri in ["/api/report", "/api/report?id=abc", "/api/report?id=&token=x"] {
            let (status, _, text) = harness.request("GET", uri, None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
            assert_eq!(text, "Missing id/token");
        }
    }

    #[tokio::test]
    async fn test_render_without_store_is_plain_text_500() {
        let mut harness = TestHarness::new(StubCompleter::text("OK"));
        harness.state.store = None;

        let (status, _, text) = harness
            .request("GET", "/api/report?id=abc&token=def", None)
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            text,
            "Server error: Missing KV_REST_API_URL / KV_REST_API_TOKEN"
        );
    }

    #[tokio::test]
    async fn test_render_repeated_parameters_use_last_value() {
        let harness = TestHarness::new(StubCompleter::text("OK"));
        let (status, headers, text) = harness
            .request("GET", "/api/report?id=a&id=b&token=x", None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(headers["content-type"].to_str().unwrap().starts_with("text/plain"));
        assert_eq!(text, "Report not found or expired.");

        let (_, _, body) = harness
            .request("POST", "/api/analyze", Some(&scenario_body()))
            .await;
        let body: Value = serde_json::from_str(&body).unwrap();
        let report_url = body["report_url"].as_str().unwrap();
        let query = report_url.split_once('?').map(|(_, q)| q).unwrap();
        let (status, _, _) = harness
            .request("GET", &format!("/api/report?id=stale&{query}"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}
