pub mod health;
pub mod index;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::generation::handlers;
use crate::session::{assign_session, SessionCookieSettings};
use crate::state::AppState;

/// Headroom on top of the upload limit for the text fields and multipart framing.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let cookie_settings = SessionCookieSettings {
        max_age_secs: state.config.session_ttl_secs,
        secure: state.config.production,
    };
    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    // Only these two routes are gated by session assignment.
    let session_routes = Router::new()
        .route(
            "/api/generate",
            post(handlers::handle_generate).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/accept", post(handlers::handle_accept))
        .route_layer(middleware::from_fn_with_state(
            cookie_settings,
            assign_session,
        ));

    Router::new()
        .route("/", get(index::index_handler))
        .route("/health", get(health::health_handler))
        .merge(session_routes)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, Response, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::Config;
    use crate::render::{BuiltinPdfRenderer, PdfRenderer, ResumeDocument};

    const BOUNDARY: &str = "tailor-test-boundary";

    struct Harness {
        app: Router,
        upstream: MockServer,
        _sessions: TempDir,
    }

    async fn harness_with(upstream_response: ResponseTemplate) -> Harness {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(upstream_response)
            .mount(&upstream)
            .await;

        let sessions = TempDir::new().unwrap();
        let config = Config {
            openai_api_key: "test-key".to_string(),
            openai_base_url: upstream.uri(),
            session_dir: sessions.path().to_path_buf(),
            ..Config::local()
        };
        let app = build_router(AppState::from_config(config).unwrap());

        Harness {
            app,
            upstream,
            _sessions: sessions,
        }
    }

    async fn harness(tailored: &str) -> Harness {
        harness_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": tailored}}]
        })))
        .await
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a [u8]),
    }

    fn multipart(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"resume.pdf\"\r\n\
                             Content-Type: application/pdf\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn generate_request(parts: &[Part<'_>], cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/api/generate").header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(multipart(parts))).unwrap()
    }

    fn accept_request(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/api/accept");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    /// `session=<id>` from the response's Set-Cookie header.
    fn issued_cookie(response: &Response<Body>) -> Option<String> {
        response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(String::from)
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_generate_returns_formatted_texts() {
        let h = harness("Jane Doe\n- Rust, Tokio\n- Axum").await;

        let response = h
            .app
            .oneshot(generate_request(
                &[
                    Part::Text("resume", "Jane Doe\n- Rust"),
                    Part::Text("job", "Senior Rust Engineer"),
                ],
                Some("session=existing"),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(issued_cookie(&response).is_none());
        let body = json_body(response).await;
        assert_eq!(body["original"], "Jane Doe<br>- Rust");
        assert_eq!(body["tailored"], "Jane Doe<br>- Rust, Tokio<br>- Axum");
        assert!(!body["tailored"].as_str().unwrap().contains('\n'));
        assert!(!body["original"].as_str().unwrap().contains('\n'));
    }

    #[tokio::test]
    async fn test_generate_without_job_is_400() {
        let h = harness("unused").await;
        let response = h
            .app
            .oneshot(generate_request(&[Part::Text("resume", "Jane Doe")], None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Job description is required");
        assert!(h.upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generate_without_resume_is_400() {
        let h = harness("unused").await;
        let response = h
            .app
            .oneshot(generate_request(
                &[Part::Text("job", "Engineer"), Part::File("resumeFile", b"")],
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "Resume text or PDF file is required"
        );
    }

    #[tokio::test]
    async fn test_malformed_pdf_is_400_not_500() {
        let h = harness("unused").await;
        let response = h
            .app
            .oneshot(generate_request(
                &[
                    Part::File("resumeFile", b"definitely not a pdf"),
                    Part::Text("resume", "pasted text that must not be used"),
                    Part::Text("job", "Engineer"),
                ],
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Failed to parse PDF file");
        assert!(h.upstream.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_uploaded_pdf_text_wins_over_pasted_text() {
        let h = harness("Tailored").await;
        // Outranks the harness's catch-all mock.
        Mock::given(method("POST"))
            .and(body_string_contains("Staff Rust Engineer"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "Tailored from PDF"}}]
            })))
            .with_priority(1)
            .expect(1)
            .mount(&h.upstream)
            .await;

        let pdf = BuiltinPdfRenderer
            .render(&ResumeDocument::new("Jane Doe\nStaff Rust Engineer"))
            .await
            .unwrap();

        let response = h
            .app
            .oneshot(generate_request(
                &[
                    Part::Text("resume", "pasted text that must not be used"),
                    Part::File("resumeFile", &pdf),
                    Part::Text("job", "Engineer"),
                ],
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["tailored"], "Tailored from PDF");
        let original = body["original"].as_str().unwrap();
        assert!(original.contains("Staff Rust Engineer"));
        assert!(!original.contains("pasted text"));

        let requests = h.upstream.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let sent = String::from_utf8_lossy(&requests[0].body);
        assert!(sent.contains("Jane Doe"));
        assert!(!sent.contains("pasted text"));
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_400() {
        let h = harness("unused").await;
        let response = h
            .app
            .oneshot(
                Request::post("/api/generate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Invalid form data");
    }

    #[tokio::test]
    async fn test_upstream_401_maps_to_api_key_message() {
        let h = harness_with(ResponseTemplate::new(401)).await;
        let response = h
            .app
            .oneshot(generate_request(
                &[Part::Text("resume", "r"), Part::Text("job", "j")],
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["error"],
            "Failed to generate tailored resume. Authentication failed. Please check your API key."
        );
    }

    #[tokio::test]
    async fn test_upstream_429_maps_to_rate_limit_message() {
        let h = harness_with(ResponseTemplate::new(429)).await;
        let response = h
            .app
            .oneshot(generate_request(
                &[Part::Text("resume", "r"), Part::Text("job", "j")],
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["error"],
            "Failed to generate tailored resume. Rate limit exceeded. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_upstream_missing_choices_is_500() {
        let h = harness_with(ResponseTemplate::new(200).set_body_json(json!({"id": "x"}))).await;
        let response = h
            .app
            .oneshot(generate_request(
                &[Part::Text("resume", "r"), Part::Text("job", "j")],
                None,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await["error"],
            "Failed to generate tailored resume. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_accept_without_session_is_400_and_issues_cookie() {
        let h = harness("unused").await;
        let response = h.app.oneshot(accept_request(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(issued_cookie(&response).is_some());
        assert_eq!(
            json_body(response).await["error"],
            "No session found. Please generate a resume first."
        );
    }

    #[tokio::test]
    async fn test_accept_without_generate_is_400() {
        let h = harness("unused").await;
        let response = h
            .app
            .oneshot(accept_request(Some("session=never-generated")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "No tailored resume found. Please generate one first."
        );
    }

    #[tokio::test]
    async fn test_generate_then_accept_is_at_most_once() {
        let h = harness("Tailored\nResume").await;

        // First contact: no cookie. The issued id is used for the record.
        let response = h
            .app
            .clone()
            .oneshot(generate_request(
                &[Part::Text("resume", "Original"), Part::Text("job", "Role")],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = issued_cookie(&response).expect("session cookie issued");

        let response = h
            .app
            .clone()
            .oneshot(accept_request(Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=tailored-resume.pdf"
        );
        let pdf = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));

        let response = h.app.oneshot(accept_request(Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_other_routes_are_not_gated() {
        let h = harness("unused").await;

        let response = h
            .app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(issued_cookie(&response).is_none());
        assert_eq!(json_body(response).await["status"], "ok");

        let response = h
            .app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(issued_cookie(&response).is_none());
        let html = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(html.to_vec()).unwrap();
        assert!(html.contains("/api/generate"));
        assert!(html.contains("/api/accept"));
    }
}
