//! Session assignment for the generate/accept routes.
//!
//! A request that presents a valid `session` cookie passes through with that
//! id. Otherwise a fresh id is issued, handed to the handler, and set as a
//! cookie on the response.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::SessionId;

pub const SESSION_COOKIE: &str = "session";

/// Cookie attributes for issued session ids.
#[derive(Debug, Clone)]
pub struct SessionCookieSettings {
    pub max_age_secs: u64,
    pub secure: bool,
}

/// Inserted into request extensions by `assign_session`.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: SessionId,
    /// True when the client sent no (valid) cookie and this id was just minted.
    pub issued: bool,
}

pub async fn assign_session(
    State(settings): State<SessionCookieSettings>,
    mut request: Request,
    next: Next,
) -> Response {
    let presented = session_from_headers(request.headers());
    let context = match presented {
        Some(id) => SessionContext { id, issued: false },
        None => {
            let id = SessionId::generate();
            debug!("Issuing new session {id}");
            SessionContext { id, issued: true }
        }
    };

    let cookie = context
        .issued
        .then(|| build_cookie(&context.id, &settings));
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;

    if let Some(cookie) = cookie {
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Failed to encode session cookie: {e}"),
        }
    }
    response
}

/// Finds the `session` cookie across every `Cookie` header. Values that are
/// not valid session ids are ignored.
pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value.trim().trim_matches('"')))
}

fn build_cookie(id: &SessionId, settings: &SessionCookieSettings) -> String {
    let mut cookie = format!(
        "{SESSION_COOKIE}={id}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        settings.max_age_secs
    );
    if settings.secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body, http::Request as HttpRequest, middleware, routing::get, Extension, Router,
    };
    use tower::ServiceExt;

    fn settings(secure: bool) -> SessionCookieSettings {
        SessionCookieSettings {
            max_age_secs: 3600,
            secure,
        }
    }

    fn app(secure: bool) -> Router {
        Router::new()
            .route(
                "/probe",
                get(|Extension(ctx): Extension<SessionContext>| async move {
                    format!("{}:{}", ctx.id, ctx.issued)
                }),
            )
            .layer(middleware::from_fn_with_state(settings(secure), assign_session))
    }

    #[test]
    fn test_cookie_lookup_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("lang=en; session=abc-123"),
        );
        assert_eq!(
            session_from_headers(&headers).map(|id| id.to_string()),
            Some("abc-123".to_string())
        );
    }

    #[test]
    fn test_invalid_cookie_value_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("session=../../tmp/x"),
        );
        assert!(session_from_headers(&headers).is_none());
    }

    #[test]
    fn test_cookie_attributes() {
        let id = SessionId::parse("tok").unwrap();
        assert_eq!(
            build_cookie(&id, &settings(false)),
            "session=tok; Path=/; Max-Age=3600; HttpOnly; SameSite=Lax"
        );
        assert!(build_cookie(&id, &settings(true)).ends_with("; Secure"));
    }

    #[tokio::test]
    async fn test_issues_cookie_when_absent() {
        let response = app(false)
            .oneshot(HttpRequest::get("/probe").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("cookie issued")
            .to_str()
            .unwrap()
            .to_string();
        assert!(set_cookie.starts_with("session="));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(!set_cookie.contains("Secure"));

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.ends_with(":true"));
        let issued_id = body.trim_end_matches(":true");
        assert!(set_cookie.starts_with(&format!("session={issued_id};")));
    }

    #[tokio::test]
    async fn test_passes_existing_cookie_through() {
        let response = app(true)
            .oneshot(
                HttpRequest::get("/probe")
                    .header(header::COOKIE, "session=existing-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"existing-token:false");
    }

    #[tokio::test]
    async fn test_secure_flag_in_production() {
        let response = app(true)
            .oneshot(HttpRequest::get("/probe").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.ends_with("; Secure"));
    }
}
