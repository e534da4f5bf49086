use std::convert::Infallible;

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Correlates log lines and the response of one HTTP request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The id a client sent, if it is a well-formed UUID
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let raw = headers.get(&REQUEST_ID_HEADER)?.to_str().ok()?;
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lets handlers take `RequestId` as an argument
///
/// Outside [`request_id_middleware`] a fresh id is made up on the spot.
#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<RequestId>().copied().unwrap_or_default())
    }
}

/// Tags each request with a [`RequestId`] and echoes it as `x-request-id`
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_headers(request.headers()).unwrap_or_default();
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// `TraceLayer` span carrying the id set by [`request_id_middleware`]
pub fn make_span_with_request_id(request: &Request<Body>) -> tracing::Span {
    match request.extensions().get::<RequestId>() {
        Some(id) => tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %id,
        ),
        None => tracing::info_span!(
            "http_request",
            method = %request.method(),
            uri = %request.uri(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};
    use axum_test::TestServer;

    async fn echo(request_id: RequestId) -> String {
        request_id.to_string()
    }

    fn server() -> TestServer {
        let app = Router::new()
            .route("/", get(echo))
            .layer(axum::middleware::from_fn(request_id_middleware));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_generates_request_id() {
        let response = server().get("/").await;
        let header = response.header(REQUEST_ID_HEADER);
        let header = header.to_str().unwrap();
        assert!(Uuid::parse_str(header).is_ok());
        assert_eq!(response.text(), header);
    }

    #[tokio::test]
    async fn test_reuses_incoming_request_id() {
        let id = Uuid::new_v4().to_string();
        let response = server()
            .get("/")
            .add_header(REQUEST_ID_HEADER, HeaderValue::from_str(&id).unwrap())
            .await;
        assert_eq!(response.text(), id);
    }

    #[tokio::test]
    async fn test_replaces_malformed_request_id() {
        let response = server()
            .get("/")
            .add_header(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"))
            .await;
        assert_ne!(response.text(), "not-a-uuid");
    }

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(RequestId::from_headers(&headers), None);

        let id = Uuid::new_v4();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        assert_eq!(RequestId::from_headers(&headers), Some(RequestId(id)));
    }

    #[tokio::test]
    async fn test_extractor_without_middleware() {
        let app = Router::new().route("/", get(echo));
        let response = TestServer::new(app).unwrap().get("/").await;
        assert!(Uuid::parse_str(&response.text()).is_ok());
    }
}
