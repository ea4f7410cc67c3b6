use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use crate::auth::jwt::TokenService;

/// Authenticated subject attached to a single request's extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
}

#[derive(Clone)]
pub struct AuthGateway {
    tokens: Arc<TokenService>,
    public_prefix: String,
}

impl AuthGateway {
    pub fn new(tokens: Arc<TokenService>, public_prefix: impl Into<String>) -> Self {
        let public_prefix = public_prefix.into().trim_end_matches('/').to_owned();
        Self {
            tokens,
            public_prefix,
        }
    }

    pub fn is_public(&self, path: &str) -> bool {
        match path.strip_prefix(self.public_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Resolves the bearer token, if any. Bad tokens yield `None` rather than an error.
    pub fn identify(&self, headers: &HeaderMap) -> Option<Identity> {
        let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))?;

        match self.tokens.parse(token.trim()) {
            Ok(subject) => Some(Identity { subject }),
            Err(e) => {
                warn!(error = %e, "ignoring unusable bearer token");
                None
            }
        }
    }
}

/// Runs once per request: attaches the identity, then rejects non-public
/// paths that ended up without one.
pub async fn authenticate(
    State(gateway): State<AuthGateway>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(identity) = gateway.identify(req.headers()) {
        debug!(subject = %identity.subject, "request authenticated");
        req.extensions_mut().insert(identity);
    }

    let path = req.uri().path();
    if !gateway.is_public(path) && req.extensions().get::<Identity>().is_none() {
        debug!(%path, "rejecting unauthenticated request");
        return unauthorized();
    }

    next.run(req).await
}

pub(crate) fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use axum::{body::Body, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    fn token_service(secret: &str) -> Arc<TokenService> {
        Arc::new(TokenService::from_config(&JwtConfig {
            secret: secret.into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 5,
        }))
    }

    async fn whoami(identity: Option<Extension<Identity>>) -> String {
        identity
            .map(|Extension(id)| id.subject)
            .unwrap_or_else(|| "anonymous".into())
    }

    fn app(gateway: AuthGateway) -> Router {
        Router::new()
            .route("/auth/ping", get(whoami))
            .route("/private", get(whoami))
            .layer(middleware::from_fn_with_state(gateway, authenticate))
    }

    async fn call(app: Router, path: &str, bearer: Option<&str>) -> (StatusCode, String) {
        let mut req = axum::http::Request::builder().uri(path);
        if let Some(token) = bearer {
            req = req.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let res = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn public_prefix_matches_whole_segments() {
        let gateway = AuthGateway::new(token_service("s"), "/auth/");
        assert!(gateway.is_public("/auth"));
        assert!(gateway.is_public("/auth/user/login"));
        assert!(!gateway.is_public("/authority"));
        assert!(!gateway.is_public("/home/dashboard"));
    }

    #[test]
    fn identify_reads_bearer_header() {
        let tokens = token_service("s");
        let gateway = AuthGateway::new(tokens.clone(), "/auth");
        let token = tokens.issue("a@x.com").unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(gateway.identify(&headers), None);

        headers.insert(AUTHORIZATION, format!("Basic {token}").parse().unwrap());
        assert_eq!(gateway.identify(&headers), None);

        headers.insert(AUTHORIZATION, format!("Bearer {token}").parse().unwrap());
        assert_eq!(
            gateway.identify(&headers),
            Some(Identity {
                subject: "a@x.com".into()
            })
        );
    }

    #[tokio::test]
    async fn protected_path_needs_valid_token() {
        let tokens = token_service("s");
        let gateway = AuthGateway::new(tokens.clone(), "/auth");
        let token = tokens.issue("a@x.com").unwrap();

        let (status, body) = call(app(gateway.clone()), "/private", Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "a@x.com");

        let (status, body) = call(app(gateway.clone()), "/private", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, "Unauthorized");

        let foreign = token_service("other").issue("a@x.com").unwrap();
        let (status, _) = call(app(gateway), "/private", Some(&foreign)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn public_path_ignores_bad_token() {
        let gateway = AuthGateway::new(token_service("s"), "/auth");

        let (status, body) = call(app(gateway.clone()), "/auth/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");

        let (status, body) = call(app(gateway), "/auth/ping", Some("garbage")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[tokio::test]
    async fn unknown_private_path_is_unauthorized_not_missing() {
        let gateway = AuthGateway::new(token_service("s"), "/auth");
        let (status, _) = call(app(gateway), "/nowhere", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
