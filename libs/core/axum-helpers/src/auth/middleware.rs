use super::jwt::JwtAuth;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Bearer token from `Authorization`, falling back to the `access_token` cookie.
pub fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    bearer.or_else(|| {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .find_map(|cookie| {
                let (name, value) = cookie.trim().split_once('=')?;
                (name == ACCESS_TOKEN_COOKIE).then(|| value.to_string())
            })
    })
}

/// Attaches [`JwtClaims`](super::JwtClaims) for requests with a valid token.
///
/// Requests without a token, or with an invalid one, pass through anonymous;
/// handlers that need a caller reject them through
/// [`CurrentUser`](super::CurrentUser).
pub async fn optional_jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token_from_headers(request.headers()) {
        match auth.verify_token(&token) {
            Ok(claims) => {
                request.extensions_mut().insert(claims);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring invalid access token"),
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("access_token=xyz"));
        assert_eq!(extract_token_from_headers(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn cookie_is_used_without_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=xyz; lang=en"),
        );
        assert_eq!(extract_token_from_headers(&headers).as_deref(), Some("xyz"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(extract_token_from_headers(&headers), None);
    }
}
