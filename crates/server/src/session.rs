//! Session cookies: caller token lookup and the refresh middleware.
//!
//! Access tokens are short-lived JWTs issued by the external auth provider.
//! On every request the middleware checks the access cookie and, when it is
//! missing, invalid or about to expire, trades the refresh cookie for a new
//! pair at the provider's token endpoint.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use clubhouse_api::{crypto, ProviderTokenResponse};

use crate::AppState;

/// Refresh cookie lifetime sent to the browser.
const REFRESH_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 30;

pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Value of cookie `name` from the `Cookie` header(s).
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Caller's access token: `Authorization: Bearer` first, then the access cookie.
pub fn access_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| cookie_value(headers, cookie_name))
}

/// Whether `token` must be refreshed: absent, unverifiable, or expiring within `margin`.
pub fn needs_refresh(token: Option<&str>, secret: &str, now: u64, margin: u64) -> bool {
    let Some(token) = token else {
        return true;
    };
    match crypto::verify_jwt(token, secret, now) {
        Ok(claims) => claims.remaining(now) <= margin,
        Err(_) => true,
    }
}

/// Rewrite the `Cookie` header without the named cookies.
pub fn strip_cookies(headers: &mut HeaderMap, names: &[&str]) {
    let kept: Vec<String> = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            !pair.is_empty() && !names.contains(&key)
        })
        .map(str::to_string)
        .collect();

    headers.remove(header::COOKIE);
    if kept.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&kept.join("; ")) {
        headers.insert(header::COOKIE, value);
    }
}

fn session_cookie(name: &str, value: &str, max_age: u64, secure: bool) -> String {
    let secure = if secure { "; Secure" } else { "" };
    format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}")
}

fn append_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => tracing::warn!("dropping malformed session cookie: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Auth provider
// ---------------------------------------------------------------------------

/// Client for the auth provider's token endpoint.
#[derive(Clone)]
pub struct AuthProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl AuthProvider {
    pub fn new(client: reqwest::Client, base_url: String, anon_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty()
    }

    /// Exchange a refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> anyhow::Result<ProviderTokenResponse> {
        let url = format!("{}/token?grant_type=refresh_token", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json::<ProviderTokenResponse>().await?)
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Refresh the session cookies before the request reaches a handler.
pub async fn refresh_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let auth = &state.config.auth;

    // Bearer callers manage their own tokens.
    if req.headers().contains_key(header::AUTHORIZATION) || !state.auth_provider.is_configured() {
        return next.run(req).await;
    }

    let Some(refresh_token) = cookie_value(req.headers(), &auth.refresh_cookie) else {
        return next.run(req).await;
    };

    let access = cookie_value(req.headers(), &auth.access_cookie);
    if !needs_refresh(
        access.as_deref(),
        &auth.jwt_secret,
        unix_now(),
        auth.refresh_margin_secs,
    ) {
        return next.run(req).await;
    }

    let secure = state
        .config
        .server
        .effective_base_url()
        .starts_with("https://");

    match state.auth_provider.refresh(&refresh_token).await {
        Ok(tokens) => {
            match HeaderValue::from_str(&format!("Bearer {}", tokens.access_token)) {
                Ok(value) => {
                    req.headers_mut().insert(header::AUTHORIZATION, value);
                }
                Err(e) => tracing::warn!("provider returned an unusable access token: {e}"),
            }

            let mut response = next.run(req).await;
            let access_max_age = tokens.expires_in.unwrap_or(crypto::JWT_EXPIRY_SECS);
            append_cookie(
                &mut response,
                &session_cookie(&auth.access_cookie, &tokens.access_token, access_max_age, secure),
            );
            append_cookie(
                &mut response,
                &session_cookie(
                    &auth.refresh_cookie,
                    &tokens.refresh_token,
                    REFRESH_COOKIE_MAX_AGE,
                    secure,
                ),
            );
            response
        }
        Err(e) => {
            tracing::warn!("session refresh failed: {e}");
            strip_cookies(
                req.headers_mut(),
                &[auth.access_cookie.as_str(), auth.refresh_cookie.as_str()],
            );

            let mut response = next.run(req).await;
            append_cookie(&mut response, &session_cookie(&auth.access_cookie, "", 0, secure));
            append_cookie(&mut response, &session_cookie(&auth.refresh_cookie, "", 0, secure));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn reads_cookie_by_name() {
        let headers = headers_with_cookie("theme=dark; clubhouse-access-token=abc; other=1");
        assert_eq!(
            cookie_value(&headers, "clubhouse-access-token").as_deref(),
            Some("abc")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = headers_with_cookie("clubhouse-access-token=from-cookie");
        assert_eq!(
            access_token(&headers, "clubhouse-access-token").as_deref(),
            Some("from-cookie")
        );
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        assert_eq!(
            access_token(&headers, "clubhouse-access-token").as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn refresh_decision() {
        let secret = "s3cret";
        let now = 1_700_000_000;
        let fresh = crypto::sign_jwt_with_ttl("u1", secret, now, 3600);
        let expiring = crypto::sign_jwt_with_ttl("u1", secret, now, 30);

        assert!(!needs_refresh(Some(&fresh), secret, now, 60));
        assert!(needs_refresh(Some(&expiring), secret, now, 60));
        assert!(needs_refresh(Some(&fresh), "other-secret", now, 60));
        assert!(needs_refresh(Some("garbage"), secret, now, 60));
        assert!(needs_refresh(None, secret, now, 60));
    }

    #[test]
    fn strips_only_named_cookies() {
        let mut headers = headers_with_cookie("a=1; clubhouse-access-token=x; b=2");
        strip_cookies(&mut headers, &["clubhouse-access-token"]);
        assert_eq!(
            headers.get(header::COOKIE).unwrap().to_str().unwrap(),
            "a=1; b=2"
        );

        let mut headers = headers_with_cookie("clubhouse-access-token=x");
        strip_cookies(&mut headers, &["clubhouse-access-token"]);
        assert!(headers.get(header::COOKIE).is_none());
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("clubhouse-access-token", "tok", 3600, false);
        assert_eq!(
            cookie,
            "clubhouse-access-token=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600"
        );
        assert!(session_cookie("n", "", 0, true).ends_with("Max-Age=0; Secure"));
    }
}
