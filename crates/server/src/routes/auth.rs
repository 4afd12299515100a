use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, State},
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};
use rusqlite::Connection;

use clubhouse_api::{crypto, db, validate, OkResponse, ProfileResponse, UserCreatedHook};
use clubhouse_runtime_config::ServerConfig;

use crate::error::ApiErr;
use crate::session::{access_token, unix_now};
use crate::storage::{profile_from_row, sq_execute, sq_query_opt, Db};

// ---------------------------------------------------------------------------
// Auth extractors
// ---------------------------------------------------------------------------

/// Caller identified by a provider-issued JWT (bearer header or access cookie).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<ServerConfig>: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<ServerConfig>::from_ref(state);
        let secret = &config.auth.jwt_secret;
        if secret.is_empty() {
            return Err(ApiErr::unauthorized("authentication is not configured"));
        }

        let token = access_token(&parts.headers, &config.auth.access_cookie)
            .ok_or_else(|| ApiErr::unauthorized("missing access token"))?;

        let claims = crypto::verify_jwt(&token, secret, unix_now()).map_err(ApiErr::from)?;
        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}

/// Optional caller: anonymous requests are allowed through.
pub struct MaybeUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    Arc<ServerConfig>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(AuthUser::from_request_parts(parts, state).await.ok()))
    }
}

impl MaybeUser {
    pub fn user_id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.user_id.as_str())
    }
}

/// Caller whose profile is a creator (site admin).
pub struct AdminUser {
    pub user_id: String,
    pub profile: ProfileResponse,
}

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    Arc<ServerConfig>: FromRef<S>,
    Db: FromRef<S>,
{
    type Rejection = ApiErr;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        let db = Db::from_ref(state);
        let conn = db.conn();
        let profile = require_admin(&conn, &user.user_id)?;
        Ok(AdminUser {
            user_id: user.user_id,
            profile,
        })
    }
}

/// Load the caller's profile and require the creator flag.
pub fn require_admin(conn: &Connection, user_id: &str) -> Result<ProfileResponse, ApiErr> {
    let profile = sq_query_opt(conn, db::profiles::get_by_id(user_id), profile_from_row)
        .map_err(ApiErr::from_db("load caller profile"))?
        .ok_or_else(|| ApiErr::forbidden("admin only"))?;
    if !profile.is_creator {
        return Err(ApiErr::forbidden("admin only"));
    }
    Ok(profile)
}

/// [`require_admin`] for an optional caller; anonymous callers are rejected.
pub fn require_admin_caller(conn: &Connection, user: &MaybeUser) -> Result<ProfileResponse, ApiErr> {
    let user_id = user
        .user_id()
        .ok_or_else(|| ApiErr::unauthorized("sign in required"))?;
    require_admin(conn, user_id)
}

// ---------------------------------------------------------------------------
// Provider hooks
// ---------------------------------------------------------------------------

/// POST /api/auth/hooks/user-created — create the profile row for a new account.
pub async fn user_created(
    State(db): State<Db>,
    State(config): State<Arc<ServerConfig>>,
    headers: HeaderMap,
    Json(req): Json<UserCreatedHook>,
) -> Result<(StatusCode, Json<OkResponse>), ApiErr> {
    let expected = &config.auth.hook_secret;
    if expected.is_empty() {
        return Err(ApiErr::forbidden("user hook is not configured"));
    }
    let provided = headers
        .get("x-hook-secret")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !crypto::secrets_match(provided, expected) {
        return Err(ApiErr::unauthorized("invalid hook secret"));
    }

    let id = validate::require("id", &req.id)?;
    let email = validate::require("email", &req.email)?;
    let full_name = req
        .full_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let conn = db.conn();
    let inserted = sq_execute(&conn, db::profiles::insert(&id, &email, full_name))
        .map_err(ApiErr::from_db("insert profile"))?;
    if inserted > 0 {
        tracing::info!("profile created for {id}");
    }

    Ok((StatusCode::CREATED, Json(OkResponse { ok: true })))
}
