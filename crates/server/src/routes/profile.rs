use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, Json};

use clubhouse_api::{
    db, service, OnboardResponse, PlanPermissions, ProfileResponse, UpdateProfileRequest,
};
use clubhouse_runtime_config::ServerConfig;

use crate::error::ApiErr;
use crate::permissions::resolve_plan_permissions;
use crate::routes::auth::{AuthUser, MaybeUser};
use crate::storage::{profile_from_row, sq_execute, sq_query_opt, sq_query_row, Db};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// GET /api/me — the caller's profile.
pub async fn me(State(db): State<Db>, user: AuthUser) -> Result<Json<ProfileResponse>, ApiErr> {
    let conn = db.conn();
    let profile = sq_query_opt(&conn, db::profiles::get_by_id(&user.user_id), profile_from_row)
        .map_err(ApiErr::from_db("load profile"))?
        .ok_or_else(|| ApiErr::not_found("profile not found"))?;
    Ok(Json(profile))
}

/// PUT /api/me — update name, avatar and notification opt-in.
pub async fn update_me(
    State(db): State<Db>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiErr> {
    let full_name = req.full_name.as_deref().map(str::trim);
    let avatar_url = req.avatar_url.as_deref().map(str::trim);

    let conn = db.conn();
    if let Some(built) = db::profiles::update(
        &user.user_id,
        full_name,
        avatar_url,
        req.email_notifications,
        &service::now_sqlite(),
    ) {
        let affected = sq_execute(&conn, built).map_err(ApiErr::from_db("update profile"))?;
        if affected == 0 {
            return Err(ApiErr::not_found("profile not found"));
        }
    }

    let profile = sq_query_opt(&conn, db::profiles::get_by_id(&user.user_id), profile_from_row)
        .map_err(ApiErr::from_db("reload profile"))?
        .ok_or_else(|| ApiErr::not_found("profile not found"))?;
    Ok(Json(profile))
}

/// GET /api/me/permissions — plan permissions of the caller (all false when anonymous).
pub async fn my_permissions(State(db): State<Db>, user: MaybeUser) -> Json<PlanPermissions> {
    let conn = db.conn();
    Json(resolve_plan_permissions(&conn, user.user_id()))
}

// ---------------------------------------------------------------------------
// Onboarding
// ---------------------------------------------------------------------------

/// Assign the default plan when the caller has none.
///
/// `Ok(None)` means the profile row does not exist yet.
fn try_assign_default_plan(db: &Db, user_id: &str) -> Result<Option<String>, ApiErr> {
    let conn = db.conn();

    let current = sq_query_opt(&conn, db::profiles::get_plan_id(user_id), |row| {
        row.get::<_, Option<String>>(0)
    })
    .map_err(ApiErr::from_db("load profile plan"))?;

    match current {
        None => Ok(None),
        Some(Some(plan_id)) => Ok(Some(plan_id)),
        Some(None) => {
            let default_plan = sq_query_opt(&conn, db::plans::default_plan_id(), |row| {
                row.get::<_, String>(0)
            })
            .map_err(ApiErr::from_db("load default plan"))?
            .ok_or_else(|| ApiErr::not_found("no default plan configured"))?;

            sq_execute(
                &conn,
                db::profiles::assign_plan_if_unset(user_id, &default_plan, &service::now_sqlite()),
            )
            .map_err(ApiErr::from_db("assign default plan"))?;

            // Another request may have assigned a plan first; report what is stored.
            let assigned = sq_query_row(&conn, db::profiles::get_plan_id(user_id), |row| {
                row.get::<_, Option<String>>(0)
            })
            .map_err(ApiErr::from_db("reload profile plan"))?;
            Ok(Some(assigned.unwrap_or(default_plan)))
        }
    }
}

/// POST /api/me/onboard — put a freshly signed-up member on the default plan.
///
/// The profile row is written by the provider hook and may lag the first
/// request, so the lookup is retried a bounded number of times.
pub async fn onboard(
    State(db): State<Db>,
    State(config): State<Arc<ServerConfig>>,
    user: AuthUser,
) -> Result<Json<OnboardResponse>, ApiErr> {
    let attempts = config.onboarding.plan_assign_attempts.max(1);
    let delay = Duration::from_millis(config.onboarding.plan_assign_delay_ms);

    for attempt in 1..=attempts {
        if let Some(plan_id) = try_assign_default_plan(&db, &user.user_id)? {
            tracing::info!(user = %user.user_id, plan = %plan_id, attempt, "member onboarded");
            return Ok(Json(OnboardResponse {
                plan_id,
                attempts: attempt,
            }));
        }
        if attempt < attempts {
            tracing::warn!(
                user = %user.user_id,
                attempt,
                "profile not visible yet, retrying plan assignment"
            );
            tokio::time::sleep(delay).await;
        }
    }

    tracing::warn!(user = %user.user_id, attempts, "gave up assigning default plan");
    Err(ApiErr::not_found("profile not found"))
}
