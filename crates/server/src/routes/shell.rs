use axum::{extract::State, Json};
use rusqlite::Connection;

use clubhouse_api::{
    db, nav, service, NavigationSettingsResponse, ShellResponse, UpdateNavigationRequest,
};

use crate::error::ApiErr;
use crate::permissions::resolve_plan_permissions;
use crate::routes::auth::{AdminUser, MaybeUser};
use crate::storage::{profile_from_row, sq_execute, sq_query_opt, sq_query_row, Db};

fn stored_navigation(conn: &Connection) -> Result<Option<String>, ApiErr> {
    let value = sq_query_opt(conn, db::settings::get(db::settings::NAVIGATION_KEY), |row| {
        row.get::<_, Option<String>>(0)
    })
    .map_err(ApiErr::from_db("load navigation settings"))?;
    Ok(value.flatten())
}

/// GET /api/shell — navigation, labels, permissions and unread count for the layout.
///
/// Anonymous callers get the default menu and no permissions.
pub async fn shell(State(db): State<Db>, user: MaybeUser) -> Result<Json<ShellResponse>, ApiErr> {
    let conn = db.conn();

    let profile = match user.user_id() {
        Some(user_id) => sq_query_opt(&conn, db::profiles::get_by_id(user_id), profile_from_row)
            .map_err(ApiErr::from_db("load profile"))?,
        None => None,
    };
    let is_admin = profile.as_ref().is_some_and(|p| p.is_creator);

    let resolved = nav::resolve_stored(stored_navigation(&conn)?.as_deref(), is_admin);
    let permissions = resolve_plan_permissions(&conn, user.user_id());

    let unread_updates = match user.user_id() {
        Some(user_id) => sq_query_row(&conn, db::updates::unread_count(user_id), |row| {
            row.get::<_, i64>(0)
        })
        .map_err(ApiErr::from_db("count unread updates"))?,
        None => 0,
    };

    Ok(Json(ShellResponse {
        navigation: resolved.items,
        labels: resolved.labels,
        permissions,
        unread_updates,
        profile,
    }))
}

// ---------------------------------------------------------------------------
// Admin navigation settings
// ---------------------------------------------------------------------------

/// GET /api/admin/settings/navigation — stored config plus what members see.
pub async fn navigation_settings(
    State(db): State<Db>,
    _admin: AdminUser,
) -> Result<Json<NavigationSettingsResponse>, ApiErr> {
    let conn = db.conn();
    let raw = stored_navigation(&conn)?;
    let resolved = nav::resolve_stored(raw.as_deref(), false).items;
    Ok(Json(NavigationSettingsResponse { raw, resolved }))
}

/// PUT /api/admin/settings/navigation — store the config verbatim.
///
/// Text that is not valid JSON is still stored; it resolves to the default menu.
pub async fn update_navigation(
    State(db): State<Db>,
    _admin: AdminUser,
    Json(req): Json<UpdateNavigationRequest>,
) -> Result<Json<NavigationSettingsResponse>, ApiErr> {
    let raw = match req.config {
        serde_json::Value::String(text) => text,
        other => other.to_string(),
    };

    let conn = db.conn();
    sq_execute(
        &conn,
        db::settings::upsert(db::settings::NAVIGATION_KEY, &raw, &service::now_sqlite()),
    )
    .map_err(ApiErr::from_db("store navigation settings"))?;

    let resolved = nav::resolve_stored(Some(&raw), false).items;
    Ok(Json(NavigationSettingsResponse {
        raw: Some(raw),
        resolved,
    }))
}
