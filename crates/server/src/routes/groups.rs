use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rusqlite::Connection;

use clubhouse_api::{
    db, service, validate, CreateGroupRequest, GroupResponse, ListGroupsResponse, OkResponse,
    UpdateGroupRequest,
};

use crate::error::ApiErr;
use crate::routes::auth::{AdminUser, AuthUser};
use crate::storage::{
    group_from_row, profile_from_row, sq_execute, sq_query_map, sq_query_opt, Db,
};

/// Whether `user_id` may see private groups.
fn is_creator(conn: &Connection, user_id: &str) -> Result<bool, ApiErr> {
    let profile = sq_query_opt(conn, db::profiles::get_by_id(user_id), profile_from_row)
        .map_err(ApiErr::from_db("load caller profile"))?;
    Ok(profile.is_some_and(|p| p.is_creator))
}

fn load(conn: &Connection, id: &str) -> Result<GroupResponse, ApiErr> {
    sq_query_opt(conn, db::groups::get_by_id(id), group_from_row)
        .map_err(ApiErr::from_db("load group"))?
        .ok_or_else(|| ApiErr::not_found("group not found"))
}

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// Member views
// ---------------------------------------------------------------------------

/// GET /api/groups — public groups (admins also see private ones).
pub async fn list_groups(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListGroupsResponse>, ApiErr> {
    let conn = db.conn();
    let include_private = is_creator(&conn, &user.user_id)?;
    let groups = sq_query_map(&conn, db::groups::list(include_private), group_from_row)
        .map_err(ApiErr::from_db("list groups"))?;
    Ok(Json(ListGroupsResponse { groups }))
}

/// GET /api/groups/:id — private groups are hidden from non-admins.
pub async fn get_group(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<GroupResponse>, ApiErr> {
    let conn = db.conn();
    let group = load(&conn, &id)?;
    if group.is_private && !is_creator(&conn, &user.user_id)? {
        return Err(ApiErr::not_found("group not found"));
    }
    Ok(Json(group))
}

// ---------------------------------------------------------------------------
// Admin settings
// ---------------------------------------------------------------------------

/// POST /api/admin/groups
pub async fn create_group(
    State(db): State<Db>,
    admin: AdminUser,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ApiErr> {
    let (name, slug) = validate::name_and_slug(&req.name, &req.slug, false)?;

    let id = service::new_id();
    let conn = db.conn();
    sq_execute(
        &conn,
        db::groups::insert(
            db::groups::NewGroup {
                id: &id,
                name: &name,
                slug: &slug,
                description: trimmed(req.description.as_deref()),
                is_private: req.is_private,
                cover_url: trimmed(req.cover_url.as_deref()),
                created_by: &admin.user_id,
            },
            &service::now_sqlite(),
        ),
    )
    .map_err(ApiErr::from_db("insert group"))?;

    Ok((StatusCode::CREATED, Json(load(&conn, &id)?)))
}

/// PUT /api/admin/groups/:id — partial settings update, last write wins.
pub async fn update_group(
    State(db): State<Db>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, ApiErr> {
    let name = req.name.as_deref().map(validate::validate_name).transpose()?;
    let slug = req
        .slug
        .as_deref()
        .map(|s| validate::validate_slug(s.trim()))
        .transpose()?;

    let changes = db::groups::GroupChanges {
        name: name.as_deref(),
        slug: slug.as_deref(),
        description: req.description.as_deref().map(str::trim),
        is_private: req.is_private,
        cover_url: req.cover_url.as_deref().map(str::trim),
    };

    let conn = db.conn();
    load(&conn, &id)?;
    if let Some(built) = db::groups::update(&id, changes, &service::now_sqlite()) {
        sq_execute(&conn, built).map_err(ApiErr::from_db("update group"))?;
    }
    Ok(Json(load(&conn, &id)?))
}

/// DELETE /api/admin/groups/:id
pub async fn delete_group(
    State(db): State<Db>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let affected =
        sq_execute(&conn, db::groups::delete(&id)).map_err(ApiErr::from_db("delete group"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("group not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}
