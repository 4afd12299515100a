use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use clubhouse_api::{
    db, service, validate, ActionResult, ContentQuery, ContentResponse, ContentStatus,
    CreateContentRequest, ListContentResponse,
};

use crate::error::{action_response, ActionResponse, ApiErr};
use crate::routes::auth::{require_admin_caller, AdminUser, AuthUser, MaybeUser};
use crate::storage::{content_from_row, sq_execute, sq_query_map, sq_query_opt, sq_query_row, Db};

const DEFAULT_CONTENT_TYPE: &str = "article";

// ---------------------------------------------------------------------------
// Member listing
// ---------------------------------------------------------------------------

/// GET /api/content — published items, optionally for one taxonomy.
pub async fn list_published(
    State(db): State<Db>,
    _user: AuthUser,
    Query(q): Query<ContentQuery>,
) -> Result<Json<ListContentResponse>, ApiErr> {
    let taxonomy_id = q.taxonomy_id.as_deref().filter(|s| !s.is_empty());
    let conn = db.conn();
    let content = sq_query_map(&conn, db::content::list_published(taxonomy_id), content_from_row)
        .map_err(ApiErr::from_db("list published content"))?;
    Ok(Json(ListContentResponse { content }))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

/// GET /api/admin/content — every item regardless of status.
pub async fn list_all(
    State(db): State<Db>,
    _admin: AdminUser,
) -> Result<Json<ListContentResponse>, ApiErr> {
    let conn = db.conn();
    let content = sq_query_map(&conn, db::content::list_all(), content_from_row)
        .map_err(ApiErr::from_db("list content"))?;
    Ok(Json(ListContentResponse { content }))
}

/// POST /api/admin/content
pub async fn create_content(
    State(db): State<Db>,
    admin: AdminUser,
    Json(req): Json<CreateContentRequest>,
) -> Result<(StatusCode, Json<ContentResponse>), ApiErr> {
    let title = validate::require("title", &req.title)?;
    let content_type = req
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let taxonomy_id = req.taxonomy_id.as_deref().filter(|s| !s.is_empty());

    let conn = db.conn();
    if let Some(taxonomy_id) = taxonomy_id {
        sq_query_opt(&conn, db::taxonomies::get_by_id(taxonomy_id), |_| Ok(()))
            .map_err(ApiErr::from_db("check taxonomy"))?
            .ok_or_else(|| ApiErr::bad_request("unknown taxonomy"))?;
    }

    let id = service::new_id();
    sq_execute(
        &conn,
        db::content::insert(
            &id,
            &title,
            req.body.as_deref(),
            content_type,
            req.status,
            &admin.user_id,
            taxonomy_id,
            &service::now_sqlite(),
        ),
    )
    .map_err(ApiErr::from_db("insert content"))?;

    let created = sq_query_row(&conn, db::content::get_by_id(&id), content_from_row)
        .map_err(ApiErr::from_db("reload content"))?;
    Ok((StatusCode::CREATED, Json(created)))
}

fn toggle(db: &Db, user: &MaybeUser, id: &str) -> Result<ActionResult, ApiErr> {
    let conn = db.conn();
    require_admin_caller(&conn, user)?;

    let current = sq_query_opt(&conn, db::content::get_status(id), |row| {
        row.get::<_, String>(0)
    })
    .map_err(ApiErr::from_db("load content status"))?
    .ok_or_else(|| ApiErr::not_found("content not found"))?;

    let next = ContentStatus::parse(&current).toggled();
    sq_execute(&conn, db::content::set_status(id, next, &service::now_sqlite()))
        .map_err(ApiErr::from_db("update content status"))?;

    tracing::info!(content = %id, status = %next, "content status toggled");
    Ok(ActionResult::ok())
}

fn remove(db: &Db, user: &MaybeUser, id: &str) -> Result<ActionResult, ApiErr> {
    let conn = db.conn();
    require_admin_caller(&conn, user)?;

    let affected =
        sq_execute(&conn, db::content::delete(id)).map_err(ApiErr::from_db("delete content"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("content not found"));
    }
    Ok(ActionResult::ok())
}

/// POST /api/admin/content/:id/toggle-status — flip published ↔ draft.
///
/// Answers only `{success, error?}`; callers re-fetch to see the new status.
pub async fn toggle_status(
    State(db): State<Db>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> ActionResponse {
    action_response(toggle(&db, &user, &id))
}

/// DELETE /api/admin/content/:id
pub async fn delete_content(
    State(db): State<Db>,
    user: MaybeUser,
    Path(id): Path<String>,
) -> ActionResponse {
    action_response(remove(&db, &user, &id))
}
