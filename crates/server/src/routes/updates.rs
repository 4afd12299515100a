use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use clubhouse_api::{
    db, service, validate, CreateUpdateRequest, ListUpdatesResponse, OkResponse,
    SiteUpdateResponse,
};

use crate::error::ApiErr;
use crate::routes::auth::{AdminUser, AuthUser};
use crate::storage::{sq_execute, sq_query_map, sq_query_opt, sq_query_row, Db};

/// GET /api/updates — newest first, with the caller's read state.
pub async fn list_updates(
    State(db): State<Db>,
    user: AuthUser,
) -> Result<Json<ListUpdatesResponse>, ApiErr> {
    let conn = db.conn();
    let updates = sq_query_map(&conn, db::updates::list_for_user(&user.user_id), |row| {
        Ok(SiteUpdateResponse {
            id: row.get(0)?,
            title: row.get(1)?,
            body: row.get(2)?,
            published_at: row.get(3)?,
            read: row.get(4)?,
        })
    })
    .map_err(ApiErr::from_db("list updates"))?;

    let unread_count = sq_query_row(&conn, db::updates::unread_count(&user.user_id), |row| {
        row.get::<_, i64>(0)
    })
    .map_err(ApiErr::from_db("count unread updates"))?;

    Ok(Json(ListUpdatesResponse {
        updates,
        unread_count,
    }))
}

/// POST /api/updates/:id/read — idempotent read receipt.
pub async fn mark_read(
    State(db): State<Db>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    sq_query_opt(&conn, db::updates::exists(&id), |_| Ok(()))
        .map_err(ApiErr::from_db("load update"))?
        .ok_or_else(|| ApiErr::not_found("update not found"))?;

    sq_execute(
        &conn,
        db::updates::mark_read(&id, &user.user_id, &service::now_sqlite()),
    )
    .map_err(ApiErr::from_db("mark update read"))?;

    Ok(Json(OkResponse { ok: true }))
}

/// POST /api/admin/updates — publish a site update now.
pub async fn create_update(
    State(db): State<Db>,
    _admin: AdminUser,
    Json(req): Json<CreateUpdateRequest>,
) -> Result<(StatusCode, Json<SiteUpdateResponse>), ApiErr> {
    let title = validate::require("title", &req.title)?;
    let body = req.body.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let id = service::new_id();
    let now = service::now_sqlite();
    let conn = db.conn();
    sq_execute(&conn, db::updates::insert(&id, &title, body, &now))
        .map_err(ApiErr::from_db("insert update"))?;

    Ok((
        StatusCode::CREATED,
        Json(SiteUpdateResponse {
            id,
            title,
            body: body.map(str::to_string),
            published_at: now,
            read: false,
        }),
    ))
}
