use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use clubhouse_api::{
    db, service, validate, CreateTaxonomyRequest, ListTaxonomiesResponse, OkResponse,
    TaxonomyQuery, TaxonomyResponse, UpdateTaxonomyRequest,
};

use crate::error::ApiErr;
use crate::routes::auth::AdminUser;
use crate::storage::{sq_execute, sq_query_map, sq_query_opt, taxonomy_from_row, Db};

fn load(conn: &rusqlite::Connection, id: &str) -> Result<TaxonomyResponse, ApiErr> {
    sq_query_opt(conn, db::taxonomies::get_by_id(id), taxonomy_from_row)
        .map_err(ApiErr::from_db("load taxonomy"))?
        .ok_or_else(|| ApiErr::not_found("taxonomy not found"))
}

/// GET /api/admin/taxonomies — list taxonomies, optionally of one `?type=`.
pub async fn list_taxonomies(
    State(db): State<Db>,
    _admin: AdminUser,
    Query(q): Query<TaxonomyQuery>,
) -> Result<Json<ListTaxonomiesResponse>, ApiErr> {
    let conn = db.conn();
    let taxonomies = sq_query_map(&conn, db::taxonomies::list(q.taxonomy_type), taxonomy_from_row)
        .map_err(ApiErr::from_db("list taxonomies"))?;
    Ok(Json(ListTaxonomiesResponse { taxonomies }))
}

/// POST /api/admin/taxonomies — create a taxonomy. Duplicate slugs are accepted.
pub async fn create_taxonomy(
    State(db): State<Db>,
    _admin: AdminUser,
    Json(req): Json<CreateTaxonomyRequest>,
) -> Result<(StatusCode, Json<TaxonomyResponse>), ApiErr> {
    let (name, slug) = validate::name_and_slug(&req.name, &req.slug, req.auto_slug)?;
    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let id = service::new_id();
    let conn = db.conn();
    sq_execute(
        &conn,
        db::taxonomies::insert(
            &id,
            req.taxonomy_type,
            &name,
            &slug,
            description,
            &service::now_sqlite(),
        ),
    )
    .map_err(ApiErr::from_db("insert taxonomy"))?;

    Ok((StatusCode::CREATED, Json(load(&conn, &id)?)))
}

/// GET /api/admin/taxonomies/:id
pub async fn get_taxonomy(
    State(db): State<Db>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<TaxonomyResponse>, ApiErr> {
    let conn = db.conn();
    Ok(Json(load(&conn, &id)?))
}

/// PUT /api/admin/taxonomies/:id — partial update, last write wins.
pub async fn update_taxonomy(
    State(db): State<Db>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateTaxonomyRequest>,
) -> Result<Json<TaxonomyResponse>, ApiErr> {
    let name = req.name.as_deref().map(validate::validate_name).transpose()?;
    let slug = req
        .slug
        .as_deref()
        .map(|s| validate::validate_slug(s.trim()))
        .transpose()?;
    let description = req.description.as_deref().map(str::trim);

    let conn = db.conn();
    let existing = load(&conn, &id)?;
    let Some(built) = db::taxonomies::update(
        &id,
        name.as_deref(),
        slug.as_deref(),
        description,
        &service::now_sqlite(),
    ) else {
        return Ok(Json(existing));
    };
    sq_execute(&conn, built).map_err(ApiErr::from_db("update taxonomy"))?;

    Ok(Json(load(&conn, &id)?))
}

/// DELETE /api/admin/taxonomies/:id
pub async fn delete_taxonomy(
    State(db): State<Db>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();
    let affected = sq_execute(&conn, db::taxonomies::delete(&id))
        .map_err(ApiErr::from_db("delete taxonomy"))?;
    if affected == 0 {
        return Err(ApiErr::not_found("taxonomy not found"));
    }
    Ok(Json(OkResponse { ok: true }))
}
