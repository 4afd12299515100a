use axum::{
    extract::{Path, State},
    Json,
};
use rusqlite::Connection;

use clubhouse_api::{
    db, service, validate, ListPlansResponse, OkResponse, Permission, PlanPermissions,
    SalesPageResponse, UpdatePlanPermissionsRequest, UpsertSalesPageRequest,
};

use crate::error::ApiErr;
use crate::routes::auth::AdminUser;
use crate::storage::{plan_from_row, sq_execute, sq_query_map, sq_query_opt, Db};

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

/// GET /api/plans — active plans in display order.
pub async fn list_plans(State(db): State<Db>) -> Result<Json<ListPlansResponse>, ApiErr> {
    let conn = db.conn();
    let plans = sq_query_map(&conn, db::plans::list_active(), plan_from_row)
        .map_err(ApiErr::from_db("list plans"))?;
    Ok(Json(ListPlansResponse { plans }))
}

fn require_plan(conn: &Connection, plan_id: &str) -> Result<(), ApiErr> {
    sq_query_opt(conn, db::plans::get_by_id(plan_id), plan_from_row)
        .map_err(ApiErr::from_db("load plan"))?
        .ok_or_else(|| ApiErr::not_found("plan not found"))?;
    Ok(())
}

fn read_permissions(conn: &Connection, plan_id: &str) -> Result<PlanPermissions, ApiErr> {
    let rows = sq_query_map(conn, db::plans::permissions_for_plan(plan_id), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
    })
    .map_err(ApiErr::from_db("load plan permissions"))?;
    Ok(PlanPermissions::from_rows(rows))
}

/// GET /api/admin/plans/:id/permissions
pub async fn plan_permissions(
    State(db): State<Db>,
    _admin: AdminUser,
    Path(plan_id): Path<String>,
) -> Result<Json<PlanPermissions>, ApiErr> {
    let conn = db.conn();
    require_plan(&conn, &plan_id)?;
    Ok(Json(read_permissions(&conn, &plan_id)?))
}

/// PUT /api/admin/plans/:id/permissions — replace the plan's permission rows.
pub async fn update_plan_permissions(
    State(db): State<Db>,
    _admin: AdminUser,
    Path(plan_id): Path<String>,
    Json(req): Json<UpdatePlanPermissionsRequest>,
) -> Result<Json<PlanPermissions>, ApiErr> {
    let mut flags = Vec::with_capacity(req.permissions.len());
    for (name, enabled) in &req.permissions {
        let permission = Permission::parse(name)
            .ok_or_else(|| ApiErr::bad_request(format!("unknown permission: {name}")))?;
        flags.push((permission, *enabled));
    }

    let conn = db.conn();
    require_plan(&conn, &plan_id)?;

    let tx = conn
        .unchecked_transaction()
        .map_err(ApiErr::from_db("begin permissions update"))?;
    sq_execute(&tx, db::plans::clear_permissions(&plan_id))
        .map_err(ApiErr::from_db("clear plan permissions"))?;
    for (permission, enabled) in flags {
        sq_execute(
            &tx,
            db::plans::upsert_permission(&plan_id, permission.as_str(), enabled),
        )
        .map_err(ApiErr::from_db("store plan permission"))?;
    }
    tx.commit()
        .map_err(ApiErr::from_db("commit permissions update"))?;

    Ok(Json(read_permissions(&conn, &plan_id)?))
}

// ---------------------------------------------------------------------------
// Sales pages
// ---------------------------------------------------------------------------

/// GET /api/public/sales/:slug — published page with its plans in listed order.
pub async fn sales_page(
    State(db): State<Db>,
    Path(slug): Path<String>,
) -> Result<Json<SalesPageResponse>, ApiErr> {
    let conn = db.conn();
    let (slug, headline, subheadline, body, plan_ids) =
        sq_query_opt(&conn, db::sales::get_published(&slug), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(ApiErr::from_db("load sales page"))?
        .ok_or_else(|| ApiErr::not_found("page not found"))?;

    let ids = service::parse_plan_ids(&plan_ids);
    let plans = if ids.is_empty() {
        Vec::new()
    } else {
        let fetched = sq_query_map(&conn, db::plans::list_active_by_ids(&ids), plan_from_row)
            .map_err(ApiErr::from_db("load sales page plans"))?;
        service::order_plans_by_ids(&ids, fetched)
            .iter()
            .map(service::plan_card)
            .collect()
    };

    Ok(Json(SalesPageResponse {
        slug,
        headline,
        subheadline,
        body,
        plans,
    }))
}

/// PUT /api/admin/sales-pages/:slug — create or replace a page.
pub async fn upsert_sales_page(
    State(db): State<Db>,
    _admin: AdminUser,
    Path(slug): Path<String>,
    Json(req): Json<UpsertSalesPageRequest>,
) -> Result<Json<OkResponse>, ApiErr> {
    let slug = validate::validate_slug(&slug)?;
    let headline = validate::require("headline", &req.headline)?;
    let plan_ids = serde_json::to_string(&req.plan_ids)
        .map_err(ApiErr::from_db("encode plan ids"))?;

    let conn = db.conn();
    sq_execute(
        &conn,
        db::sales::upsert(
            &service::new_id(),
            db::sales::PageFields {
                slug: &slug,
                headline: &headline,
                subheadline: req.subheadline.as_deref(),
                body: req.body.as_deref(),
                plan_ids: &plan_ids,
                is_published: req.is_published,
            },
            &service::now_sqlite(),
        ),
    )
    .map_err(ApiErr::from_db("store sales page"))?;

    Ok(Json(OkResponse { ok: true }))
}
