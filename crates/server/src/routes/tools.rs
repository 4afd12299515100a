use std::collections::HashSet;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use clubhouse_api::{
    db, service, validate, CreateToolRequest, ListToolsResponse, OkResponse, SetToolAccessRequest,
    ToolResponse,
};

use crate::error::ApiErr;
use crate::permissions::plan_of;
use crate::routes::auth::{AdminUser, MaybeUser};
use crate::storage::{plan_from_row, sq_execute, sq_query_map, sq_query_opt, Db};

/// GET /api/tools — active tools, each flagged with whether the caller's plan unlocks it.
pub async fn list_tools(
    State(db): State<Db>,
    user: MaybeUser,
) -> Result<Json<ListToolsResponse>, ApiErr> {
    let conn = db.conn();

    let plan_id = match user.user_id() {
        Some(user_id) => plan_of(&conn, user_id).map_err(ApiErr::from_db("load caller plan"))?,
        None => None,
    };
    let unlocked: HashSet<String> = match plan_id {
        Some(plan_id) => sq_query_map(&conn, db::tools::access_for_plan(&plan_id), |row| {
            row.get::<_, String>(0)
        })
        .map_err(ApiErr::from_db("load tool access"))?
        .into_iter()
        .collect(),
        None => HashSet::new(),
    };

    let tools = sq_query_map(&conn, db::tools::list_active(), |row| {
        let id: String = row.get(0)?;
        Ok(ToolResponse {
            available: unlocked.contains(&id),
            id,
            name: row.get(1)?,
            description: row.get(2)?,
            url: row.get(3)?,
            icon: row.get(4)?,
        })
    })
    .map_err(ApiErr::from_db("list tools"))?;

    Ok(Json(ListToolsResponse { tools }))
}

/// POST /api/admin/tools
pub async fn create_tool(
    State(db): State<Db>,
    _admin: AdminUser,
    Json(req): Json<CreateToolRequest>,
) -> Result<(StatusCode, Json<ToolResponse>), ApiErr> {
    let name = validate::validate_name(&req.name)?;
    let description = req.description.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let url = req.url.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let icon = req.icon.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let id = service::new_id();
    let conn = db.conn();
    sq_execute(
        &conn,
        db::tools::insert(
            &id,
            &name,
            description,
            url,
            icon,
            req.sort_order,
            &service::now_sqlite(),
        ),
    )
    .map_err(ApiErr::from_db("insert tool"))?;

    Ok((
        StatusCode::CREATED,
        Json(ToolResponse {
            id,
            name,
            description: description.map(str::to_string),
            url: url.map(str::to_string),
            icon: icon.map(str::to_string),
            available: false,
        }),
    ))
}

/// PUT /api/admin/tools/:id/access — replace the set of plans that unlock a tool.
pub async fn set_tool_access(
    State(db): State<Db>,
    _admin: AdminUser,
    Path(tool_id): Path<String>,
    Json(req): Json<SetToolAccessRequest>,
) -> Result<Json<OkResponse>, ApiErr> {
    let conn = db.conn();

    sq_query_opt(&conn, db::tools::exists(&tool_id), |_| Ok(()))
        .map_err(ApiErr::from_db("load tool"))?
        .ok_or_else(|| ApiErr::not_found("tool not found"))?;

    for plan_id in &req.plan_ids {
        sq_query_opt(&conn, db::plans::get_by_id(plan_id), plan_from_row)
            .map_err(ApiErr::from_db("load plan"))?
            .ok_or_else(|| ApiErr::bad_request(format!("unknown plan: {plan_id}")))?;
    }

    let tx = conn
        .unchecked_transaction()
        .map_err(ApiErr::from_db("begin tool access update"))?;
    sq_execute(&tx, db::tools::clear_access(&tool_id))
        .map_err(ApiErr::from_db("clear tool access"))?;
    for plan_id in &req.plan_ids {
        sq_execute(&tx, db::tools::grant_access(&tool_id, plan_id))
            .map_err(ApiErr::from_db("grant tool access"))?;
    }
    tx.commit()
        .map_err(ApiErr::from_db("commit tool access update"))?;

    Ok(Json(OkResponse { ok: true }))
}
