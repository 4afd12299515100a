//! Tool catalogue and per-plan access builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::tables::{ToolPlanAccess, Tools};
use super::Built;

/// `(id, name, description, url, icon)` of active tools by display order.
pub fn list_active() -> Built {
    Query::select()
        .columns([
            Tools::Id,
            Tools::Name,
            Tools::Description,
            Tools::Url,
            Tools::Icon,
        ])
        .from(Tools::Table)
        .and_where(Expr::col(Tools::IsActive).eq(true))
        .order_by(Tools::SortOrder, Order::Asc)
        .order_by(Tools::Name, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Tool ids a plan can use.
pub fn access_for_plan(plan_id: &str) -> Built {
    Query::select()
        .column(ToolPlanAccess::ToolId)
        .from(ToolPlanAccess::Table)
        .and_where(Expr::col(ToolPlanAccess::PlanId).eq(plan_id))
        .build(SqliteQueryBuilder)
}

#[allow(clippy::too_many_arguments)]
pub fn insert(
    id: &str,
    name: &str,
    description: Option<&str>,
    url: Option<&str>,
    icon: Option<&str>,
    sort_order: i64,
    now: &str,
) -> Built {
    Query::insert()
        .into_table(Tools::Table)
        .columns([
            Tools::Id,
            Tools::Name,
            Tools::Description,
            Tools::Url,
            Tools::Icon,
            Tools::SortOrder,
            Tools::CreatedAt,
        ])
        .values_panic([
            id.into(),
            name.into(),
            description.map(str::to_string).into(),
            url.map(str::to_string).into(),
            icon.map(str::to_string).into(),
            sort_order.into(),
            now.into(),
        ])
        .build(SqliteQueryBuilder)
}

pub fn exists(id: &str) -> Built {
    Query::select()
        .column(Tools::Id)
        .from(Tools::Table)
        .and_where(Expr::col(Tools::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn clear_access(tool_id: &str) -> Built {
    Query::delete()
        .from_table(ToolPlanAccess::Table)
        .and_where(Expr::col(ToolPlanAccess::ToolId).eq(tool_id))
        .build(SqliteQueryBuilder)
}

pub fn grant_access(tool_id: &str, plan_id: &str) -> Built {
    Query::insert()
        .into_table(ToolPlanAccess::Table)
        .columns([ToolPlanAccess::ToolId, ToolPlanAccess::PlanId])
        .values_panic([tool_id.into(), plan_id.into()])
        .on_conflict(
            sea_query::OnConflict::columns([ToolPlanAccess::ToolId, ToolPlanAccess::PlanId])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}
