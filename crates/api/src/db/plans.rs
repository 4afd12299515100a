//! Plan, plan-permission, and permission-resolution query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::tables::{PlanPermissions, Plans};
use super::Built;

fn plan_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Plans::Id,
        Plans::Name,
        Plans::Slug,
        Plans::Description,
        Plans::PriceCents,
        Plans::BillingInterval,
        Plans::IsDefault,
        Plans::IsActive,
        Plans::SortOrder,
    ])
}

/// Active plans by display order.
pub fn list_active() -> Built {
    let mut q = Query::select().to_owned();
    plan_columns(&mut q);
    q.from(Plans::Table)
        .and_where(Expr::col(Plans::IsActive).eq(true))
        .order_by(Plans::SortOrder, Order::Asc)
        .order_by(Plans::Name, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Active plans whose id is in `ids`, in no particular order.
pub fn list_active_by_ids(ids: &[String]) -> Built {
    let mut q = Query::select().to_owned();
    plan_columns(&mut q);
    q.from(Plans::Table)
        .and_where(Expr::col(Plans::IsActive).eq(true))
        .and_where(Expr::col(Plans::Id).is_in(ids.iter().map(String::as_str)))
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    plan_columns(&mut q);
    q.from(Plans::Table)
        .and_where(Expr::col(Plans::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// The plan new members are placed on.
pub fn default_plan_id() -> Built {
    Query::select()
        .column(Plans::Id)
        .from(Plans::Table)
        .and_where(Expr::col(Plans::IsDefault).eq(true))
        .and_where(Expr::col(Plans::IsActive).eq(true))
        .order_by(Plans::SortOrder, Order::Asc)
        .limit(1)
        .build(SqliteQueryBuilder)
}

/// `(permission, enabled)` rows for a plan.
pub fn permissions_for_plan(plan_id: &str) -> Built {
    Query::select()
        .columns([PlanPermissions::Permission, PlanPermissions::Enabled])
        .from(PlanPermissions::Table)
        .and_where(Expr::col(PlanPermissions::PlanId).eq(plan_id))
        .build(SqliteQueryBuilder)
}

/// Upsert a single permission flag.
pub fn upsert_permission(plan_id: &str, permission: &str, enabled: bool) -> Built {
    Query::insert()
        .into_table(PlanPermissions::Table)
        .columns([
            PlanPermissions::PlanId,
            PlanPermissions::Permission,
            PlanPermissions::Enabled,
        ])
        .values_panic([plan_id.into(), permission.into(), enabled.into()])
        .on_conflict(
            sea_query::OnConflict::columns([PlanPermissions::PlanId, PlanPermissions::Permission])
                .update_column(PlanPermissions::Enabled)
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// Remove every permission row of a plan.
pub fn clear_permissions(plan_id: &str) -> Built {
    Query::delete()
        .from_table(PlanPermissions::Table)
        .and_where(Expr::col(PlanPermissions::PlanId).eq(plan_id))
        .build(SqliteQueryBuilder)
}
