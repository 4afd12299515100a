//! Profile query builders.

use sea_query::{Expr, Query, SqliteQueryBuilder};

use super::tables::Profiles;
use super::Built;

/// Column list for profile SELECTs. Order matches `profile_from_row` in the server.
fn profile_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Profiles::Id,
        Profiles::Email,
        Profiles::FullName,
        Profiles::AvatarUrl,
        Profiles::IsCreator,
        Profiles::PlanId,
        Profiles::EmailNotifications,
        Profiles::CreatedAt,
        Profiles::UpdatedAt,
    ])
}

/// INSERT a profile; a second insert for the same id is ignored.
pub fn insert(id: &str, email: &str, full_name: Option<&str>) -> Built {
    Query::insert()
        .into_table(Profiles::Table)
        .columns([Profiles::Id, Profiles::Email, Profiles::FullName])
        .values_panic([
            id.into(),
            email.into(),
            full_name.map(str::to_string).into(),
        ])
        .on_conflict(
            sea_query::OnConflict::column(Profiles::Id)
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}

/// SELECT a profile by id.
pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    profile_columns(&mut q);
    q.from(Profiles::Table)
        .and_where(Expr::col(Profiles::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// SELECT `plan_id` for a profile (row absent = no profile yet).
pub fn get_plan_id(id: &str) -> Built {
    Query::select()
        .column(Profiles::PlanId)
        .from(Profiles::Table)
        .and_where(Expr::col(Profiles::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Assign a plan only when the profile has none.
pub fn assign_plan_if_unset(id: &str, plan_id: &str, now: &str) -> Built {
    Query::update()
        .table(Profiles::Table)
        .value(Profiles::PlanId, plan_id)
        .value(Profiles::UpdatedAt, now)
        .and_where(Expr::col(Profiles::Id).eq(id))
        .and_where(Expr::col(Profiles::PlanId).is_null())
        .build(SqliteQueryBuilder)
}

/// Partial profile update. Returns `None` when there is nothing to set.
pub fn update(
    id: &str,
    full_name: Option<&str>,
    avatar_url: Option<&str>,
    email_notifications: Option<bool>,
    now: &str,
) -> Option<Built> {
    if full_name.is_none() && avatar_url.is_none() && email_notifications.is_none() {
        return None;
    }
    let mut q = Query::update();
    q.table(Profiles::Table);
    if let Some(name) = full_name {
        q.value(Profiles::FullName, name);
    }
    if let Some(url) = avatar_url {
        q.value(Profiles::AvatarUrl, url);
    }
    if let Some(enabled) = email_notifications {
        q.value(Profiles::EmailNotifications, enabled);
    }
    q.value(Profiles::UpdatedAt, now);
    Some(
        q.and_where(Expr::col(Profiles::Id).eq(id))
            .build(SqliteQueryBuilder),
    )
}
