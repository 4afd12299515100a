//! Plan permission lookup for the calling member.

use rusqlite::Connection;

use clubhouse_api::{db, PlanPermissions};

use crate::storage::{sq_query_map, sq_query_opt};

/// Permissions granted by the caller's plan.
///
/// All flags are off when there is no caller, no profile, no plan, or the
/// store cannot be read.
pub fn resolve_plan_permissions(conn: &Connection, user_id: Option<&str>) -> PlanPermissions {
    let Some(user_id) = user_id else {
        return PlanPermissions::none();
    };
    match load(conn, user_id) {
        Ok(perms) => perms,
        Err(e) => {
            tracing::error!("resolve permissions for {user_id}: {e}");
            PlanPermissions::none()
        }
    }
}

/// Plan id of `user_id`, `None` for a missing profile or an unassigned plan.
pub fn plan_of(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<String>> {
    let plan = sq_query_opt(conn, db::profiles::get_plan_id(user_id), |row| {
        row.get::<_, Option<String>>(0)
    })?;
    Ok(plan.flatten())
}

fn load(conn: &Connection, user_id: &str) -> rusqlite::Result<PlanPermissions> {
    let Some(plan_id) = plan_of(conn, user_id)? else {
        return Ok(PlanPermissions::none());
    };
    let rows = sq_query_map(conn, db::plans::permissions_for_plan(&plan_id), |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, bool>(1)?))
    })?;
    Ok(PlanPermissions::from_rows(rows))
}
