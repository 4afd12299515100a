use anyhow::{Context, Result};
use rusqlite::{types::Type, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};

use clubhouse_api::db::{migrations::MIGRATIONS, Built};
use clubhouse_api::{
    ContentResponse, ContentStatus, ConversationResponse, GroupResponse, MessageResponse,
    PlanResponse, ProfileResponse, TaxonomyResponse, TaxonomyType,
};

/// Shared database state
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }
}

/// Initialize the database: open connection, enable WAL, run migrations
pub fn init_db(data_dir: &Path) -> Result<Db> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("clubhouse.db");
    let conn = Connection::open(&db_path).context("opening SQLite database")?;

    // WAL journal, enforced foreign keys.
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;

    run_migrations(&conn)?;

    Ok(Db {
        conn: Arc::new(Mutex::new(conn)),
    })
}

fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !already_applied {
            conn.execute_batch(sql)
                .with_context(|| format!("running migration {name}"))?;
            conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])?;
            tracing::info!("Applied migration: {name}");
        }
    }

    Ok(())
}

// ── sea-query execution helpers ─────────────────────────────────────────────

fn to_sqlite_value(value: &sea_query::Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    use sea_query::Value as Sq;

    match value {
        Sq::Bool(v) => v.map_or(Sql::Null, |b| Sql::Integer(i64::from(b))),
        Sq::TinyInt(v) => v.map_or(Sql::Null, |n| Sql::Integer(n.into())),
        Sq::SmallInt(v) => v.map_or(Sql::Null, |n| Sql::Integer(n.into())),
        Sq::Int(v) => v.map_or(Sql::Null, |n| Sql::Integer(n.into())),
        Sq::BigInt(v) => v.map_or(Sql::Null, Sql::Integer),
        Sq::TinyUnsigned(v) => v.map_or(Sql::Null, |n| Sql::Integer(n.into())),
        Sq::SmallUnsigned(v) => v.map_or(Sql::Null, |n| Sql::Integer(n.into())),
        Sq::Unsigned(v) => v.map_or(Sql::Null, |n| Sql::Integer(n.into())),
        Sq::BigUnsigned(v) => v.map_or(Sql::Null, |n| {
            Sql::Integer(i64::try_from(n).unwrap_or(i64::MAX))
        }),
        Sq::Float(v) => v.map_or(Sql::Null, |f| Sql::Real(f.into())),
        Sq::Double(v) => v.map_or(Sql::Null, Sql::Real),
        Sq::String(v) => v.as_ref().map_or(Sql::Null, |s| Sql::Text((**s).clone())),
        Sq::Char(v) => v.map_or(Sql::Null, |c| Sql::Text(c.to_string())),
        Sq::Bytes(v) => v.as_ref().map_or(Sql::Null, |b| Sql::Blob((**b).clone())),
        #[allow(unreachable_patterns)]
        _ => Sql::Null,
    }
}

fn bind(values: &sea_query::Values) -> rusqlite::ParamsFromIter<Vec<rusqlite::types::Value>> {
    rusqlite::params_from_iter(values.0.iter().map(to_sqlite_value).collect::<Vec<_>>())
}

/// Execute a built INSERT/UPDATE/DELETE. Returns affected rows.
pub fn sq_execute(conn: &Connection, (sql, values): Built) -> rusqlite::Result<usize> {
    conn.execute(&sql, bind(&values))
}

/// Query exactly one row.
pub fn sq_query_row<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<T>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    conn.query_row(&sql, bind(&values), f)
}

/// Query at most one row.
pub fn sq_query_opt<T, F>(
    conn: &Connection,
    built: Built,
    f: F,
) -> rusqlite::Result<Option<T>>
where
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    sq_query_row(conn, built, f).optional()
}

/// Query all rows.
pub fn sq_query_map<T, F>(conn: &Connection, (sql, values): Built, f: F) -> rusqlite::Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(bind(&values), f)?;
    rows.collect()
}

// ── Row mappers (column order matches the db builders) ──────────────────────

fn conversion_error(idx: usize, what: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, what.to_string().into())
}

pub fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<ProfileResponse> {
    Ok(ProfileResponse {
        id: row.get(0)?,
        email: row.get(1)?,
        full_name: row.get(2)?,
        avatar_url: row.get(3)?,
        is_creator: row.get(4)?,
        plan_id: row.get(5)?,
        email_notifications: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<PlanResponse> {
    Ok(PlanResponse {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        price_cents: row.get(4)?,
        billing_interval: row.get(5)?,
        is_default: row.get(6)?,
        is_active: row.get(7)?,
        sort_order: row.get(8)?,
    })
}

pub fn taxonomy_from_row(row: &Row<'_>) -> rusqlite::Result<TaxonomyResponse> {
    let raw_type: String = row.get(1)?;
    Ok(TaxonomyResponse {
        id: row.get(0)?,
        taxonomy_type: TaxonomyType::parse(&raw_type)
            .ok_or_else(|| conversion_error(1, "unknown taxonomy type"))?,
        name: row.get(2)?,
        slug: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn content_from_row(row: &Row<'_>) -> rusqlite::Result<ContentResponse> {
    let status: String = row.get(4)?;
    Ok(ContentResponse {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        content_type: row.get(3)?,
        status: ContentStatus::parse(&status),
        author_id: row.get(5)?,
        taxonomy_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn group_from_row(row: &Row<'_>) -> rusqlite::Result<GroupResponse> {
    Ok(GroupResponse {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        is_private: row.get(4)?,
        cover_url: row.get(5)?,
        created_by: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<ConversationResponse> {
    Ok(ConversationResponse {
        id: row.get(0)?,
        participant_one: row.get(1)?,
        participant_two: row.get(2)?,
        last_message_at: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

pub fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageResponse> {
    Ok(MessageResponse {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_id: row.get(2)?,
        body: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_api::db;

    #[test]
    fn migrations_apply_once_and_builders_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_handle = init_db(dir.path()).expect("init db");
        // Re-opening must not re-run the schema migration.
        init_db(dir.path()).expect("re-init db");

        let conn = db_handle.conn();
        sq_execute(&conn, db::profiles::insert("u1", "a@example.com", Some("Ada")))
            .expect("insert profile");
        // Duplicate insert is ignored.
        let affected = sq_execute(&conn, db::profiles::insert("u1", "b@example.com", None))
            .expect("insert duplicate");
        assert_eq!(affected, 0);

        let profile = sq_query_row(&conn, db::profiles::get_by_id("u1"), profile_from_row)
            .expect("load profile");
        assert_eq!(profile.email, "a@example.com");
        assert!(!profile.is_creator);
        assert!(profile.email_notifications);
        assert_eq!(profile.plan_id, None);

        let missing = sq_query_opt(&conn, db::profiles::get_by_id("nope"), profile_from_row)
            .expect("query missing");
        assert!(missing.is_none());
    }

    #[test]
    fn bool_and_null_values_bind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_handle = init_db(dir.path()).expect("init db");
        let conn = db_handle.conn();
        let now = "2026-01-01 00:00:00";
        sq_execute(
            &conn,
            db::groups::insert(
                db::groups::NewGroup {
                    id: "g1",
                    name: "Makers",
                    slug: "makers",
                    description: None,
                    is_private: true,
                    cover_url: None,
                    created_by: "u1",
                },
                now,
            ),
        )
        .expect("insert group");

        let public = sq_query_map(&conn, db::groups::list(false), group_from_row).expect("list");
        assert!(public.is_empty());
        let all = sq_query_map(&conn, db::groups::list(true), group_from_row).expect("list");
        assert_eq!(all.len(), 1);
        assert!(all[0].is_private);
        assert_eq!(all[0].description, None);
    }
}
