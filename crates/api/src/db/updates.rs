//! Site update + read-receipt builders.

use sea_query::{Alias, Asterisk, Cond, Expr, Func, OnConflict, Order, Query, SqliteQueryBuilder};

use super::tables::{SiteUpdateReads, SiteUpdates};
use super::Built;

pub fn insert(id: &str, title: &str, body: Option<&str>, now: &str) -> Built {
    Query::insert()
        .into_table(SiteUpdates::Table)
        .columns([
            SiteUpdates::Id,
            SiteUpdates::Title,
            SiteUpdates::Body,
            SiteUpdates::PublishedAt,
            SiteUpdates::CreatedAt,
        ])
        .values_panic([
            id.into(),
            title.into(),
            body.map(str::to_string).into(),
            now.into(),
            now.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// `(id, title, body, published_at, is_read)` newest first, read state for `user_id`.
pub fn list_for_user(user_id: &str) -> Built {
    Query::select()
        .column((SiteUpdates::Table, SiteUpdates::Id))
        .column((SiteUpdates::Table, SiteUpdates::Title))
        .column((SiteUpdates::Table, SiteUpdates::Body))
        .column((SiteUpdates::Table, SiteUpdates::PublishedAt))
        .expr_as(
            Expr::col((SiteUpdateReads::Table, SiteUpdateReads::UserId)).is_not_null(),
            Alias::new("is_read"),
        )
        .from(SiteUpdates::Table)
        .left_join(
            SiteUpdateReads::Table,
            Cond::all()
                .add(
                    Expr::col((SiteUpdateReads::Table, SiteUpdateReads::UpdateId))
                        .equals((SiteUpdates::Table, SiteUpdates::Id)),
                )
                .add(Expr::col((SiteUpdateReads::Table, SiteUpdateReads::UserId)).eq(user_id)),
        )
        .order_by((SiteUpdates::Table, SiteUpdates::PublishedAt), Order::Desc)
        .order_by((SiteUpdates::Table, SiteUpdates::Id), Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Number of updates `user_id` has not read.
pub fn unread_count(user_id: &str) -> Built {
    Query::select()
        .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("count"))
        .from(SiteUpdates::Table)
        .and_where(
            Expr::col(SiteUpdates::Id).not_in_subquery(
                Query::select()
                    .column(SiteUpdateReads::UpdateId)
                    .from(SiteUpdateReads::Table)
                    .and_where(Expr::col(SiteUpdateReads::UserId).eq(user_id))
                    .to_owned(),
            ),
        )
        .build(SqliteQueryBuilder)
}

pub fn exists(id: &str) -> Built {
    Query::select()
        .column(SiteUpdates::Id)
        .from(SiteUpdates::Table)
        .and_where(Expr::col(SiteUpdates::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Record a read receipt; repeated reads keep the first timestamp.
pub fn mark_read(update_id: &str, user_id: &str, now: &str) -> Built {
    Query::insert()
        .into_table(SiteUpdateReads::Table)
        .columns([
            SiteUpdateReads::UpdateId,
            SiteUpdateReads::UserId,
            SiteUpdateReads::ReadAt,
        ])
        .values_panic([update_id.into(), user_id.into(), now.into()])
        .on_conflict(
            OnConflict::columns([SiteUpdateReads::UpdateId, SiteUpdateReads::UserId])
                .do_nothing()
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}
