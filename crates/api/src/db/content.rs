//! Content query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::tables::Content;
use super::Built;
use crate::ContentStatus;

fn content_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Content::Id,
        Content::Title,
        Content::Body,
        Content::ContentType,
        Content::Status,
        Content::AuthorId,
        Content::TaxonomyId,
        Content::CreatedAt,
        Content::UpdatedAt,
    ])
}

#[allow(clippy::too_many_arguments)]
pub fn insert(
    id: &str,
    title: &str,
    body: Option<&str>,
    content_type: &str,
    status: ContentStatus,
    author_id: &str,
    taxonomy_id: Option<&str>,
    now: &str,
) -> Built {
    Query::insert()
        .into_table(Content::Table)
        .columns([
            Content::Id,
            Content::Title,
            Content::Body,
            Content::ContentType,
            Content::Status,
            Content::AuthorId,
            Content::TaxonomyId,
            Content::CreatedAt,
            Content::UpdatedAt,
        ])
        .values_panic([
            id.into(),
            title.into(),
            body.map(str::to_string).into(),
            content_type.into(),
            status.as_str().into(),
            author_id.into(),
            taxonomy_id.map(str::to_string).into(),
            now.into(),
            now.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Every item, newest first (admin view).
pub fn list_all() -> Built {
    let mut q = Query::select().to_owned();
    content_columns(&mut q);
    q.from(Content::Table)
        .order_by(Content::CreatedAt, Order::Desc)
        .order_by(Content::Id, Order::Asc)
        .build(SqliteQueryBuilder)
}

/// Published items, newest first, optionally within one taxonomy.
pub fn list_published(taxonomy_id: Option<&str>) -> Built {
    let mut q = Query::select().to_owned();
    content_columns(&mut q);
    q.from(Content::Table)
        .and_where(Expr::col(Content::Status).eq(ContentStatus::Published.as_str()));
    if let Some(taxonomy_id) = taxonomy_id {
        q.and_where(Expr::col(Content::TaxonomyId).eq(taxonomy_id));
    }
    q.order_by(Content::CreatedAt, Order::Desc)
        .order_by(Content::Id, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    content_columns(&mut q);
    q.from(Content::Table)
        .and_where(Expr::col(Content::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn get_status(id: &str) -> Built {
    Query::select()
        .column(Content::Status)
        .from(Content::Table)
        .and_where(Expr::col(Content::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn set_status(id: &str, status: ContentStatus, now: &str) -> Built {
    Query::update()
        .table(Content::Table)
        .value(Content::Status, status.as_str())
        .value(Content::UpdatedAt, now)
        .and_where(Expr::col(Content::Id).eq(id))
        .build(SqliteQueryBuilder)
}

pub fn delete(id: &str) -> Built {
    Query::delete()
        .from_table(Content::Table)
        .and_where(Expr::col(Content::Id).eq(id))
        .build(SqliteQueryBuilder)
}
