//! Group query builders.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::tables::Groups;
use super::Built;

fn group_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Groups::Id,
        Groups::Name,
        Groups::Slug,
        Groups::Description,
        Groups::IsPrivate,
        Groups::CoverUrl,
        Groups::CreatedBy,
        Groups::CreatedAt,
        Groups::UpdatedAt,
    ])
}

/// Fields of a new group row.
#[derive(Debug, Clone, Copy)]
pub struct NewGroup<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub is_private: bool,
    pub cover_url: Option<&'a str>,
    pub created_by: &'a str,
}

pub fn insert(group: NewGroup<'_>, now: &str) -> Built {
    Query::insert()
        .into_table(Groups::Table)
        .columns([
            Groups::Id,
            Groups::Name,
            Groups::Slug,
            Groups::Description,
            Groups::IsPrivate,
            Groups::CoverUrl,
            Groups::CreatedBy,
            Groups::CreatedAt,
            Groups::UpdatedAt,
        ])
        .values_panic([
            group.id.into(),
            group.name.into(),
            group.slug.into(),
            group.description.map(str::to_string).into(),
            group.is_private.into(),
            group.cover_url.map(str::to_string).into(),
            group.created_by.into(),
            now.into(),
            now.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// Groups visible to members: public ones, plus private ones when `include_private`.
pub fn list(include_private: bool) -> Built {
    let mut q = Query::select().to_owned();
    group_columns(&mut q);
    q.from(Groups::Table);
    if !include_private {
        q.and_where(Expr::col(Groups::IsPrivate).eq(false));
    }
    q.order_by(Groups::Name, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    group_columns(&mut q);
    q.from(Groups::Table)
        .and_where(Expr::col(Groups::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Settings changes for one group; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupChanges<'a> {
    pub name: Option<&'a str>,
    pub slug: Option<&'a str>,
    pub description: Option<&'a str>,
    pub is_private: Option<bool>,
    pub cover_url: Option<&'a str>,
}

impl GroupChanges<'_> {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.is_private.is_none()
            && self.cover_url.is_none()
    }
}

/// Single-statement settings update. Returns `None` when there is nothing to set.
pub fn update(id: &str, changes: GroupChanges<'_>, now: &str) -> Option<Built> {
    if changes.is_empty() {
        return None;
    }
    let mut q = Query::update();
    q.table(Groups::Table);
    if let Some(name) = changes.name {
        q.value(Groups::Name, name);
    }
    if let Some(slug) = changes.slug {
        q.value(Groups::Slug, slug);
    }
    if let Some(description) = changes.description {
        q.value(Groups::Description, description);
    }
    if let Some(is_private) = changes.is_private {
        q.value(Groups::IsPrivate, is_private);
    }
    if let Some(cover_url) = changes.cover_url {
        q.value(Groups::CoverUrl, cover_url);
    }
    q.value(Groups::UpdatedAt, now);
    Some(
        q.and_where(Expr::col(Groups::Id).eq(id))
            .build(SqliteQueryBuilder),
    )
}

pub fn delete(id: &str) -> Built {
    Query::delete()
        .from_table(Groups::Table)
        .and_where(Expr::col(Groups::Id).eq(id))
        .build(SqliteQueryBuilder)
}
