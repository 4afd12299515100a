//! Taxonomy query builders.
//!
//! Inputs are expected to be validated by the caller; nothing is re-checked here.

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use super::tables::Taxonomies;
use super::Built;
use crate::TaxonomyType;

fn taxonomy_columns(q: &mut sea_query::SelectStatement) -> &mut sea_query::SelectStatement {
    q.columns([
        Taxonomies::Id,
        Taxonomies::Type,
        Taxonomies::Name,
        Taxonomies::Slug,
        Taxonomies::Description,
        Taxonomies::CreatedAt,
        Taxonomies::UpdatedAt,
    ])
}

pub fn insert(
    id: &str,
    taxonomy_type: TaxonomyType,
    name: &str,
    slug: &str,
    description: Option<&str>,
    now: &str,
) -> Built {
    Query::insert()
        .into_table(Taxonomies::Table)
        .columns([
            Taxonomies::Id,
            Taxonomies::Type,
            Taxonomies::Name,
            Taxonomies::Slug,
            Taxonomies::Description,
            Taxonomies::CreatedAt,
            Taxonomies::UpdatedAt,
        ])
        .values_panic([
            id.into(),
            taxonomy_type.as_str().into(),
            name.into(),
            slug.into(),
            description.map(str::to_string).into(),
            now.into(),
            now.into(),
        ])
        .build(SqliteQueryBuilder)
}

/// List taxonomies, optionally scoped to one type, by name.
pub fn list(taxonomy_type: Option<TaxonomyType>) -> Built {
    let mut q = Query::select().to_owned();
    taxonomy_columns(&mut q);
    q.from(Taxonomies::Table);
    if let Some(t) = taxonomy_type {
        q.and_where(Expr::col(Taxonomies::Type).eq(t.as_str()));
    }
    q.order_by(Taxonomies::Type, Order::Asc)
        .order_by(Taxonomies::Name, Order::Asc)
        .build(SqliteQueryBuilder)
}

pub fn get_by_id(id: &str) -> Built {
    let mut q = Query::select().to_owned();
    taxonomy_columns(&mut q);
    q.from(Taxonomies::Table)
        .and_where(Expr::col(Taxonomies::Id).eq(id))
        .build(SqliteQueryBuilder)
}

/// Partial update. Returns `None` when there is nothing to set.
pub fn update(
    id: &str,
    name: Option<&str>,
    slug: Option<&str>,
    description: Option<&str>,
    now: &str,
) -> Option<Built> {
    if name.is_none() && slug.is_none() && description.is_none() {
        return None;
    }
    let mut q = Query::update();
    q.table(Taxonomies::Table);
    if let Some(name) = name {
        q.value(Taxonomies::Name, name);
    }
    if let Some(slug) = slug {
        q.value(Taxonomies::Slug, slug);
    }
    if let Some(description) = description {
        q.value(Taxonomies::Description, description);
    }
    q.value(Taxonomies::UpdatedAt, now);
    Some(
        q.and_where(Expr::col(Taxonomies::Id).eq(id))
            .build(SqliteQueryBuilder),
    )
}

pub fn delete(id: &str) -> Built {
    Query::delete()
        .from_table(Taxonomies::Table)
        .and_where(Expr::col(Taxonomies::Id).eq(id))
        .build(SqliteQueryBuilder)
}
