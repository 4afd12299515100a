//! Public sales page builders.

use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};

use super::tables::PublicSalesPages;
use super::Built;

/// `(slug, headline, subheadline, body, plan_ids)` of a published page.
pub fn get_published(slug: &str) -> Built {
    Query::select()
        .columns([
            PublicSalesPages::Slug,
            PublicSalesPages::Headline,
            PublicSalesPages::Subheadline,
            PublicSalesPages::Body,
            PublicSalesPages::PlanIds,
        ])
        .from(PublicSalesPages::Table)
        .and_where(Expr::col(PublicSalesPages::Slug).eq(slug))
        .and_where(Expr::col(PublicSalesPages::IsPublished).eq(true))
        .build(SqliteQueryBuilder)
}

/// Fields of a page upsert, keyed by slug.
#[derive(Debug, Clone, Copy)]
pub struct PageFields<'a> {
    pub slug: &'a str,
    pub headline: &'a str,
    pub subheadline: Option<&'a str>,
    pub body: Option<&'a str>,
    /// JSON array text.
    pub plan_ids: &'a str,
    pub is_published: bool,
}

/// Insert or replace the page with `slug`. `id` is only used on insert.
pub fn upsert(id: &str, page: PageFields<'_>, now: &str) -> Built {
    Query::insert()
        .into_table(PublicSalesPages::Table)
        .columns([
            PublicSalesPages::Id,
            PublicSalesPages::Slug,
            PublicSalesPages::Headline,
            PublicSalesPages::Subheadline,
            PublicSalesPages::Body,
            PublicSalesPages::PlanIds,
            PublicSalesPages::IsPublished,
            PublicSalesPages::CreatedAt,
            PublicSalesPages::UpdatedAt,
        ])
        .values_panic([
            id.into(),
            page.slug.into(),
            page.headline.into(),
            page.subheadline.map(str::to_string).into(),
            page.body.map(str::to_string).into(),
            page.plan_ids.into(),
            page.is_published.into(),
            now.into(),
            now.into(),
        ])
        .on_conflict(
            OnConflict::column(PublicSalesPages::Slug)
                .update_columns([
                    PublicSalesPages::Headline,
                    PublicSalesPages::Subheadline,
                    PublicSalesPages::Body,
                    PublicSalesPages::PlanIds,
                    PublicSalesPages::IsPublished,
                    PublicSalesPages::UpdatedAt,
                ])
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}
