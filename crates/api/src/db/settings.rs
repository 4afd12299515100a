//! `site_settings` key/value builders.

use sea_query::{Expr, OnConflict, Query, SqliteQueryBuilder};

use super::tables::SiteSettings;
use super::Built;

/// Key holding the member navigation config.
pub const NAVIGATION_KEY: &str = "member_navigation";

pub fn get(key: &str) -> Built {
    Query::select()
        .column(SiteSettings::Value)
        .from(SiteSettings::Table)
        .and_where(Expr::col(SiteSettings::Key).eq(key))
        .build(SqliteQueryBuilder)
}

pub fn upsert(key: &str, value: &str, now: &str) -> Built {
    Query::insert()
        .into_table(SiteSettings::Table)
        .columns([SiteSettings::Key, SiteSettings::Value, SiteSettings::UpdatedAt])
        .values_panic([key.into(), value.into(), now.into()])
        .on_conflict(
            OnConflict::column(SiteSettings::Key)
                .update_columns([SiteSettings::Value, SiteSettings::UpdatedAt])
                .to_owned(),
        )
        .build(SqliteQueryBuilder)
}
