//! Shared business logic — framework-agnostic pure functions.
//!
//! Route handlers stay thin adapters around these helpers and the `db` builders.

use std::collections::HashMap;

use crate::{PlanCard, PlanResponse};

// ─── Ids & Timestamps ───────────────────────────────────────────────────────

/// New row id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time in the SQLite `datetime('now')` format.
pub fn now_sqlite() -> String {
    format_sqlite(chrono::Utc::now())
}

pub fn format_sqlite(t: chrono::DateTime<chrono::Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

// ─── Messaging ──────────────────────────────────────────────────────────────

/// Message body as stored: an optional bolded subject line, a blank line, then the body.
pub fn compose_message_body(subject: Option<&str>, body: &str) -> String {
    match subject.map(str::trim).filter(|s| !s.is_empty()) {
        Some(subject) => format!("**{subject}**\n\n{body}"),
        None => body.to_string(),
    }
}

// ─── Plans ──────────────────────────────────────────────────────────────────

/// Human price label: `Free`, `$19/month`, `$190.50/year`.
pub fn price_label(price_cents: i64, billing_interval: Option<&str>) -> String {
    if price_cents <= 0 {
        return "Free".to_string();
    }
    let dollars = price_cents / 100;
    let cents = price_cents % 100;
    let amount = if cents == 0 {
        format!("${dollars}")
    } else {
        format!("${dollars}.{cents:02}")
    };
    match billing_interval.map(str::trim).filter(|s| !s.is_empty()) {
        Some(interval) => format!("{amount}/{interval}"),
        None => amount,
    }
}

pub fn plan_card(plan: &PlanResponse) -> PlanCard {
    PlanCard {
        id: plan.id.clone(),
        name: plan.name.clone(),
        description: plan.description.clone(),
        price_label: price_label(plan.price_cents, plan.billing_interval.as_deref()),
    }
}

/// Arrange fetched plans in the explicit `ids` order, dropping ids that were not
/// fetched (unknown or inactive) and repeated ids.
pub fn order_plans_by_ids(ids: &[String], plans: Vec<PlanResponse>) -> Vec<PlanResponse> {
    let mut by_id: HashMap<String, PlanResponse> =
        plans.into_iter().map(|p| (p.id.clone(), p)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

/// Parse the `plan_ids` JSON column. Malformed text yields no plans.
pub fn parse_plan_ids(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_default()
}
