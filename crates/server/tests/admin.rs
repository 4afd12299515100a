mod common;

use anyhow::{ensure, Result};
use serde_json::json;

use clubhouse_api::{
    ContentStatus, CreateContentRequest, CreateGroupRequest, CreateTaxonomyRequest,
    CreateToolRequest, SetToolAccessRequest, TaxonomyType, UpdateGroupRequest,
    UpdateNavigationRequest, UpdatePlanPermissionsRequest, UpdateTaxonomyRequest,
    UpsertSalesPageRequest,
};

fn taxonomy_form(name: &str, slug: &str, auto_slug: bool) -> CreateTaxonomyRequest {
    CreateTaxonomyRequest {
        taxonomy_type: TaxonomyType::Category,
        name: name.into(),
        slug: slug.into(),
        auto_slug,
        description: None,
    }
}

// ---------------------------------------------------------------------------
// Taxonomies
// ---------------------------------------------------------------------------

/// Auto-slug derives `business` from `Business`; explicit slugs are kept.
#[tokio::test]
async fn taxonomy_auto_slug_and_explicit_slug() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    let admin = server.client_as("admin");

    let created = admin
        .create_taxonomy(&taxonomy_form("Business", "", true))
        .await?;
    ensure!(created.slug == "business", "got {}", created.slug);
    ensure!(created.taxonomy_type == TaxonomyType::Category);

    let explicit = admin
        .create_taxonomy(&taxonomy_form("Growth Hacks", "growth-2", false))
        .await?;
    ensure!(explicit.slug == "growth-2");

    let fetched = admin.get_taxonomy(&created.id).await?;
    ensure!(fetched == created, "re-fetch differs: {fetched:?}");
    Ok(())
}

/// Two taxonomies of the same type may share a slug.
#[tokio::test]
async fn duplicate_taxonomy_slug_is_accepted() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    let admin = server.client_as("admin");

    let first = admin
        .create_taxonomy(&taxonomy_form("Business", "business", false))
        .await?;
    let second = admin
        .create_taxonomy(&taxonomy_form("Business Again", "business", false))
        .await?;
    ensure!(first.id != second.id);

    let listed = admin.list_taxonomies(Some(TaxonomyType::Category)).await?;
    let business = listed
        .taxonomies
        .iter()
        .filter(|t| t.slug == "business")
        .count();
    ensure!(business == 2, "expected 2 rows with slug business, got {business}");
    Ok(())
}

/// The route handler validates too, for forms that bypass the client.
#[tokio::test]
async fn server_rejects_invalid_slug() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");

    let resp = server
        .client()
        .reqwest_client()
        .post(format!("{}/api/admin/taxonomies", server.base_url))
        .bearer_auth(common::token_for("admin"))
        .json(&json!({"type": "category", "name": "Bad", "slug": "-leading"}))
        .send()
        .await?;
    ensure!(resp.status() == 400, "expected 400, got {}", resp.status());
    let body: serde_json::Value = resp.json().await?;
    ensure!(body["error"].as_str().is_some_and(|e| e.contains("slug")));
    Ok(())
}

/// Type filter, update (last write wins) and delete.
#[tokio::test]
async fn taxonomy_filter_update_delete() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    let admin = server.client_as("admin");

    let category = admin
        .create_taxonomy(&taxonomy_form("Business", "", true))
        .await?;
    admin
        .create_taxonomy(&CreateTaxonomyRequest {
            taxonomy_type: TaxonomyType::ExpertTag,
            name: "Marketing".into(),
            slug: String::new(),
            auto_slug: true,
            description: Some("Growth experts".into()),
        })
        .await?;

    let experts = admin.list_taxonomies(Some(TaxonomyType::ExpertTag)).await?;
    ensure!(experts.taxonomies.len() == 1);
    ensure!(experts.taxonomies[0].slug == "marketing");
    let all = admin.list_taxonomies(None).await?;
    ensure!(all.taxonomies.len() == 2);

    let updated = admin
        .update_taxonomy(
            &category.id,
            &UpdateTaxonomyRequest {
                name: Some("Business & Finance".into()),
                slug: Some("business-finance".into()),
                description: None,
            },
        )
        .await?;
    ensure!(updated.name == "Business & Finance");
    ensure!(updated.slug == "business-finance");

    admin.delete_taxonomy(&category.id).await?;
    let err = admin.get_taxonomy(&category.id).await.unwrap_err();
    ensure!(err.to_string().starts_with("404"), "{err}");
    Ok(())
}

/// Members cannot reach admin routes.
#[tokio::test]
async fn admin_routes_require_creator() -> Result<()> {
    let server = common::spawn().await;
    server.add_member("member", None);

    let err = server
        .client_as("member")
        .list_taxonomies(None)
        .await
        .unwrap_err();
    ensure!(err.to_string().starts_with("403"), "{err}");

    let err = server.client().list_groups().await.unwrap_err();
    ensure!(err.to_string() == "auth token not set");
    Ok(())
}

// ---------------------------------------------------------------------------
// Content moderation
// ---------------------------------------------------------------------------

/// Toggling a published item answers only `{success}`; a re-fetch shows `draft`.
#[tokio::test]
async fn toggle_then_refetch_shows_draft() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    server.add_member("member", None);
    let admin = server.client_as("admin");
    let member = server.client_as("member");

    let item = admin
        .create_content(&CreateContentRequest {
            title: "Welcome guide".into(),
            body: Some("Start here".into()),
            content_type: None,
            status: ContentStatus::Published,
            taxonomy_id: None,
        })
        .await?;
    ensure!(item.content_type == "article");
    ensure!(member.list_content(None).await?.content.len() == 1);

    let result = admin.toggle_content_status(&item.id).await?;
    ensure!(result.success && result.error.is_none(), "{result:?}");

    let listed = admin.admin_list_content().await?;
    let refetched = listed
        .content
        .iter()
        .find(|c| c.id == item.id)
        .expect("item still listed");
    ensure!(refetched.status == ContentStatus::Draft);
    ensure!(member.list_content(None).await?.content.is_empty());

    let result = admin.toggle_content_status(&item.id).await?;
    ensure!(result.success);
    let listed = admin.admin_list_content().await?;
    ensure!(listed.content[0].status == ContentStatus::Published);
    Ok(())
}

/// Failures come back as `{success: false, error}`.
#[tokio::test]
async fn content_actions_report_failures() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    server.add_member("member", None);

    let result = server
        .client_as("admin")
        .toggle_content_status("missing")
        .await?;
    ensure!(!result.success);
    ensure!(result.error.as_deref() == Some("content not found"));

    let result = server.client_as("member").delete_content("missing").await?;
    ensure!(!result.success);
    ensure!(result.error.as_deref() == Some("admin only"));
    Ok(())
}

/// Delete removes the item; deleting again reports not found.
#[tokio::test]
async fn delete_content_item() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    let admin = server.client_as("admin");

    let item = admin
        .create_content(&CreateContentRequest {
            title: "Old post".into(),
            body: None,
            content_type: Some("video".into()),
            status: ContentStatus::Draft,
            taxonomy_id: None,
        })
        .await?;

    ensure!(admin.delete_content(&item.id).await?.success);
    ensure!(admin.admin_list_content().await?.content.is_empty());
    ensure!(!admin.delete_content(&item.id).await?.success);
    Ok(())
}

/// Members can filter published content by taxonomy.
#[tokio::test]
async fn content_taxonomy_filter() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    let admin = server.client_as("admin");

    let tag = admin
        .create_taxonomy(&taxonomy_form("Business", "", true))
        .await?;
    for (title, taxonomy_id) in [("Tagged", Some(tag.id.clone())), ("Untagged", None)] {
        admin
            .create_content(&CreateContentRequest {
                title: title.into(),
                body: None,
                content_type: None,
                status: ContentStatus::Published,
                taxonomy_id,
            })
            .await?;
    }

    let filtered = admin.list_content(Some(&tag.id)).await?;
    ensure!(filtered.content.len() == 1);
    ensure!(filtered.content[0].title == "Tagged");
    ensure!(admin.list_content(None).await?.content.len() == 2);
    Ok(())
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Settings update changes only the given fields; private groups are hidden from members.
#[tokio::test]
async fn group_settings_and_privacy() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    server.add_member("member", None);
    let admin = server.client_as("admin");
    let member = server.client_as("member");

    let group = admin
        .create_group(&CreateGroupRequest {
            name: "My Group".into(),
            slug: String::new(),
            description: Some("Makers".into()),
            is_private: false,
            cover_url: None,
        })
        .await?;
    ensure!(group.slug == "my-group");
    ensure!(group.created_by.as_deref() == Some("admin"));

    let updated = admin
        .update_group(
            &group.id,
            &UpdateGroupRequest {
                is_private: Some(true),
                cover_url: Some("https://cdn.example.com/cover.png".into()),
                ..Default::default()
            },
        )
        .await?;
    ensure!(updated.is_private);
    ensure!(updated.description.as_deref() == Some("Makers"));
    ensure!(updated.name == "My Group");

    ensure!(member.list_groups().await?.groups.is_empty());
    ensure!(member.get_group(&group.id).await.is_err());
    ensure!(admin.list_groups().await?.groups.len() == 1);

    let err = admin
        .update_group(
            &group.id,
            &UpdateGroupRequest {
                slug: Some("My Group".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    ensure!(err.to_string().starts_with("400"), "{err}");

    admin.delete_group(&group.id).await?;
    ensure!(admin.list_groups().await?.groups.is_empty());
    Ok(())
}

// ---------------------------------------------------------------------------
// Navigation, plans, tools, sales pages
// ---------------------------------------------------------------------------

/// Stored navigation is returned verbatim and resolved for members.
#[tokio::test]
async fn navigation_settings_round_trip() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    let admin = server.client_as("admin");

    let initial = admin.navigation_settings().await?;
    ensure!(initial.raw.is_none());
    ensure!(initial.resolved.len() == 5);

    let saved = admin
        .update_navigation(&UpdateNavigationRequest {
            config: json!([
                {"id": "tools", "label": "Toolbox", "order": 1, "visible": true},
                {"id": "dashboard", "label": "", "order": 0, "visible": true},
                {"id": "experts", "visible": "true", "order": 2},
            ]),
        })
        .await?;
    let keys: Vec<&str> = saved.resolved.iter().map(|i| i.key.as_str()).collect();
    ensure!(keys == ["dashboard", "tools"], "got {keys:?}");
    ensure!(saved.resolved[1].label == "Toolbox");
    ensure!(saved.resolved[0].label == "Dashboard");

    let malformed = admin
        .update_navigation(&UpdateNavigationRequest {
            config: json!("{not json"),
        })
        .await?;
    ensure!(malformed.raw.as_deref() == Some("{not json"));
    ensure!(malformed.resolved.len() == 5);
    Ok(())
}

/// Permission rows are replaced wholesale; unknown names are rejected.
#[tokio::test]
async fn plan_permissions_replace() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    server.add_plan("pro", 1900, false, 1);
    server.grant("pro", "events", true);
    let admin = server.client_as("admin");

    let perms = admin
        .update_plan_permissions(
            "pro",
            &UpdatePlanPermissionsRequest {
                permissions: [("community".to_string(), true), ("tools".to_string(), true)]
                    .into_iter()
                    .collect(),
            },
        )
        .await?;
    ensure!(perms.community && perms.tools);
    ensure!(!perms.events, "old rows must be cleared");
    ensure!(admin.plan_permissions("pro").await? == perms);

    let err = admin
        .update_plan_permissions(
            "pro",
            &UpdatePlanPermissionsRequest {
                permissions: [("teleport".to_string(), true)].into_iter().collect(),
            },
        )
        .await
        .unwrap_err();
    ensure!(err.to_string().starts_with("400"), "{err}");

    let err = admin.plan_permissions("missing").await.unwrap_err();
    ensure!(err.to_string().starts_with("404"), "{err}");
    Ok(())
}

/// `available` follows the caller's plan.
#[tokio::test]
async fn tool_availability_follows_plan() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    server.add_plan("free", 0, true, 0);
    server.add_plan("pro", 1900, false, 1);
    server.add_member("pro-member", Some("pro"));
    server.add_member("free-member", Some("free"));
    let admin = server.client_as("admin");

    let calc = admin
        .create_tool(&CreateToolRequest {
            name: "Pricing Calculator".into(),
            description: None,
            url: Some("https://tools.example.com/calc".into()),
            icon: None,
            sort_order: 1,
        })
        .await?;
    admin
        .create_tool(&CreateToolRequest {
            name: "Checklist".into(),
            description: None,
            url: None,
            icon: None,
            sort_order: 2,
        })
        .await?;
    admin
        .set_tool_access(
            &calc.id,
            &SetToolAccessRequest {
                plan_ids: vec!["pro".into()],
            },
        )
        .await?;

    let pro = server.client_as("pro-member").list_tools().await?;
    ensure!(pro.tools.len() == 2);
    ensure!(pro.tools[0].name == "Pricing Calculator" && pro.tools[0].available);
    ensure!(!pro.tools[1].available);

    let free = server.client_as("free-member").list_tools().await?;
    ensure!(free.tools.iter().all(|t| !t.available));

    let anonymous = server.client().list_tools().await?;
    ensure!(anonymous.tools.iter().all(|t| !t.available));
    Ok(())
}

/// Plans on a sales page follow the page's explicit order and skip unknown/inactive ids.
#[tokio::test]
async fn sales_page_orders_plans() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    server.add_plan("free", 0, true, 0);
    server.add_plan("pro", 1900, false, 1);
    server.add_plan("team", 19050, false, 2);
    server.exec("UPDATE plans SET billing_interval = 'year' WHERE id = 'team';");
    server.add_plan("legacy", 500, false, 3);
    server.exec("UPDATE plans SET is_active = 0 WHERE id = 'legacy';");
    let admin = server.client_as("admin");

    admin
        .upsert_sales_page(
            "join",
            &UpsertSalesPageRequest {
                headline: "Join the club".into(),
                subheadline: None,
                body: None,
                plan_ids: vec![
                    "team".into(),
                    "ghost".into(),
                    "free".into(),
                    "legacy".into(),
                    "pro".into(),
                ],
                is_published: true,
            },
        )
        .await?;

    let page = server.client().sales_page("join").await?;
    ensure!(page.headline == "Join the club");
    let cards: Vec<(&str, &str)> = page
        .plans
        .iter()
        .map(|p| (p.id.as_str(), p.price_label.as_str()))
        .collect();
    ensure!(
        cards == [("team", "$190.50/year"), ("free", "Free"), ("pro", "$19/month")],
        "got {cards:?}"
    );

    admin
        .upsert_sales_page(
            "join",
            &UpsertSalesPageRequest {
                headline: "Hidden".into(),
                subheadline: None,
                body: None,
                plan_ids: vec![],
                is_published: false,
            },
        )
        .await?;
    ensure!(server.client().sales_page("join").await.is_err());
    Ok(())
}
