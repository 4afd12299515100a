mod common;

use std::time::Duration;

use anyhow::{ensure, Result};

use clubhouse_api::{
    CreateUpdateRequest, PlanPermissions, UpdateProfileRequest, UserCreatedHook,
};
use clubhouse_api_client::PermissionWatcher;

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Anonymous callers, members without a plan and plans without rows get the all-false map.
#[tokio::test]
async fn permissions_default_to_all_false() -> Result<()> {
    let server = common::spawn().await;
    server.add_plan("bare", 0, false, 0);
    server.add_member("planless", None);
    server.add_member("bare-member", Some("bare"));

    ensure!(server.client().my_permissions().await? == PlanPermissions::none());
    ensure!(server.client_as("planless").my_permissions().await? == PlanPermissions::none());
    ensure!(server.client_as("bare-member").my_permissions().await? == PlanPermissions::none());
    ensure!(server.client_as("nobody").my_permissions().await? == PlanPermissions::none());
    Ok(())
}

/// Enabled rows turn flags on; disabled and unknown rows do not.
#[tokio::test]
async fn permissions_follow_plan_rows() -> Result<()> {
    let server = common::spawn().await;
    server.add_plan("pro", 1900, false, 1);
    server.grant("pro", "community", true);
    server.grant("pro", "tools", true);
    server.grant("pro", "events", false);
    server.grant("pro", "teleport", true);
    server.add_member("member", Some("pro"));

    let perms = server.client_as("member").my_permissions().await?;
    ensure!(
        perms
            == PlanPermissions {
                community: true,
                tools: true,
                ..PlanPermissions::none()
            },
        "got {perms:?}"
    );
    Ok(())
}

/// The watcher republishes when the token changes and clears on sign-out.
#[tokio::test]
async fn watcher_tracks_sign_in_and_out() -> Result<()> {
    let server = common::spawn().await;
    server.add_plan("pro", 1900, false, 1);
    server.grant("pro", "messaging", true);
    server.add_member("member", Some("pro"));
    server.add_member("planless", None);

    let client = server.client();
    let watcher = PermissionWatcher::spawn(client.clone());
    let mut rx = watcher.subscribe();
    let settle = Duration::from_secs(5);

    client.set_auth(common::token_for("member"));
    tokio::time::timeout(settle, rx.wait_for(|p| p.messaging)).await??;

    client.set_auth(common::token_for("planless"));
    tokio::time::timeout(settle, rx.wait_for(|p| !p.messaging)).await??;

    client.set_auth(common::token_for("member"));
    tokio::time::timeout(settle, rx.wait_for(|p| p.messaging)).await??;

    client.clear_auth();
    tokio::time::timeout(settle, rx.wait_for(|p| !p.any())).await??;
    ensure!(watcher.current() == PlanPermissions::none());
    Ok(())
}

// ---------------------------------------------------------------------------
// Shell
// ---------------------------------------------------------------------------

/// Creators get the admin entry last; members never see it.
#[tokio::test]
async fn shell_admin_entry_only_for_creators() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    server.add_member("member", None);

    let admin_shell = server.client_as("admin").shell().await?;
    let keys: Vec<&str> = admin_shell.navigation.iter().map(|i| i.key.as_str()).collect();
    ensure!(
        keys == ["dashboard", "community", "content", "tools", "experts", "admin"],
        "got {keys:?}"
    );
    ensure!(admin_shell.labels["admin"] == "Admin");
    ensure!(admin_shell.profile.is_some_and(|p| p.is_creator));

    let member_shell = server.client_as("member").shell().await?;
    ensure!(member_shell.navigation.iter().all(|i| i.key != "admin"));
    ensure!(!member_shell.labels.contains_key("admin"));
    ensure!(member_shell.labels["content"] == "Library");

    let anonymous = server.client().shell().await?;
    ensure!(anonymous.profile.is_none());
    ensure!(anonymous.navigation.len() == 5);
    ensure!(anonymous.unread_updates == 0);
    Ok(())
}

/// Stored navigation reaches members through the shell.
#[tokio::test]
async fn shell_uses_stored_navigation() -> Result<()> {
    let server = common::spawn().await;
    server.add_member("member", None);
    server.exec(
        r#"INSERT INTO site_settings (key, value) VALUES
           ('navigation', '[{"id":"experts","label":"Mentors","order":1,"visible":true},{"id":"community","order":0,"visible":true},{"id":"tools","label":"Kit","visible":false}]');"#,
    );

    let shell = server.client_as("member").shell().await?;
    let items: Vec<(&str, &str)> = shell
        .navigation
        .iter()
        .map(|i| (i.key.as_str(), i.label.as_str()))
        .collect();
    ensure!(
        items == [("community", "Community"), ("experts", "Mentors")],
        "got {items:?}"
    );
    ensure!(shell.labels["tools"] == "Kit");
    Ok(())
}

// ---------------------------------------------------------------------------
// Site updates
// ---------------------------------------------------------------------------

/// Unread counts drop as updates are read; marking twice is harmless.
#[tokio::test]
async fn updates_unread_and_mark_read() -> Result<()> {
    let server = common::spawn().await;
    server.add_admin("admin");
    server.add_member("member", None);
    let admin = server.client_as("admin");
    let member = server.client_as("member");

    let first = admin
        .create_update(&CreateUpdateRequest {
            title: "New tools".into(),
            body: Some("Two new calculators".into()),
        })
        .await?;
    admin
        .create_update(&CreateUpdateRequest {
            title: "Office hours".into(),
            body: None,
        })
        .await?;

    let listed = member.list_updates().await?;
    ensure!(listed.updates.len() == 2);
    ensure!(listed.unread_count == 2);
    ensure!(member.shell().await?.unread_updates == 2);

    member.mark_update_read(&first.id).await?;
    member.mark_update_read(&first.id).await?;

    let listed = member.list_updates().await?;
    ensure!(listed.unread_count == 1);
    let read = listed
        .updates
        .iter()
        .find(|u| u.id == first.id)
        .expect("update listed");
    ensure!(read.read);

    // Read state is per member.
    ensure!(admin.list_updates().await?.unread_count == 2);

    let err = member.mark_update_read("missing").await.unwrap_err();
    ensure!(err.to_string().starts_with("404"), "{err}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Profile lifecycle
// ---------------------------------------------------------------------------

/// The provider hook creates the profile once and checks its secret.
#[tokio::test]
async fn user_created_hook_creates_profile() -> Result<()> {
    let server = common::spawn().await;
    let client = server.client();
    let hook = UserCreatedHook {
        id: "new-user".into(),
        email: "new@example.com".into(),
        full_name: Some("  New Member ".into()),
    };

    let err = client.user_created_hook("wrong", &hook).await.unwrap_err();
    ensure!(err.to_string().starts_with("401"), "{err}");

    ensure!(client.user_created_hook(common::HOOK_SECRET, &hook).await?.ok);
    // A replayed hook must not fail or duplicate the row.
    ensure!(client.user_created_hook(common::HOOK_SECRET, &hook).await?.ok);

    let profile = server.client_as("new-user").me().await?;
    ensure!(profile.email == "new@example.com");
    ensure!(profile.full_name.as_deref() == Some("New Member"));
    ensure!(!profile.is_creator);
    ensure!(profile.plan_id.is_none());
    Ok(())
}

/// Partial profile updates leave untouched fields alone.
#[tokio::test]
async fn update_me_is_partial() -> Result<()> {
    let server = common::spawn().await;
    server.add_member("member", None);
    let member = server.client_as("member");

    let updated = member
        .update_me(&UpdateProfileRequest {
            email_notifications: Some(false),
            ..Default::default()
        })
        .await?;
    ensure!(!updated.email_notifications);
    ensure!(updated.full_name.as_deref() == Some("Member member"));

    let updated = member
        .update_me(&UpdateProfileRequest {
            full_name: Some("Renamed".into()),
            ..Default::default()
        })
        .await?;
    ensure!(updated.full_name.as_deref() == Some("Renamed"));
    ensure!(!updated.email_notifications);
    Ok(())
}

/// Onboarding waits for a lagging profile row, then assigns the default plan.
#[tokio::test]
async fn onboarding_retries_until_profile_exists() -> Result<()> {
    let server = common::spawn().await;
    server.add_plan("free", 0, true, 0);
    server.add_plan("pro", 1900, false, 1);

    let db = server.db.clone();
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        db.conn()
            .execute(
                "INSERT INTO profiles (id, email) VALUES ('late', 'late@example.com')",
                [],
            )
            .expect("insert late profile");
    });

    let onboarded = server.client_as("late").onboard().await?;
    writer.await?;
    ensure!(onboarded.plan_id == "free");
    ensure!(onboarded.attempts >= 2, "attempts: {}", onboarded.attempts);
    ensure!(server.client_as("late").me().await?.plan_id.as_deref() == Some("free"));

    // An existing plan is kept.
    server.add_member("pro-member", Some("pro"));
    let kept = server.client_as("pro-member").onboard().await?;
    ensure!(kept.plan_id == "pro" && kept.attempts == 1);
    Ok(())
}

/// Onboarding gives up after the configured number of attempts.
#[tokio::test]
async fn onboarding_gives_up_without_profile() -> Result<()> {
    let server = common::spawn_with(|config| {
        config.onboarding.plan_assign_attempts = 3;
        config.onboarding.plan_assign_delay_ms = 20;
    })
    .await;
    server.add_plan("free", 0, true, 0);

    let err = server.client_as("ghost").onboard().await.unwrap_err();
    ensure!(err.to_string().starts_with("404"), "{err}");
    Ok(())
}
