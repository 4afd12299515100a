use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::Serialize;
use tokio::sync::watch;

use clubhouse_api::validate;
use clubhouse_api::*;

/// Typed HTTP client for the clubhouse API.
///
/// The stored access token lives in a `watch` channel so observers (see
/// [`crate::PermissionWatcher`]) can react to sign-in, token change and
/// sign-out. Clones share the same auth state.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    auth: Arc<watch::Sender<Option<String>>>,
}

impl ApiClient {
    /// Create a new client with the given base URL and timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create from an existing `reqwest::Client` (e.g. shared in tests).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        let (auth, _) = watch::channel(None);
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: Arc::new(auth),
        }
    }

    /// Sign in (or swap tokens). Observers are notified.
    pub fn set_auth(&self, token: String) {
        self.auth.send_replace(Some(token));
    }

    /// Sign out. Observers are notified.
    pub fn clear_auth(&self) {
        self.auth.send_replace(None);
    }

    pub fn auth_token(&self) -> Option<String> {
        self.auth.borrow().clone()
    }

    /// Receiver that yields on every auth change.
    pub fn subscribe_auth(&self) -> watch::Receiver<Option<String>> {
        self.auth.subscribe()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Access the underlying `reqwest::Client`.
    pub fn reqwest_client(&self) -> &reqwest::Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn token_or_bail(&self) -> Result<String> {
        self.auth_token()
            .ok_or_else(|| anyhow::anyhow!("auth token not set"))
    }

    async fn get_authed<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let token = self.token_or_bail()?;
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        parse_response(resp).await
    }

    async fn send_authed<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T> {
        let token = self.token_or_bail()?;
        let mut req = self
            .client
            .request(method, self.url(path))
            .bearer_auth(token);
        if let Some(body) = body {
            req = req.json(body);
        }
        parse_response(req.send().await?).await
    }

    /// Action endpoints answer `{success, error?}` on failure too.
    async fn send_action(&self, method: reqwest::Method, path: &str) -> Result<ActionResult> {
        let token = self.token_or_bail()?;
        let resp = self
            .client
            .request(method, self.url(path))
            .bearer_auth(token)
            .send()
            .await?;
        parse_action(resp).await
    }

    // ── Health ────────────────────────────────────────────────────────────

    pub async fn health(&self) -> Result<HealthResponse> {
        let resp = self.client.get(self.url("/health")).send().await?;
        parse_response(resp).await
    }

    // ── Auth provider hook ────────────────────────────────────────────────

    pub async fn user_created_hook(
        &self,
        hook_secret: &str,
        req: &UserCreatedHook,
    ) -> Result<OkResponse> {
        let resp = self
            .client
            .post(self.url("/auth/hooks/user-created"))
            .header("x-hook-secret", hook_secret)
            .json(req)
            .send()
            .await?;
        parse_response(resp).await
    }

    // ── Profile ───────────────────────────────────────────────────────────

    pub async fn me(&self) -> Result<ProfileResponse> {
        self.get_authed("/me").await
    }

    pub async fn update_me(&self, req: &UpdateProfileRequest) -> Result<ProfileResponse> {
        self.send_authed(reqwest::Method::PUT, "/me", Some(req)).await
    }

    pub async fn onboard(&self) -> Result<OnboardResponse> {
        self.send_authed::<(), _>(reqwest::Method::POST, "/me/onboard", None)
            .await
    }

    /// Permissions of the signed-in member; anonymous when no token is set.
    pub async fn my_permissions(&self) -> Result<PlanPermissions> {
        let mut req = self.client.get(self.url("/me/permissions"));
        if let Some(token) = self.auth_token() {
            req = req.bearer_auth(token);
        }
        parse_response(req.send().await?).await
    }

    pub async fn shell(&self) -> Result<ShellResponse> {
        let mut req = self.client.get(self.url("/shell"));
        if let Some(token) = self.auth_token() {
            req = req.bearer_auth(token);
        }
        parse_response(req.send().await?).await
    }

    // ── Catalogue ─────────────────────────────────────────────────────────

    pub async fn list_plans(&self) -> Result<ListPlansResponse> {
        let resp = self.client.get(self.url("/plans")).send().await?;
        parse_response(resp).await
    }

    pub async fn sales_page(&self, slug: &str) -> Result<SalesPageResponse> {
        let resp = self
            .client
            .get(self.url(&format!("/public/sales/{slug}")))
            .send()
            .await?;
        parse_response(resp).await
    }

    pub async fn list_tools(&self) -> Result<ListToolsResponse> {
        let mut req = self.client.get(self.url("/tools"));
        if let Some(token) = self.auth_token() {
            req = req.bearer_auth(token);
        }
        parse_response(req.send().await?).await
    }

    pub async fn list_content(&self, taxonomy_id: Option<&str>) -> Result<ListContentResponse> {
        let path = match taxonomy_id {
            Some(id) => format!("/content?taxonomy_id={id}"),
            None => "/content".to_string(),
        };
        self.get_authed(&path).await
    }

    pub async fn list_groups(&self) -> Result<ListGroupsResponse> {
        self.get_authed("/groups").await
    }

    pub async fn get_group(&self, id: &str) -> Result<GroupResponse> {
        self.get_authed(&format!("/groups/{id}")).await
    }

    // ── Messaging ─────────────────────────────────────────────────────────

    pub async fn list_conversations(&self) -> Result<ListConversationsResponse> {
        self.get_authed("/conversations").await
    }

    pub async fn list_messages(&self, conversation_id: &str) -> Result<ListMessagesResponse> {
        self.get_authed(&format!("/conversations/{conversation_id}/messages"))
            .await
    }

    // ── Site updates ──────────────────────────────────────────────────────

    pub async fn list_updates(&self) -> Result<ListUpdatesResponse> {
        self.get_authed("/updates").await
    }

    pub async fn mark_update_read(&self, id: &str) -> Result<OkResponse> {
        self.send_authed::<(), _>(reqwest::Method::POST, &format!("/updates/{id}/read"), None)
            .await
    }

    // ── Admin: taxonomies ─────────────────────────────────────────────────

    pub async fn list_taxonomies(
        &self,
        taxonomy_type: Option<TaxonomyType>,
    ) -> Result<ListTaxonomiesResponse> {
        let path = match taxonomy_type {
            Some(t) => format!("/admin/taxonomies?type={t}"),
            None => "/admin/taxonomies".to_string(),
        };
        self.get_authed(&path).await
    }

    /// Validate the taxonomy form, then submit it. Invalid forms never reach the server.
    pub async fn create_taxonomy(&self, req: &CreateTaxonomyRequest) -> Result<TaxonomyResponse> {
        let (name, slug) = validate::name_and_slug(&req.name, &req.slug, req.auto_slug)?;
        let form = CreateTaxonomyRequest {
            taxonomy_type: req.taxonomy_type,
            name,
            slug,
            auto_slug: false,
            description: req.description.clone(),
        };
        self.send_authed(reqwest::Method::POST, "/admin/taxonomies", Some(&form))
            .await
    }

    pub async fn get_taxonomy(&self, id: &str) -> Result<TaxonomyResponse> {
        self.get_authed(&format!("/admin/taxonomies/{id}")).await
    }

    /// Validate the edited fields, then submit them.
    pub async fn update_taxonomy(
        &self,
        id: &str,
        req: &UpdateTaxonomyRequest,
    ) -> Result<TaxonomyResponse> {
        let form = UpdateTaxonomyRequest {
            name: req
                .name
                .as_deref()
                .map(validate::validate_name)
                .transpose()?,
            slug: req
                .slug
                .as_deref()
                .map(|s| validate::validate_slug(s.trim()))
                .transpose()?,
            description: req.description.clone(),
        };
        self.send_authed(
            reqwest::Method::PUT,
            &format!("/admin/taxonomies/{id}"),
            Some(&form),
        )
        .await
    }

    pub async fn delete_taxonomy(&self, id: &str) -> Result<OkResponse> {
        self.send_authed::<(), _>(
            reqwest::Method::DELETE,
            &format!("/admin/taxonomies/{id}"),
            None,
        )
        .await
    }

    // ── Admin: content ────────────────────────────────────────────────────

    pub async fn admin_list_content(&self) -> Result<ListContentResponse> {
        self.get_authed("/admin/content").await
    }

    pub async fn create_content(&self, req: &CreateContentRequest) -> Result<ContentResponse> {
        self.send_authed(reqwest::Method::POST, "/admin/content", Some(req))
            .await
    }

    pub async fn toggle_content_status(&self, id: &str) -> Result<ActionResult> {
        self.send_action(
            reqwest::Method::POST,
            &format!("/admin/content/{id}/toggle-status"),
        )
        .await
    }

    pub async fn delete_content(&self, id: &str) -> Result<ActionResult> {
        self.send_action(reqwest::Method::DELETE, &format!("/admin/content/{id}"))
            .await
    }

    // ── Admin: groups ─────────────────────────────────────────────────────

    pub async fn create_group(&self, req: &CreateGroupRequest) -> Result<GroupResponse> {
        self.send_authed(reqwest::Method::POST, "/admin/groups", Some(req))
            .await
    }

    pub async fn update_group(&self, id: &str, req: &UpdateGroupRequest) -> Result<GroupResponse> {
        self.send_authed(
            reqwest::Method::PUT,
            &format!("/admin/groups/{id}"),
            Some(req),
        )
        .await
    }

    pub async fn delete_group(&self, id: &str) -> Result<OkResponse> {
        self.send_authed::<(), _>(reqwest::Method::DELETE, &format!("/admin/groups/{id}"), None)
            .await
    }

    // ── Admin: messages ───────────────────────────────────────────────────

    pub async fn send_admin_message(&self, req: &SendMessageRequest) -> Result<ActionResult> {
        let token = self.token_or_bail()?;
        let resp = self
            .client
            .post(self.url("/admin/messages"))
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;
        parse_action(resp).await
    }

    // ── Admin: navigation ─────────────────────────────────────────────────

    pub async fn navigation_settings(&self) -> Result<NavigationSettingsResponse> {
        self.get_authed("/admin/settings/navigation").await
    }

    pub async fn update_navigation(
        &self,
        req: &UpdateNavigationRequest,
    ) -> Result<NavigationSettingsResponse> {
        self.send_authed(
            reqwest::Method::PUT,
            "/admin/settings/navigation",
            Some(req),
        )
        .await
    }

    // ── Admin: plans, tools, sales pages, updates ─────────────────────────

    pub async fn plan_permissions(&self, plan_id: &str) -> Result<PlanPermissions> {
        self.get_authed(&format!("/admin/plans/{plan_id}/permissions"))
            .await
    }

    pub async fn update_plan_permissions(
        &self,
        plan_id: &str,
        req: &UpdatePlanPermissionsRequest,
    ) -> Result<PlanPermissions> {
        self.send_authed(
            reqwest::Method::PUT,
            &format!("/admin/plans/{plan_id}/permissions"),
            Some(req),
        )
        .await
    }

    pub async fn create_tool(&self, req: &CreateToolRequest) -> Result<ToolResponse> {
        self.send_authed(reqwest::Method::POST, "/admin/tools", Some(req))
            .await
    }

    pub async fn set_tool_access(
        &self,
        tool_id: &str,
        req: &SetToolAccessRequest,
    ) -> Result<OkResponse> {
        self.send_authed(
            reqwest::Method::PUT,
            &format!("/admin/tools/{tool_id}/access"),
            Some(req),
        )
        .await
    }

    pub async fn upsert_sales_page(
        &self,
        slug: &str,
        req: &UpsertSalesPageRequest,
    ) -> Result<OkResponse> {
        self.send_authed(
            reqwest::Method::PUT,
            &format!("/admin/sales-pages/{slug}"),
            Some(req),
        )
        .await
    }

    pub async fn create_update(&self, req: &CreateUpdateRequest) -> Result<SiteUpdateResponse> {
        self.send_authed(reqwest::Method::POST, "/admin/updates", Some(req))
            .await
    }

    // ── Raw helpers (for tests / advanced usage) ──────────────────────────

    /// Authenticated GET returning the raw response.
    pub async fn get_with_auth(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// GET carrying only a `Cookie` header, returning the raw response.
    pub async fn get_with_cookies(&self, path: &str, cookies: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url(path))
            .header(reqwest::header::COOKIE, cookies)
            .send()
            .await?)
    }
}

/// Parse an HTTP response: return the deserialized body on 2xx,
/// or an error containing the status and body text.
async fn parse_response<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        bail!("{status}: {body}");
    }
    Ok(resp.json().await?)
}

/// Parse an action response. Failed actions still carry `{success: false, error}`;
/// only bodies that are not an action result become errors.
async fn parse_action(resp: reqwest::Response) -> Result<ActionResult> {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    match serde_json::from_str::<ActionResult>(&body) {
        Ok(result) => Ok(result),
        Err(_) => bail!("{status}: {body}"),
    }
}
