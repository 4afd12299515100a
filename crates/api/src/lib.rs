//! Shared API types, navigation/permission resolution, and SQL builders for clubhouse.
//!
//! This crate is the **single source of truth** for all API request/response types.
//! The server, the typed client, and any frontend tooling consume these definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "backend")]
pub mod crypto;
#[cfg(feature = "backend")]
pub mod db;
pub mod nav;
pub mod permissions;
#[cfg(feature = "backend")]
pub mod service;
pub mod validate;

pub use nav::NavItem;
pub use permissions::{Permission, PlanPermissions};

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// Discriminator for rows in the `taxonomies` table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyType {
    Category,
    ContentTag,
    ExpertTag,
}

impl TaxonomyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::ContentTag => "content_tag",
            Self::ExpertTag => "expert_tag",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "category" => Some(Self::Category),
            "content_tag" => Some(Self::ContentTag),
            "expert_tag" => Some(Self::ExpertTag),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaxonomyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publication state of a content item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Published,
    #[default]
    Draft,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Draft => "draft",
        }
    }

    /// Unknown stored values are treated as drafts so they never leak to members.
    pub fn parse(s: &str) -> Self {
        match s {
            "published" => Self::Published,
            _ => Self::Draft,
        }
    }

    /// The status a moderation toggle moves to.
    pub fn toggled(self) -> Self {
        match self {
            Self::Published => Self::Draft,
            Self::Draft => Self::Published,
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Generic Responses ───────────────────────────────────────────────────────

/// Simple `{ "ok": true }` acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Outcome of an admin action: `{ "success": true }` or `{ "success": false, "error": "..." }`.
///
/// Actions never return the mutated row; callers re-fetch to observe new state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Id of the row the action created or touched, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
            id: None,
        }
    }

    pub fn ok_with_id(id: impl Into<String>) -> Self {
        Self {
            success: true,
            error: None,
            id: Some(id.into()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            id: None,
        }
    }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Payload the auth provider posts to `POST /api/auth/hooks/user-created`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCreatedHook {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Token pair returned by the auth provider's refresh endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// A member profile as stored in `profiles`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileResponse {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_creator: bool,
    pub plan_id: Option<String>,
    pub email_notifications: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl ProfileResponse {
    /// Name shown to other members: full name when set, otherwise the email.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.email)
    }
}

/// Request body for `PUT /api/me` — partial profile update.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub email_notifications: Option<bool>,
}

/// Returned by `POST /api/me/onboard`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OnboardResponse {
    pub plan_id: String,
    /// Number of attempts it took for the profile row to become visible.
    pub attempts: u32,
}

// ─── Taxonomies ──────────────────────────────────────────────────────────────

/// Single taxonomy record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxonomyResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub taxonomy_type: TaxonomyType,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Returned by `GET /api/admin/taxonomies`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListTaxonomiesResponse {
    pub taxonomies: Vec<TaxonomyResponse>,
}

/// Query parameters for `GET /api/admin/taxonomies`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaxonomyQuery {
    #[serde(rename = "type")]
    pub taxonomy_type: Option<TaxonomyType>,
}

/// Request body for `POST /api/admin/taxonomies` — the taxonomy form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaxonomyRequest {
    #[serde(rename = "type")]
    pub taxonomy_type: TaxonomyType,
    pub name: String,
    /// Ignored when `auto_slug` is set; derived from `name` when blank.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub auto_slug: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for `PUT /api/admin/taxonomies/:id` — partial update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaxonomyRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// Single content item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentResponse {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub content_type: String,
    pub status: ContentStatus,
    pub author_id: Option<String>,
    pub taxonomy_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Returned by the content listing endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListContentResponse {
    pub content: Vec<ContentResponse>,
}

/// Query parameters for `GET /api/content`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ContentQuery {
    pub taxonomy_id: Option<String>,
}

/// Request body for `POST /api/admin/content`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateContentRequest {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub taxonomy_id: Option<String>,
}

// ─── Groups ──────────────────────────────────────────────────────────────────

/// Single community group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_private: bool,
    pub cover_url: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Returned by `GET /api/groups`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListGroupsResponse {
    pub groups: Vec<GroupResponse>,
}

/// Request body for `POST /api/admin/groups`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub cover_url: Option<String>,
}

/// Request body for `PUT /api/admin/groups/:id` — partial settings update.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub is_private: Option<bool>,
    pub cover_url: Option<String>,
}

// ─── Messaging ───────────────────────────────────────────────────────────────

/// Request body for `POST /api/admin/messages`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: String,
    #[serde(default)]
    pub subject: Option<String>,
    pub body: String,
}

/// A two-party conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationResponse {
    pub id: String,
    pub participant_one: String,
    pub participant_two: String,
    pub last_message_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Returned by `GET /api/conversations`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub conversations: Vec<ConversationResponse>,
}

/// Single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageResponse {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub created_at: String,
}

/// Returned by `GET /api/conversations/:id/messages`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<MessageResponse>,
}

/// JSON body posted to the notification webhook.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageNotification {
    pub recipient_user_id: String,
    pub sender_name: String,
}

// ─── Shell / Navigation ─────────────────────────────────────────────────────

/// Returned by `GET /api/shell` — everything the member layout needs.
#[derive(Debug, Serialize, Deserialize)]
pub struct ShellResponse {
    pub navigation: Vec<NavItem>,
    pub labels: BTreeMap<String, String>,
    pub permissions: PlanPermissions,
    pub unread_updates: i64,
    pub profile: Option<ProfileResponse>,
}

/// Returned by `GET /api/admin/settings/navigation`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NavigationSettingsResponse {
    /// The stored config, verbatim. `null` when nothing has been saved.
    pub raw: Option<String>,
    /// What members currently see (without the admin entry).
    pub resolved: Vec<NavItem>,
}

/// Request body for `PUT /api/admin/settings/navigation`.
///
/// `config` may be a JSON array of `{id, label, order, visible}` or a string
/// holding that array; it is stored as text either way.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateNavigationRequest {
    pub config: serde_json::Value,
}

// ─── Plans & Sales Pages ─────────────────────────────────────────────────────

/// A subscription plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanResponse {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub billing_interval: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub sort_order: i64,
}

/// Returned by `GET /api/plans`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListPlansResponse {
    pub plans: Vec<PlanResponse>,
}

/// Request body for `PUT /api/admin/plans/:id/permissions`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatePlanPermissionsRequest {
    pub permissions: BTreeMap<String, bool>,
}

/// Display model of a plan on a sales page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanCard {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_label: String,
}

/// Returned by `GET /api/public/sales/:slug`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SalesPageResponse {
    pub slug: String,
    pub headline: String,
    pub subheadline: Option<String>,
    pub body: Option<String>,
    pub plans: Vec<PlanCard>,
}

/// Request body for `PUT /api/admin/sales-pages/:slug`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertSalesPageRequest {
    pub headline: String,
    #[serde(default)]
    pub subheadline: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub plan_ids: Vec<String>,
    #[serde(default)]
    pub is_published: bool,
}

// ─── Tools ───────────────────────────────────────────────────────────────────

/// A catalogue tool with its availability for the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub icon: Option<String>,
    pub available: bool,
}

/// Returned by `GET /api/tools`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListToolsResponse {
    pub tools: Vec<ToolResponse>,
}

/// Request body for `POST /api/admin/tools`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateToolRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

/// Request body for `PUT /api/admin/tools/:id/access` — replaces the access set.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetToolAccessRequest {
    pub plan_ids: Vec<String>,
}

// ─── Site Updates ────────────────────────────────────────────────────────────

/// A site update with the caller's read state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteUpdateResponse {
    pub id: String,
    pub title: String,
    pub body: Option<String>,
    pub published_at: String,
    pub read: bool,
}

/// Returned by `GET /api/updates`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListUpdatesResponse {
    pub updates: Vec<SiteUpdateResponse>,
    pub unread_count: i64,
}

/// Request body for `POST /api/admin/updates`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateUpdateRequest {
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
}

// ─── Health ──────────────────────────────────────────────────────────────────

/// Returned by `GET /api/health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ─── Service Error ───────────────────────────────────────────────────────────

/// Framework-agnostic service error.
///
/// Each variant maps to an HTTP status code. The server converts this into
/// its own response type.
#[derive(Debug, Clone)]
pub enum ServiceError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl ServiceError {
    /// HTTP status code as a `u16`.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }

    /// Build a closure that wraps a DB/IO error as `Internal`.
    pub fn from_db<E: std::fmt::Display>(context: &str) -> impl FnOnce(E) -> Self + '_ {
        move |e| Self::Internal(format!("{context}: {e}"))
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ServiceError {}

impl From<validate::ValidationError> for ServiceError {
    fn from(e: validate::ValidationError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

/// JSON error shape `{ "error": "..." }` returned by all error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl From<&ServiceError> for ApiError {
    fn from(e: &ServiceError) -> Self {
        Self {
            error: e.message().to_string(),
        }
    }
}
