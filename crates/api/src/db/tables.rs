//! Compile-time–checked column identifiers for all tables.

use sea_query::Iden;

#[derive(Iden)]
pub enum Profiles {
    Table,
    Id,
    Email,
    FullName,
    AvatarUrl,
    IsCreator,
    PlanId,
    EmailNotifications,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Plans {
    Table,
    Id,
    Name,
    Slug,
    Description,
    PriceCents,
    BillingInterval,
    IsDefault,
    IsActive,
    SortOrder,
    CreatedAt,
}

#[derive(Iden)]
pub enum PlanPermissions {
    Table,
    PlanId,
    Permission,
    Enabled,
}

#[derive(Iden)]
pub enum Tools {
    Table,
    Id,
    Name,
    Description,
    Url,
    Icon,
    IsActive,
    SortOrder,
    CreatedAt,
}

#[derive(Iden)]
pub enum ToolPlanAccess {
    Table,
    ToolId,
    PlanId,
}

#[derive(Iden)]
pub enum Taxonomies {
    Table,
    Id,
    Type,
    Name,
    Slug,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Groups {
    Table,
    Id,
    Name,
    Slug,
    Description,
    IsPrivate,
    CoverUrl,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Content {
    Table,
    Id,
    Title,
    Body,
    ContentType,
    Status,
    AuthorId,
    TaxonomyId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Conversations {
    Table,
    Id,
    ParticipantOne,
    ParticipantTwo,
    LastMessageAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
pub enum Messages {
    Table,
    Id,
    ConversationId,
    SenderId,
    Body,
    CreatedAt,
}

#[derive(Iden)]
pub enum SiteSettings {
    Table,
    Key,
    Value,
    UpdatedAt,
}

#[derive(Iden)]
pub enum SiteUpdates {
    Table,
    Id,
    Title,
    Body,
    PublishedAt,
    CreatedAt,
}

#[derive(Iden)]
pub enum SiteUpdateReads {
    Table,
    UpdateId,
    UserId,
    ReadAt,
}

#[derive(Iden)]
pub enum PublicSalesPages {
    Table,
    Id,
    Slug,
    Headline,
    Subheadline,
    Body,
    PlanIds,
    IsPublished,
    CreatedAt,
    UpdatedAt,
}
