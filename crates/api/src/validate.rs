//! Form validation shared by the client (before submission) and route handlers.

use std::sync::LazyLock;

use regex::Regex;

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid slug regex"));

/// Maximum length of taxonomy and group names.
pub const MAX_NAME_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,
    #[error("name must be at most {MAX_NAME_LEN} characters")]
    NameTooLong,
    #[error("slug must be lowercase letters, digits, and single hyphens (e.g. my-group-2)")]
    InvalidSlug,
    #[error("{0} is required")]
    Required(&'static str),
}

/// Whether `slug` matches `^[a-z0-9]+(-[a-z0-9]+)*$`.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_RE.is_match(slug)
}

/// Derive a slug from a display name: `"Business & Finance"` → `"business-finance"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Trim and check a name. Returns the trimmed name.
pub fn validate_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    Ok(trimmed.to_string())
}

pub fn validate_slug(slug: &str) -> Result<String, ValidationError> {
    if is_valid_slug(slug) {
        Ok(slug.to_string())
    } else {
        Err(ValidationError::InvalidSlug)
    }
}

/// Validate a name/slug form pair, deriving the slug when `auto_slug` is set or
/// the slug field is blank. Returns `(name, slug)`.
pub fn name_and_slug(
    name: &str,
    slug: &str,
    auto_slug: bool,
) -> Result<(String, String), ValidationError> {
    let name = validate_name(name)?;
    let slug = if auto_slug || slug.trim().is_empty() {
        slugify(&name)
    } else {
        slug.trim().to_string()
    };
    let slug = validate_slug(&slug)?;
    Ok((name, slug))
}

/// Trim a required free-text field.
pub fn require(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(trimmed.to_string())
    }
}
