//! Plan permission flags.
//!
//! A plan grants features through rows in `plan_permissions(plan_id, permission, enabled)`.
//! Members always see the same fixed-shape map; anything unknown or missing is `false`.

use serde::{Deserialize, Serialize};

/// Named feature flags a plan can enable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Community,
    ContentLibrary,
    Tools,
    Experts,
    Messaging,
    Events,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Self::Community,
        Self::ContentLibrary,
        Self::Tools,
        Self::Experts,
        Self::Messaging,
        Self::Events,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::ContentLibrary => "content_library",
            Self::Tools => "tools",
            Self::Experts => "experts",
            Self::Messaging => "messaging",
            Self::Events => "events",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved permissions for one member. `Default` is all-false.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanPermissions {
    pub community: bool,
    pub content_library: bool,
    pub tools: bool,
    pub experts: bool,
    pub messaging: bool,
    pub events: bool,
}

impl PlanPermissions {
    /// All flags off: no user, no plan, or nothing could be read.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from `(permission, enabled)` rows. Unknown names are ignored.
    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = (S, bool)>,
        S: AsRef<str>,
    {
        let mut perms = Self::none();
        for (name, enabled) in rows {
            if let Some(p) = Permission::parse(name.as_ref()) {
                perms.set(p, enabled);
            }
        }
        perms
    }

    pub fn get(&self, permission: Permission) -> bool {
        match permission {
            Permission::Community => self.community,
            Permission::ContentLibrary => self.content_library,
            Permission::Tools => self.tools,
            Permission::Experts => self.experts,
            Permission::Messaging => self.messaging,
            Permission::Events => self.events,
        }
    }

    pub fn set(&mut self, permission: Permission, enabled: bool) {
        let slot = match permission {
            Permission::Community => &mut self.community,
            Permission::ContentLibrary => &mut self.content_library,
            Permission::Tools => &mut self.tools,
            Permission::Experts => &mut self.experts,
            Permission::Messaging => &mut self.messaging,
            Permission::Events => &mut self.events,
        };
        *slot = enabled;
    }

    pub fn any(&self) -> bool {
        Permission::ALL.into_iter().any(|p| self.get(p))
    }
}
