pub mod auth;
pub mod content;
pub mod groups;
pub mod health;
pub mod messages;
pub mod plans;
pub mod profile;
pub mod shell;
pub mod taxonomies;
pub mod tools;
pub mod updates;
