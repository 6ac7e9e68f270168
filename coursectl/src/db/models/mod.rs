//! Database record structures.
//!
//! These are the shapes the [`crate::db::Store`] hands back to the rest of the application.
//! They are independent of the API representations in [`crate::api::models`], which never
//! expose stored access credentials.
//!
//! - [`users`]: users and their linked hosting-provider identities
//! - [`groups`]: student groups with their ordered membership
//! - [`courses`]: courses and the provider directory they live in
//! - [`repositories`]: locally recorded provider repositories

pub mod courses;
pub mod groups;
pub mod repositories;
pub mod users;
