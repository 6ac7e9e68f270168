//! Caller identity and authorization.
//!
//! Callers are identified by their local user id, carried in a single request header whose
//! name is configured by `auth.user_header`. Establishing that header (login, provider OAuth)
//! happens in front of this service.
//!
//! - [`current_user`]: header parsing, user lookup and the [`CurrentUser`] extractor
//! - [`permissions`]: authorization predicates over a resolved caller

pub mod current_user;
pub mod permissions;

pub use current_user::{CurrentUser, resolve_identity};
