//! HTTP API.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures
//! - **[`locks`]**: Per-group guard serialising provisioning runs
//!
//! Routes live under `/api/v1`. Callers identify themselves with the header named by
//! `auth.user_header`.

pub mod handlers;
pub mod locks;
pub mod models;
