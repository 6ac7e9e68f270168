//! HTTP request handlers.
//!
//! - [`groups`]: Group lookup, provisioning (status change) and deletion
//! - [`probes`]: Liveness probe

pub mod groups;
pub mod probes;
