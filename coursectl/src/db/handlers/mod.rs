//! Repository implementations for PostgreSQL access.
//!
//! Each repository wraps a SQLx connection (or transaction) and provides strongly-typed
//! operations for one table family, returning records from [`crate::db::models`].
//! [`crate::db::PostgresStore`] composes them behind the [`crate::db::Store`] trait.
//!
//! # Available Repositories
//!
//! - [`Users`]: users and their remote identities
//! - [`Groups`]: groups, membership and approval status
//! - [`Courses`]: course lookups
//! - [`Repositories`]: recorded provider repositories
//!
//! # Common Pattern
//!
//! ```ignore
//! use coursectl::db::handlers::Groups;
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Groups::new(&mut tx);
//!     let group = repo.get_by_id(42).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod courses;
pub mod groups;
pub mod repositories;
pub mod users;

pub use courses::Courses;
pub use groups::Groups;
pub use repositories::Repositories;
pub use users::Users;
