//! GraphQL API with subscriptions for real-time updates
//!
//! Queries and mutations live in domain modules under `queries/` and
//! `mutations/` and are merged into the roots in `schema.rs`.

pub mod auth;
pub mod helpers;
pub mod mutations;
pub mod queries;
pub mod scalars;
mod schema;
mod subscriptions;
pub mod types;

pub use auth::{AuthUser, resolve_connection_identity, resolve_identity};
pub use scalars::Date;
pub use schema::{CatalogSchema, build_schema, build_schema_with_stores, schema_sdl};
pub use types::{Actor, Movie, MovieInput, Status};
