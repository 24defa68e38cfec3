//! API route definitions
//!
//! The primary API is GraphQL at /graphql. Plain HTTP routes here cover
//! liveness and readiness probes.

pub mod health;
