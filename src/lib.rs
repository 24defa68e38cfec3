//! Movie catalog backend
//!
//! A GraphQL API over a SQLite movie collection. Queries and mutations are
//! served at `/graphql`; `movieAdded` subscriptions stream over `/graphql/ws`.

pub mod api;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod graphql;
pub mod logging;
pub mod services;

pub use app::{AppState, build_app};
pub use config::Config;
