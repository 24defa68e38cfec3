//! Long-running services and their lifecycle

pub mod database;
pub mod events;
pub mod graphql;
pub mod http_server;
pub mod manager;

pub use database::{DatabaseService, DatabaseServiceConfig};
pub use events::{EventBus, MOVIE_ADDED};
pub use graphql::{GraphqlService, GraphqlServiceConfig};
pub use http_server::{HttpServerConfig, HttpServerService};
pub use manager::{HealthStatus, Service, ServiceHealth, ServicesManager};
