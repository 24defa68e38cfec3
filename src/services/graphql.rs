//! GraphQL service: owns schema building and exposes HTTP routes for /graphql and /graphql/ws.
//!
//! Depends on the database service; builds the schema in [start](Service::start) once
//! the pool is available. The HTTP server merges [GraphqlService::router] into the app
//! and uses [GraphqlService::schema] to build [AppState].

use std::sync::Arc;

use anyhow::Result;
use async_graphql::Data;
use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use async_trait::async_trait;
use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use tokio::sync::RwLock;
use tracing::info;

use crate::app::AppState;
use crate::graphql::auth::USER_ID_HEADER;
use crate::graphql::{CatalogSchema, Movie, build_schema, resolve_connection_identity, resolve_identity};
use crate::services::events::EventBus;
use crate::services::manager::{Service, ServiceHealth};

/// Configuration for the GraphQL service.
#[derive(Clone)]
pub struct GraphqlServiceConfig {
    /// Used to log the GraphiQL URL on start
    pub server_port: u16,
    /// Bus shared by `addMovie` and `movieAdded`
    pub events: Arc<EventBus<Movie>>,
}

/// GraphQL service: builds and holds the schema, provides routes for the playground and API.
pub struct GraphqlService {
    manager: Arc<crate::services::ServicesManager>,
    config: GraphqlServiceConfig,
    schema: RwLock<Option<CatalogSchema>>,
}

impl GraphqlService {
    pub fn new(manager: Arc<crate::services::ServicesManager>, config: GraphqlServiceConfig) -> Self {
        Self {
            manager,
            config,
            schema: RwLock::new(None),
        }
    }

    /// Return the built schema, if the service has been started.
    pub async fn schema(&self) -> Option<CatalogSchema> {
        self.schema.read().await.clone()
    }

    /// Router with /graphql and /graphql/ws. Merge into the app and call
    /// `.with_state(state)` on the combined router.
    pub fn router() -> Router<AppState> {
        Router::new()
            .route("/graphql", get(graphiql).post(graphql_handler))
            .route("/graphql/ws", get(graphql_ws_handler))
    }
}

fn header_user_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_ID_HEADER).and_then(|h| h.to_str().ok())
}

async fn graphiql(headers: HeaderMap) -> impl IntoResponse {
    let accepts_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/html"))
        .unwrap_or(false);

    if accepts_html {
        Html(
            GraphiQLSource::build()
                .endpoint("/graphql")
                .subscription_endpoint("/graphql/ws")
                .finish(),
        )
        .into_response()
    } else {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            axum::Json(serde_json::json!({
                "error": "GET requests are not supported for GraphQL queries. Use POST with Content-Type: application/json"
            })),
        )
            .into_response()
    }
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let mut request = req.into_inner();
    match resolve_identity(header_user_id(&headers), state.config.default_user_id.as_deref()) {
        Some(user) => {
            tracing::debug!(user_id = %user.user_id, "Request identity");
            request = request.data(user);
        }
        None => tracing::debug!("Anonymous request"),
    }
    state.schema.execute(request).await.into()
}

/// `on_connection_init` callback for `/graphql/ws`: attaches the connection's
/// identity to every operation it runs. An anonymous connection is accepted.
pub async fn connection_init_data(
    params: serde_json::Value,
    header_user: Option<String>,
    default_user: Option<String>,
) -> async_graphql::Result<Data> {
    let mut data = Data::default();
    match resolve_connection_identity(&params, header_user.as_deref(), default_user.as_deref()) {
        Some(user) => {
            tracing::debug!(user_id = %user.user_id, "WebSocket identity");
            data.insert(user);
        }
        None => tracing::debug!("Anonymous WebSocket connection"),
    }
    Ok(data)
}

async fn graphql_ws_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    protocol: GraphQLProtocol,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let header_user = header_user_id(&headers).map(str::to_string);
    let default_user = state.config.default_user_id.clone();

    ws.protocols(["graphql-transport-ws", "graphql-ws"])
        .on_upgrade(move |socket| {
            GraphQLWebSocket::new(socket, state.schema.clone(), protocol)
                .on_connection_init(move |params| {
                    connection_init_data(params, header_user, default_user)
                })
                .serve()
        })
}

#[async_trait]
impl Service for GraphqlService {
    fn name(&self) -> &str {
        "graphql"
    }

    fn dependencies(&self) -> Vec<String> {
        vec!["database".to_string()]
    }

    async fn start(&self) -> Result<()> {
        info!(service = "graphql", "GraphQL service starting");
        let db = self
            .manager
            .get_database()
            .await
            .map(|svc| svc.pool().clone())
            .ok_or_else(|| anyhow::anyhow!("database service not available"))?;

        let schema = build_schema(&db, self.config.events.clone());
        *self.schema.write().await = Some(schema);

        info!(service = "graphql", "GraphQL service started");
        info!(
            service = "graphql",
            "GraphQL playground: http://localhost:{}/graphql",
            self.config.server_port
        );
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        *self.schema.write().await = None;
        info!(service = "graphql", "GraphQL service stopped");
        Ok(())
    }

    async fn health(&self) -> Result<ServiceHealth> {
        if self.schema.read().await.is_some() {
            Ok(ServiceHealth::healthy())
        } else {
            Ok(ServiceHealth::unhealthy("schema not built"))
        }
    }
}
