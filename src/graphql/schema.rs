//! GraphQL schema definition with queries, mutations, and subscriptions

use std::sync::Arc;

use async_graphql::extensions::Tracing;
use async_graphql::{MergedObject, Schema};

use crate::db::{ActorStore, Database, MovieStore};
use crate::services::events::EventBus;

use super::mutations::MovieMutations;
use super::queries::MovieQueries;
use super::subscriptions::SubscriptionRoot;
use super::types::Movie;

#[derive(MergedObject, Default)]
pub struct QueryRoot(MovieQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(MovieMutations);

/// The GraphQL schema type
pub type CatalogSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Build the schema over the SQLite-backed repositories
pub fn build_schema(db: &Database, events: Arc<EventBus<Movie>>) -> CatalogSchema {
    build_schema_with_stores(Arc::new(db.movies()), Arc::new(db.actors()), events)
}

/// Build the schema over any store implementations
pub fn build_schema_with_stores(
    movies: Arc<dyn MovieStore>,
    actors: Arc<dyn ActorStore>,
    events: Arc<EventBus<Movie>>,
) -> CatalogSchema {
    Schema::build(QueryRoot::default(), MutationRoot::default(), SubscriptionRoot)
        .extension(Tracing)
        .data(movies)
        .data(actors)
        .data(events)
        .finish()
}

/// SDL of the schema. Needs no storage.
pub fn schema_sdl() -> String {
    Schema::build(QueryRoot::default(), MutationRoot::default(), SubscriptionRoot)
        .finish()
        .sdl()
}
