//! Integration tests for the GraphQL API
//!
//! Documents are executed directly against a schema built over an in-memory
//! SQLite database, the same way the HTTP handlers execute them.

use std::sync::Arc;

use async_graphql::{Request, Variables};
use movie_catalog::db::schema_sync::sync_schema;
use movie_catalog::db::{ActorRecord, Database};
use movie_catalog::graphql::{AuthUser, CatalogSchema, Movie, build_schema};
use movie_catalog::services::EventBus;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

struct Harness {
    db: Database,
    schema: CatalogSchema,
}

async fn harness() -> Harness {
    let db = Database::connect_in_memory().await.unwrap();
    let sync = sync_schema(db.pool()).await;
    assert!(sync.errors.is_empty(), "{:?}", sync.errors);
    let schema = build_schema(&db, Arc::new(EventBus::<Movie>::default()));
    Harness { db, schema }
}

fn as_user(query: &str) -> Request {
    Request::new(query).data(AuthUser {
        user_id: "tester".to_string(),
    })
}

/// Execute and return the whole response as JSON (`data` and `errors`)
async fn run(schema: &CatalogSchema, request: Request) -> Value {
    let response = schema.execute(request).await;
    serde_json::to_value(&response).unwrap()
}

fn actor(id: &str, name: &str) -> ActorRecord {
    ActorRecord {
        id: id.to_string(),
        name: name.to_string(),
    }
}

fn error_code(response: &Value) -> Option<&str> {
    response["errors"][0]["extensions"]["code"].as_str()
}

const ADD_DUNE: &str = r#"
    mutation {
        addMovie(movie: { title: "Dune", releaseDate: 1, rating: 9, status: INTERESTED, actorIds: [] }) {
            id title releaseDate rating status actorIds
        }
    }
"#;

// ============================================================================
// addMovie / movies
// ============================================================================

#[tokio::test]
async fn test_dune_scenario() {
    let h = harness().await;

    let response = run(&h.schema, as_user(ADD_DUNE)).await;
    assert_eq!(response.get("errors"), None, "{response}");

    let movies = response["data"]["addMovie"].as_array().unwrap();
    assert_eq!(movies.len(), 1);
    let dune = &movies[0];
    assert!(!dune["id"].as_str().unwrap().is_empty());
    assert_eq!(dune["title"], "Dune");
    assert_eq!(dune["releaseDate"], 1);
    assert_eq!(dune["rating"], 9);
    assert_eq!(dune["status"], "INTERESTED");
    assert_eq!(dune["actorIds"], json!([]));

    let listed = run(&h.schema, Request::new("{ movies { id title } }")).await;
    assert_eq!(
        listed["data"]["movies"],
        json!([{ "id": dune["id"], "title": "Dune" }])
    );
}

#[tokio::test]
async fn test_each_created_movie_listed_exactly_once() {
    let h = harness().await;

    let first = run(&h.schema, as_user(ADD_DUNE)).await;
    let id = first["data"]["addMovie"][0]["id"].clone();
    let second = run(
        &h.schema,
        as_user(r#"mutation { addMovie(movie: { title: "Arrival" }) { id title } }"#),
    )
    .await;

    let movies = second["data"]["addMovie"].as_array().unwrap();
    assert_eq!(movies.len(), 2);
    assert_eq!(movies.iter().filter(|m| m["id"] == id).count(), 1);

    // Storage order is creation order
    let titles: Vec<&str> = movies.iter().map(|m| m["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Dune", "Arrival"]);
}

#[tokio::test]
async fn test_add_movie_without_identity_is_unauthorized() {
    let h = harness().await;

    let response = run(&h.schema, Request::new(ADD_DUNE)).await;
    assert_eq!(error_code(&response), Some("UNAUTHORIZED"));
    assert_eq!(response["data"]["addMovie"], Value::Null);

    assert_eq!(h.db.movies().count().await.unwrap(), 0);
    let listed = run(&h.schema, Request::new("{ movies { id } }")).await;
    assert_eq!(listed["data"]["movies"], json!([]));
}

#[tokio::test]
async fn test_add_movie_without_input_creates_empty_movie() {
    let h = harness().await;

    let response = run(
        &h.schema,
        as_user("mutation { addMovie { id title releaseDate rating status actorIds } }"),
    )
    .await;
    assert_eq!(response.get("errors"), None, "{response}");

    let movie = &response["data"]["addMovie"][0];
    assert_eq!(movie["title"], "");
    assert_eq!(movie["releaseDate"], Value::Null);
    assert_eq!(movie["rating"], Value::Null);
    assert_eq!(movie["status"], Value::Null);
}

#[tokio::test]
async fn test_supplied_id_is_ignored_and_rating_unchecked() {
    let h = harness().await;

    let response = run(
        &h.schema,
        as_user(r#"mutation { addMovie(movie: { id: "mine", rating: -4 }) { id rating } }"#),
    )
    .await;

    let movie = &response["data"]["addMovie"][0];
    assert_ne!(movie["id"], "mine");
    assert_eq!(movie["rating"], -4);
}

// ============================================================================
// movie(id)
// ============================================================================

#[tokio::test]
async fn test_movie_by_id_returns_input_fields() {
    let h = harness().await;
    let created = run(&h.schema, as_user(ADD_DUNE)).await;
    let id = created["data"]["addMovie"][0]["id"].clone();

    let request = Request::new("query($id: ID) { movie(id: $id) { id title releaseDate rating status } }")
        .variables(Variables::from_json(json!({ "id": id })));
    let response = run(&h.schema, request).await;

    assert_eq!(
        response["data"]["movie"],
        json!({
            "id": id,
            "title": "Dune",
            "releaseDate": 1,
            "rating": 9,
            "status": "INTERESTED",
        })
    );
}

#[tokio::test]
async fn test_movie_unknown_or_missing_id_is_null() {
    let h = harness().await;
    run(&h.schema, as_user(ADD_DUNE)).await;

    let unknown = run(&h.schema, Request::new(r#"{ movie(id: "nope") { id } }"#)).await;
    assert_eq!(unknown.get("errors"), None);
    assert_eq!(unknown["data"]["movie"], Value::Null);

    let missing = run(&h.schema, Request::new("{ movie { id } }")).await;
    assert_eq!(missing.get("errors"), None);
    assert_eq!(missing["data"]["movie"], Value::Null);
}

// ============================================================================
// Date scalar
// ============================================================================

#[tokio::test]
async fn test_non_integer_date_literal_is_null_not_error() {
    let h = harness().await;

    let response = run(
        &h.schema,
        as_user(r#"mutation { addMovie(movie: { title: "Tenet", releaseDate: "yesterday" }) { title releaseDate } }"#),
    )
    .await;

    assert_eq!(response.get("errors"), None, "{response}");
    assert_eq!(
        response["data"]["addMovie"],
        json!([{ "title": "Tenet", "releaseDate": null }])
    );
}

#[tokio::test]
async fn test_non_integer_date_variable_is_null_not_error() {
    let h = harness().await;

    let request = as_user("mutation($movie: MovieInput) { addMovie(movie: $movie) { releaseDate } }")
        .variables(Variables::from_json(json!({
            "movie": { "releaseDate": 12.5 }
        })));
    let response = run(&h.schema, request).await;

    assert_eq!(response.get("errors"), None, "{response}");
    assert_eq!(response["data"]["addMovie"][0]["releaseDate"], Value::Null);
}

#[tokio::test]
async fn test_integral_float_date_variable_is_kept() {
    let h = harness().await;

    let request = as_user("mutation($movie: MovieInput) { addMovie(movie: $movie) { releaseDate } }")
        .variables(Variables::from_json(json!({
            "movie": { "title": "X", "releaseDate": 1_600_000_000_000.0 }
        })));
    let response = run(&h.schema, request).await;

    assert_eq!(response.get("errors"), None, "{response}");
    assert_eq!(
        response["data"]["addMovie"][0]["releaseDate"],
        1_600_000_000_000_i64
    );
}

#[tokio::test]
async fn test_date_round_trips_at_millisecond_precision() {
    let h = harness().await;
    let millis: i64 = 1_634_860_800_123;

    let request = as_user("mutation($d: Date) { addMovie(movie: { releaseDate: $d }) { id releaseDate } }")
        .variables(Variables::from_json(json!({ "d": millis })));
    let response = run(&h.schema, request).await;

    assert_eq!(response["data"]["addMovie"][0]["releaseDate"], millis);
    let stored: Vec<Option<i64>> = sqlx::query_scalar("SELECT release_date FROM movies")
        .fetch_all(h.db.pool())
        .await
        .unwrap();
    assert_eq!(stored, vec![Some(millis)]);
}

// ============================================================================
// Actors
// ============================================================================

#[tokio::test]
async fn test_actor_resolution_keeps_order_and_drops_unknown() {
    let h = harness().await;
    h.db
        .actors()
        .insert_missing(&[
            actor("a1", "Timothée Chalamet"),
            actor("a2", "Zendaya"),
            actor("a3", "Rebecca Ferguson"),
        ])
        .await
        .unwrap();

    let response = run(
        &h.schema,
        as_user(
            r#"mutation {
                addMovie(movie: { title: "Dune", actorIds: ["a2", "ghost", "a1"], actor: [{ id: "a3" }, { id: "a2" }] }) {
                    actorIds
                    actor { id name }
                }
            }"#,
        ),
    )
    .await;
    assert_eq!(response.get("errors"), None, "{response}");

    let movie = &response["data"]["addMovie"][0];
    assert_eq!(movie["actorIds"], json!(["a2", "ghost", "a1", "a3"]));
    assert_eq!(
        movie["actor"],
        json!([
            { "id": "a2", "name": "Zendaya" },
            { "id": "a1", "name": "Timothée Chalamet" },
            { "id": "a3", "name": "Rebecca Ferguson" },
        ])
    );
}

// ============================================================================
// Storage failures
// ============================================================================

#[tokio::test]
async fn test_storage_failure_is_an_error_not_empty_list() {
    let h = harness().await;
    h.db.close().await;

    let response = run(&h.schema, Request::new("{ movies { id } }")).await;
    assert_eq!(error_code(&response), Some("STORAGE_ERROR"));
    assert_eq!(response["data"]["movies"], Value::Null);

    let response = run(&h.schema, Request::new(r#"{ movie(id: "x") { id } }"#)).await;
    assert_eq!(error_code(&response), Some("STORAGE_ERROR"));

    let response = run(&h.schema, as_user(ADD_DUNE)).await;
    assert_eq!(error_code(&response), Some("STORAGE_ERROR"));
}
