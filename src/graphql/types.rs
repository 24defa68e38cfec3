//! GraphQL types for the movie catalog

use std::sync::Arc;

use async_graphql::{ComplexObject, Context, Enum, ID, InputObject, Result, SimpleObject};
use serde::{Deserialize, Serialize};

use crate::db::{ActorRecord, ActorStore, CreateMovie, MovieRecord};

use super::helpers::storage_error;
use super::scalars::Date;

/// Viewing status of a movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, Serialize, Deserialize)]
pub enum Status {
    Watched,
    Interested,
    NotInterested,
    Unknown,
}

impl Status {
    /// Name as stored in the database (same as the wire name)
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Watched => "WATCHED",
            Status::Interested => "INTERESTED",
            Status::NotInterested => "NOT_INTERESTED",
            Status::Unknown => "UNKNOWN",
        }
    }

    /// Parse a stored status. Unrecognized values read as `Unknown`.
    pub fn from_db(s: &str) -> Self {
        match s {
            "WATCHED" => Status::Watched,
            "INTERESTED" => Status::Interested,
            "NOT_INTERESTED" => Status::NotInterested,
            _ => Status::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, SimpleObject)]
pub struct Actor {
    pub id: ID,
    pub name: String,
}

impl From<ActorRecord> for Actor {
    fn from(r: ActorRecord) -> Self {
        Self {
            id: ID(r.id),
            name: r.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
#[graphql(complex)]
pub struct Movie {
    pub id: ID,
    pub title: String,
    pub release_date: Option<Date>,
    pub rating: Option<i32>,
    pub status: Option<Status>,
    /// Raw actor references, in stored order
    pub actor_ids: Vec<ID>,
}

#[ComplexObject]
impl Movie {
    /// Actors referenced by `actorIds`. Ids with no matching actor are skipped.
    async fn actor(&self, ctx: &Context<'_>) -> Result<Option<Vec<Option<Actor>>>> {
        let actors = ctx.data::<Arc<dyn ActorStore>>()?;
        let ids: Vec<String> = self.actor_ids.iter().map(|id| id.0.clone()).collect();

        let records = actors
            .get_actors_by_ids(&ids)
            .await
            .map_err(|e| storage_error("resolving actors", e))?;

        Ok(Some(
            records.into_iter().map(|r| Some(Actor::from(r))).collect(),
        ))
    }
}

impl From<MovieRecord> for Movie {
    fn from(r: MovieRecord) -> Self {
        Self {
            id: ID(r.id),
            // Title is optional in storage but non-null on the wire
            title: r.title.unwrap_or_default(),
            release_date: r.release_date.map(Date::from),
            rating: r.rating,
            status: r.status.as_deref().map(Status::from_db),
            actor_ids: r.actor_ids.into_iter().map(ID).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct ActorInput {
    pub id: Option<ID>,
}

/// Fields for a new movie. Every field is optional.
#[derive(Debug, Clone, Default, InputObject)]
pub struct MovieInput {
    /// Ignored; storage assigns the id
    pub id: Option<ID>,
    pub title: Option<String>,
    pub release_date: Option<Date>,
    pub rating: Option<i32>,
    pub status: Option<Status>,
    pub actor: Option<Vec<Option<ActorInput>>>,
    pub actor_ids: Option<Vec<ID>>,
}

impl MovieInput {
    /// Storage input. Invalid dates become "no release date"; actor
    /// references from `actorIds` then `actor[].id` are merged without duplicates.
    pub fn into_create(self) -> CreateMovie {
        let nested = self
            .actor
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|a| a.id);

        let mut actor_ids: Vec<String> = Vec::new();
        for id in self.actor_ids.into_iter().flatten().chain(nested) {
            let id = id.0;
            if !actor_ids.contains(&id) {
                actor_ids.push(id);
            }
        }

        CreateMovie {
            title: self.title,
            release_date: self.release_date.and_then(|d| d.instant()),
            rating: self.rating,
            status: self.status.map(|s| s.as_str().to_string()),
            actor_ids,
        }
    }
}
