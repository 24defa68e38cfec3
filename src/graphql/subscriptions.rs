//! GraphQL subscriptions for real-time updates
//!
//! Subscriptions allow clients to receive push updates over WebSocket.

use std::sync::Arc;

use async_graphql::{Context, Result, Subscription};
use futures::Stream;
use tokio_stream::StreamExt;

use crate::services::events::{EventBus, MOVIE_ADDED};

use super::auth::AuthExt;
use super::types::Movie;

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Every movie created after the subscription opened
    async fn movie_added<'ctx>(
        &self,
        ctx: &Context<'ctx>,
    ) -> Result<impl Stream<Item = Option<Movie>> + 'ctx> {
        let events = ctx.data::<Arc<EventBus<Movie>>>()?;
        tracing::debug!(
            user_id = ctx.try_auth_user().map(|u| u.user_id.as_str()),
            "Opened movieAdded subscription"
        );

        Ok(events.subscribe(&[MOVIE_ADDED]).map(Some))
    }
}
