use super::prelude::*;

#[derive(Default)]
pub struct MovieMutations;

#[Object]
impl MovieMutations {
    /// Create a movie and return the full list. Requires an identity.
    async fn add_movie(
        &self,
        ctx: &Context<'_>,
        movie: Option<MovieInput>,
    ) -> Result<Option<Vec<Option<Movie>>>> {
        let user = ctx.auth_user()?;
        let store = ctx.data::<Arc<dyn MovieStore>>()?;
        let events = ctx.data::<Arc<EventBus<Movie>>>()?;

        let record = store
            .create_movie(movie.unwrap_or_default().into_create())
            .await
            .map_err(|e| storage_error("creating movie", e))?;

        tracing::info!(
            user_id = %user.user_id,
            movie_id = %record.id,
            title = record.title.as_deref().unwrap_or_default(),
            "User added movie"
        );

        events.publish(MOVIE_ADDED, Movie::from(record));

        let records = store
            .list_movies()
            .await
            .map_err(|e| storage_error("listing movies", e))?;

        Ok(Some(
            records.into_iter().map(|r| Some(Movie::from(r))).collect(),
        ))
    }
}
