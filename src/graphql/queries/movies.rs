use super::prelude::*;

#[derive(Default)]
pub struct MovieQueries;

#[Object]
impl MovieQueries {
    /// All movies, in storage order
    async fn movies(&self, ctx: &Context<'_>) -> Result<Option<Vec<Option<Movie>>>> {
        let store = ctx.data::<Arc<dyn MovieStore>>()?;

        let records = store
            .list_movies()
            .await
            .map_err(|e| storage_error("listing movies", e))?;

        Ok(Some(
            records.into_iter().map(|r| Some(Movie::from(r))).collect(),
        ))
    }

    /// A single movie by id; null when there is none
    async fn movie(&self, ctx: &Context<'_>, id: Option<ID>) -> Result<Option<Movie>> {
        let Some(id) = id else {
            return Ok(None);
        };
        let store = ctx.data::<Arc<dyn MovieStore>>()?;

        let record = store
            .get_movie(&id)
            .await
            .map_err(|e| storage_error("loading movie", e))?;

        Ok(record.map(Movie::from))
    }
}
