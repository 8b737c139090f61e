use futures_util::{StreamExt, stream};
use log::debug;
use mlb_api::client::{ApiResult, MlbApi};
use mlb_api::{GameId, RawPayload};
use std::num::NonZeroUsize;

/// Anything that can hand over the live feed for a game id.
pub trait GameSource {
    fn game_feed(&self, game_id: GameId) -> impl Future<Output = ApiResult<RawPayload>>;
}

impl GameSource for MlbApi {
    async fn game_feed(&self, game_id: GameId) -> ApiResult<RawPayload> {
        self.fetch_game_feed(game_id).await
    }
}

pub type Fetched = (GameId, ApiResult<RawPayload>);

/// Fetch every id, at most `concurrency` requests in flight (`None` issues
/// them all at once).
///
/// Returns one entry per id in the order given, however the requests
/// finish. A failed request only fails its own entry.
pub async fn fetch_all<S: GameSource>(
    source: &S,
    ids: &[GameId],
    concurrency: Option<NonZeroUsize>,
) -> Vec<Fetched> {
    let limit = concurrency.map_or(ids.len(), NonZeroUsize::get).max(1);
    debug!("fetching {} games, {limit} at a time", ids.len());

    stream::iter(ids.iter().copied())
        .map(|game_id| async move { (game_id, source.game_feed(game_id).await) })
        .buffered(limit)
        .collect()
        .await
}
