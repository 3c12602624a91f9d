//! Controller module - composes a soundtrack for a journey
//!
//! It is organized into submodules by responsibility:
//!
//! - `ranking`: Closeness-of-duration ranking for albums and episodes
//! - `fitting`: Mood pools and per-leg track fitting
//! - `playlist`: Resolution of the reusable generated playlist

mod fitting;
mod playlist;
mod ranking;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::config::SoundtrackSettings;
use crate::model::{Catalog, CatalogError, Playable, Route, Track};

pub use fitting::{
    fit_tracks, popular_only, MoodPools, DANCEABILITY_THRESHOLD, DEFAULT_POPULARITY_THRESHOLD,
    ENERGY_THRESHOLD,
};
pub use playlist::{
    PlaylistClaim, PlaylistIdentityManager, PlaylistLookup, DEFAULT_PLAYLIST_DESCRIPTION, DEFAULT_PLAYLIST_NAME,
};
pub use ranking::{rank_by_duration, DEFAULT_MAX_SUGGESTIONS, DEFAULT_TOLERANCE};

/// Anything that stops a composition
#[derive(Error, Debug)]
pub enum SoundtrackError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("playlist record unavailable: {0}")]
    Store(#[from] std::io::Error),
}

/// Builds the list of things to listen to during a journey
#[derive(Clone)]
pub struct SoundtrackComposer {
    catalog: Arc<dyn Catalog>,
    playlists: Arc<PlaylistIdentityManager>,
    settings: SoundtrackSettings,
}

impl SoundtrackComposer {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        playlists: PlaylistIdentityManager,
        settings: SoundtrackSettings,
    ) -> Self {
        Self {
            catalog,
            playlists: Arc::new(playlists),
            settings,
        }
    }

    fn tolerance(&self) -> Duration {
        Duration::from_secs(self.settings.tolerance_mins * 60)
    }

    /// The generated playlist first, then albums, then podcast episodes.
    ///
    /// The three branches run concurrently; the first failure cancels the
    /// others and is returned. Dropping the returned future cancels every
    /// request in flight.
    pub async fn compose(&self, route: &Route) -> Result<Vec<Playable>, SoundtrackError> {
        tracing::info!(
            duration_secs = route.duration_secs,
            legs = route.legs.len(),
            "Composing soundtrack"
        );

        let (playlist, albums, podcasts) = tokio::try_join!(
            self.generated_playlist(route),
            self.suggest_albums(route),
            self.suggest_podcasts(route)
        )?;

        tracing::info!(
            albums = albums.len(),
            podcasts = podcasts.len(),
            "Soundtrack composed"
        );

        let mut playables = Vec::with_capacity(1 + albums.len() + podcasts.len());
        playables.push(playlist);
        playables.extend(albums);
        playables.extend(podcasts);
        Ok(playables)
    }

    pub async fn suggest_albums(&self, route: &Route) -> Result<Vec<Playable>, SoundtrackError> {
        let albums = self.catalog.saved_albums().await?;
        let ranked = rank_by_duration(
            route.duration(),
            albums,
            |album| album.runtime(),
            self.tolerance(),
            self.settings.max_suggestions,
        );
        tracing::debug!(count = ranked.len(), "Ranked albums");
        Ok(ranked
            .iter()
            .map(|album| Playable::from_album(album, self.settings.thumbnail_width))
            .collect())
    }

    pub async fn suggest_podcasts(&self, route: &Route) -> Result<Vec<Playable>, SoundtrackError> {
        let episodes = self
            .catalog
            .podcast_episodes(
                self.settings.podcast_show_limit,
                self.settings.episodes_per_show,
            )
            .await?;
        let ranked = rank_by_duration(
            route.duration(),
            episodes,
            |episode| episode.runtime(),
            self.tolerance(),
            self.settings.max_suggestions,
        );
        tracing::debug!(count = ranked.len(), "Ranked podcast episodes");
        Ok(ranked
            .iter()
            .map(|episode| Playable::from_episode(episode, self.settings.thumbnail_width))
            .collect())
    }

    /// Fills the generated playlist for this route and describes it
    pub async fn generated_playlist(&self, route: &Route) -> Result<Playable, SoundtrackError> {
        let (tracks, claim) =
            tokio::try_join!(self.generate_track_list(route), self.playlists.claim())?;
        let playlist_id = claim.commit().await?;

        let uris: Vec<String> = tracks.iter().map(|t| t.uri.clone()).collect();
        self.catalog
            .replace_playlist_tracks(&playlist_id, &uris)
            .await?;

        let playlist = self.catalog.playlist(&playlist_id).await?;
        Ok(Playable::from_generated_playlist(
            &playlist_id,
            &playlist.images,
            &tracks,
            self.settings.thumbnail_width,
        ))
    }

    /// Tracks for every leg of the route, in leg order
    pub async fn generate_track_list(&self, route: &Route) -> Result<Vec<Track>, SoundtrackError> {
        let candidates = match &self.settings.seed_playlist {
            Some(seed) => self.catalog.playlist_tracks_with_features(seed).await?,
            None => {
                self.catalog
                    .saved_tracks_with_features(
                        self.settings.saved_track_pages,
                        self.settings.saved_track_page_size,
                    )
                    .await?
            }
        };
        let candidates = popular_only(candidates, self.settings.popularity_threshold);

        let mut pools = MoodPools::partition(candidates, &mut rand::rng());
        Ok(pools.fit_legs(&route.legs))
    }
}
