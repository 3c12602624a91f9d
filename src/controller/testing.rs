//! In-memory catalog used by controller tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::fixtures::image;
use crate::model::{
    Album, AudioFeatures, Catalog, CatalogError, CatalogResult, Playlist, PlaylistCreateRequest,
    PodcastEpisode, PodcastShow, Track, TrackWithFeatures,
};

#[derive(Default)]
struct FakeState {
    playlists: HashMap<String, Vec<String>>,
    created: Vec<(String, PlaylistCreateRequest)>,
    replaced: usize,
    next_id: usize,
}

#[derive(Default)]
pub struct FakeCatalog {
    albums: Vec<Album>,
    shows: Vec<(PodcastShow, Vec<PodcastEpisode>)>,
    saved: Vec<TrackWithFeatures>,
    albums_status: Option<u16>,
    create_status: Option<u16>,
    playlist_decode_failure: bool,
    saved_tracks_stalled: bool,
    state: Mutex<FakeState>,
}

fn decode_error() -> CatalogError {
    CatalogError::Decode(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
}

impl FakeCatalog {
    pub fn with_playlist(self, id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .playlists
            .insert(id.to_string(), Vec::new());
        self
    }

    pub fn with_albums(mut self, albums: Vec<Album>) -> Self {
        self.albums = albums;
        self
    }

    pub fn with_show(mut self, id: &str, episodes: Vec<PodcastEpisode>) -> Self {
        let show = PodcastShow {
            id: id.to_string(),
            name: id.to_string(),
        };
        self.shows.push((show, episodes));
        self
    }

    pub fn with_saved_tracks(mut self, tracks: Vec<TrackWithFeatures>) -> Self {
        self.saved = tracks;
        self
    }

    pub fn failing_albums(mut self, status: u16) -> Self {
        self.albums_status = Some(status);
        self
    }

    pub fn failing_create(mut self, status: u16) -> Self {
        self.create_status = Some(status);
        self
    }

    pub fn failing_playlist_decode(mut self) -> Self {
        self.playlist_decode_failure = true;
        self
    }

    /// Saved-track requests never complete
    pub fn stalled_saved_tracks(mut self) -> Self {
        self.saved_tracks_stalled = true;
        self
    }

    pub fn replace_count(&self) -> usize {
        self.state.lock().unwrap().replaced
    }

    pub fn created_count(&self) -> usize {
        self.state.lock().unwrap().created.len()
    }

    pub fn created_requests(&self) -> Vec<(String, PlaylistCreateRequest)> {
        self.state.lock().unwrap().created.clone()
    }

    /// Current uris of a playlist, `None` if it does not exist
    pub fn playlist_uris(&self, id: &str) -> Option<Vec<String>> {
        self.state.lock().unwrap().playlists.get(id).cloned()
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    async fn saved_albums(&self) -> CatalogResult<Vec<Album>> {
        if let Some(status) = self.albums_status {
            return Err(CatalogError::UnexpectedStatus(status));
        }
        Ok(self.albums.clone())
    }

    async fn saved_shows(&self, limit: u32) -> CatalogResult<Vec<PodcastShow>> {
        Ok(self
            .shows
            .iter()
            .take(limit as usize)
            .map(|(show, _)| show.clone())
            .collect())
    }

    async fn show_episodes(&self, show_id: &str, limit: u32) -> CatalogResult<Vec<PodcastEpisode>> {
        self.shows
            .iter()
            .find(|(show, _)| show.id == show_id)
            .map(|(_, episodes)| episodes.iter().take(limit as usize).cloned().collect())
            .ok_or(CatalogError::UnexpectedStatus(404))
    }

    async fn saved_tracks(&self, offset: u32, limit: u32) -> CatalogResult<Vec<Track>> {
        if self.saved_tracks_stalled {
            std::future::pending::<()>().await;
        }
        Ok(self
            .saved
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|candidate| candidate.track.clone())
            .collect())
    }

    async fn audio_features(&self, track_ids: &[String]) -> CatalogResult<Vec<Option<AudioFeatures>>> {
        Ok(track_ids
            .iter()
            .map(|id| {
                self.saved
                    .iter()
                    .find(|candidate| &candidate.track.id == id)
                    .map(|candidate| candidate.features)
            })
            .collect())
    }

    async fn playlist(&self, playlist_id: &str) -> CatalogResult<Playlist> {
        if self.playlist_decode_failure {
            return Err(decode_error());
        }
        let state = self.state.lock().unwrap();
        if !state.playlists.contains_key(playlist_id) {
            return Err(CatalogError::UnexpectedStatus(404));
        }
        Ok(Playlist {
            id: playlist_id.to_string(),
            name: "Generated".to_string(),
            images: vec![image("https://mosaic/640", 640), image("https://mosaic/300", 300)],
            tracks: Vec::new(),
        })
    }

    async fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> CatalogResult<()> {
        let mut state = self.state.lock().unwrap();
        state.replaced += 1;
        match state.playlists.get_mut(playlist_id) {
            Some(current) => {
                *current = uris.to_vec();
                Ok(())
            }
            None => Err(CatalogError::UnexpectedStatus(404)),
        }
    }

    async fn create_playlist(
        &self,
        owner_id: &str,
        request: &PlaylistCreateRequest,
    ) -> CatalogResult<String> {
        if let Some(status) = self.create_status {
            return Err(CatalogError::UnexpectedStatus(status));
        }
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("generated-{}", state.next_id);
        state.playlists.insert(id.clone(), Vec::new());
        state.created.push((owner_id.to_string(), request.clone()));
        Ok(id)
    }

    async fn current_user(&self) -> CatalogResult<String> {
        Ok("fake-user".to_string())
    }
}
