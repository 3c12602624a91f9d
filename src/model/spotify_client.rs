//! Catalog client: authenticated REST access to the user's library

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use super::content::{
    Album, AudioFeatures, Image, Playlist, PlaylistCreateRequest, PodcastEpisode, PodcastShow,
    Track, TrackWithFeatures,
};
use super::error::{CatalogError, CatalogResult};

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// The audio-features endpoint accepts at most this many ids per call
const AUDIO_FEATURES_BATCH: usize = 100;

/// Remote music and podcast catalog.
///
/// Every method either returns the decoded value of a response carrying the
/// expected status, or the first [`CatalogError`] met. Nothing is retried.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// First page of the user's saved albums
    async fn saved_albums(&self) -> CatalogResult<Vec<Album>>;

    async fn saved_shows(&self, limit: u32) -> CatalogResult<Vec<PodcastShow>>;

    async fn show_episodes(&self, show_id: &str, limit: u32) -> CatalogResult<Vec<PodcastEpisode>>;

    async fn saved_tracks(&self, offset: u32, limit: u32) -> CatalogResult<Vec<Track>>;

    /// Features aligned with `track_ids`; `None` where the catalog has none
    async fn audio_features(&self, track_ids: &[String]) -> CatalogResult<Vec<Option<AudioFeatures>>>;

    async fn playlist(&self, playlist_id: &str) -> CatalogResult<Playlist>;

    /// Replaces the whole content of the playlist with `uris`
    async fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> CatalogResult<()>;

    /// Returns the new playlist's id
    async fn create_playlist(
        &self,
        owner_id: &str,
        request: &PlaylistCreateRequest,
    ) -> CatalogResult<String>;

    /// Id of the user the token belongs to
    async fn current_user(&self) -> CatalogResult<String>;

    /// Episodes of the first `show_limit` followed shows, in show order
    async fn podcast_episodes(
        &self,
        show_limit: u32,
        episodes_per_show: u32,
    ) -> CatalogResult<Vec<PodcastEpisode>> {
        let shows = self.saved_shows(show_limit).await?;
        let per_show = try_join_all(
            shows
                .iter()
                .map(|show| self.show_episodes(&show.id, episodes_per_show)),
        )
        .await?;
        Ok(per_show.into_iter().flatten().collect())
    }

    /// `pages` consecutive pages of saved tracks joined with their features
    async fn saved_tracks_with_features(
        &self,
        pages: u32,
        page_size: u32,
    ) -> CatalogResult<Vec<TrackWithFeatures>> {
        let pages = try_join_all(
            (0..pages).map(|page| self.saved_tracks(page * page_size, page_size)),
        )
        .await?;
        let tracks: Vec<Track> = pages.into_iter().flatten().collect();
        tracing::debug!(count = tracks.len(), "Fetched saved tracks");
        self.with_features(tracks).await
    }

    /// Tracks of an existing playlist joined with their features
    async fn playlist_tracks_with_features(
        &self,
        playlist_id: &str,
    ) -> CatalogResult<Vec<TrackWithFeatures>> {
        let playlist = self.playlist(playlist_id).await?;
        self.with_features(playlist.tracks).await
    }

    /// Pairs each track with its features, dropping tracks that have none
    async fn with_features(&self, tracks: Vec<Track>) -> CatalogResult<Vec<TrackWithFeatures>> {
        let ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
        let features = self.audio_features(&ids).await?;
        Ok(tracks
            .into_iter()
            .zip(features)
            .filter_map(|(track, features)| {
                features.map(|features| TrackWithFeatures { track, features })
            })
            .collect())
    }
}

// ============================================================================
// Wire format
// ============================================================================

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Page<T> {
    #[serde(default, deserialize_with = "null_as_empty")]
    items: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    id: Option<String>,
    uri: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    duration_ms: u64,
    #[serde(default)]
    popularity: u32,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl TrackObject {
    /// Local files carry no id and playlists may hold episodes; neither is
    /// a playable catalog track.
    fn into_track(self) -> Option<Track> {
        if self.kind.as_deref().is_some_and(|kind| kind != "track") {
            return None;
        }
        let id = self.id?;
        Some(Track {
            id,
            uri: self.uri,
            name: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            duration_ms: self.duration_ms,
            popularity: self.popularity,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SavedTrackObject {
    track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    name: String,
    uri: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    #[serde(default, deserialize_with = "null_as_empty")]
    images: Vec<Image>,
    #[serde(default)]
    tracks: Page<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct SavedAlbumObject {
    album: AlbumObject,
}

#[derive(Debug, Deserialize)]
struct ShowObject {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct SavedShowObject {
    show: ShowObject,
}

#[derive(Debug, Deserialize)]
struct EpisodeObject {
    name: String,
    duration_ms: u64,
    uri: String,
    #[serde(default)]
    release_date: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct PlaylistObject {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    images: Vec<Image>,
    #[serde(default)]
    tracks: Page<SavedTrackObject>,
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesResponse {
    audio_features: Vec<Option<AudioFeatures>>,
}

#[derive(Debug, Deserialize)]
struct UserObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SnapshotResponse {
    snapshot_id: String,
}

// ============================================================================
// HTTP client
// ============================================================================

/// Catalog client speaking the Spotify Web API
#[derive(Clone)]
pub struct SpotifyClient {
    http: Client,
    base_url: Arc<str>,
    access_token: Arc<str>,
}

impl SpotifyClient {
    pub fn new(access_token: &str, request_timeout: Duration) -> CatalogResult<Self> {
        Self::with_base_url(DEFAULT_API_BASE_URL, access_token, request_timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        access_token: &str,
        request_timeout: Duration,
    ) -> CatalogResult<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            access_token: Arc::from(access_token),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> CatalogResult<T> {
        crate::log_api_request!(operation, expected = expected.as_u16());
        let result = self.execute(request, expected).await;
        crate::log_api_result!(operation, result);
        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> CatalogResult<T> {
        let response = request.bearer_auth(&*self.access_token).send().await?;

        let status = response.status();
        if status != expected {
            return Err(CatalogError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> CatalogResult<T> {
        let request = self.http.get(self.url(endpoint)).query(query);
        self.call(operation, request, StatusCode::OK).await
    }

    async fn audio_features_batch(
        &self,
        track_ids: &[String],
    ) -> CatalogResult<Vec<Option<AudioFeatures>>> {
        let response: AudioFeaturesResponse = self
            .get("audio_features", "/audio-features", &[("ids", track_ids.join(","))])
            .await?;
        if response.audio_features.len() != track_ids.len() {
            tracing::warn!(
                requested = track_ids.len(),
                returned = response.audio_features.len(),
                "Audio features misaligned with request"
            );
            return Err(CatalogError::Decode(serde::de::Error::custom(format!(
                "expected {} audio features, got {}",
                track_ids.len(),
                response.audio_features.len()
            ))));
        }
        Ok(response.audio_features)
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    async fn saved_albums(&self) -> CatalogResult<Vec<Album>> {
        let page: Page<SavedAlbumObject> = self.get("saved_albums", "/me/albums", &[]).await?;
        Ok(page
            .items
            .into_iter()
            .map(|saved| {
                let album = saved.album;
                Album {
                    name: album.name,
                    artists: album.artists.into_iter().map(|a| a.name).collect(),
                    tracks: album
                        .tracks
                        .items
                        .into_iter()
                        .filter_map(TrackObject::into_track)
                        .collect(),
                    images: album.images,
                    uri: album.uri,
                }
            })
            .collect())
    }

    async fn saved_shows(&self, limit: u32) -> CatalogResult<Vec<PodcastShow>> {
        let page: Page<SavedShowObject> = self
            .get("saved_shows", "/me/shows", &[("limit", limit.to_string())])
            .await?;
        Ok(page
            .items
            .into_iter()
            .map(|saved| PodcastShow {
                id: saved.show.id,
                name: saved.show.name,
            })
            .collect())
    }

    async fn show_episodes(&self, show_id: &str, limit: u32) -> CatalogResult<Vec<PodcastEpisode>> {
        let endpoint = format!("/shows/{}/episodes", show_id);
        let page: Page<Option<EpisodeObject>> = self
            .get("show_episodes", &endpoint, &[("limit", limit.to_string())])
            .await?;
        Ok(page
            .items
            .into_iter()
            .flatten()
            .map(|episode| PodcastEpisode {
                name: episode.name,
                duration_ms: episode.duration_ms,
                uri: episode.uri,
                release_date: episode.release_date,
                images: episode.images,
            })
            .collect())
    }

    async fn saved_tracks(&self, offset: u32, limit: u32) -> CatalogResult<Vec<Track>> {
        let page: Page<SavedTrackObject> = self
            .get(
                "saved_tracks",
                "/me/tracks",
                &[("offset", offset.to_string()), ("limit", limit.to_string())],
            )
            .await?;
        Ok(page
            .items
            .into_iter()
            .filter_map(|saved| saved.track.and_then(TrackObject::into_track))
            .collect())
    }

    async fn audio_features(&self, track_ids: &[String]) -> CatalogResult<Vec<Option<AudioFeatures>>> {
        if track_ids.is_empty() {
            return Ok(Vec::new());
        }
        let batches = try_join_all(
            track_ids
                .chunks(AUDIO_FEATURES_BATCH)
                .map(|batch| self.audio_features_batch(batch)),
        )
        .await?;
        Ok(batches.into_iter().flatten().collect())
    }

    async fn playlist(&self, playlist_id: &str) -> CatalogResult<Playlist> {
        let endpoint = format!("/playlists/{}", playlist_id);
        let playlist: PlaylistObject = self.get("get_playlist", &endpoint, &[]).await?;
        Ok(Playlist {
            id: playlist.id,
            name: playlist.name,
            images: playlist.images,
            tracks: playlist
                .tracks
                .items
                .into_iter()
                .filter_map(|item| item.track.and_then(TrackObject::into_track))
                .collect(),
        })
    }

    async fn replace_playlist_tracks(&self, playlist_id: &str, uris: &[String]) -> CatalogResult<()> {
        let request = self
            .http
            .put(self.url(&format!("/playlists/{}/tracks", playlist_id)))
            .query(&[("uris", uris.join(","))])
            .json(&serde_json::json!({}));
        let snapshot: SnapshotResponse = self
            .call("replace_playlist_tracks", request, StatusCode::CREATED)
            .await?;
        tracing::debug!(
            playlist_id,
            snapshot_id = %snapshot.snapshot_id,
            count = uris.len(),
            "Playlist tracks replaced"
        );
        Ok(())
    }

    async fn create_playlist(
        &self,
        owner_id: &str,
        request: &PlaylistCreateRequest,
    ) -> CatalogResult<String> {
        let builder = self
            .http
            .post(self.url(&format!("/users/{}/playlists", owner_id)))
            .json(request);
        let created: CreatedPlaylist = self
            .call("create_playlist", builder, StatusCode::CREATED)
            .await?;
        Ok(created.id)
    }

    async fn current_user(&self) -> CatalogResult<String> {
        let user: UserObject = self.get("current_user", "/me", &[]).await?;
        Ok(user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const TOKEN: &str = "test-token";

    fn client(server: &Server) -> SpotifyClient {
        SpotifyClient::with_base_url(&server.url(), TOKEN, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_saved_albums_decodes_and_authenticates() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/me/albums")
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items": [{"added_at": "2024-01-01T00:00:00Z", "album": {
                    "name": "Blue",
                    "uri": "spotify:album:blue",
                    "artists": [{"name": "Joni"}, {"name": "Band"}],
                    "images": [{"url": "big", "width": 640, "height": 640}],
                    "tracks": {"items": [
                        {"id": "t1", "uri": "spotify:track:t1", "name": "All I Want", "duration_ms": 120500, "artists": [{"name": "Joni"}]},
                        {"id": "t2", "uri": "spotify:track:t2", "name": "My Old Man", "duration_ms": 60000, "artists": []}
                    ]}
                }}]}"#,
            )
            .create_async()
            .await;

        let albums = client(&server).saved_albums().await.unwrap();
        mock.assert_async().await;

        assert_eq!(albums.len(), 1);
        assert_eq!(albums[0].name, "Blue");
        assert_eq!(albums[0].artist_list(), "Joni, Band");
        assert_eq!(albums[0].tracks.len(), 2);
        assert_eq!(albums[0].runtime(), Duration::from_millis(180_500));
        assert_eq!(albums[0].images[0].width, Some(640));
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/playlists/gone")
            .with_status(404)
            .with_body(r#"{"error": {"status": 404, "message": "Not found."}}"#)
            .create_async()
            .await;

        let err = client(&server).playlist("gone").await.unwrap_err();
        assert!(matches!(err, CatalogError::UnexpectedStatus(404)));
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/me")
            .with_status(200)
            .with_body(r#"{"display_name": "no id here"}"#)
            .create_async()
            .await;

        let err = client(&server).current_user().await.unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_failure() {
        let client =
            SpotifyClient::with_base_url("http://127.0.0.1:1", TOKEN, Duration::from_secs(2))
                .unwrap();
        let err = client.current_user().await.unwrap_err();
        assert!(matches!(err, CatalogError::Transport(_)));
    }

    #[tokio::test]
    async fn test_replace_tracks_requires_created() {
        let mut server = Server::new_async().await;
        let created = server
            .mock("PUT", "/playlists/p1/tracks")
            .match_query(Matcher::UrlEncoded(
                "uris".into(),
                "spotify:track:a,spotify:track:b".into(),
            ))
            .with_status(201)
            .with_body(r#"{"snapshot_id": "snap"}"#)
            .create_async()
            .await;

        let uris = vec!["spotify:track:a".to_string(), "spotify:track:b".to_string()];
        client(&server)
            .replace_playlist_tracks("p1", &uris)
            .await
            .unwrap();
        created.assert_async().await;

        server
            .mock("PUT", "/playlists/p2/tracks")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"snapshot_id": "snap"}"#)
            .create_async()
            .await;

        let err = client(&server)
            .replace_playlist_tracks("p2", &uris)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnexpectedStatus(200)));
    }

    #[tokio::test]
    async fn test_create_playlist_posts_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/users/user-1/playlists")
            .match_body(Matcher::Json(serde_json::json!({
                "name": "Journey",
                "public": false,
                "collaborative": false,
                "description": "Generated"
            })))
            .with_status(201)
            .with_body(r#"{"id": "new-playlist", "name": "Journey"}"#)
            .create_async()
            .await;

        let request = PlaylistCreateRequest::private("Journey", "Generated");
        let id = client(&server)
            .create_playlist("user-1", &request)
            .await
            .unwrap();
        mock.assert_async().await;
        assert_eq!(id, "new-playlist");
    }

    #[tokio::test]
    async fn test_podcast_episodes_follow_show_order() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/me/shows")
            .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_body(r#"{"items": [{"show": {"id": "s1", "name": "One"}}, {"show": {"id": "s2", "name": "Two"}}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/shows/s1/episodes")
            .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_body(r#"{"items": [{"name": "e1", "duration_ms": 1800000, "uri": "spotify:episode:e1", "release_date": "2024-01-01", "images": []}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/shows/s2/episodes")
            .match_query(Matcher::UrlEncoded("limit".into(), "5".into()))
            .with_status(200)
            .with_body(r#"{"items": [null, {"name": "e2", "duration_ms": 2400000, "uri": "spotify:episode:e2", "release_date": "2024-02-01", "images": null}]}"#)
            .create_async()
            .await;

        let episodes = client(&server).podcast_episodes(5, 5).await.unwrap();
        let names: Vec<&str> = episodes.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["e1", "e2"]);
        assert_eq!(episodes[1].runtime(), Duration::from_secs(40 * 60));
    }

    #[tokio::test]
    async fn test_saved_tracks_with_features_skips_missing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/me/tracks")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "0".into()),
                Matcher::UrlEncoded("limit".into(), "50".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"items": [
                    {"track": {"id": "a", "uri": "spotify:track:a", "name": "A", "duration_ms": 200000, "popularity": 70, "artists": []}},
                    {"track": {"id": null, "uri": "spotify:local:x", "name": "Local", "duration_ms": 100000, "popularity": 0, "artists": []}},
                    {"track": {"id": "b", "uri": "spotify:track:b", "name": "B", "duration_ms": 180000, "popularity": 55, "artists": []}}
                ]}"#,
            )
            .create_async()
            .await;
        let features = server
            .mock("GET", "/audio-features")
            .match_query(Matcher::UrlEncoded("ids".into(), "a,b".into()))
            .with_status(200)
            .with_body(r#"{"audio_features": [null, {"danceability": 0.8, "energy": 0.9, "tempo": 120.0}]}"#)
            .create_async()
            .await;

        let tracks = client(&server)
            .saved_tracks_with_features(1, 50)
            .await
            .unwrap();
        features.assert_async().await;

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].track.id, "b");
        assert_eq!(tracks[0].track.popularity, 55);
        assert_eq!(tracks[0].features.energy, 0.9);
    }

    fn features_body(count: usize) -> String {
        let feature = r#"{"danceability": 0.5, "energy": 0.5}"#;
        format!(r#"{{"audio_features": [{}]}}"#, vec![feature; count].join(","))
    }

    #[tokio::test]
    async fn test_audio_features_batches_large_requests() {
        let mut server = Server::new_async().await;
        let ids: Vec<String> = (0..150).map(|i| format!("id{}", i)).collect();
        let first = server
            .mock("GET", "/audio-features")
            .match_query(Matcher::UrlEncoded("ids".into(), ids[..100].join(",")))
            .with_status(200)
            .with_body(features_body(100))
            .create_async()
            .await;
        let second = server
            .mock("GET", "/audio-features")
            .match_query(Matcher::UrlEncoded("ids".into(), ids[100..].join(",")))
            .with_status(200)
            .with_body(features_body(50))
            .create_async()
            .await;

        let features = client(&server).audio_features(&ids).await.unwrap();
        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(features.len(), 150);
    }

    #[tokio::test]
    async fn test_misaligned_audio_features_are_a_decode_failure() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/audio-features")
            .match_query(Matcher::UrlEncoded("ids".into(), "a,b".into()))
            .with_status(200)
            .with_body(r#"{"audio_features": [{"danceability": 0.8, "energy": 0.9}]}"#)
            .create_async()
            .await;

        let client = client(&server);
        let err = client
            .audio_features(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));

        let tracks = vec![
            crate::model::fixtures::track("a", 100),
            crate::model::fixtures::track("b", 100),
        ];
        let err = client.with_features(tracks).await.unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
    }

    #[tokio::test]
    async fn test_playlist_skips_episodes_and_null_items() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/playlists/p1")
            .with_status(200)
            .with_body(
                r#"{"id": "p1", "name": "Mix", "images": null, "tracks": {"items": [
                    {"track": null},
                    {"track": {"id": "e", "uri": "spotify:episode:e", "name": "Ep", "duration_ms": 100, "type": "episode"}},
                    {"track": {"id": "t", "uri": "spotify:track:t", "name": "T", "duration_ms": 100, "type": "track"}}
                ]}}"#,
            )
            .create_async()
            .await;

        let playlist = client(&server).playlist("p1").await.unwrap();
        assert!(playlist.images.is_empty());
        assert_eq!(playlist.tracks.len(), 1);
        assert_eq!(playlist.tracks[0].id, "t");
    }
}
