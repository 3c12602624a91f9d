//! Catalog content: tracks, albums, podcast episodes, playlists and the
//! unified `Playable` shape everything is projected into.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::thumbnails::{large_thumbnail, small_thumbnail};

/// A saved track
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
    pub duration_ms: u64,
    pub popularity: u32,
}

impl Track {
    /// Whole seconds, truncated
    pub fn duration_secs(&self) -> i64 {
        (self.duration_ms / 1000) as i64
    }
}

/// Mood descriptors attached to a track, both normalized to 0..1
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct AudioFeatures {
    pub danceability: f32,
    pub energy: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackWithFeatures {
    pub track: Track,
    pub features: AudioFeatures,
}

/// One size variant of an artwork
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// An album from the user's library
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Album {
    pub name: String,
    pub artists: Vec<String>,
    pub tracks: Vec<Track>,
    pub images: Vec<Image>,
    pub uri: String,
}

impl Album {
    /// Total play time, recomputed from the tracks on every call
    pub fn runtime(&self) -> Duration {
        Duration::from_millis(self.tracks.iter().map(|t| t.duration_ms).sum())
    }

    pub fn artist_list(&self) -> String {
        self.artists.join(", ")
    }

    pub fn title(&self) -> String {
        format!("{} - {}", self.name, self.artist_list())
    }
}

/// A followed podcast show
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodcastShow {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodcastEpisode {
    pub name: String,
    pub duration_ms: u64,
    pub uri: String,
    pub release_date: String,
    pub images: Vec<Image>,
}

impl PodcastEpisode {
    pub fn runtime(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

/// Playlist metadata plus the tracks of its first page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub images: Vec<Image>,
    pub tracks: Vec<Track>,
}

/// Body of a create-playlist call
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlaylistCreateRequest {
    pub name: String,
    pub public: bool,
    pub collaborative: bool,
    pub description: String,
}

impl PlaylistCreateRequest {
    /// A private, non-collaborative playlist
    pub fn private(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public: false,
            collaborative: false,
            description: description.into(),
        }
    }
}

/// Title shown for the generated playlist
pub const GENERATED_PLAYLIST_TITLE: &str = "Auto generated playlist";

/// Anything the listener can pick for the journey, ready for display and
/// for handing its `uri` to a player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Playable {
    pub title: String,
    pub subtitle: String,
    pub uri: String,
    pub thumbnail_small_url: Option<String>,
    pub thumbnail_large_url: Option<String>,
    pub duration_mins: u64,
}

fn whole_minutes(duration: Duration) -> u64 {
    duration.as_secs() / 60
}

impl Playable {
    pub fn from_album(album: &Album, thumbnail_width: u32) -> Self {
        Self {
            title: album.name.clone(),
            subtitle: album.artist_list(),
            uri: album.uri.clone(),
            thumbnail_small_url: small_thumbnail(&album.images).map(str::to_string),
            thumbnail_large_url: large_thumbnail(&album.images, thumbnail_width)
                .map(str::to_string),
            duration_mins: whole_minutes(album.runtime()),
        }
    }

    pub fn from_episode(episode: &PodcastEpisode, thumbnail_width: u32) -> Self {
        Self {
            title: episode.name.clone(),
            subtitle: String::new(),
            uri: episode.uri.clone(),
            thumbnail_small_url: small_thumbnail(&episode.images).map(str::to_string),
            thumbnail_large_url: large_thumbnail(&episode.images, thumbnail_width)
                .map(str::to_string),
            duration_mins: whole_minutes(episode.runtime()),
        }
    }

    /// The generated playlist, with its play time taken from the tracks
    /// that were written to it rather than from the remote copy.
    pub fn from_generated_playlist(
        playlist_id: &str,
        images: &[Image],
        tracks: &[Track],
        thumbnail_width: u32,
    ) -> Self {
        let total_ms: u64 = tracks.iter().map(|t| t.duration_ms).sum();
        Self {
            title: GENERATED_PLAYLIST_TITLE.to_string(),
            subtitle: String::new(),
            uri: format!("spotify:playlist:{}", playlist_id),
            thumbnail_small_url: small_thumbnail(images).map(str::to_string),
            thumbnail_large_url: large_thumbnail(images, thumbnail_width).map(str::to_string),
            duration_mins: whole_minutes(Duration::from_millis(total_ms)),
        }
    }

    pub fn from_track(track: &Track) -> Self {
        Self {
            title: track.name.clone(),
            subtitle: track.artists.join(", "),
            uri: track.uri.clone(),
            thumbnail_small_url: None,
            thumbnail_large_url: None,
            duration_mins: whole_minutes(Duration::from_millis(track.duration_ms)),
        }
    }
}
