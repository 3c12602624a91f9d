//! Model module - journey types, catalog content and catalog access
//!
//! It is organized into submodules by responsibility:
//!
//! - `types`: Routes, legs and travel modes
//! - `content`: Catalog content and the unified `Playable` output
//! - `thumbnails`: Artwork variant selection
//! - `cache`: On-disk record of the generated playlist id
//! - `error`: Catalog error taxonomy
//! - `spotify_client`: The `Catalog` trait and its HTTP implementation

mod types;
mod content;
mod thumbnails;
mod cache;
mod error;
mod spotify_client;

pub use types::{Leg, LegMode, Mood, Route};

pub use content::{
    Album, AudioFeatures, Image, Playable, Playlist, PlaylistCreateRequest, PodcastEpisode,
    PodcastShow, Track, TrackWithFeatures, GENERATED_PLAYLIST_TITLE,
};

pub use thumbnails::{large_thumbnail, small_thumbnail, DESIRED_THUMBNAIL_WIDTH};

pub use cache::{PlaylistIdStore, PLAYLIST_ID_FILE};

pub use error::{CatalogError, CatalogResult};

pub use spotify_client::{Catalog, SpotifyClient, DEFAULT_API_BASE_URL};

#[cfg(test)]
pub(crate) use content::fixtures;
