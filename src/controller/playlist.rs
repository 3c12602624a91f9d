//! Resolves the one generated playlist this install reuses across journeys

use std::sync::Arc;

use tokio::sync::MutexGuard;

use crate::model::{Catalog, CatalogError, PlaylistCreateRequest, PlaylistIdStore};

use super::SoundtrackError;

pub const DEFAULT_PLAYLIST_NAME: &str = "Soundtrack Generated";
pub const DEFAULT_PLAYLIST_DESCRIPTION: &str =
    "Automatically generated playlist, refilled for every journey";

/// Outcome of checking the stored playlist id against the catalog
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaylistLookup {
    /// Stored and still present remotely
    Valid(String),
    /// Stored, but the catalog refused it
    Stale { id: String, status: u16 },
    /// Nothing stored yet
    Absent,
}

pub struct PlaylistIdentityManager {
    catalog: Arc<dyn Catalog>,
    store: PlaylistIdStore,
    request: PlaylistCreateRequest,
}

impl PlaylistIdentityManager {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        store: PlaylistIdStore,
        request: PlaylistCreateRequest,
    ) -> Self {
        Self {
            catalog,
            store,
            request,
        }
    }

    pub fn store(&self) -> &PlaylistIdStore {
        &self.store
    }

    pub async fn lookup(&self) -> Result<PlaylistLookup, SoundtrackError> {
        let Some(id) = self.store.load().await? else {
            return Ok(PlaylistLookup::Absent);
        };

        match self.catalog.playlist(&id).await {
            Ok(_) => Ok(PlaylistLookup::Valid(id)),
            Err(CatalogError::UnexpectedStatus(status)) => Ok(PlaylistLookup::Stale { id, status }),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns the stored id when the playlist still exists, otherwise
    /// creates a fresh playlist and records its id.
    pub async fn resolve(&self) -> Result<String, SoundtrackError> {
        self.claim().await?.commit().await
    }

    /// Like [`resolve`](Self::resolve), but a freshly created id is only
    /// recorded once the returned claim is committed. The record stays
    /// locked until then; dropping the claim leaves the record untouched.
    pub async fn claim(&self) -> Result<PlaylistClaim<'_>, SoundtrackError> {
        let writer = self.store.lock().await;

        match self.lookup().await? {
            PlaylistLookup::Valid(id) => {
                tracing::info!(playlist_id = %id, "Reusing generated playlist");
                return Ok(PlaylistClaim {
                    id,
                    created: false,
                    store: &self.store,
                    _writer: writer,
                });
            }
            PlaylistLookup::Stale { id, status } => {
                tracing::warn!(playlist_id = %id, status, "Stored playlist is gone, recreating");
            }
            PlaylistLookup::Absent => {
                tracing::info!("No generated playlist yet, creating one");
            }
        }

        let owner = self.catalog.current_user().await?;
        let id = self.catalog.create_playlist(&owner, &self.request).await?;
        tracing::info!(playlist_id = %id, owner = %owner, "Created generated playlist");
        Ok(PlaylistClaim {
            id,
            created: true,
            store: &self.store,
            _writer: writer,
        })
    }
}

/// A resolved playlist id holding the record lock
pub struct PlaylistClaim<'a> {
    id: String,
    created: bool,
    store: &'a PlaylistIdStore,
    _writer: MutexGuard<'a, ()>,
}

impl PlaylistClaim<'_> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the playlist was created by this claim
    pub fn created(&self) -> bool {
        self.created
    }

    /// Records a newly created id and releases the lock
    pub async fn commit(self) -> Result<String, SoundtrackError> {
        if self.created {
            self.store.save(&self.id).await?;
        }
        Ok(self.id)
    }
}
