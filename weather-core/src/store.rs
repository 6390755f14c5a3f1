//! Saved-locations list with write-through persistence.
//!
//! The in-memory list is authoritative for reads. Every mutation rewrites the
//! whole list under [`LOCATIONS_KEY`]. Storage failures are logged and
//! swallowed: the list keeps working for the rest of the session.

use std::sync::Arc;

use tokio::sync::{Mutex, watch};

use crate::{error::PersistenceError, model::SavedLocation, storage::KeyValueStore};

/// Key under which the serialized list lives.
pub const LOCATIONS_KEY: &str = "savedLocations";

#[derive(Debug)]
pub struct LocationStore {
    backend: Arc<dyn KeyValueStore>,
    // Held across the mutation and its persistence write.
    locations: Mutex<Vec<SavedLocation>>,
    updates: watch::Sender<Vec<SavedLocation>>,
}

impl LocationStore {
    /// Load the saved list from `backend`. Never fails.
    pub async fn initialize(backend: Arc<dyn KeyValueStore>) -> Self {
        let locations = match load(backend.as_ref()).await {
            Ok(locations) => locations,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load locations from store");
                Vec::new()
            }
        };

        tracing::debug!(count = locations.len(), "loaded saved locations");

        let (updates, _) = watch::channel(locations.clone());
        Self {
            backend,
            locations: Mutex::new(locations),
            updates,
        }
    }

    pub async fn list(&self) -> Vec<SavedLocation> {
        self.locations.lock().await.clone()
    }

    /// Receives the full list after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<Vec<SavedLocation>> {
        self.updates.subscribe()
    }

    /// Append `location` unless one with the same coordinates is saved.
    pub async fn add(&self, location: SavedLocation) {
        let mut locations = self.locations.lock().await;

        if locations.iter().any(|l| l.same_place(&location)) {
            tracing::info!(
                name = %location.name,
                lat = location.lat,
                lon = location.lon,
                "Location already exists."
            );
            return;
        }

        tracing::info!(name = %location.name, "adding saved location");
        locations.push(location);
        self.commit(&locations).await;
    }

    /// Drop every entry at the same coordinates as `location`.
    pub async fn remove(&self, location: &SavedLocation) {
        let mut locations = self.locations.lock().await;

        let before = locations.len();
        locations.retain(|l| !l.same_place(location));
        tracing::info!(
            lat = location.lat,
            lon = location.lon,
            removed = before - locations.len(),
            "removing saved location"
        );

        self.commit(&locations).await;
    }

    async fn commit(&self, locations: &[SavedLocation]) {
        self.updates.send_replace(locations.to_vec());

        if let Err(e) = persist(self.backend.as_ref(), locations).await {
            tracing::error!(error = %e, "Failed to save locations to store");
        }
    }
}

async fn load(backend: &dyn KeyValueStore) -> Result<Vec<SavedLocation>, PersistenceError> {
    match backend.get(LOCATIONS_KEY).await? {
        Some(json) if !json.is_empty() => Ok(serde_json::from_str(&json)?),
        _ => Ok(Vec::new()),
    }
}

async fn persist(
    backend: &dyn KeyValueStore,
    locations: &[SavedLocation],
) -> Result<(), PersistenceError> {
    let json = serde_json::to_string(locations)?;
    backend.set(LOCATIONS_KEY, &json).await
}
