use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::model::{PlayerIdentity, RoomIndexEntry, RoomState};
use crate::logger;
use crate::store::remote::{RemoteStore, StoreSubscription, StoreWrite};
use crate::utils::errors::RoomError;
use crate::utils::logger::Logger;

/// Room membership and turn tracking over the remote store.
///
/// Turn tracking is advisory UI state: any participant may mutate zones at
/// any time, and the shared turn fields resolve last-write-wins with no
/// version guard. Two concurrent `advance_turn` calls can both land and
/// skip a seat; that stays an accepted UX glitch, since the modeled game
/// enforces no turn rule anyway.
pub struct RoomCoordinator {
    store: Arc<dyn RemoteStore>,
}

impl RoomCoordinator {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Creates a new room and its lobby projection.
    ///
    /// # Arguments
    /// * `name` - Display name for the room.
    /// * `creator` - The creating participant; only this identity may later
    ///   cancel the room (enforced by the store's access rules).
    ///
    /// # Returns
    /// The generated room id.
    pub async fn create_room(
        &self,
        name: &str,
        creator: &PlayerIdentity,
    ) -> Result<String, RoomError> {
        let room_id = Uuid::new_v4().to_string();
        let created_at = Utc::now().timestamp_millis();

        let room = json!({
            "id": room_id,
            "name": name,
            "createdAt": created_at,
            "createdByUid": creator.uid,
            "turnOrder": [],
            "currentTurnIndex": 0,
        });
        let index_entry = json!({
            "id": room_id,
            "name": name,
            "createdAt": created_at,
            "createdByUid": creator.uid,
        });

        self.store
            .update(vec![
                StoreWrite::set(format!("rooms/{room_id}"), room),
                StoreWrite::set(format!("roomsIndex/{room_id}"), index_entry),
            ])
            .await?;

        logger!(INFO, "[ROOM] `{}` created room `{name}` ({room_id})", creator.uid);
        Ok(room_id)
    }

    /// Adds a participant to an existing room's turn order.
    ///
    /// Joining a room that does not exist is an error, never a create: a
    /// cancelled room must not be resurrected by a stale join attempt.
    /// Joining twice is a no-op.
    pub async fn join(
        &self,
        room_id: &str,
        identity: &PlayerIdentity,
        deck_name: &str,
    ) -> Result<(), RoomError> {
        let value = self
            .store
            .read(&format!("rooms/{room_id}"))
            .await?
            .filter(|v| !v.is_null())
            .ok_or_else(|| RoomError::RoomNotFound(room_id.to_string()))?;

        let room: RoomState = serde_json::from_value(value).unwrap_or_default();
        if room.turn_order.iter().any(|uid| uid == &identity.uid) {
            logger!(DEBUG, "[ROOM] `{}` already joined `{room_id}`", identity.uid);
            return Ok(());
        }

        let mut turn_order = room.turn_order;
        turn_order.push(identity.uid.clone());

        let index_player = json!({
            "uid": identity.uid,
            "playerName": identity.player_name,
            "deckName": deck_name,
            "isOnline": true,
        });

        self.store
            .update(vec![
                StoreWrite::set(format!("rooms/{room_id}/turnOrder"), json!(turn_order)),
                StoreWrite::set(
                    format!("roomsIndex/{room_id}/players/{}", identity.uid),
                    index_player,
                ),
            ])
            .await?;

        logger!(INFO, "[ROOM] `{}` joined room `{room_id}`", identity.uid);
        Ok(())
    }

    /// Advances the shared turn index, wrapping around the turn order.
    ///
    /// # Returns
    /// * `Ok(Some(index))` - The index written.
    /// * `Ok(None)` - The room has no participants yet; nothing written.
    pub async fn advance_turn(&self, room_id: &str) -> Result<Option<usize>, RoomError> {
        let Some(value) = self.store.read(&format!("rooms/{room_id}")).await? else {
            return Err(RoomError::RoomNotFound(room_id.to_string()));
        };
        let room: RoomState = serde_json::from_value(value).unwrap_or_default();
        if room.turn_order.is_empty() {
            return Ok(None);
        }

        let next = (room.current_turn_index + 1) % room.turn_order.len();
        self.store
            .write(&format!("rooms/{room_id}/currentTurnIndex"), json!(next))
            .await?;
        Ok(Some(next))
    }

    /// Deletes a room and its lobby entry.
    ///
    /// Creator-only: the store's access rules reject the write for anyone
    /// else, surfacing as `StoreError::PermissionDenied`. Not retried.
    pub async fn cancel_room(&self, room_id: &str) -> Result<(), RoomError> {
        self.store
            .update(vec![
                StoreWrite::delete(format!("rooms/{room_id}")),
                StoreWrite::delete(format!("roomsIndex/{room_id}")),
            ])
            .await?;

        logger!(INFO, "[ROOM] Room `{room_id}` cancelled");
        Ok(())
    }

    /// Lobby listing from the `roomsIndex` projection. Entries that fail to
    /// decode are skipped rather than failing the whole listing.
    pub async fn list_rooms(&self) -> Result<Vec<RoomIndexEntry>, RoomError> {
        let value = self.store.read("roomsIndex").await?;
        let Some(serde_json::Value::Object(entries)) = value else {
            return Ok(Vec::new());
        };

        let rooms = entries
            .into_values()
            .filter_map(|entry| serde_json::from_value::<RoomIndexEntry>(entry).ok())
            .collect();
        Ok(rooms)
    }

    /// Live lobby feed over the index projection, so the lobby never
    /// receives in-game zone traffic.
    pub async fn subscribe_lobby(&self) -> Result<StoreSubscription, RoomError> {
        let subscription = self.store.subscribe("roomsIndex").await?;
        Ok(subscription)
    }
}
