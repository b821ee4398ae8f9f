use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::game::board::{PlayerBoard, STARTING_LIFE};
use crate::game::zone::{WireZone, ZoneKind};

fn default_life() -> i32 {
    STARTING_LIFE
}

/// Who a participant is, as the store and the UI see them.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerIdentity {
    pub uid: String,
    pub player_name: String,
}

impl PlayerIdentity {
    pub fn new(uid: &str, player_name: &str) -> Self {
        Self {
            uid: uid.to_string(),
            player_name: player_name.to_string(),
        }
    }
}

/// One participant's persisted state inside a room, exactly as laid out in
/// the wire schema. Every field defaults so partially-written or legacy
/// player subtrees still decode.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PlayerWireState {
    #[serde(default)]
    pub uid: String,
    #[serde(rename = "playerName", default)]
    pub player_name: String,
    #[serde(rename = "deckName", default)]
    pub deck_name: String,
    #[serde(default)]
    pub library: WireZone,
    #[serde(default)]
    pub hand: WireZone,
    #[serde(default)]
    pub battlefield: WireZone,
    #[serde(default)]
    pub graveyard: WireZone,
    #[serde(default)]
    pub exile: WireZone,
    /// Denormalized so peers can see hand size without hand contents.
    #[serde(rename = "handCount", default)]
    pub hand_count: usize,
    #[serde(rename = "libraryCount", default)]
    pub library_count: usize,
    #[serde(default = "default_life")]
    pub life: i32,
    #[serde(rename = "lastUpdate", default)]
    pub last_update: i64,
    #[serde(rename = "isOnline", default)]
    pub is_online: bool,
}

impl PlayerWireState {
    pub fn zone(&self, kind: ZoneKind) -> &WireZone {
        match kind {
            ZoneKind::Library => &self.library,
            ZoneKind::Hand => &self.hand,
            ZoneKind::Battlefield => &self.battlefield,
            ZoneKind::Graveyard => &self.graveyard,
            ZoneKind::Exile => &self.exile,
        }
    }

    /// A state worth restoring still has cards in hidden zones; an empty
    /// shell left by a half-finished join is rebuilt from the deck instead.
    pub fn is_restorable(&self) -> bool {
        !self.hand.is_empty() || !self.library.is_empty()
    }

    /// Rebuilds the local board from the persisted zones.
    pub fn to_board(&self) -> PlayerBoard {
        PlayerBoard {
            library: self.library.instances(),
            hand: self.hand.instances(),
            battlefield: self.battlefield.instances(),
            graveyard: self.graveyard.instances(),
            exile: self.exile.instances(),
            life: self.life,
        }
    }
}

/// A room's full persisted state.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RoomState {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
    #[serde(rename = "createdByUid", default)]
    pub created_by_uid: String,
    /// Append-only membership, in join order.
    #[serde(rename = "turnOrder", default)]
    pub turn_order: Vec<String>,
    #[serde(rename = "currentTurnIndex", default)]
    pub current_turn_index: usize,
    #[serde(default)]
    pub players: HashMap<String, PlayerWireState>,
}

impl RoomState {
    /// The participant whose turn it is. The stored index is normalized
    /// modulo the turn order length, so concurrent double-advances still
    /// land on a real participant.
    pub fn current_turn(&self) -> Option<&str> {
        if self.turn_order.is_empty() {
            return None;
        }
        let index = self.current_turn_index % self.turn_order.len();
        Some(&self.turn_order[index])
    }
}

/// Lightweight lobby projection of a room. Kept under `roomsIndex/` so a
/// lobby can subscribe without receiving every in-game zone update.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RoomIndexEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
    #[serde(rename = "createdByUid", default)]
    pub created_by_uid: String,
    #[serde(default)]
    pub players: HashMap<String, RoomIndexPlayer>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RoomIndexPlayer {
    #[serde(default)]
    pub uid: String,
    #[serde(rename = "playerName", default)]
    pub player_name: String,
    #[serde(rename = "deckName", default)]
    pub deck_name: String,
    #[serde(rename = "isOnline", default)]
    pub is_online: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_current_turn_wraps_modulo_length() {
        let room = RoomState {
            turn_order: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            current_turn_index: 4,
            ..Default::default()
        };
        assert_eq!(room.current_turn(), Some("b"));
    }

    #[test]
    fn test_current_turn_on_empty_order() {
        let room = RoomState::default();
        assert_eq!(room.current_turn(), None);
    }

    #[test]
    fn test_partial_player_state_decodes() {
        // A peer that only ever wrote presence still decodes cleanly.
        let value = json!({ "uid": "p1", "isOnline": true });
        let player: PlayerWireState = serde_json::from_value(value).unwrap();

        assert_eq!(player.uid, "p1");
        assert!(player.is_online);
        assert_eq!(player.life, STARTING_LIFE);
        assert!(player.hand.is_empty());
        assert!(!player.is_restorable());
    }

    #[test]
    fn test_room_with_legacy_zone_encodings_decodes() {
        let value = json!({
            "id": "r1",
            "players": {
                "p1": {
                    "uid": "p1",
                    "battlefield": [
                        { "instanceId": "6f7c0c55-2f96-4b7e-9d3c-27a4e0e2a1aa", "cardId": "abc" }
                    ],
                }
            }
        });

        let room: RoomState = serde_json::from_value(value).unwrap();
        let battlefield = &room.players["p1"].battlefield;
        assert_eq!(battlefield.len(), 1);
        assert!(battlefield.is_consistent());
    }
}
