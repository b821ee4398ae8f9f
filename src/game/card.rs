use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One physical copy of a card in play.
///
/// `instance_id` is minted once when a deck is instantiated into play
/// objects and is the identity zones and diffs track for the card's whole
/// lifetime; `card_id` only points at the catalog and is never identity.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CardInstance {
    #[serde(rename = "instanceId")]
    pub instance_id: Uuid,
    #[serde(rename = "cardId")]
    pub card_id: String,
    #[serde(default)]
    pub tapped: bool,
    #[serde(rename = "faceDown", default)]
    pub face_down: bool,
}

impl CardInstance {
    pub fn new(card_id: &str) -> Self {
        return Self {
            instance_id: Uuid::new_v4(),
            card_id: card_id.to_string(),
            tapped: false,
            face_down: false,
        };
    }
}

/// Compact wire form of a card. The instance id is not duplicated here; it
/// lives in the enclosing `cardsById` map key.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WireCard {
    #[serde(rename = "cardId")]
    pub card_id: String,
    #[serde(default)]
    pub tapped: bool,
    #[serde(rename = "faceDown", default)]
    pub face_down: bool,
}

impl WireCard {
    pub fn from_instance(card: &CardInstance) -> Self {
        Self {
            card_id: card.card_id.clone(),
            tapped: card.tapped,
            face_down: card.face_down,
        }
    }

    pub fn to_instance(&self, instance_id: Uuid) -> CardInstance {
        CardInstance {
            instance_id,
            card_id: self.card_id.clone(),
            tapped: self.tapped,
            face_down: self.face_down,
        }
    }
}

/// Sparse field patch for a card present in both snapshots of a diff. Only
/// fields that actually changed are set.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct CardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tapped: Option<bool>,
    #[serde(rename = "faceDown", skip_serializing_if = "Option::is_none")]
    pub face_down: Option<bool>,
}

impl CardPatch {
    pub fn is_empty(&self) -> bool {
        self.tapped.is_none() && self.face_down.is_none()
    }
}
