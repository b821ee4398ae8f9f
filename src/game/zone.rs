use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::card::{CardInstance, WireCard};
use crate::catalog::cache::CatalogCache;
use crate::models::catalog::CatalogEntry;

/// The five game locations a card instance can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneKind {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Exile,
}

impl ZoneKind {
    pub const ALL: [ZoneKind; 5] = [
        ZoneKind::Library,
        ZoneKind::Hand,
        ZoneKind::Battlefield,
        ZoneKind::Graveyard,
        ZoneKind::Exile,
    ];

    /// Zones of a peer that other players are allowed to see in full.
    /// Hands and libraries stay hidden; only their counts travel.
    pub const PUBLIC: [ZoneKind; 3] = [
        ZoneKind::Battlefield,
        ZoneKind::Graveyard,
        ZoneKind::Exile,
    ];

    /// Field name of this zone in the persisted wire schema.
    pub fn key(&self) -> &'static str {
        match self {
            ZoneKind::Library => "library",
            ZoneKind::Hand => "hand",
            ZoneKind::Battlefield => "battlefield",
            ZoneKind::Graveyard => "graveyard",
            ZoneKind::Exile => "exile",
        }
    }
}

/// Wire form of one zone: card payloads keyed by instance id, plus the
/// ordering as a separate sequence.
///
/// The split exists so property changes (tap state) and position changes
/// patch independently. Invariant: `order` is a permutation of exactly the
/// keys of `cards_by_id`, maintained by the encoders and assumed by the
/// diff engine.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct WireZone {
    #[serde(rename = "cardsById")]
    pub cards_by_id: HashMap<Uuid, WireCard>,
    pub order: Vec<Uuid>,
}

/// The two historical encodings accepted from the store. Older rooms
/// persisted zones as a bare card array; current ones use map + order.
#[derive(Deserialize)]
#[serde(untagged)]
enum ZoneEncoding {
    MapForm {
        #[serde(rename = "cardsById", default)]
        cards_by_id: HashMap<Uuid, WireCard>,
        #[serde(default)]
        order: Vec<Uuid>,
    },
    LegacyList(Vec<CardInstance>),
}

impl WireZone {
    /// Deterministic encoding of an ordered card sequence.
    pub fn from_cards(cards: &[CardInstance]) -> Self {
        let mut cards_by_id = HashMap::with_capacity(cards.len());
        let mut order = Vec::with_capacity(cards.len());
        for card in cards {
            cards_by_id.insert(card.instance_id, WireCard::from_instance(card));
            order.push(card.instance_id);
        }
        Self { cards_by_id, order }
    }

    /// Normalizes any historical store value into the canonical form.
    ///
    /// Total over its input: nulls, the legacy array encoding, the map+order
    /// encoding, and unrecognizable shapes all come back as a usable zone
    /// (empty in the worst case), never as an error. Rooms written by older
    /// protocol versions must keep loading.
    pub fn decode(value: &Value) -> WireZone {
        match serde_json::from_value::<ZoneEncoding>(value.clone()) {
            Ok(ZoneEncoding::MapForm { cards_by_id, order }) => WireZone { cards_by_id, order },
            Ok(ZoneEncoding::LegacyList(cards)) => WireZone::from_cards(&cards),
            Err(_) => WireZone::default(),
        }
    }

    /// Rebuilds the ordered instance sequence. Ids in `order` with no map
    /// entry are skipped.
    pub fn instances(&self) -> Vec<CardInstance> {
        self.order
            .iter()
            .filter_map(|id| self.cards_by_id.get(id).map(|card| card.to_instance(*id)))
            .collect()
    }

    /// Catalog ids referenced by this zone, deduplicated for prefetch.
    pub fn card_ids(&self) -> HashSet<String> {
        self.cards_by_id
            .values()
            .map(|card| card.card_id.clone())
            .collect()
    }

    /// Resolves every card through the catalog cache into the display-ready
    /// projection. Unresolvable ids hydrate as placeholder entries.
    pub fn hydrate(&self, catalog: &CatalogCache) -> Vec<HydratedCard> {
        self.instances()
            .iter()
            .map(|card| HydratedCard {
                instance_id: card.instance_id,
                card: catalog.resolve(&card.card_id),
                tapped: card.tapped,
                face_down: card.face_down,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Checks the map/order permutation invariant.
    pub fn is_consistent(&self) -> bool {
        if self.order.len() != self.cards_by_id.len() {
            return false;
        }
        let seen: HashSet<&Uuid> = self.order.iter().collect();
        seen.len() == self.order.len() && self.cards_by_id.keys().all(|id| seen.contains(id))
    }
}

impl<'de> Deserialize<'de> for WireZone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(WireZone::decode(&value))
    }
}

/// Extracts the catalog ids a store-shaped zone value needs prefetched.
pub fn collect_card_ids(value: &Value) -> HashSet<String> {
    WireZone::decode(value).card_ids()
}

/// Hydrates a store-shaped zone value, whatever encoding it uses.
pub fn hydrate(value: &Value, catalog: &CatalogCache) -> Vec<HydratedCard> {
    WireZone::decode(value).hydrate(catalog)
}

/// Display-ready projection of one card: wire reference resolved into full
/// catalog metadata. Derived and disposable; never the source of truth.
#[derive(Debug, Clone, PartialEq)]
pub struct HydratedCard {
    pub instance_id: Uuid,
    pub card: CatalogEntry,
    pub tapped: bool,
    pub face_down: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cards(n: usize) -> Vec<CardInstance> {
        (0..n).map(|i| CardInstance::new(&format!("card-{i}"))).collect()
    }

    #[test]
    fn test_from_cards_preserves_order() {
        let cards = cards(3);
        let zone = WireZone::from_cards(&cards);

        let expected: Vec<Uuid> = cards.iter().map(|c| c.instance_id).collect();
        assert_eq!(zone.order, expected);
        assert_eq!(zone.cards_by_id.len(), 3);
        assert!(zone.is_consistent());
    }

    #[test]
    fn test_decode_map_form() {
        let id = Uuid::new_v4();
        let value = json!({
            "cardsById": { id.to_string(): { "cardId": "abc", "tapped": true } },
            "order": [id.to_string()],
        });

        let zone = WireZone::decode(&value);
        assert_eq!(zone.order, vec![id]);
        assert!(zone.cards_by_id[&id].tapped);
        assert!(!zone.cards_by_id[&id].face_down);
    }

    #[test]
    fn test_decode_legacy_array_form() {
        let id = Uuid::new_v4();
        let value = json!([
            { "instanceId": id.to_string(), "cardId": "abc", "faceDown": true }
        ]);

        // The legacy bare-array encoding normalizes to map + order.
        let zone = WireZone::decode(&value);
        assert_eq!(zone.order, vec![id]);
        assert!(zone.cards_by_id[&id].face_down);
    }

    #[test]
    fn test_decode_is_total_over_garbage() {
        for value in [json!(null), json!(42), json!("zone"), json!({ "what": [1, 2] })] {
            let zone = WireZone::decode(&value);
            assert!(zone.is_empty());
        }
    }

    #[test]
    fn test_round_trip_through_serde() {
        let zone = WireZone::from_cards(&cards(4));
        let value = serde_json::to_value(&zone).unwrap();
        let back: WireZone = serde_json::from_value(value).unwrap();
        assert_eq!(back, zone);
    }

    #[test]
    fn test_collect_card_ids_deduplicates() {
        let mut cards = cards(2);
        cards.push(CardInstance::new("card-0"));
        let value = serde_json::to_value(WireZone::from_cards(&cards)).unwrap();

        let ids = collect_card_ids(&value);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("card-0"));
        assert!(ids.contains("card-1"));
    }

    #[test]
    fn test_hydrate_never_fails_on_unknown_ids() {
        let catalog = CatalogCache::offline();
        let zone = WireZone::from_cards(&cards(2));

        let hydrated = zone.hydrate(&catalog);
        assert_eq!(hydrated.len(), 2);
        // Unresolvable ids hydrate to the placeholder, not an error.
        assert_eq!(hydrated[0].card.name, "Unknown card");
        assert_eq!(hydrated[0].card.id, "card-0");
    }

    #[test]
    fn test_hydrate_resolves_cached_entries() {
        let catalog = CatalogCache::offline();
        catalog.insert(crate::models::catalog::CatalogEntry {
            id: "card-0".to_string(),
            name: "Storm Crow".to_string(),
            mana_cost: "{1}{U}".to_string(),
            type_line: "Creature — Bird".to_string(),
            oracle_text: "Flying".to_string(),
            image_url: String::new(),
        });

        let zone = WireZone::from_cards(&cards(1));
        let hydrated = zone.hydrate(&catalog);
        assert_eq!(hydrated[0].card.name, "Storm Crow");
        assert_eq!(hydrated[0].instance_id, zone.order[0]);
    }

    #[test]
    fn test_is_consistent_catches_orphans() {
        let mut zone = WireZone::from_cards(&cards(2));
        zone.order.push(Uuid::new_v4());
        assert!(!zone.is_consistent());
    }
}
