use std::collections::HashMap;

use serde_json::json;
use uuid::Uuid;

use super::card::{CardPatch, WireCard};
use super::zone::WireZone;
use crate::store::remote::StoreWrite;

/// Minimal structured difference between two wire snapshots of one zone.
///
/// Property changes cost one field write each, membership changes cost one
/// write per card, and only a reorder costs the whole `order` sequence:
/// partial reorders are not compactly expressible, so order patches are
/// all-or-nothing. The engine does not validate the result against the
/// map/order invariant; callers diff matched encoded pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneDiff {
    /// Cards present in the current snapshot only, with full payloads.
    pub added_cards: HashMap<Uuid, WireCard>,
    /// Instance ids present in the previous snapshot only.
    pub removed_card_ids: Vec<Uuid>,
    /// Per-card sparse patches for instances present in both snapshots.
    pub updated_cards: HashMap<Uuid, CardPatch>,
    /// The complete new sequence, set iff the order changed at all.
    pub new_order: Option<Vec<Uuid>>,
}

impl ZoneDiff {
    /// Computes the patch taking `previous` to `current`.
    ///
    /// # Returns
    /// * `None` - when `previous` is absent (the caller must send full
    ///   state) or when nothing differs (nothing to send).
    /// * `Some(ZoneDiff)` - the minimal patch otherwise.
    pub fn between(previous: Option<&WireZone>, current: &WireZone) -> Option<ZoneDiff> {
        let previous = previous?;
        let mut diff = ZoneDiff::default();

        for (id, card) in &current.cards_by_id {
            match previous.cards_by_id.get(id) {
                None => {
                    diff.added_cards.insert(*id, card.clone());
                }
                Some(before) => {
                    let mut patch = CardPatch::default();
                    if before.tapped != card.tapped {
                        patch.tapped = Some(card.tapped);
                    }
                    if before.face_down != card.face_down {
                        patch.face_down = Some(card.face_down);
                    }
                    if !patch.is_empty() {
                        diff.updated_cards.insert(*id, patch);
                    }
                }
            }
        }

        for id in previous.cards_by_id.keys() {
            if !current.cards_by_id.contains_key(id) {
                diff.removed_card_ids.push(*id);
            }
        }

        if previous.order != current.order {
            diff.new_order = Some(current.order.clone());
        }

        if diff.is_empty() {
            return None;
        }
        Some(diff)
    }

    pub fn is_empty(&self) -> bool {
        self.added_cards.is_empty()
            && self.removed_card_ids.is_empty()
            && self.updated_cards.is_empty()
            && self.new_order.is_none()
    }

    /// Translates the diff into point writes under the zone's store path.
    ///
    /// One write per added card, one delete per removed card, one write per
    /// changed field per updated card, and one write for the whole order
    /// sequence when it changed. The remote payload stays proportional to
    /// the change, not to the zone size.
    pub fn into_writes(self, base_path: &str) -> Vec<StoreWrite> {
        let mut writes = Vec::new();

        for (id, card) in self.added_cards {
            writes.push(StoreWrite::set(
                format!("{base_path}/cardsById/{id}"),
                json!(card),
            ));
        }
        for id in self.removed_card_ids {
            writes.push(StoreWrite::delete(format!("{base_path}/cardsById/{id}")));
        }
        for (id, patch) in self.updated_cards {
            if let Some(tapped) = patch.tapped {
                writes.push(StoreWrite::set(
                    format!("{base_path}/cardsById/{id}/tapped"),
                    json!(tapped),
                ));
            }
            if let Some(face_down) = patch.face_down {
                writes.push(StoreWrite::set(
                    format!("{base_path}/cardsById/{id}/faceDown"),
                    json!(face_down),
                ));
            }
        }
        if let Some(order) = self.new_order {
            writes.push(StoreWrite::set(format!("{base_path}/order"), json!(order)));
        }

        writes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::card::CardInstance;
    use crate::store::memory::MemoryStore;
    use crate::store::remote::RemoteStore;

    fn cards(n: usize) -> Vec<CardInstance> {
        (0..n).map(|i| CardInstance::new(&format!("card-{i}"))).collect()
    }

    #[test]
    fn test_no_previous_means_full_state() {
        let zone = WireZone::from_cards(&cards(2));
        assert!(ZoneDiff::between(None, &zone).is_none());
    }

    #[test]
    fn test_identical_snapshots_produce_nothing() {
        let zone = WireZone::from_cards(&cards(3));
        assert!(ZoneDiff::between(Some(&zone), &zone).is_none());
    }

    #[test]
    fn test_single_tap_is_minimal() {
        let mut cards = cards(5);
        let before = WireZone::from_cards(&cards);
        cards[2].tapped = true;
        let after = WireZone::from_cards(&cards);

        let diff = ZoneDiff::between(Some(&before), &after).unwrap();
        // Exactly one card with exactly one changed field; nothing else.
        assert_eq!(diff.updated_cards.len(), 1);
        let patch = &diff.updated_cards[&cards[2].instance_id];
        assert_eq!(patch.tapped, Some(true));
        assert_eq!(patch.face_down, None);
        assert!(diff.added_cards.is_empty());
        assert!(diff.removed_card_ids.is_empty());
        assert!(diff.new_order.is_none());
    }

    #[test]
    fn test_addition_and_removal_are_tracked() {
        let before_cards = cards(3);
        let before = WireZone::from_cards(&before_cards);

        let mut after_cards = before_cards[1..].to_vec();
        let incoming = CardInstance::new("card-new");
        after_cards.push(incoming.clone());
        let after = WireZone::from_cards(&after_cards);

        let diff = ZoneDiff::between(Some(&before), &after).unwrap();
        assert_eq!(diff.removed_card_ids, vec![before_cards[0].instance_id]);
        assert_eq!(diff.added_cards.len(), 1);
        assert!(diff.added_cards.contains_key(&incoming.instance_id));
        // Membership changed, so the order sequence travels too.
        assert!(diff.new_order.is_some());
    }

    #[test]
    fn test_reorder_sends_whole_order_and_nothing_else() {
        let mut cards = cards(4);
        let before = WireZone::from_cards(&cards);
        cards.swap(0, 3);
        let after = WireZone::from_cards(&cards);

        let diff = ZoneDiff::between(Some(&before), &after).unwrap();
        assert_eq!(diff.new_order.as_ref().unwrap(), &after.order);
        assert!(diff.added_cards.is_empty());
        assert!(diff.removed_card_ids.is_empty());
        assert!(diff.updated_cards.is_empty());
    }

    #[test]
    fn test_into_writes_touches_one_path_per_field() {
        let mut cards = cards(2);
        let before = WireZone::from_cards(&cards);
        cards[0].tapped = true;
        let after = WireZone::from_cards(&cards);

        let diff = ZoneDiff::between(Some(&before), &after).unwrap();
        let writes = diff.into_writes("rooms/r/players/p/battlefield");

        assert_eq!(writes.len(), 1);
        let expected = format!(
            "rooms/r/players/p/battlefield/cardsById/{}/tapped",
            cards[0].instance_id
        );
        assert_eq!(writes[0].path, expected);
        assert_eq!(writes[0].value, Some(json!(true)));
    }

    /// Applying `diff(A, B)` on top of A through the store yields B.
    #[tokio::test]
    async fn test_diff_apply_round_trip() {
        let mut deck = cards(6);
        let before = WireZone::from_cards(&deck);

        // Tap one, flip one, drop one, add one, and reorder.
        deck[0].tapped = true;
        deck[1].face_down = true;
        deck.remove(4);
        deck.push(CardInstance::new("card-extra"));
        deck.swap(0, 2);
        let after = WireZone::from_cards(&deck);

        let store = MemoryStore::new();
        let path = "rooms/r/players/p/battlefield";
        store
            .write(path, serde_json::to_value(&before).unwrap())
            .await
            .unwrap();

        let diff = ZoneDiff::between(Some(&before), &after).unwrap();
        store.update(diff.into_writes(path)).await.unwrap();

        let stored = store.read(path).await.unwrap().unwrap();
        let round_tripped = WireZone::decode(&stored);
        assert_eq!(round_tripped.cards_by_id, after.cards_by_id);
        assert_eq!(round_tripped.order, after.order);
    }
}
