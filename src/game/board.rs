use rand::seq::SliceRandom;
use uuid::Uuid;

use super::card::CardInstance;
use super::zone::{WireZone, ZoneKind};
use crate::models::deck::Deck;

pub const STARTING_LIFE: i32 = 20;

/// One player's complete local play state: the five zones plus life.
///
/// This is the authoritative local state the synchronizer observes. Each
/// zone is an ordered sequence; index 0 is the top of the pile where that
/// matters (draws come off the front of the library).
#[derive(Debug, Clone, Default)]
pub struct PlayerBoard {
    pub library: Vec<CardInstance>,
    pub hand: Vec<CardInstance>,
    pub battlefield: Vec<CardInstance>,
    pub graveyard: Vec<CardInstance>,
    pub exile: Vec<CardInstance>,
    pub life: i32,
}

impl PlayerBoard {
    pub fn new() -> Self {
        Self {
            life: STARTING_LIFE,
            ..Default::default()
        }
    }

    /// Instantiates a decklist into play objects: every physical copy gets
    /// its own fresh instance id, then the library is shuffled.
    pub fn from_deck(deck: &Deck) -> Self {
        let mut board = PlayerBoard::new();
        for line in &deck.cards {
            for _ in 0..line.amount {
                board.library.push(CardInstance::new(&line.card_id));
            }
        }
        board.shuffle_library();
        return board;
    }

    pub fn zone(&self, kind: ZoneKind) -> &Vec<CardInstance> {
        match kind {
            ZoneKind::Library => &self.library,
            ZoneKind::Hand => &self.hand,
            ZoneKind::Battlefield => &self.battlefield,
            ZoneKind::Graveyard => &self.graveyard,
            ZoneKind::Exile => &self.exile,
        }
    }

    pub fn zone_mut(&mut self, kind: ZoneKind) -> &mut Vec<CardInstance> {
        match kind {
            ZoneKind::Library => &mut self.library,
            ZoneKind::Hand => &mut self.hand,
            ZoneKind::Battlefield => &mut self.battlefield,
            ZoneKind::Graveyard => &mut self.graveyard,
            ZoneKind::Exile => &mut self.exile,
        }
    }

    /// Uniform Fisher-Yates shuffle of the library.
    pub fn shuffle_library(&mut self) {
        self.library.shuffle(&mut rand::thread_rng());
    }

    pub fn encode_zone(&self, kind: ZoneKind) -> WireZone {
        WireZone::from_cards(self.zone(kind))
    }

    /// Zone currently holding the given instance, if any.
    pub fn locate(&self, instance_id: Uuid) -> Option<ZoneKind> {
        ZoneKind::ALL
            .into_iter()
            .find(|kind| self.zone(*kind).iter().any(|c| c.instance_id == instance_id))
    }

    /// Removes the instance from whichever zone holds it.
    pub fn take(&mut self, instance_id: Uuid) -> Option<(ZoneKind, CardInstance)> {
        for kind in ZoneKind::ALL {
            let zone = self.zone_mut(kind);
            if let Some(position) = zone.iter().position(|c| c.instance_id == instance_id) {
                return Some((kind, zone.remove(position)));
            }
        }
        None
    }

    pub fn hand_count(&self) -> usize {
        self.hand.len()
    }

    pub fn library_count(&self) -> usize {
        self.library.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::deck::DeckCard;
    use std::collections::HashSet;

    fn deck(lines: &[(&str, u32)]) -> Deck {
        Deck {
            id: "d1".to_string(),
            player_id: "p1".to_string(),
            name: "Test deck".to_string(),
            cards: lines
                .iter()
                .map(|(id, amount)| DeckCard {
                    card_id: id.to_string(),
                    amount: *amount,
                })
                .collect(),
        }
    }

    #[test]
    fn test_from_deck_mints_one_instance_per_copy() {
        let board = PlayerBoard::from_deck(&deck(&[("swamp", 24), ("rat", 36)]));

        assert_eq!(board.library.len(), 60);
        assert_eq!(board.hand_count(), 0);
        assert_eq!(board.life, STARTING_LIFE);

        // Every copy carries its own globally unique instance id.
        let ids: HashSet<Uuid> = board.library.iter().map(|c| c.instance_id).collect();
        assert_eq!(ids.len(), 60);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut board = PlayerBoard::from_deck(&deck(&[("a", 30), ("b", 30)]));
        let before: HashSet<Uuid> = board.library.iter().map(|c| c.instance_id).collect();

        board.shuffle_library();

        // No card created, destroyed, or duplicated.
        let after: HashSet<Uuid> = board.library.iter().map(|c| c.instance_id).collect();
        assert_eq!(board.library.len(), 60);
        assert_eq!(before, after);
    }

    #[test]
    fn test_take_removes_from_owning_zone_only() {
        let mut board = PlayerBoard::from_deck(&deck(&[("a", 3)]));
        let target = board.library[1].instance_id;

        let (kind, card) = board.take(target).unwrap();
        assert_eq!(kind, ZoneKind::Library);
        assert_eq!(card.instance_id, target);
        assert_eq!(board.library.len(), 2);
        assert!(board.locate(target).is_none());
    }

    #[test]
    fn test_locate_finds_zone() {
        let mut board = PlayerBoard::new();
        let card = CardInstance::new("bolt");
        let id = card.instance_id;
        board.graveyard.push(card);

        assert_eq!(board.locate(id), Some(ZoneKind::Graveyard));
    }
}
