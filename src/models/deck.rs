use serde::{Deserialize, Serialize};

/// A saved decklist: catalog references plus copy counts. Decks are built
/// elsewhere; the sync core only instantiates them into play objects.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Deck {
    pub id: String,
    #[serde(rename = "playerId")]
    pub player_id: String,
    pub name: String,
    pub cards: Vec<DeckCard>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DeckCard {
    #[serde(rename = "cardId")]
    pub card_id: String,
    pub amount: u32,
}

impl Deck {
    pub fn size(&self) -> usize {
        self.cards.iter().map(|c| c.amount as usize).sum()
    }
}
