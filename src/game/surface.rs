use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::board::PlayerBoard;
use super::zone::ZoneKind;
use crate::utils::errors::SurfaceError;

type ChangeNotifier = Box<dyn Fn() + Send + Sync>;

/// UI-facing zone mutation operations.
///
/// The surface is the producer side of the sync pipeline: it mutates the
/// shared local board and pokes the notifier after every mutation so the
/// synchronizer's debounce window restarts. It performs no rules
/// enforcement beyond keeping each instance in exactly one zone; the
/// playspace is manual.
pub struct PlaySurface {
    board: Arc<RwLock<PlayerBoard>>,
    notify: ChangeNotifier,
}

impl PlaySurface {
    pub fn new(board: Arc<RwLock<PlayerBoard>>, notify: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            board,
            notify: Box::new(notify),
        }
    }

    pub fn board(&self) -> Arc<RwLock<PlayerBoard>> {
        Arc::clone(&self.board)
    }

    /// Draws up to `n` cards off the top of the library into the hand.
    ///
    /// # Returns
    /// The number of cards actually drawn; drawing from an empty library is
    /// a no-op, not an error.
    pub async fn draw(&self, n: usize) -> usize {
        let mut board = self.board.write().await;
        let mut drawn = 0;
        for _ in 0..n {
            if board.library.is_empty() {
                break;
            }
            let card = board.library.remove(0);
            board.hand.push(card);
            drawn += 1;
        }
        drop(board);

        if drawn > 0 {
            (self.notify)();
        }
        drawn
    }

    /// Plays a card from wherever it is onto the battlefield.
    pub async fn play(&self, instance_id: Uuid) -> Result<(), SurfaceError> {
        self.move_card(instance_id, ZoneKind::Battlefield, None).await
    }

    /// Moves one instance to `to`, inserting at `position` (or the end).
    ///
    /// The instance id is unchanged by the move and the card leaves its old
    /// zone in the same step, so it exists in exactly one zone afterwards.
    /// Tap and face-down state reset when a card leaves the battlefield.
    pub async fn move_card(
        &self,
        instance_id: Uuid,
        to: ZoneKind,
        position: Option<usize>,
    ) -> Result<(), SurfaceError> {
        let mut board = self.board.write().await;
        let (from, mut card) = board
            .take(instance_id)
            .ok_or(SurfaceError::CardNotFound(instance_id))?;

        if from == ZoneKind::Battlefield && to != ZoneKind::Battlefield {
            card.tapped = false;
            card.face_down = false;
        }

        let zone = board.zone_mut(to);
        let index = position.unwrap_or(zone.len()).min(zone.len());
        zone.insert(index, card);
        drop(board);

        (self.notify)();
        Ok(())
    }

    /// Toggles the tap state of one instance in place.
    pub async fn toggle_tap(&self, instance_id: Uuid) -> Result<bool, SurfaceError> {
        let mut board = self.board.write().await;
        for kind in ZoneKind::ALL {
            if let Some(card) = board
                .zone_mut(kind)
                .iter_mut()
                .find(|c| c.instance_id == instance_id)
            {
                card.tapped = !card.tapped;
                let tapped = card.tapped;
                drop(board);
                (self.notify)();
                return Ok(tapped);
            }
        }
        Err(SurfaceError::CardNotFound(instance_id))
    }

    /// Flips one instance face down or back up.
    pub async fn flip(&self, instance_id: Uuid) -> Result<bool, SurfaceError> {
        let mut board = self.board.write().await;
        for kind in ZoneKind::ALL {
            if let Some(card) = board
                .zone_mut(kind)
                .iter_mut()
                .find(|c| c.instance_id == instance_id)
            {
                card.face_down = !card.face_down;
                let face_down = card.face_down;
                drop(board);
                (self.notify)();
                return Ok(face_down);
            }
        }
        Err(SurfaceError::CardNotFound(instance_id))
    }

    /// Untaps every battlefield card.
    pub async fn untap_all(&self) {
        let mut board = self.board.write().await;
        for card in board.battlefield.iter_mut() {
            card.tapped = false;
        }
        drop(board);
        (self.notify)();
    }

    pub async fn shuffle_library(&self) {
        let mut board = self.board.write().await;
        board.shuffle_library();
        drop(board);
        (self.notify)();
    }

    /// Returns the hand to the library, shuffles, and draws a new hand.
    pub async fn mulligan(&self, new_hand_size: usize) -> usize {
        {
            let mut board = self.board.write().await;
            let mut hand = std::mem::take(&mut board.hand);
            board.library.append(&mut hand);
            board.shuffle_library();
        }
        self.draw(new_hand_size).await
    }

    pub async fn set_life(&self, life: i32) {
        let mut board = self.board.write().await;
        board.life = life;
        drop(board);
        (self.notify)();
    }

    pub async fn adjust_life(&self, delta: i32) -> i32 {
        let mut board = self.board.write().await;
        board.life += delta;
        let life = board.life;
        drop(board);
        (self.notify)();
        life
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::deck::{Deck, DeckCard};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn surface() -> (PlaySurface, Arc<AtomicUsize>) {
        let deck = Deck {
            id: "d1".to_string(),
            player_id: "p1".to_string(),
            name: "Test deck".to_string(),
            cards: vec![DeckCard {
                card_id: "rat".to_string(),
                amount: 10,
            }],
        };
        let board = Arc::new(RwLock::new(PlayerBoard::from_deck(&deck)));
        let notifications = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&notifications);
        let surface = PlaySurface::new(board, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (surface, notifications)
    }

    #[tokio::test]
    async fn test_draw_takes_from_the_top() {
        let (surface, notifications) = surface();
        let board = surface.board();
        let top = board.read().await.library[0].instance_id;

        let drawn = surface.draw(2).await;
        assert_eq!(drawn, 2);

        let board = board.read().await;
        assert_eq!(board.hand[0].instance_id, top);
        assert_eq!(board.library.len(), 8);
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_draw_from_empty_library_is_noop() {
        let (surface, notifications) = surface();
        surface.draw(10).await;
        notifications.store(0, Ordering::SeqCst);

        let drawn = surface.draw(1).await;
        assert_eq!(drawn, 0);
        // No mutation happened, so the synchronizer was not poked.
        assert_eq!(notifications.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_play_keeps_instance_identity() {
        let (surface, _) = surface();
        surface.draw(3).await;
        let board = surface.board();
        let played = board.read().await.hand[1].instance_id;

        surface.play(played).await.unwrap();

        let board = board.read().await;
        // The moved card kept its id and sits in exactly one zone.
        assert_eq!(board.battlefield[0].instance_id, played);
        assert!(board.hand.iter().all(|c| c.instance_id != played));
        assert_eq!(board.locate(played), Some(ZoneKind::Battlefield));
    }

    #[tokio::test]
    async fn test_leaving_battlefield_resets_card_state() {
        let (surface, _) = surface();
        surface.draw(1).await;
        let board = surface.board();
        let id = board.read().await.hand[0].instance_id;

        surface.play(id).await.unwrap();
        surface.toggle_tap(id).await.unwrap();
        surface.flip(id).await.unwrap();
        surface
            .move_card(id, ZoneKind::Graveyard, None)
            .await
            .unwrap();

        let board = board.read().await;
        let card = &board.graveyard[0];
        assert!(!card.tapped);
        assert!(!card.face_down);
    }

    #[tokio::test]
    async fn test_move_to_position_inserts_there() {
        let (surface, _) = surface();
        surface.draw(3).await;
        let board = surface.board();
        let id = board.read().await.hand[2].instance_id;

        surface
            .move_card(id, ZoneKind::Library, Some(0))
            .await
            .unwrap();

        // The card went back on top of the library.
        assert_eq!(board.read().await.library[0].instance_id, id);
    }

    #[tokio::test]
    async fn test_toggle_tap_flips_state() {
        let (surface, _) = surface();
        surface.draw(1).await;
        let board = surface.board();
        let id = board.read().await.hand[0].instance_id;
        surface.play(id).await.unwrap();

        assert_eq!(surface.toggle_tap(id).await.unwrap(), true);
        assert_eq!(surface.toggle_tap(id).await.unwrap(), false);
    }

    #[tokio::test]
    async fn test_untap_all_clears_battlefield() {
        let (surface, _) = surface();
        surface.draw(2).await;
        let board = surface.board();
        let ids: Vec<Uuid> = board.read().await.hand.iter().map(|c| c.instance_id).collect();
        for id in &ids {
            surface.play(*id).await.unwrap();
            surface.toggle_tap(*id).await.unwrap();
        }

        surface.untap_all().await;

        let board = board.read().await;
        assert!(board.battlefield.iter().all(|c| !c.tapped));
    }

    #[tokio::test]
    async fn test_mulligan_reshuffles_and_redraws() {
        let (surface, _) = surface();
        surface.draw(7).await;

        let drawn = surface.mulligan(6).await;
        assert_eq!(drawn, 6);

        let board = surface.board();
        let board = board.read().await;
        assert_eq!(board.hand.len(), 6);
        assert_eq!(board.library.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_instance_is_an_error() {
        let (surface, _) = surface();
        let missing = Uuid::new_v4();
        let result = surface.play(missing).await;
        assert!(matches!(result, Err(SurfaceError::CardNotFound(_))));
    }

    #[tokio::test]
    async fn test_life_adjustments() {
        let (surface, _) = surface();
        assert_eq!(surface.adjust_life(-3).await, 17);
        surface.set_life(40).await;
        assert_eq!(surface.board().read().await.life, 40);
    }
}
