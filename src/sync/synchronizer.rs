use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::debounce::Debounce;
use crate::catalog::cache::CatalogCache;
use crate::game::board::PlayerBoard;
use crate::game::diff::ZoneDiff;
use crate::game::zone::{HydratedCard, WireZone, ZoneKind};
use crate::logger;
use crate::models::deck::Deck;
use crate::room::model::{PlayerIdentity, PlayerWireState, RoomState};
use crate::store::remote::{RemoteStore, StoreWrite};
use crate::utils::errors::{StoreError, SyncError};
use crate::utils::logger::Logger;

/// Lifecycle of one client's synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Uninitialized,
    /// Rehydrating a persisted player state after a rejoin.
    Restoring,
    /// Building a fresh player state from the deck.
    Creating,
    Ready,
    /// A debounced flush is being pushed to the store.
    Syncing,
    Disconnected,
}

/// What this client knows about one remote participant.
///
/// Only the public zones are ever hydrated; a peer's hand and library stay
/// counts so hidden information stays hidden.
#[derive(Debug, Clone, Default)]
pub struct PeerView {
    pub uid: String,
    pub player_name: String,
    pub deck_name: String,
    pub life: i32,
    pub hand_count: usize,
    pub library_count: usize,
    pub is_online: bool,
    pub last_update: i64,
    pub battlefield: Vec<HydratedCard>,
    pub graveyard: Vec<HydratedCard>,
    pub exile: Vec<HydratedCard>,
}

/// Wire-form copy of the last state that reached the store. Exists only in
/// this client's memory; the next flush diffs against it.
struct SyncedSnapshot {
    zones: HashMap<ZoneKind, WireZone>,
    hand_count: usize,
    library_count: usize,
    life: i32,
}

impl SyncedSnapshot {
    fn of_board(board: &PlayerBoard) -> Self {
        let mut zones = HashMap::new();
        for kind in ZoneKind::ALL {
            zones.insert(kind, board.encode_zone(kind));
        }
        Self {
            zones,
            hand_count: board.hand_count(),
            library_count: board.library_count(),
            life: board.life,
        }
    }

    fn of_wire(state: &PlayerWireState) -> Self {
        let mut zones = HashMap::new();
        for kind in ZoneKind::ALL {
            zones.insert(kind, state.zone(kind).clone());
        }
        Self {
            zones,
            hand_count: state.hand_count,
            library_count: state.library_count,
            life: state.life,
        }
    }
}

struct SyncShared {
    store: Arc<dyn RemoteStore>,
    catalog: Arc<CatalogCache>,
    room_id: String,
    identity: PlayerIdentity,
    deck_name: String,
    board: Arc<RwLock<PlayerBoard>>,
    last_synced: Mutex<Option<SyncedSnapshot>>,
    phase: RwLock<SyncPhase>,
    room: RwLock<Option<RoomState>>,
    peers: RwLock<HashMap<String, PeerView>>,
    debounce: Debounce,
}

/// Per-client sync loop between the local board and the remote store.
///
/// The synchronizer owns the only pending write per player: local mutations
/// restart the debounce window, and the eventual flush pushes either one
/// full-state write (first sync) or one combined incremental update built
/// from per-zone diffs plus the scalar fields. Incoming room snapshots are
/// hydrated into peer views on the way in.
pub struct PlayerSynchronizer {
    shared: Arc<SyncShared>,
    pump: StdMutex<Option<JoinHandle<()>>>,
}

impl PlayerSynchronizer {
    /// Connects one participant to a room.
    ///
    /// Restores the persisted player state when the store already holds one
    /// with cards in hand or library; otherwise instantiates and shuffles
    /// the deck and writes the initial full state. Fails closed when the
    /// store is unreachable: the caller must present offline mode rather
    /// than simulate a room locally.
    ///
    /// # Arguments
    /// * `store` - The remote store the room lives in.
    /// * `catalog` - Shared catalog cache used for all hydration.
    /// * `room_id` - Room to attach to.
    /// * `identity` - This participant; the synchronizer only ever writes
    ///   under this identity's player subtree.
    /// * `deck` - Decklist instantiated on a fresh join; its name is kept
    ///   either way.
    /// * `debounce_delay` - Quiet window between a local mutation and the
    ///   sync write.
    pub async fn connect(
        store: Arc<dyn RemoteStore>,
        catalog: Arc<CatalogCache>,
        room_id: &str,
        identity: PlayerIdentity,
        deck: &Deck,
        debounce_delay: Duration,
    ) -> Result<PlayerSynchronizer, SyncError> {
        let shared = Arc::new(SyncShared {
            store,
            catalog,
            room_id: room_id.to_string(),
            identity,
            deck_name: deck.name.clone(),
            board: Arc::new(RwLock::new(PlayerBoard::new())),
            last_synced: Mutex::new(None),
            phase: RwLock::new(SyncPhase::Uninitialized),
            room: RwLock::new(None),
            peers: RwLock::new(HashMap::new()),
            debounce: Debounce::new(debounce_delay),
        });

        let existing = shared
            .store
            .read(&shared.player_path())
            .await?
            .filter(|value| !value.is_null())
            .map(|value| serde_json::from_value::<PlayerWireState>(value).unwrap_or_default());

        match existing {
            Some(state) if state.is_restorable() => shared.restore(state).await?,
            _ => shared.create_fresh(deck).await?,
        }

        let subscription = shared
            .store
            .subscribe(&format!("rooms/{room_id}"))
            .await?;
        let pump = tokio::spawn({
            let shared = Arc::clone(&shared);
            async move {
                let mut subscription = subscription;
                while let Some(snapshot) = subscription.next().await {
                    shared.ingest_room(snapshot).await;
                }
            }
        });

        shared.set_phase(SyncPhase::Ready).await;
        Ok(PlayerSynchronizer {
            shared,
            pump: StdMutex::new(Some(pump)),
        })
    }

    /// The shared local board this synchronizer observes.
    pub fn board(&self) -> Arc<RwLock<PlayerBoard>> {
        Arc::clone(&self.shared.board)
    }

    pub async fn phase(&self) -> SyncPhase {
        *self.shared.phase.read().await
    }

    /// (Re)starts the debounce window. Call after every local mutation.
    pub fn notify_change(&self) {
        Arc::clone(&self.shared).schedule();
    }

    /// A notifier handle for the play surface, so the UI layer never holds
    /// the synchronizer itself.
    pub fn change_notifier(&self) -> impl Fn() + Send + Sync + 'static {
        let shared = Arc::clone(&self.shared);
        move || Arc::clone(&shared).schedule()
    }

    pub fn is_sync_pending(&self) -> bool {
        self.shared.debounce.is_pending()
    }

    /// Display-ready view of one of this player's own zones.
    pub async fn hydrated_zone(&self, kind: ZoneKind) -> Vec<HydratedCard> {
        let board = self.shared.board.read().await;
        board.encode_zone(kind).hydrate(&self.shared.catalog)
    }

    /// Latest hydrated views of every other participant.
    pub async fn peers(&self) -> HashMap<String, PeerView> {
        self.shared.peers.read().await.clone()
    }

    /// Latest raw room snapshot, turn metadata included.
    pub async fn room(&self) -> Option<RoomState> {
        self.shared.room.read().await.clone()
    }

    /// Tears the session down: drops any pending flush, stops ingesting,
    /// and marks this participant offline. The player state stays in the
    /// store so a later connect can restore it.
    pub async fn disconnect(&self) {
        self.shared.debounce.cancel();
        let pump = self.pump.lock().expect("Pump handle lock poisoned").take();
        if let Some(pump) = pump {
            pump.abort();
        }

        let path = format!("{}/isOnline", self.shared.player_path());
        if let Err(error) = self.shared.store.write(&path, json!(false)).await {
            logger!(
                WARN,
                "[SYNC] Could not mark `{}` offline: {error}",
                self.shared.identity.uid
            );
        }

        self.shared.set_phase(SyncPhase::Disconnected).await;
        logger!(
            INFO,
            "[SYNC] `{}` left room `{}`",
            self.shared.identity.uid,
            self.shared.room_id
        );
    }
}

impl SyncShared {
    fn player_path(&self) -> String {
        format!("rooms/{}/players/{}", self.room_id, self.identity.uid)
    }

    async fn set_phase(&self, phase: SyncPhase) {
        *self.phase.write().await = phase;
    }

    fn schedule(self: Arc<Self>) {
        let shared = Arc::clone(&self);
        self.debounce.restart(async move {
            shared.flush().await;
        });
    }

    /// Rejoin path: warm the catalog first so hydration never blocks on the
    /// network, then rebuild the board from the persisted zones. The synced
    /// snapshot starts as the remote state itself, so the first flush only
    /// sends what actually changed since the disconnect.
    async fn restore(&self, state: PlayerWireState) -> Result<(), SyncError> {
        self.set_phase(SyncPhase::Restoring).await;
        logger!(
            INFO,
            "[SYNC] Restoring `{}` in room `{}`",
            self.identity.uid,
            self.room_id
        );

        let mut ids = HashSet::new();
        for kind in ZoneKind::ALL {
            ids.extend(state.zone(kind).card_ids());
        }
        self.catalog.prefetch(&ids).await;

        *self.board.write().await = state.to_board();
        *self.last_synced.lock().await = Some(SyncedSnapshot::of_wire(&state));

        let path = format!("{}/isOnline", self.player_path());
        self.store.write(&path, json!(true)).await?;
        Ok(())
    }

    /// Fresh-join path: instantiate and shuffle the deck, then push the one
    /// unavoidable full-size write.
    async fn create_fresh(&self, deck: &Deck) -> Result<(), SyncError> {
        self.set_phase(SyncPhase::Creating).await;
        logger!(
            INFO,
            "[SYNC] Creating state for `{}` in room `{}` from `{}` ({} cards)",
            self.identity.uid,
            self.room_id,
            deck.name,
            deck.size()
        );

        let board = PlayerBoard::from_deck(deck);
        let snapshot = SyncedSnapshot::of_board(&board);
        *self.board.write().await = board;

        self.write_full(&snapshot).await?;
        *self.last_synced.lock().await = Some(snapshot);
        Ok(())
    }

    fn wire_state(&self, snapshot: &SyncedSnapshot) -> PlayerWireState {
        let zone = |kind: ZoneKind| snapshot.zones.get(&kind).cloned().unwrap_or_default();
        PlayerWireState {
            uid: self.identity.uid.clone(),
            player_name: self.identity.player_name.clone(),
            deck_name: self.deck_name.clone(),
            library: zone(ZoneKind::Library),
            hand: zone(ZoneKind::Hand),
            battlefield: zone(ZoneKind::Battlefield),
            graveyard: zone(ZoneKind::Graveyard),
            exile: zone(ZoneKind::Exile),
            hand_count: snapshot.hand_count,
            library_count: snapshot.library_count,
            life: snapshot.life,
            last_update: Utc::now().timestamp_millis(),
            is_online: true,
        }
    }

    async fn write_full(&self, snapshot: &SyncedSnapshot) -> Result<(), SyncError> {
        let path = self.player_path();
        let state = self.wire_state(snapshot);
        let value = serde_json::to_value(&state)
            .map_err(|e| StoreError::Serialization(path.clone(), e.to_string()))?;
        self.store.write(&path, value).await?;
        Ok(())
    }

    /// Debounce target: push the current board state, minimally.
    async fn flush(&self) {
        self.set_phase(SyncPhase::Syncing).await;
        let snapshot = {
            let board = self.board.read().await;
            SyncedSnapshot::of_board(&board)
        };

        // Holding the snapshot lock across the write serializes flushes,
        // which keeps writes in local-mutation order for this player.
        let mut last_synced = self.last_synced.lock().await;
        let result = match last_synced.as_ref() {
            None => self.write_full(&snapshot).await,
            Some(previous) => {
                let writes = self.incremental_writes(previous, &snapshot);
                if writes.is_empty() {
                    logger!(DEBUG, "[SYNC] Nothing to send for `{}`", self.identity.uid);
                    self.set_phase(SyncPhase::Ready).await;
                    return;
                }
                let count = writes.len();
                match self.store.update(writes).await {
                    Ok(()) => {
                        logger!(
                            DEBUG,
                            "[SYNC] Pushed {count} patch writes for `{}`",
                            self.identity.uid
                        );
                        Ok(())
                    }
                    Err(error) => Err(SyncError::Store(error)),
                }
            }
        };

        match result {
            Ok(()) => *last_synced = Some(snapshot),
            // Not retried; the next mutation schedules another attempt and
            // the stale snapshot makes it carry the unsent changes too.
            Err(error) => logger!(
                ERROR,
                "[SYNC] Could not push state for `{}`: {error}",
                self.identity.uid
            ),
        }
        self.set_phase(SyncPhase::Ready).await;
    }

    fn incremental_writes(
        &self,
        previous: &SyncedSnapshot,
        current: &SyncedSnapshot,
    ) -> Vec<StoreWrite> {
        let path = self.player_path();
        let mut writes = Vec::new();

        for kind in ZoneKind::ALL {
            let diff = ZoneDiff::between(previous.zones.get(&kind), &current.zones[&kind]);
            if let Some(diff) = diff {
                writes.extend(diff.into_writes(&format!("{path}/{}", kind.key())));
            }
        }

        if previous.hand_count != current.hand_count {
            writes.push(StoreWrite::set(
                format!("{path}/handCount"),
                json!(current.hand_count),
            ));
        }
        if previous.library_count != current.library_count {
            writes.push(StoreWrite::set(
                format!("{path}/libraryCount"),
                json!(current.library_count),
            ));
        }
        if previous.life != current.life {
            writes.push(StoreWrite::set(format!("{path}/life"), json!(current.life)));
        }

        writes
    }

    /// Subscription pump target: refresh peer views from a room snapshot.
    ///
    /// Only battlefield, graveyard, and exile of other players hydrate;
    /// their hands and libraries are deliberately left as counts.
    async fn ingest_room(&self, value: Value) {
        if value.is_null() {
            logger!(WARN, "[SYNC] Room `{}` is gone from the store", self.room_id);
            *self.room.write().await = None;
            self.peers.write().await.clear();
            return;
        }

        let room = match serde_json::from_value::<RoomState>(value) {
            Ok(room) => room,
            Err(error) => {
                logger!(
                    WARN,
                    "[SYNC] Ignoring unreadable snapshot of room `{}`: {error}",
                    self.room_id
                );
                return;
            }
        };

        let mut ids = HashSet::new();
        for (uid, player) in &room.players {
            if uid == &self.identity.uid {
                continue;
            }
            for kind in ZoneKind::PUBLIC {
                ids.extend(player.zone(kind).card_ids());
            }
        }
        self.catalog.prefetch(&ids).await;

        let mut peers = HashMap::new();
        for (uid, player) in &room.players {
            if uid == &self.identity.uid {
                continue;
            }
            peers.insert(
                uid.clone(),
                PeerView {
                    uid: uid.clone(),
                    player_name: player.player_name.clone(),
                    deck_name: player.deck_name.clone(),
                    life: player.life,
                    hand_count: player.hand_count,
                    library_count: player.library_count,
                    is_online: player.is_online,
                    last_update: player.last_update,
                    battlefield: player.battlefield.hydrate(&self.catalog),
                    graveyard: player.graveyard.hydrate(&self.catalog),
                    exile: player.exile.hydrate(&self.catalog),
                },
            );
        }

        *self.peers.write().await = peers;
        *self.room.write().await = Some(room);
    }
}
