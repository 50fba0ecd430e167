//! In-memory game contract for tests and offline replays.
//!
//! [`MockChain`] keeps the contract state behind a mutex and applies the same progression
//! the contract does: one step per action, a redraw every `RESEED_INTERVAL` actions, one
//! point per correct decision, and `out` once `MAX_ACTION` actions were taken. Handles are
//! cheap to clone; [`MockChain::as_caller`] returns a handle submitting as another account.

use crate::{ActionSubmitter, ChainReader};
use commonware_codec::Encode;
use ethers::{types::Address, types::U256, utils::keccak256};
use mollinalli_execution::{has_four_of_a_kind, next_seed, Progress};
use mollinalli_types::{
    ChainState, ContractError, Event, GameConfig, PlayerSession, Stage, MAX_PLAYERS,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const EVENT_CAPACITY: usize = 1024;
const GENESIS_TIME: u64 = 1_700_000_000;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("execution reverted")]
    Reverted(#[source] ContractError),
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Default)]
struct State {
    config: GameConfig,
    stage: Stage,
    lobby: Vec<Address>,
    players: HashMap<Address, PlayerSession>,
    next_deal: Option<U256>,
    deals: u64,
    now: u64,
    submission_failures: VecDeque<MockError>,
    read_failures: usize,
    frozen: Option<HashMap<Address, ChainState>>,
    submitted: Vec<(Address, bool)>,
    subscribers: Vec<mpsc::Sender<Vec<u8>>>,
}

impl State {
    fn emit(&mut self, event: Event) {
        let frame = event.encode().to_vec();
        self.subscribers.retain(|tx| match tx.try_send(frame.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("event subscriber lagging, dropping frame");
                true
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
    }

    fn tick(&mut self) -> u64 {
        self.now += 1;
        GENESIS_TIME + self.now
    }

    fn deal(&mut self) -> U256 {
        if let Some(seed) = self.next_deal.take() {
            return seed;
        }
        self.deals += 1;
        U256::from_big_endian(&keccak256(self.deals.to_be_bytes()))
    }

    fn join(&mut self, caller: Address) -> Result<(), ContractError> {
        if self.stage == Stage::Ended {
            debug!("previous game over, opening new lobby");
            self.stage = Stage::NotStart;
            self.lobby.clear();
            self.players.clear();
        }
        if self.stage != Stage::NotStart {
            return Err(ContractError::Started);
        }
        if self.players.contains_key(&caller) {
            return Err(ContractError::Joined);
        }
        if self.lobby.len() >= MAX_PLAYERS {
            return Err(ContractError::IsFull);
        }
        self.lobby.push(caller);
        self.players.insert(
            caller,
            PlayerSession {
                is_ready: true,
                ..Default::default()
            },
        );
        Ok(())
    }

    fn start(&mut self, caller: Address) -> Result<(), ContractError> {
        match self.stage {
            Stage::NotStart => {}
            Stage::Playing => return Err(ContractError::Started),
            Stage::Ended => return Err(ContractError::Ended),
        }
        if !self.players.contains_key(&caller) {
            return Err(ContractError::NotPlayer);
        }
        let seed = self.deal();
        for player in self.players.values_mut() {
            *player = PlayerSession::from_contract(true, false, 0, 0, seed);
        }
        self.stage = Stage::Playing;
        self.tick();
        self.emit(Event::GameStarted {
            players: self.lobby.clone(),
            seed,
        });
        Ok(())
    }

    fn act(&mut self, caller: Address, pressed: bool) -> Result<(), ContractError> {
        if self.stage != Stage::Playing {
            return Err(ContractError::NotPlaying);
        }
        let max_action = self.config.max_action;
        let player = self
            .players
            .get_mut(&caller)
            .ok_or(ContractError::NotPlayer)?;
        if player.out {
            return Err(ContractError::OutPlayer);
        }

        let correct = has_four_of_a_kind(player.seed, player.turn as u64) == pressed;
        let (progress, _) = Progress::from_session(player).advance();
        let score = player.score.saturating_add(u8::from(correct));
        let out = progress.action_count >= max_action;
        *player = PlayerSession::from_contract(true, out, score, progress.action_count, progress.seed);
        let snapshot = player.clone();
        self.submitted.push((caller, pressed));

        if out {
            let end_time = self.tick();
            self.emit(Event::GameEnded {
                address: caller,
                player: snapshot,
                end_time,
            });
            if self.players.values().all(|p| p.out) {
                self.stage = Stage::Ended;
            }
        }
        Ok(())
    }
}

/// Handle to a shared in-memory game contract.
#[derive(Clone)]
pub struct MockChain {
    state: Arc<Mutex<State>>,
    caller: Address,
}

impl MockChain {
    pub fn new(config: GameConfig, caller: Address) -> Self {
        let state = State {
            config,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            caller,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Handle sharing this chain but submitting as `caller`.
    pub fn as_caller(&self, caller: Address) -> Self {
        Self {
            state: self.state.clone(),
            caller,
        }
    }

    pub fn caller(&self) -> Address {
        self.caller
    }

    /// Seed dealt by the next `startGame`.
    pub fn set_next_deal(&self, seed: U256) {
        self.state().next_deal = Some(seed);
    }

    /// Make the next submission fail with `error` without touching contract state.
    pub fn fail_next_submission(&self, error: MockError) {
        self.state().submission_failures.push_back(error);
    }

    /// Make the next `count` reads fail.
    pub fn fail_reads(&self, count: usize) {
        self.state().read_failures = count;
    }

    /// Serve reads from the current state until [`MockChain::thaw_reads`], as a lagging
    /// node would.
    pub fn freeze_reads(&self) {
        let mut state = self.state();
        let snapshot = state
            .players
            .iter()
            .map(|(address, player)| (*address, ChainState::new(state.stage, player.clone())))
            .collect();
        state.frozen = Some(snapshot);
    }

    pub fn thaw_reads(&self) {
        self.state().frozen = None;
    }

    /// Subscribe to encoded contract events.
    pub fn subscribe(&self) -> mpsc::Receiver<Vec<u8>> {
        let (tx, rx) = mpsc::channel(EVENT_CAPACITY);
        self.state().subscribers.push(tx);
        rx
    }

    /// Drop every subscription, ending their streams.
    pub fn close_subscriptions(&self) {
        self.state().subscribers.clear();
    }

    /// Emit an arbitrary event, e.g. a replayed `GameStarted`.
    pub fn emit(&self, event: Event) {
        self.state().emit(event);
    }

    pub fn stage(&self) -> Stage {
        self.state().stage
    }

    pub fn player(&self, address: Address) -> Option<PlayerSession> {
        self.state().players.get(&address).cloned()
    }

    /// Actions accepted so far, in order.
    pub fn submitted(&self) -> Vec<(Address, bool)> {
        self.state().submitted.clone()
    }

    fn submit(
        &self,
        apply: impl FnOnce(&mut State, Address) -> Result<(), ContractError>,
    ) -> Result<(), MockError> {
        let mut state = self.state();
        if let Some(error) = state.submission_failures.pop_front() {
            debug!(error = %error, "failing scripted submission");
            return Err(error);
        }
        apply(&mut *state, self.caller).map_err(MockError::Reverted)
    }
}

impl ChainReader for MockChain {
    type Error = MockError;

    async fn read_config(&self) -> Result<GameConfig, Self::Error> {
        Ok(self.state().config)
    }

    async fn read_state(&self, address: Address) -> Result<ChainState, Self::Error> {
        let mut state = self.state();
        if state.read_failures > 0 {
            state.read_failures -= 1;
            return Err(MockError::Transport("read timed out".into()));
        }
        if let Some(frozen) = &state.frozen {
            return Ok(frozen.get(&address).cloned().unwrap_or_default());
        }
        let player = state.players.get(&address).cloned().unwrap_or_default();
        Ok(ChainState::new(state.stage, player))
    }
}

impl ActionSubmitter for MockChain {
    type Error = MockError;

    async fn submit_action(&self, bell: bool) -> Result<(), Self::Error> {
        self.submit(|state, caller| state.act(caller, bell))
    }

    async fn join_game(&self) -> Result<(), Self::Error> {
        self.submit(State::join)
    }

    async fn start_game(&self) -> Result<(), Self::Error> {
        self.submit(State::start)
    }
}
