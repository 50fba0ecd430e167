//! One player's view of a game.
//!
//! [`Session`] glues the pure execution core to the chain. Actions are applied locally
//! before they are submitted, so the next cards show immediately; a failed submission rolls
//! the local state back. Reads from the chain and contract events are folded in through
//! [`Session::refresh`] and [`Session::handle_event`].

use crate::{ActionSubmitter, BoxError, ChainReader, Error, Result};
use ethers::types::Address;
use mollinalli_execution::{same_deal, ActionOutcome, Progress, RoundStateMachine, StageTracker};
use mollinalli_types::{
    CardBatch, ChainState, ContractError, DisplayStage, EndInfo, Event, GameConfig,
    PlayerSession, Stage,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Everything a front-end needs to render the table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub address: Address,
    pub stage: DisplayStage,
    /// Cards in front of the player, `None` until a seed was dealt.
    pub cards: Option<CardBatch>,
    /// Score from the last chain read.
    pub score: u8,
    /// Actions taken, including ones still being submitted.
    pub action_count: u8,
    pub turn: u8,
    pub in_flight: usize,
    /// The player used up their actions for this round.
    pub round_ended: bool,
    /// Whether ringing the bell would be correct for the visible cards.
    pub bell_expected: Option<bool>,
    pub end_info: Option<EndInfo>,
}

impl SessionView {
    /// Confirmed result worth displaying. Provisional entries carry no details.
    pub fn result(&self) -> Option<&EndInfo> {
        self.end_info.as_ref().filter(|info| !info.is_provisional())
    }
}

pub struct Session<R: ChainReader, S: ActionSubmitter> {
    address: Address,
    reader: R,
    submitter: S,
    round: RoundStateMachine,
    stage: StageTracker,
    player: PlayerSession,
}

fn read_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
    warn!(error = %err, "chain read failed");
    Error::Read(Box::new(err))
}

/// Find a contract revert reason anywhere in the error chain.
fn revert_reason(err: &(dyn std::error::Error + 'static)) -> Option<ContractError> {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(reason) = err.downcast_ref::<ContractError>() {
            return Some(*reason);
        }
        current = err.source();
    }
    None
}

fn submission_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> Error {
    match revert_reason(&err) {
        Some(reason) => {
            warn!(reason = reason.abi_name(), "transaction reverted");
            Error::Reverted(reason)
        }
        None => {
            warn!(error = %err, "submission failed");
            Error::Submission(Box::new(err) as BoxError)
        }
    }
}

impl<R: ChainReader, S: ActionSubmitter> Session<R, S> {
    /// Read the game limits and the player's state, then initialize the local core.
    pub async fn connect(address: Address, reader: R, submitter: S) -> Result<Self> {
        let config = reader.read_config().await.map_err(read_error)?;
        config.validate()?;
        debug!(
            max_action = config.max_action,
            max_action_per_round = config.max_action_per_round,
            "read game config"
        );

        let mut session = Self {
            address,
            reader,
            submitter,
            round: RoundStateMachine::new(config),
            stage: StageTracker::new(address),
            player: PlayerSession::default(),
        };
        let state = session
            .reader
            .read_state(address)
            .await
            .map_err(read_error)?;
        session.apply_state(state)?;
        info!(?address, stage = %session.stage.display(), "connected");
        Ok(session)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn config(&self) -> &GameConfig {
        self.round.config()
    }

    pub fn stage(&self) -> DisplayStage {
        self.stage.display()
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    /// Pass (`bell == false`) or ring the bell.
    ///
    /// The cards advance locally before the submission is awaited. If the submission
    /// fails, the local state falls back to the last accepted action and the error is
    /// returned.
    pub async fn action(&mut self, bell: bool) -> Result<ActionOutcome> {
        let stage = self.stage.display();
        if !stage.accepts_actions() {
            return Err(Error::ActionsClosed(stage));
        }
        let outcome = self.round.apply_action(bell)?;
        if outcome.round_ended {
            self.stage.enter_waiting_end();
        }

        match self.submitter.submit_action(bell).await {
            Ok(()) => {
                self.round.submission_confirmed();
                debug!(
                    bell,
                    correct = outcome.is_correct(),
                    action_count = outcome.progress.action_count,
                    "action submitted"
                );
                Ok(outcome)
            }
            Err(err) => {
                let rollback = self.round.submission_failed();
                if rollback.round_end_revoked {
                    self.stage.revoke_waiting_end();
                }
                Err(submission_error(err))
            }
        }
    }

    /// Poll the chain and fold the result into the local state.
    pub async fn refresh(&mut self) -> Result<SessionView> {
        let state = self
            .reader
            .read_state(self.address)
            .await
            .map_err(read_error)?;
        self.apply_state(state)?;
        Ok(self.view())
    }

    fn apply_state(&mut self, state: ChainState) -> Result<()> {
        let incoming = Progress::from_session(&state.player);
        let new_deal = state.stage() == Some(Stage::Playing)
            && state.player.has_seed()
            && !state.player.out
            && self.round.current().map_or(true, |current| {
                current.seed.is_zero() || !same_deal(current, incoming)
            });
        self.round.reconcile(&state.player)?;
        if new_deal {
            // Same effect as a `GameStarted` this client did not receive.
            self.stage.on_game_started();
        }
        let stage = self.stage.on_snapshot(state.stage_raw, &state.player);
        let per_round = self.round.config().max_action_per_round;
        if stage == DisplayStage::Playing && state.player.action_count >= per_round {
            self.stage.enter_waiting_end();
        }
        self.player = state.player;
        Ok(())
    }

    /// Fold in a contract event. Returns whether anything changed.
    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::GameStarted { players, seed } => {
                if !players.contains(&self.address) {
                    debug!("game started without this player");
                    return false;
                }
                if !self.round.start_session(seed) {
                    return false;
                }
                self.stage.on_game_started();
                self.player = PlayerSession::from_contract(true, false, 0, 0, seed);
                info!(players = players.len(), "game started");
                true
            }
            event @ Event::GameEnded { .. } => {
                let Some(info) = event.end_info() else {
                    return false;
                };
                if !self.stage.on_game_ended(info) {
                    return false;
                }
                self.stage.enter_waiting_end();
                true
            }
        }
    }

    /// Join the lobby.
    ///
    /// Local progress is forgotten. The previous result and the `WAITING_END` overlay stay
    /// until the next game starts.
    pub async fn join(&mut self) -> Result<()> {
        self.submitter.join_game().await.map_err(submission_error)?;
        self.round.reset();
        self.player = PlayerSession {
            is_ready: true,
            ..Default::default()
        };
        info!("joined game");
        Ok(())
    }

    /// Start the game for the current lobby.
    ///
    /// Cards are dealt once the `GameStarted` event or the next read arrives.
    pub async fn start(&mut self) -> Result<()> {
        self.submitter.start_game().await.map_err(submission_error)?;
        info!("requested game start");
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        let current = self.round.current().unwrap_or_default();
        SessionView {
            address: self.address,
            stage: self.stage.display(),
            cards: self.round.visible_cards(),
            score: self.player.score,
            action_count: current.action_count,
            turn: current.turn,
            in_flight: self.round.in_flight(),
            round_ended: self.round.round_end_signaled(),
            bell_expected: self.round.bell_expected(),
            end_info: self.stage.end_info().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mocks::{MockChain, MockError},
        Stream,
    };
    use ethers::types::U256;
    use mollinalli_execution::{advance_seed, decode, has_four_of_a_kind};

    fn alice() -> Address {
        Address::repeat_byte(0xa1)
    }

    fn bob() -> Address {
        Address::repeat_byte(0xb0)
    }

    fn seed() -> U256 {
        U256::from(0xdead_beef_cafe_f00du64) << 128usize | U256::from(0x5eedu64)
    }

    async fn playing(config: GameConfig) -> (MockChain, Session<MockChain, MockChain>) {
        let chain = MockChain::new(config, alice());
        chain.set_next_deal(seed());
        chain.join_game().await.unwrap();
        chain.start_game().await.unwrap();
        let session = Session::connect(alice(), chain.clone(), chain.clone())
            .await
            .unwrap();
        (chain, session)
    }

    #[tokio::test]
    async fn test_connect_before_game() {
        let chain = MockChain::new(GameConfig::default(), alice());
        let session = Session::connect(alice(), chain.clone(), chain).await.unwrap();
        let view = session.view();
        assert_eq!(view.stage, DisplayStage::NotStart);
        assert!(view.cards.is_none());
        assert!(view.bell_expected.is_none());
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_config() {
        let chain = MockChain::new(GameConfig::new(6, 12), alice());
        let result = Session::connect(alice(), chain.clone(), chain).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_surfaces_read_failure() {
        let chain = MockChain::new(GameConfig::default(), alice());
        chain.fail_reads(1);
        let result = Session::connect(alice(), chain.clone(), chain).await;
        assert!(matches!(result, Err(Error::Read(_))));
    }

    #[tokio::test]
    async fn test_actions_rejected_before_game() {
        let chain = MockChain::new(GameConfig::default(), alice());
        let mut session = Session::connect(alice(), chain.clone(), chain).await.unwrap();
        assert!(matches!(
            session.action(false).await,
            Err(Error::ActionsClosed(DisplayStage::NotStart))
        ));
    }

    #[tokio::test]
    async fn test_action_updates_view_and_chain() {
        let (chain, mut session) = playing(GameConfig::default()).await;
        assert_eq!(session.view().cards, Some(decode(seed(), 0)));

        let expected = has_four_of_a_kind(seed(), 0);
        let outcome = session.action(expected).await.unwrap();
        assert!(outcome.is_correct());
        assert_eq!(outcome.cards, decode(seed(), 1));

        let view = session.view();
        assert_eq!(view.action_count, 1);
        assert_eq!(view.turn, 1);
        assert_eq!(view.in_flight, 0);
        assert_eq!(chain.player(alice()).unwrap().action_count, 1);

        let view = session.refresh().await.unwrap();
        assert_eq!(view.score, 1);
        assert_eq!(view.cards, Some(decode(seed(), 1)));
    }

    #[tokio::test]
    async fn test_failed_submission_rolls_back() {
        let (chain, mut session) = playing(GameConfig::default()).await;
        session.action(false).await.unwrap();

        chain.fail_next_submission(MockError::Transport("connection reset".into()));
        assert!(matches!(
            session.action(true).await,
            Err(Error::Submission(_))
        ));
        let view = session.view();
        assert_eq!(view.action_count, 1);
        assert_eq!(view.cards, Some(decode(seed(), 1)));
        assert_eq!(chain.player(alice()).unwrap().action_count, 1);

        // The retry lands on the same turn.
        let outcome = session.action(true).await.unwrap();
        assert_eq!(outcome.progress.action_count, 2);
    }

    #[tokio::test]
    async fn test_revert_surfaced_by_name() {
        let (chain, mut session) = playing(GameConfig::default()).await;
        chain.fail_next_submission(MockError::Reverted(ContractError::OutPlayer));
        assert!(matches!(
            session.action(false).await,
            Err(Error::Reverted(ContractError::OutPlayer))
        ));
        assert_eq!(session.view().action_count, 0);
    }

    #[tokio::test]
    async fn test_round_end_waits_for_result() {
        let (chain, mut session) = playing(GameConfig::new(6, 6)).await;
        let mut events = Stream::new(chain.subscribe(), alice());

        for i in 1..=6u8 {
            let outcome = session.action(false).await.unwrap();
            assert_eq!(outcome.round_ended, i == 6);
        }
        let view = session.view();
        assert_eq!(view.stage, DisplayStage::WaitingEnd);
        assert!(view.round_ended);
        assert_eq!(view.cards, Some(decode(advance_seed(seed(), 1), 0)));
        assert!(matches!(
            session.action(false).await,
            Err(Error::ActionsClosed(DisplayStage::WaitingEnd))
        ));

        // The contract moved on to ENDED; the overlay stays.
        assert_eq!(chain.stage(), Stage::Ended);
        assert_eq!(session.refresh().await.unwrap().stage, DisplayStage::WaitingEnd);
        assert!(session.view().result().is_none());

        let event = events.next().await.unwrap().unwrap();
        assert!(session.handle_event(event));
        let view = session.view();
        let result = view.result().expect("confirmed result");
        assert_eq!(result.address, alice());
        assert_eq!(result.player.action_count, 6);
    }

    #[tokio::test]
    async fn test_failed_final_action_reopens_round() {
        let (chain, mut session) = playing(GameConfig::new(2, 2)).await;
        session.action(false).await.unwrap();
        chain.fail_next_submission(MockError::Transport("dropped".into()));
        assert!(session.action(false).await.is_err());

        let view = session.view();
        assert_eq!(view.stage, DisplayStage::Playing);
        assert!(!view.round_ended);

        assert!(session.action(false).await.unwrap().round_ended);
        assert_eq!(session.stage(), DisplayStage::WaitingEnd);
    }

    #[tokio::test]
    async fn test_lagging_reads_keep_local_progress() {
        let (chain, mut session) = playing(GameConfig::new(24, 3)).await;
        chain.freeze_reads();
        session.action(false).await.unwrap();
        session.action(false).await.unwrap();

        let view = session.refresh().await.unwrap();
        assert_eq!(view.action_count, 2);
        assert_eq!(view.turn, 2);
        assert_eq!(view.cards, Some(decode(seed(), 2)));
        assert_eq!(view.stage, DisplayStage::Playing);

        let outcome = session.action(false).await.unwrap();
        assert_eq!(outcome.progress.action_count, 3);
        assert!(outcome.round_ended);

        let view = session.refresh().await.unwrap();
        assert_eq!(view.action_count, 3);
        assert!(view.round_ended);
        assert_eq!(view.stage, DisplayStage::WaitingEnd);

        chain.thaw_reads();
        let view = session.refresh().await.unwrap();
        assert_eq!(view.action_count, 3);
        assert_eq!(view.in_flight, 0);
        assert_eq!(view.stage, DisplayStage::WaitingEnd);
        let on_chain = chain.player(alice()).unwrap();
        assert_eq!(on_chain.action_count, 3);
        assert_eq!(on_chain.turn, 3);
    }

    #[tokio::test]
    async fn test_result_survives_join_until_next_game() {
        let (chain, mut session) = playing(GameConfig::new(1, 1)).await;
        let mut events = Stream::new(chain.subscribe(), alice());
        session.action(false).await.unwrap();
        assert!(session.handle_event(events.next().await.unwrap().unwrap()));
        assert!(session.view().result().is_some());

        let next = seed() + U256::one();
        chain.set_next_deal(next);
        session.join().await.unwrap();
        let view = session.view();
        assert_eq!(view.stage, DisplayStage::WaitingEnd);
        assert!(view.result().is_some());
        assert!(view.cards.is_none());

        session.start().await.unwrap();
        let started = events.next().await.unwrap().unwrap();
        assert!(matches!(started, Event::GameStarted { seed, .. } if seed == next));
        assert!(session.handle_event(started));
        let view = session.view();
        assert_eq!(view.stage, DisplayStage::Playing);
        assert!(view.end_info.is_none());
        assert_eq!(view.cards, Some(decode(next, 0)));
    }

    #[tokio::test]
    async fn test_fresh_deal_read_clears_previous_result() {
        let (chain, mut session) = playing(GameConfig::new(1, 1)).await;
        let mut events = Stream::new(chain.subscribe(), alice());
        session.action(false).await.unwrap();
        assert!(session.handle_event(events.next().await.unwrap().unwrap()));

        let next = seed() + U256::one();
        chain.set_next_deal(next);
        session.join().await.unwrap();
        session.start().await.unwrap();

        // The `GameStarted` event is never handled; the read alone shows the new deal.
        let view = session.refresh().await.unwrap();
        assert_eq!(view.stage, DisplayStage::Playing);
        assert!(view.end_info.is_none());
        assert_eq!(view.cards, Some(decode(next, 0)));
    }

    #[tokio::test]
    async fn test_reconnect_mid_game() {
        let (chain, mut session) = playing(GameConfig::default()).await;
        for _ in 0..8 {
            session.action(false).await.unwrap();
        }
        drop(session);

        let mut session = Session::connect(alice(), chain.clone(), chain.clone())
            .await
            .unwrap();
        let view = session.view();
        assert_eq!(view.stage, DisplayStage::Playing);
        assert_eq!(view.action_count, 8);
        assert_eq!(view.turn, 2);
        assert_eq!(view.cards, Some(decode(advance_seed(seed(), 1), 2)));

        // A late GameStarted for the same deal must not rewind progress.
        let replayed = Event::GameStarted {
            players: vec![alice()],
            seed: seed(),
        };
        assert!(!session.handle_event(replayed));
        assert_eq!(session.view().action_count, 8);
    }

    #[tokio::test]
    async fn test_connect_when_already_out() {
        let (chain, mut session) = playing(GameConfig::new(1, 1)).await;
        session.action(true).await.unwrap();
        drop(session);

        let session = Session::connect(alice(), chain.clone(), chain).await.unwrap();
        let view = session.view();
        let info = view.end_info.as_ref().expect("provisional end info");
        assert!(info.is_provisional());
        assert!(view.result().is_none());
    }

    #[tokio::test]
    async fn test_join_and_start_flow() {
        let chain = MockChain::new(GameConfig::default(), alice());
        chain.set_next_deal(seed());
        let mut events = Stream::new(chain.subscribe(), alice());
        let mut session = Session::connect(alice(), chain.clone(), chain.clone())
            .await
            .unwrap();

        session.join().await.unwrap();
        assert!(matches!(
            session.join().await,
            Err(Error::Reverted(ContractError::Joined))
        ));
        session.start().await.unwrap();
        assert!(session.view().cards.is_none());

        let event = events.next().await.unwrap().unwrap();
        assert!(session.handle_event(event.clone()));
        assert!(!session.handle_event(event));

        let view = session.view();
        assert_eq!(view.stage, DisplayStage::Playing);
        assert_eq!(view.cards, Some(decode(seed(), 0)));
    }

    #[tokio::test]
    async fn test_game_started_for_other_table_is_ignored() {
        let chain = MockChain::new(GameConfig::default(), alice());
        let mut session = Session::connect(alice(), chain.clone(), chain).await.unwrap();
        let event = Event::GameStarted {
            players: vec![bob()],
            seed: seed(),
        };
        assert!(!session.handle_event(event));
        assert!(session.view().cards.is_none());
    }
}
