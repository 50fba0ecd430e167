//! Displayed stage and end-of-game capture.
//!
//! The contract reports `NOT_START -> PLAYING -> ENDED`. On top of that the client keeps a
//! local `WAITING_END` overlay, entered from `PLAYING` once the player has finished their
//! round (or is seen as out) and left only when a new game starts. While the overlay is set
//! the contract stage keeps being tracked underneath but is not displayed, so results stay
//! visible even after the contract has already cycled back to `NOT_START`.

use ethers::types::Address;
use mollinalli_types::{DisplayStage, EndInfo, PlayerSession, Stage};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct StageTracker {
    address: Address,
    chain: Option<Stage>,
    waiting_end: bool,
    end_info: Option<EndInfo>,
}

impl StageTracker {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            chain: None,
            waiting_end: false,
            end_info: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Last known contract stage.
    pub fn chain_stage(&self) -> Option<Stage> {
        self.chain
    }

    /// Stage to show.
    pub fn display(&self) -> DisplayStage {
        if self.waiting_end {
            return DisplayStage::WaitingEnd;
        }
        self.chain.map(DisplayStage::from).unwrap_or(DisplayStage::NotStart)
    }

    pub fn end_info(&self) -> Option<&EndInfo> {
        self.end_info.as_ref()
    }

    /// Adopt a fresh read of the contract.
    ///
    /// Unknown stage values are ignored. A player already marked out gets a provisional
    /// [`EndInfo`] right away, since the `GameEnded` event may have been emitted before this
    /// client started listening.
    pub fn on_snapshot(&mut self, stage_raw: u8, player: &PlayerSession) -> DisplayStage {
        match Stage::from_raw(stage_raw) {
            Some(stage) => {
                if self.chain != Some(stage) {
                    debug!(?stage, waiting_end = self.waiting_end, "contract stage changed");
                }
                self.chain = Some(stage);
            }
            None => warn!(stage_raw, "ignoring unknown contract stage"),
        }
        if player.out {
            if self.end_info.is_none() {
                debug!("player is out, capturing provisional end info");
                self.end_info = Some(EndInfo::provisional(self.address, player.clone()));
            }
            self.enter_waiting_end();
        }
        self.display()
    }

    /// Switch to `WAITING_END`. Only possible while playing.
    pub fn enter_waiting_end(&mut self) -> bool {
        if self.waiting_end {
            return false;
        }
        if self.display() != DisplayStage::Playing {
            return false;
        }
        self.waiting_end = true;
        info!("waiting for game end");
        true
    }

    /// Undo `WAITING_END` after the action that triggered it was rolled back.
    pub fn revoke_waiting_end(&mut self) {
        if self.waiting_end {
            debug!("leaving waiting end after rollback");
        }
        self.waiting_end = false;
    }

    /// A new game started: clear the overlay and the previous result.
    pub fn on_game_started(&mut self) {
        self.waiting_end = false;
        self.end_info = None;
        self.chain = Some(Stage::Playing);
    }

    /// A `GameEnded` event arrived.
    ///
    /// Events for other players are ignored. A provisional EndInfo is upgraded; a confirmed
    /// one is kept until the next game.
    pub fn on_game_ended(&mut self, info: EndInfo) -> bool {
        if info.address != self.address {
            return false;
        }
        if matches!(&self.end_info, Some(existing) if !existing.is_provisional()) {
            debug!("ignoring repeated game end");
            return false;
        }
        info!(
            score = info.player.score,
            action_count = info.player.action_count,
            end_time = info.timestamp,
            "game ended"
        );
        self.end_info = Some(info);
        true
    }
}
