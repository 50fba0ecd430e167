//! Per-player round progression.
//!
//! [`RoundStateMachine`] tracks `{seed, turn, action_count}` for one player and applies the
//! local effect of an action: advance the window, redraw the deck every
//! [`RESEED_INTERVAL`] actions and flag the end of the round.
//!
//! ## Confirmed vs pending
//!
//! The contract is authoritative, but the player expects to see the next cards as soon as
//! they act. The machine therefore keeps two views:
//! - **confirmed** - the last snapshot read from the chain;
//! - **projection** - confirmed plus every locally applied action, whether already accepted
//!   by the submitter or still in flight.
//!
//! Actions always build on the projection. A failed submission discards the actions still in
//! flight, and every authoritative read replaces the confirmed view, dropping the projection
//! once the chain has caught up with it or moved on to another deal.
//!
//! The machine performs no I/O. Submitting the action is the caller's job; the caller must
//! apply the action here before awaiting the submission so that two actions can never share
//! a turn.

use ethers::types::U256;
use mollinalli_types::{
    CardBatch, GameConfig, PlayerInvariantError, PlayerSession, RESEED_INTERVAL,
};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    bell::has_four_of_a_kind,
    cards::decode,
    seed::{advance_seed, next_seed},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoundError {
    #[error("round state is not initialized")]
    NotInitialized,
    #[error("no seed has been dealt yet")]
    NoSeed,
    #[error("action limit reached (max={max})")]
    ActionLimitReached { max: u8 },
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(#[from] PlayerInvariantError),
}

/// Position of a player in their seed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Progress {
    pub seed: U256,
    pub turn: u8,
    pub action_count: u8,
}

impl Progress {
    pub fn new(seed: U256) -> Self {
        Self {
            seed,
            turn: 0,
            action_count: 0,
        }
    }

    pub fn from_session(player: &PlayerSession) -> Self {
        Self {
            seed: player.seed,
            turn: player.turn,
            action_count: player.action_count,
        }
    }

    /// Progress after one more action, and whether the deck was redrawn.
    pub fn advance(&self) -> (Self, bool) {
        let action_count = self.action_count.saturating_add(1);
        if action_count % RESEED_INTERVAL == 0 {
            let next = Self {
                seed: next_seed(self.seed),
                turn: 0,
                action_count,
            };
            return (next, true);
        }
        let next = Self {
            seed: self.seed,
            turn: self.turn.saturating_add(1),
            action_count,
        };
        (next, false)
    }

    /// Cards visible at this position, or `None` before a seed was dealt.
    pub fn cards(&self) -> Option<CardBatch> {
        if self.seed.is_zero() {
            return None;
        }
        Some(decode(self.seed, self.turn as u64))
    }
}

/// Result of applying one action locally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    /// Whether the player rang the bell.
    pub bell: bool,
    /// Whether ringing was correct for the cards the player acted on.
    pub bell_expected: bool,
    /// Progress after the action.
    pub progress: Progress,
    /// The deck was redrawn by this action.
    pub reseeded: bool,
    /// This action completed the round. Reported once per session.
    pub round_ended: bool,
    /// Cards now visible.
    pub cards: CardBatch,
}

impl ActionOutcome {
    /// Whether the action matches what the contract will score as correct.
    pub fn is_correct(&self) -> bool {
        self.bell == self.bell_expected
    }
}

/// Effect of discarding the pending projection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rollback {
    /// In-flight actions that were dropped.
    pub discarded: usize,
    /// A round end reported by a dropped action was withdrawn.
    pub round_end_revoked: bool,
}

/// Local mirror of one player's progress through a game.
#[derive(Clone, Debug)]
pub struct RoundStateMachine {
    config: GameConfig,
    /// Seed the current game was dealt, when known.
    session_seed: Option<U256>,
    confirmed: Option<Progress>,
    /// Progress after the last action the submitter accepted.
    accepted: Option<Progress>,
    /// Progress after each action still in flight, oldest first.
    pending: VecDeque<Progress>,
    /// Action count at which the round end was reported.
    round_end_at: Option<u8>,
}

impl RoundStateMachine {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            session_seed: None,
            confirmed: None,
            accepted: None,
            pending: VecDeque::new(),
            round_end_at: None,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.confirmed.is_some()
    }

    /// Last authoritative progress.
    pub fn confirmed(&self) -> Option<Progress> {
        self.confirmed
    }

    /// Locally projected progress, if the chain has not caught up yet.
    pub fn projection(&self) -> Option<Progress> {
        self.pending.back().copied().or(self.accepted)
    }

    /// Progress shown to the player: the projection when present, confirmed otherwise.
    pub fn current(&self) -> Option<Progress> {
        self.projection().or(self.confirmed)
    }

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    fn clear_projection(&mut self) {
        self.accepted = None;
        self.pending.clear();
    }

    pub fn round_end_signaled(&self) -> bool {
        self.round_end_at.is_some()
    }

    pub fn visible_cards(&self) -> Option<CardBatch> {
        self.current().and_then(|progress| progress.cards())
    }

    /// Whether ringing would be correct for the visible cards.
    pub fn bell_expected(&self) -> Option<bool> {
        self.current()
            .filter(|progress| !progress.seed.is_zero())
            .map(|progress| has_four_of_a_kind(progress.seed, progress.turn as u64))
    }

    /// Adopt the first snapshot of a session.
    ///
    /// Returns `false` without touching state when already initialized: a repeated or
    /// stale snapshot must not reset progress made locally since.
    pub fn initialize(&mut self, player: &PlayerSession) -> Result<bool, RoundError> {
        if self.is_initialized() {
            debug!("ignoring repeated initial snapshot");
            return Ok(false);
        }
        player.validate_invariants()?;
        let progress = Progress::from_session(player);
        self.session_seed = (progress.action_count == 0 && !progress.seed.is_zero())
            .then_some(progress.seed);
        self.confirmed = Some(progress);
        self.clear_projection();
        self.round_end_at = None;
        debug!(
            action_count = progress.action_count,
            turn = progress.turn,
            has_seed = !progress.seed.is_zero(),
            "initialized round state"
        );
        Ok(true)
    }

    /// Whether `seed` is the deal of the game currently tracked.
    ///
    /// Mid-game snapshots only expose the current (possibly redrawn) seed, so the deal is
    /// recognized by replaying the redraws it would have gone through.
    pub fn is_current_session(&self, seed: U256) -> bool {
        if self.session_seed == Some(seed) {
            return true;
        }
        let Some(confirmed) = self.confirmed else {
            return false;
        };
        if confirmed.seed.is_zero() {
            return false;
        }
        let rounds = (confirmed.action_count / RESEED_INTERVAL) as usize;
        advance_seed(seed, rounds) == confirmed.seed
    }

    /// A new game dealt `seed` to this player.
    ///
    /// Returns `false` when `seed` belongs to the game already tracked.
    pub fn start_session(&mut self, seed: U256) -> bool {
        if self.is_current_session(seed) {
            debug!("ignoring repeated game start");
            self.session_seed = Some(seed);
            return false;
        }
        self.session_seed = Some(seed);
        self.confirmed = Some(Progress::new(seed));
        self.clear_projection();
        self.round_end_at = None;
        info!("started new session");
        true
    }

    /// Forget the tracked game (e.g. after joining a new lobby).
    pub fn reset(&mut self) {
        self.session_seed = None;
        self.confirmed = None;
        self.clear_projection();
        self.round_end_at = None;
        debug!("reset round state");
    }

    /// Apply an action to the projection.
    pub fn apply_action(&mut self, bell: bool) -> Result<ActionOutcome, RoundError> {
        let current = self.current().ok_or(RoundError::NotInitialized)?;
        if current.seed.is_zero() {
            return Err(RoundError::NoSeed);
        }
        if current.action_count >= self.config.max_action {
            return Err(RoundError::ActionLimitReached {
                max: self.config.max_action,
            });
        }

        let bell_expected = has_four_of_a_kind(current.seed, current.turn as u64);
        let (progress, reseeded) = current.advance();
        let round_ended = self.round_end_at.is_none()
            && progress.action_count == self.config.max_action_per_round;
        if round_ended {
            self.round_end_at = Some(progress.action_count);
        }
        self.pending.push_back(progress);

        debug!(
            bell,
            bell_expected,
            action_count = progress.action_count,
            turn = progress.turn,
            in_flight = self.pending.len(),
            "applied action"
        );
        if reseeded {
            info!(action_count = progress.action_count, "redrew deck");
        }
        if round_ended {
            info!(action_count = progress.action_count, "round ended");
        }

        // `progress.seed` is non-zero: it is either `current.seed` or a hash of it.
        let cards = decode(progress.seed, progress.turn as u64);
        Ok(ActionOutcome {
            bell,
            bell_expected,
            progress,
            reseeded,
            round_ended,
            cards,
        })
    }

    /// The oldest in-flight submission was accepted.
    ///
    /// The projection stays until an authoritative read catches up with it.
    pub fn submission_confirmed(&mut self) {
        if let Some(progress) = self.pending.pop_front() {
            self.accepted = Some(progress);
        }
    }

    /// A submission failed: discard every action still in flight and fall back to the last
    /// accepted one (or to confirmed).
    pub fn submission_failed(&mut self) -> Rollback {
        let discarded = self.pending.len();
        self.pending.clear();

        let base_count = self
            .accepted
            .or(self.confirmed)
            .map(|p| p.action_count)
            .unwrap_or(0);
        let round_end_revoked = matches!(self.round_end_at, Some(at) if at > base_count);
        if round_end_revoked {
            self.round_end_at = None;
        }
        warn!(discarded, round_end_revoked, "discarded pending actions");
        Rollback {
            discarded,
            round_end_revoked,
        }
    }

    /// Adopt an authoritative snapshot.
    ///
    /// A snapshot behind the projection only moves the confirmed view; accepted actions stay
    /// projected until the chain reports them. A snapshot from another deal replaces
    /// everything.
    ///
    /// Returns whether the visible progress changed.
    pub fn reconcile(&mut self, player: &PlayerSession) -> Result<bool, RoundError> {
        if !self.is_initialized() {
            return self.initialize(player);
        }
        player.validate_invariants()?;

        let before = self.current();
        let confirmed = Progress::from_session(player);
        self.confirmed = Some(confirmed);

        if let Some(projection) = self.projection() {
            if !same_deal(confirmed, projection) {
                warn!(
                    confirmed = confirmed.action_count,
                    projected = projection.action_count,
                    "chain moved to another deal, dropping local projection"
                );
                self.clear_projection();
                self.round_end_at = None;
            } else if confirmed.action_count >= projection.action_count {
                if confirmed != projection {
                    warn!(
                        confirmed = confirmed.action_count,
                        projected = projection.action_count,
                        "chain is ahead of local projection"
                    );
                }
                self.clear_projection();
            } else if self
                .accepted
                .is_some_and(|accepted| confirmed.action_count >= accepted.action_count)
            {
                self.accepted = None;
            }
        }
        if let Some(at) = self.round_end_at {
            if confirmed.action_count < at && self.projection().is_none() {
                self.round_end_at = None;
            }
        }

        let changed = before != self.current();
        if changed {
            debug!(
                action_count = confirmed.action_count,
                turn = confirmed.turn,
                "reconciled with chain"
            );
        }
        Ok(changed)
    }
}

/// Whether `a` and `b` are positions in the same deal, i.e. the later seed is reached from
/// the earlier one by the redraws between them.
pub fn same_deal(a: Progress, b: Progress) -> bool {
    let (behind, ahead) = if a.action_count <= b.action_count {
        (a, b)
    } else {
        (b, a)
    };
    let rounds = ahead.action_count / RESEED_INTERVAL - behind.action_count / RESEED_INTERVAL;
    advance_seed(behind.seed, rounds as usize) == ahead.seed
}
