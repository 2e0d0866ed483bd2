use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::cards::{Card, DECK_SIZE};
use crate::deck::Deck;
use crate::errors::GameError;
use crate::logger::SettlementRecord;
use crate::player::{Action, PlayerId, PlayerProfile, Seat, TableId};
use crate::rules::{validate_action, TableRules, ValidatedAction};
use crate::scoring::{forfeit_winner, score_round, stalemate_winner, EndReason, RoundOutcome};
use crate::snapshot::{PlayerView, StateSnapshot};

/// Lifecycle of a table. `Ended` is terminal for the round.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Waiting,
    Playing,
    Ended,
}

/// Where the current seat is within its turn.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// The seat owes exactly one draw
    AwaitingDraw,
    /// The seat has drawn and may drop melds before discarding
    AwaitingDiscard,
}

/// Whether a round is still running after a mutation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RoundStatus {
    Ongoing,
    Finished(RoundOutcome),
}

impl RoundStatus {
    pub fn outcome(&self) -> Option<&RoundOutcome> {
        match self {
            RoundStatus::Ongoing => None,
            RoundStatus::Finished(outcome) => Some(outcome),
        }
    }
}

/// Authoritative state of one table.
///
/// Every mutating call either succeeds completely or returns an error and
/// leaves the session untouched. After a successful mutation the card
/// conservation invariant is rechecked; a failure there is reported as
/// [`GameError::ConsistencyViolation`] and the session must be abandoned.
///
/// While `Playing`, the current seat is connected and active except right
/// after that seat disconnects mid-turn: [`TableSession::awaiting_autoplay`]
/// then names it and the owner must finish the turn on its behalf before
/// applying anything else.
#[derive(Debug, Clone)]
pub struct TableSession {
    table_id: TableId,
    stake_amount: u64,
    pot_amount: u64,
    rules: TableRules,
    seats: Vec<Seat>,
    status: TableStatus,
    phase: TurnPhase,
    current_turn_index: usize,
    deck: Option<Deck>,
    outcome: Option<RoundOutcome>,
    started_at: Option<DateTime<Utc>>,
    version: u64,
}

impl TableSession {
    pub fn new(table_id: impl Into<TableId>, stake_amount: u64) -> Self {
        Self {
            table_id: table_id.into(),
            stake_amount,
            pot_amount: 0,
            rules: TableRules::default(),
            seats: Vec::new(),
            status: TableStatus::Waiting,
            phase: TurnPhase::AwaitingDraw,
            current_turn_index: 0,
            deck: None,
            outcome: None,
            started_at: None,
            version: 0,
        }
    }

    pub fn with_rules(
        table_id: impl Into<TableId>,
        stake_amount: u64,
        rules: TableRules,
    ) -> Result<Self, GameError> {
        rules.validate()?;
        Ok(Self {
            rules,
            ..Self::new(table_id, stake_amount)
        })
    }

    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }
    pub fn stake_amount(&self) -> u64 {
        self.stake_amount
    }
    pub fn pot_amount(&self) -> u64 {
        self.pot_amount
    }
    pub fn rules(&self) -> &TableRules {
        &self.rules
    }
    pub fn status(&self) -> TableStatus {
        self.status
    }
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }
    pub fn current_turn_index(&self) -> usize {
        self.current_turn_index
    }
    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }
    pub fn version(&self) -> u64 {
        self.version
    }
    pub fn outcome(&self) -> Option<&RoundOutcome> {
        self.outcome.as_ref()
    }

    pub fn seat(&self, player_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id() == player_id)
    }

    pub fn seat_index(&self, player_id: &str) -> Option<usize> {
        self.seats.iter().position(|s| s.id() == player_id)
    }

    pub fn current_seat(&self) -> Option<&Seat> {
        match self.status {
            TableStatus::Playing => self.seats.get(self.current_turn_index),
            _ => None,
        }
    }

    pub fn discard_top(&self) -> Option<Card> {
        self.deck.as_ref().and_then(Deck::discard_top)
    }

    pub fn draw_count(&self) -> usize {
        self.deck.as_ref().map_or(0, Deck::draw_count)
    }

    pub fn discard_count(&self) -> usize {
        self.deck.as_ref().map_or(0, Deck::discard_count)
    }

    /// Seat index whose turn must be played automatically because it disconnected mid-turn.
    pub fn awaiting_autoplay(&self) -> Option<usize> {
        self.current_seat()
            .filter(|s| s.is_active() && !s.is_connected())
            .map(|_| self.current_turn_index)
    }

    /// Seats a player. Only allowed while `Waiting`.
    pub fn join(&mut self, profile: PlayerProfile) -> Result<(), GameError> {
        self.require_status(TableStatus::Waiting, "join")?;
        if self.seat(&profile.id).is_some() {
            return Err(GameError::DuplicatePlayer(profile.id));
        }
        if self.seats.len() >= self.rules.max_seats {
            return Err(GameError::TableFull {
                max_seats: self.rules.max_seats,
            });
        }
        self.seats.push(Seat::new(profile));
        self.version += 1;
        Ok(())
    }

    /// Removes a waiting player's seat, or forfeits a playing player's seat.
    pub fn leave(&mut self, player_id: &str) -> Result<RoundStatus, GameError> {
        let index = self
            .seat_index(player_id)
            .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
        match self.status {
            TableStatus::Waiting => {
                self.seats.remove(index);
                self.version += 1;
                Ok(RoundStatus::Ongoing)
            }
            TableStatus::Playing => {
                self.seats[index].forfeit();
                let status = self.after_seat_lost(index);
                self.version += 1;
                self.check_consistency()?;
                Ok(status)
            }
            TableStatus::Ended => Err(GameError::InvalidTransition {
                status: self.status,
                operation: "leave",
            }),
        }
    }

    /// Marks a seat connected or disconnected. Disconnecting can end the round by forfeit.
    pub fn set_connected(&mut self, player_id: &str, connected: bool) -> Result<RoundStatus, GameError> {
        let index = self
            .seat_index(player_id)
            .ok_or_else(|| GameError::UnknownPlayer(player_id.to_string()))?;
        if self.seats[index].is_connected() == connected {
            return Ok(RoundStatus::Ongoing);
        }
        self.seats[index].set_connected(connected);
        let status = if !connected && self.status == TableStatus::Playing {
            self.check_forfeit()
        } else {
            RoundStatus::Ongoing
        };
        self.version += 1;
        Ok(status)
    }

    /// Shuffles a fresh deck keyed by `seed` and starts the round.
    pub fn start(&mut self, seed: u64) -> Result<RoundStatus, GameError> {
        self.start_with_deck(Deck::new_shuffled(seed))
    }

    /// Starts the round from a prepared deck: deals, flips the first discard,
    /// collects the pot and hands the turn to seat 0.
    pub fn start_with_deck(&mut self, mut deck: Deck) -> Result<RoundStatus, GameError> {
        self.require_status(TableStatus::Waiting, "start")?;
        if self.seats.len() < self.rules.min_seats {
            return Err(GameError::NotEnoughPlayers {
                seated: self.seats.len(),
                required: self.rules.min_seats,
            });
        }
        let hands = deck.deal(self.seats.len(), self.rules.hand_size)?;
        deck.flip_to_discard()?;

        for (seat, hand) in self.seats.iter_mut().zip(hands) {
            seat.take_cards(hand);
        }
        self.deck = Some(deck);
        self.pot_amount = self.stake_amount.saturating_mul(self.seats.len() as u64);
        self.status = TableStatus::Playing;
        self.phase = TurnPhase::AwaitingDraw;
        self.current_turn_index = 0;
        self.outcome = None;
        self.started_at = Some(Utc::now());

        let status = self.check_forfeit();
        self.version += 1;
        self.check_consistency()?;
        Ok(status)
    }

    /// Validates and applies one action for the seat whose turn it is.
    ///
    /// A draw that finds nothing left ends the round in stalemate and is
    /// reported as [`RoundStatus::Finished`], not as an error.
    pub fn apply(&mut self, action: &Action) -> Result<RoundStatus, GameError> {
        let validated = validate_action(self, action)?;
        let index = self.current_turn_index;
        let deck = self
            .deck
            .as_mut()
            .ok_or_else(|| GameError::ConsistencyViolation("playing without a deck".into()))?;

        let status = match validated {
            ValidatedAction::DrawDeck => match deck.draw_from_deck() {
                Ok(card) => {
                    self.seats[index].receive(card);
                    self.phase = TurnPhase::AwaitingDiscard;
                    RoundStatus::Ongoing
                }
                Err(GameError::Stalemate) => {
                    let winner = stalemate_winner(&self.seats).ok_or_else(|| {
                        GameError::ConsistencyViolation("stalemate without an active seat".into())
                    })?;
                    self.finish(winner, EndReason::Stalemate)
                }
                Err(e) => return Err(e),
            },
            ValidatedAction::DrawDiscard => {
                let card = deck.draw_from_discard()?;
                self.seats[index].receive(card);
                self.phase = TurnPhase::AwaitingDiscard;
                RoundStatus::Ongoing
            }
            ValidatedAction::Drop(indices) => {
                self.seats[index].meld(&indices);
                RoundStatus::Ongoing
            }
            ValidatedAction::Discard(i) => {
                let card = self.seats[index].remove_at(i);
                deck.discard(card);
                self.advance_turn();
                RoundStatus::Ongoing
            }
            ValidatedAction::Pass => {
                self.advance_turn();
                RoundStatus::Ongoing
            }
            ValidatedAction::Tonk => self.finish(index, EndReason::Tonk),
        };

        self.version += 1;
        self.check_consistency()?;
        Ok(status)
    }

    /// The view delivered to `viewer`; pass `None` for spectators.
    pub fn snapshot(&self, viewer: Option<&str>) -> StateSnapshot {
        StateSnapshot {
            table_id: self.table_id.clone(),
            version: self.version,
            status: self.status,
            phase: (self.status == TableStatus::Playing).then_some(self.phase),
            players: self
                .seats
                .iter()
                .map(|s| PlayerView {
                    id: s.id().clone(),
                    name: s.name().to_string(),
                    card_count: s.hand().len(),
                    cards: (viewer == Some(s.id().as_str())).then(|| s.hand().to_vec()),
                    melds: s.melds().to_vec(),
                    connected: s.is_connected(),
                    active: s.is_active(),
                })
                .collect(),
            current_player_index: self.current_turn_index,
            deck_count: self.draw_count(),
            discard_pile_top: self.discard_top(),
            pot_amount: self.pot_amount,
            winner: self.outcome.as_ref().map(|o| o.winner_id.clone()),
            scores: self.outcome.as_ref().map(|o| {
                o.scores
                    .iter()
                    .map(|p| (p.id.clone(), p.score))
                    .collect()
            }),
        }
    }

    /// Settlement for the finished round, `None` until the session has ended.
    pub fn settlement(&self) -> Option<SettlementRecord> {
        let outcome = self.outcome.as_ref()?;
        Some(SettlementRecord {
            table_id: self.table_id.clone(),
            pot_amount: self.pot_amount,
            winner_id: outcome.winner_id.clone(),
            players: outcome.scores.clone(),
            started_at: self.started_at.unwrap_or(outcome.ended_at),
            ended_at: outcome.ended_at,
            end_reason: outcome.reason,
            seed: self.deck.as_ref().and_then(Deck::seed),
        })
    }

    /// Fresh waiting session at the same stake with every still-active player
    /// re-seated in order. Disconnected players stay disconnected.
    pub fn next_round(&self) -> Result<TableSession, GameError> {
        self.require_status(TableStatus::Ended, "reset")?;
        let mut next = TableSession {
            rules: self.rules,
            ..TableSession::new(self.table_id.clone(), self.stake_amount)
        };
        next.seats = self
            .seats
            .iter()
            .filter(|s| s.is_active())
            .map(Seat::reseat)
            .collect();
        next.version = self.version + 1;
        Ok(next)
    }

    /// Verifies that hands, melds and both piles hold each of the 40 cards exactly once.
    pub fn check_consistency(&self) -> Result<(), GameError> {
        let Some(deck) = &self.deck else {
            return Ok(());
        };
        let mut seen = HashSet::with_capacity(DECK_SIZE);
        let mut total = 0usize;
        for card in self.seats.iter().flat_map(Seat::all_cards).chain(deck.cards()) {
            total += 1;
            if !seen.insert(*card) {
                return Err(GameError::ConsistencyViolation(format!(
                    "{card} appears in more than one place"
                )));
            }
        }
        if total != DECK_SIZE {
            return Err(GameError::ConsistencyViolation(format!(
                "{total} cards in play, expected {DECK_SIZE}"
            )));
        }
        Ok(())
    }

    fn require_status(&self, wanted: TableStatus, operation: &'static str) -> Result<(), GameError> {
        if self.status == wanted {
            Ok(())
        } else {
            Err(GameError::InvalidTransition {
                status: self.status,
                operation,
            })
        }
    }

    /// Moves the turn to the next connected, active seat in seating order.
    fn advance_turn(&mut self) {
        let n = self.seats.len();
        if let Some(next) = (1..=n)
            .map(|step| (self.current_turn_index + step) % n)
            .find(|&i| self.seats[i].can_play())
        {
            self.current_turn_index = next;
        }
        self.phase = TurnPhase::AwaitingDraw;
    }

    /// Handles a seat that forfeited: the round may end, otherwise the turn moves on if it was theirs.
    fn after_seat_lost(&mut self, index: usize) -> RoundStatus {
        let status = self.check_forfeit();
        if status == RoundStatus::Ongoing && index == self.current_turn_index {
            self.advance_turn();
        }
        status
    }

    fn check_forfeit(&mut self) -> RoundStatus {
        if self.seats.iter().filter(|s| s.can_play()).count() >= 2 {
            return RoundStatus::Ongoing;
        }
        match forfeit_winner(&self.seats) {
            Some(winner) => self.finish(winner, EndReason::Forfeit),
            None => RoundStatus::Ongoing,
        }
    }

    fn finish(&mut self, winner: usize, reason: EndReason) -> RoundStatus {
        let outcome = score_round(&self.seats, winner, reason);
        self.status = TableStatus::Ended;
        self.outcome = Some(outcome.clone());
        RoundStatus::Finished(outcome)
    }

    #[cfg(test)]
    pub(crate) fn seats_mut(&mut self) -> &mut Vec<Seat> {
        &mut self.seats
    }

    #[cfg(test)]
    pub(crate) fn deck_mut(&mut self) -> Option<&mut Deck> {
        self.deck.as_mut()
    }
}
