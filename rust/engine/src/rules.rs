use crate::cards::{Card, DECK_SIZE};
use crate::errors::{GameError, MoveRejection};
use crate::player::{Action, ActionKind};
use crate::session::{TableSession, TableStatus, TurnPhase};
use serde::{Deserialize, Serialize};

/// Highest hand value that may still declare Tonk.
pub const TONK_LIMIT: u32 = 50;

/// Smallest number of cards in a set or run.
pub const MIN_MELD: usize = 3;

/// True iff there are at least three cards and all share a rank.
pub fn is_valid_set(cards: &[Card]) -> bool {
    cards.len() >= MIN_MELD && cards.iter().all(|c| c.rank == cards[0].rank)
}

/// True iff there are at least three cards of one suit whose values, once sorted,
/// step by exactly one. The Ace is always low, so nothing wraps around.
pub fn is_valid_run(cards: &[Card]) -> bool {
    if cards.len() < MIN_MELD || !cards.iter().all(|c| c.suit == cards[0].suit) {
        return false;
    }
    let mut values: Vec<u32> = cards.iter().map(Card::value).collect();
    values.sort_unstable();
    values.windows(2).all(|w| w[1] == w[0] + 1)
}

pub fn hand_value(cards: &[Card]) -> u32 {
    cards.iter().map(Card::value).sum()
}

pub fn is_tonk_eligible(cards: &[Card]) -> bool {
    hand_value(cards) <= TONK_LIMIT
}

/// Per-table dealing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableRules {
    /// Cards dealt to each seat
    pub hand_size: usize,
    /// Seats required to start a round
    pub min_seats: usize,
    /// Seats a table accepts
    pub max_seats: usize,
}

impl Default for TableRules {
    fn default() -> Self {
        Self {
            hand_size: 5,
            min_seats: 2,
            max_seats: 4,
        }
    }
}

impl TableRules {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.hand_size == 0 {
            return Err(GameError::InvalidRules("hand_size must be at least 1".into()));
        }
        if self.min_seats < 2 {
            return Err(GameError::InvalidRules("min_seats must be at least 2".into()));
        }
        if self.max_seats < self.min_seats {
            return Err(GameError::InvalidRules(
                "max_seats must not be below min_seats".into(),
            ));
        }
        // a full table still needs one card to seed the discard pile
        if self.max_seats * self.hand_size + 1 > DECK_SIZE {
            return Err(GameError::InvalidRules(format!(
                "{} seats of {} cards do not fit a {DECK_SIZE}-card deck",
                self.max_seats, self.hand_size
            )));
        }
        Ok(())
    }
}

/// An action that passed every rule check against the session it was validated on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedAction {
    DrawDeck,
    DrawDiscard,
    Discard(usize),
    /// Distinct hand indices, ascending.
    Drop(Vec<usize>),
    Tonk,
    Pass,
}

/// Checks turn ownership, phase ordering and card selection without touching
/// the session.
///
/// # Errors
///
/// - [`GameError::InvalidMove`] for every rule violation, carrying the reason
/// - [`GameError::EmptyDiscard`] when drawing from an empty discard pile
pub fn validate_action(
    session: &TableSession,
    action: &Action,
) -> Result<ValidatedAction, GameError> {
    if action.table_id != *session.table_id() {
        return Err(MoveRejection::WrongTable(action.table_id.clone()).into());
    }
    if session.status() != TableStatus::Playing {
        return Err(MoveRejection::RoundNotInProgress.into());
    }
    let Some(seat_index) = session.seat_index(&action.player_id) else {
        return Err(MoveRejection::NotInRound(action.player_id.clone()).into());
    };
    let current = session.current_turn_index();
    if seat_index != current {
        return Err(MoveRejection::NotYourTurn {
            expected: session.seats()[current].id().clone(),
            actual: action.player_id.clone(),
        }
        .into());
    }

    let phase = session.phase();
    let hand = session.seats()[seat_index].hand();
    let require_phase = |wanted: TurnPhase, name: &'static str| {
        if phase == wanted {
            Ok(())
        } else {
            Err(GameError::from(MoveRejection::WrongPhase {
                phase,
                action: name,
            }))
        }
    };

    match action.kind {
        ActionKind::DrawDeck => {
            require_phase(TurnPhase::AwaitingDraw, "draw_deck")?;
            Ok(ValidatedAction::DrawDeck)
        }
        ActionKind::DrawDiscard => {
            require_phase(TurnPhase::AwaitingDraw, "draw_discard")?;
            if session.discard_top().is_none() {
                return Err(GameError::EmptyDiscard);
            }
            Ok(ValidatedAction::DrawDiscard)
        }
        ActionKind::Discard => {
            require_phase(TurnPhase::AwaitingDiscard, "discard")?;
            let selected = checked_selection(action.selection(), hand.len())?;
            if selected.len() != 1 {
                return Err(MoveRejection::WrongSelectionSize {
                    action: "discard",
                    expected: "exactly 1",
                    actual: selected.len(),
                }
                .into());
            }
            Ok(ValidatedAction::Discard(selected[0]))
        }
        ActionKind::Drop => {
            require_phase(TurnPhase::AwaitingDiscard, "drop")?;
            let selected = checked_selection(action.selection(), hand.len())?;
            if selected.len() < MIN_MELD {
                return Err(MoveRejection::WrongSelectionSize {
                    action: "drop",
                    expected: "at least 3",
                    actual: selected.len(),
                }
                .into());
            }
            let cards: Vec<Card> = selected.iter().map(|&i| hand[i]).collect();
            if !is_valid_set(&cards) && !is_valid_run(&cards) {
                return Err(MoveRejection::NotAMeld.into());
            }
            Ok(ValidatedAction::Drop(selected))
        }
        ActionKind::Tonk => {
            if !is_tonk_eligible(hand) {
                return Err(MoveRejection::TonkIneligible {
                    hand_value: hand_value(hand),
                    threshold: TONK_LIMIT,
                }
                .into());
            }
            Ok(ValidatedAction::Tonk)
        }
        ActionKind::Pass => {
            require_phase(TurnPhase::AwaitingDiscard, "pass")?;
            if !hand.is_empty() {
                return Err(MoveRejection::PassWithCards.into());
            }
            Ok(ValidatedAction::Pass)
        }
    }
}

/// Sorted, distinct, in-range indices.
fn checked_selection(mut indices: Vec<usize>, hand_size: usize) -> Result<Vec<usize>, GameError> {
    if let Some(&index) = indices.iter().find(|&&i| i >= hand_size) {
        return Err(MoveRejection::IndexOutOfRange { index, hand_size }.into());
    }
    indices.sort_unstable();
    if let Some(w) = indices.windows(2).find(|w| w[0] == w[1]) {
        return Err(MoveRejection::DuplicateIndex(w[0]).into());
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_rejects_out_of_range_and_duplicates() {
        assert_eq!(checked_selection(vec![2, 0, 1], 3), Ok(vec![0, 1, 2]));
        assert!(matches!(
            checked_selection(vec![0, 5], 5),
            Err(GameError::InvalidMove(MoveRejection::IndexOutOfRange { index: 5, .. }))
        ));
        assert!(matches!(
            checked_selection(vec![1, 1, 2], 5),
            Err(GameError::InvalidMove(MoveRejection::DuplicateIndex(1)))
        ));
    }

    #[test]
    fn default_rules_are_valid_and_oversized_tables_are_not() {
        assert!(TableRules::default().validate().is_ok());
        let rules = TableRules {
            max_seats: 8,
            ..TableRules::default()
        };
        assert!(matches!(rules.validate(), Err(GameError::InvalidRules(_))));
    }
}
