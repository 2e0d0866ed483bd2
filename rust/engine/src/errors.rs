use crate::player::PlayerId;
use crate::session::{TableStatus, TurnPhase};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid move: {0}")]
    InvalidMove(#[from] MoveRejection),
    #[error("Discard pile is empty")]
    EmptyDiscard,
    /// Draw pile and discard pile (minus its top) are both exhausted.
    /// The session turns this into a round end; callers of `apply` never see it.
    #[error("Draw pile and discard pile are exhausted")]
    Stalemate,
    #[error("Cannot {operation} while table is {status:?}")]
    InvalidTransition {
        status: TableStatus,
        operation: &'static str,
    },
    #[error("Need {required} seated players to start, have {seated}")]
    NotEnoughPlayers { seated: usize, required: usize },
    #[error("Not enough cards to deal: needed {needed}, available {available}")]
    InsufficientCards { needed: usize, available: usize },
    #[error("Table is full ({max_seats} seats)")]
    TableFull { max_seats: usize },
    #[error("Player {0} is already seated")]
    DuplicatePlayer(PlayerId),
    #[error("Player {0} is not seated at this table")]
    UnknownPlayer(PlayerId),
    #[error("Invalid table rules: {0}")]
    InvalidRules(String),
    #[error("Consistency violation: {0}")]
    ConsistencyViolation(String),
}

impl GameError {
    /// Only a broken invariant is fatal to a table; every other error leaves it intact.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::ConsistencyViolation(_))
    }
}

/// Why an action was refused. Delivered to the acting player only.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("action addressed to table {0}")]
    WrongTable(String),
    #[error("no round in progress")]
    RoundNotInProgress,
    #[error("player {0} has no seat in this round")]
    NotInRound(PlayerId),
    #[error("it's not player {actual}'s turn (expected {expected})")]
    NotYourTurn { expected: PlayerId, actual: PlayerId },
    #[error("{action} is not allowed while {phase:?}")]
    WrongPhase {
        phase: TurnPhase,
        action: &'static str,
    },
    #[error("card index {index} is out of range for a hand of {hand_size}")]
    IndexOutOfRange { index: usize, hand_size: usize },
    #[error("card index {0} selected more than once")]
    DuplicateIndex(usize),
    #[error("{action} needs {expected} card(s), got {actual}")]
    WrongSelectionSize {
        action: &'static str,
        expected: &'static str,
        actual: usize,
    },
    #[error("selected cards form neither a set nor a run")]
    NotAMeld,
    #[error("hand value {hand_value} exceeds the Tonk limit of {threshold}")]
    TonkIneligible { hand_value: u32, threshold: u32 },
    #[error("pass is only allowed with an empty hand")]
    PassWithCards,
}
