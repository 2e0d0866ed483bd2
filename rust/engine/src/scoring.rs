use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::player::{PlayerId, Seat};

/// Why a round ended.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// A player declared Tonk with an eligible hand
    Tonk,
    /// Nothing was left to draw
    Stalemate,
    /// Fewer than two connected, active seats remained
    Forfeit,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub id: PlayerId,
    /// Value of the cards left in hand when the round ended
    pub score: u32,
}

/// Result of a finished round.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RoundOutcome {
    pub winner_index: usize,
    pub winner_id: PlayerId,
    pub reason: EndReason,
    /// One entry per seat, in seating order
    pub scores: Vec<PlayerScore>,
    pub ended_at: DateTime<Utc>,
}

/// Scores every seat and names the winner.
///
/// Scores are recorded for bookkeeping only; once a winner is known they
/// never change who takes the pot.
pub fn score_round(seats: &[Seat], winner_index: usize, reason: EndReason) -> RoundOutcome {
    RoundOutcome {
        winner_index,
        winner_id: seats[winner_index].id().clone(),
        reason,
        scores: seats
            .iter()
            .map(|s| PlayerScore {
                id: s.id().clone(),
                score: s.hand_value(),
            })
            .collect(),
        ended_at: Utc::now(),
    }
}

/// Active seat with the lowest hand value; ties go to the lowest seat index.
pub fn stalemate_winner(seats: &[Seat]) -> Option<usize> {
    seats
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_active())
        .min_by_key(|(i, s)| (s.hand_value(), *i))
        .map(|(i, _)| i)
}

/// The last seat still able to play. With nobody left the stalemate rule decides.
pub fn forfeit_winner(seats: &[Seat]) -> Option<usize> {
    let mut playing = seats.iter().enumerate().filter(|(_, s)| s.can_play());
    match (playing.next(), playing.next()) {
        (Some((i, _)), None) => Some(i),
        (None, _) => stalemate_winner(seats).or(if seats.is_empty() { None } else { Some(0) }),
        (Some(_), Some(_)) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerProfile;

    fn seat_with(id: &str, cards: &[&str]) -> Seat {
        let mut seat = Seat::new(PlayerProfile::new(id, id));
        seat.take_cards(cards.iter().map(|c| c.parse().unwrap()).collect());
        seat
    }

    #[test]
    fn stalemate_tie_goes_to_lowest_seat() {
        let seats = vec![
            seat_with("a", &["Kh", "Qh"]),
            seat_with("b", &["7h", "3h"]),
            seat_with("c", &["Js"]),
        ];
        assert_eq!(stalemate_winner(&seats), Some(1));
    }

    #[test]
    fn stalemate_skips_inactive_seats() {
        let mut seats = vec![seat_with("a", &["Ah"]), seat_with("b", &["Kh"])];
        seats[0].forfeit();
        assert_eq!(stalemate_winner(&seats), Some(1));
    }

    #[test]
    fn forfeit_needs_a_single_remaining_seat() {
        let mut seats = vec![
            seat_with("a", &["Ah"]),
            seat_with("b", &["Kh"]),
            seat_with("c", &["Qh"]),
        ];
        assert_eq!(forfeit_winner(&seats), None);
        seats[0].forfeit();
        seats[2].set_connected(false);
        assert_eq!(forfeit_winner(&seats), Some(1));
    }

    #[test]
    fn scores_cover_every_seat() {
        let seats = vec![seat_with("a", &["Ah", "2h"]), seat_with("b", &["Kh"])];
        let outcome = score_round(&seats, 0, EndReason::Tonk);
        assert_eq!(outcome.winner_id, "a");
        assert_eq!(
            outcome.scores,
            vec![
                PlayerScore { id: "a".into(), score: 3 },
                PlayerScore { id: "b".into(), score: 10 },
            ]
        );
    }
}
