//! Fallback policy for seats that disconnected mid-turn.
//!
//! It never looks at other seats or the discard pile, so its moves are legal
//! for any seat in any reachable state of its own turn.

use crate::AutoPlayer;
use tonk_engine::cards::Card;
use tonk_engine::player::{Action, ActionKind, PlayerId};
use tonk_engine::session::{TableSession, TurnPhase};

/// Draws from the deck if the draw is still owed, then discards the card with
/// the highest value (the lowest index wins ties). An empty hand passes.
///
/// # Example
///
/// ```rust
/// use tonk_ai::baseline::BaselineAutoPlayer;
/// use tonk_ai::AutoPlayer;
///
/// let policy = BaselineAutoPlayer::new();
/// assert_eq!(policy.name(), "BaselineAutoPlayer");
/// ```
#[derive(Debug, Clone, Default)]
pub struct BaselineAutoPlayer;

impl BaselineAutoPlayer {
    pub fn new() -> Self {
        Self
    }
}

/// Index of the highest-valued card, the lowest index among equals.
pub fn highest_card_index(hand: &[Card]) -> Option<usize> {
    hand.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, u32)>, (i, c)| match best {
            Some((_, v)) if v >= c.value() => best,
            _ => Some((i, c.value())),
        })
        .map(|(i, _)| i)
}

impl AutoPlayer for BaselineAutoPlayer {
    fn next_action(&self, session: &TableSession, player_id: &PlayerId) -> Action {
        let table_id = session.table_id().clone();
        let hand = session.seat(player_id).map(|s| s.hand()).unwrap_or(&[]);
        match session.phase() {
            TurnPhase::AwaitingDraw => Action::new(table_id, player_id.clone(), ActionKind::DrawDeck),
            TurnPhase::AwaitingDiscard => match highest_card_index(hand) {
                Some(i) => Action::discard(table_id, player_id.clone(), i),
                None => Action::new(table_id, player_id.clone(), ActionKind::Pass),
            },
        }
    }

    fn name(&self) -> &str {
        "BaselineAutoPlayer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonk_engine::player::PlayerProfile;

    fn cards(list: &[&str]) -> Vec<Card> {
        list.iter().map(|c| c.parse().unwrap()).collect()
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        assert_eq!(highest_card_index(&cards(&["3h", "Kd", "Qs", "7c"])), Some(1));
        assert_eq!(highest_card_index(&cards(&["Ah", "2d"])), Some(1));
        assert_eq!(highest_card_index(&[]), None);
    }

    #[test]
    fn plays_a_whole_turn() {
        let mut t = TableSession::new("t1", 1);
        t.join(PlayerProfile::new("a", "A")).unwrap();
        t.join(PlayerProfile::new("b", "B")).unwrap();
        t.start(3).unwrap();
        let ai = BaselineAutoPlayer::new();
        let a = "a".to_string();

        let draw = ai.next_action(&t, &a);
        assert_eq!(draw.kind, ActionKind::DrawDeck);
        t.apply(&draw).unwrap();

        let discard = ai.next_action(&t, &a);
        assert_eq!(discard.kind, ActionKind::Discard);
        let expected = highest_card_index(t.seat("a").unwrap().hand());
        assert_eq!(discard.card_index, expected);
        t.apply(&discard).unwrap();
        assert_eq!(t.current_turn_index(), 1);
    }
}
