use std::collections::BTreeMap;

use crate::AutoPlayer;
use crate::baseline::highest_card_index;
use tonk_engine::cards::Card;
use tonk_engine::player::{Action, ActionKind, PlayerId};
use tonk_engine::rules::hand_value;
use tonk_engine::session::{TableSession, TurnPhase};

/// Takes the discard when it completes a meld, drops every meld it holds and
/// declares Tonk once the hand is worth `tonk_at` or less.
#[derive(Debug, Clone)]
pub struct GreedyAutoPlayer {
    pub tonk_at: u32,
}

impl Default for GreedyAutoPlayer {
    fn default() -> Self {
        Self { tonk_at: 15 }
    }
}

/// Indices of a set or run inside `hand`, preferring the larger group.
pub fn find_meld(hand: &[Card]) -> Option<Vec<usize>> {
    let mut by_rank: BTreeMap<_, Vec<usize>> = BTreeMap::new();
    let mut by_suit: BTreeMap<_, Vec<usize>> = BTreeMap::new();
    for (i, c) in hand.iter().enumerate() {
        by_rank.entry(c.rank).or_default().push(i);
        by_suit.entry(c.suit).or_default().push(i);
    }

    let best_set = by_rank.into_values().filter(|g| g.len() >= 3).max_by_key(Vec::len);
    let best_run = by_suit
        .into_values()
        .filter_map(|g| longest_run(hand, g))
        .max_by_key(Vec::len);

    match (best_set, best_run) {
        (Some(s), Some(r)) if r.len() > s.len() => Some(r),
        (Some(s), _) => Some(s),
        (None, r) => r,
    }
}

/// Longest streak of consecutive values among same-suit indices, if at least three long.
fn longest_run(hand: &[Card], mut indices: Vec<usize>) -> Option<Vec<usize>> {
    indices.sort_by_key(|&i| hand[i].value());
    indices.dedup_by_key(|i| hand[*i].value());

    let mut best: Vec<usize> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for i in indices {
        match current.last() {
            Some(&prev) if hand[prev].value() + 1 == hand[i].value() => current.push(i),
            _ => current = vec![i],
        }
        if current.len() > best.len() {
            best = current.clone();
        }
    }
    (best.len() >= 3).then_some(best)
}

impl GreedyAutoPlayer {
    fn discard_completes_meld(hand: &[Card], top: Card) -> bool {
        let mut with_top = hand.to_vec();
        with_top.push(top);
        find_meld(&with_top).is_some_and(|m| m.contains(&hand.len()))
    }
}

impl AutoPlayer for GreedyAutoPlayer {
    fn next_action(&self, session: &TableSession, player_id: &PlayerId) -> Action {
        let table_id = session.table_id().clone();
        let hand = session.seat(player_id).map(|s| s.hand()).unwrap_or(&[]);
        let act = |kind| Action::new(table_id.clone(), player_id.clone(), kind);

        if hand_value(hand) <= self.tonk_at {
            return act(ActionKind::Tonk);
        }
        match session.phase() {
            TurnPhase::AwaitingDraw => match session.discard_top() {
                Some(top) if Self::discard_completes_meld(hand, top) => act(ActionKind::DrawDiscard),
                _ => act(ActionKind::DrawDeck),
            },
            TurnPhase::AwaitingDiscard => {
                if let Some(meld) = find_meld(hand) {
                    return Action::drop_cards(table_id.clone(), player_id.clone(), meld);
                }
                match highest_card_index(hand) {
                    Some(i) => Action::discard(table_id.clone(), player_id.clone(), i),
                    None => act(ActionKind::Pass),
                }
            }
        }
    }

    fn name(&self) -> &str {
        "GreedyAutoPlayer"
    }
}
