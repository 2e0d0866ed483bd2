use std::collections::HashSet;

use tonk_engine::cards::{full_deck, Card, DECK_SIZE};
use tonk_engine::deck::Deck;
use tonk_engine::errors::GameError;
use tonk_engine::player::PlayerProfile;
use tonk_engine::session::{TableSession, TableStatus, TurnPhase};

fn card(s: &str) -> Card {
    s.parse().expect("valid card notation")
}

#[test]
fn full_deck_has_forty_unique_cards() {
    let deck = full_deck();
    assert_eq!(deck.len(), DECK_SIZE);
    let unique: HashSet<_> = deck.iter().collect();
    assert_eq!(unique.len(), DECK_SIZE);
    assert!(deck.iter().all(|c| c.value() <= 10));
}

#[test]
fn same_seed_same_shuffle() {
    let mut a = Deck::new_shuffled(42);
    let mut b = Deck::new_shuffled(42);
    let mut c = Deck::new_shuffled(43);
    let ha = a.deal(4, 5).unwrap();
    let hb = b.deal(4, 5).unwrap();
    let hc = c.deal(4, 5).unwrap();
    assert_eq!(ha, hb);
    assert_ne!(ha, hc);
    assert_eq!(a.seed(), Some(42));
}

#[test]
fn dealing_is_round_robin_from_the_top() {
    let mut order = vec![card("Ah"), card("2h"), card("3h"), card("4h"), card("5h"), card("6h")];
    for c in full_deck() {
        if !order.contains(&c) {
            order.push(c);
        }
    }
    let mut deck = Deck::stacked(order, 0).unwrap();
    let hands = deck.deal(2, 3).unwrap();
    assert_eq!(hands[0], vec![card("Ah"), card("3h"), card("5h")]);
    assert_eq!(hands[1], vec![card("2h"), card("4h"), card("6h")]);
    assert_eq!(deck.draw_count(), DECK_SIZE - 6);
    assert_eq!(deck.seed(), None);
}

#[test]
fn dealing_more_than_the_deck_fails() {
    let mut deck = Deck::new_shuffled(1);
    assert_eq!(
        deck.deal(5, 9),
        Err(GameError::InsufficientCards {
            needed: 45,
            available: 40
        })
    );
    assert_eq!(deck.draw_count(), DECK_SIZE);
}

#[test]
fn starting_a_four_seat_table_deals_and_flips_one_discard() {
    let mut table = TableSession::new("t1", 5);
    for i in 0..4 {
        table
            .join(PlayerProfile::new(format!("p{i}"), format!("P{i}")))
            .unwrap();
    }
    table.start(7).unwrap();

    assert_eq!(table.status(), TableStatus::Playing);
    assert_eq!(table.phase(), TurnPhase::AwaitingDraw);
    assert_eq!(table.current_turn_index(), 0);
    assert!(table.seats().iter().all(|s| s.hand().len() == 5));
    assert_eq!(table.draw_count(), 19);
    assert_eq!(table.discard_count(), 1);
    assert!(table.discard_top().is_some());
    assert_eq!(table.pot_amount(), 20);
    table.check_consistency().unwrap();
}

#[test]
fn stacked_deck_must_be_complete() {
    let short: Vec<Card> = full_deck().into_iter().take(39).collect();
    assert!(matches!(
        Deck::stacked(short, 0),
        Err(GameError::ConsistencyViolation(_))
    ));
}
