use tonk_engine::cards::{full_deck, Card};
use tonk_engine::deck::Deck;
use tonk_engine::errors::{GameError, MoveRejection};
use tonk_engine::player::{Action, ActionKind, PlayerProfile};
use tonk_engine::rules::{hand_value, is_tonk_eligible, is_valid_run, is_valid_set, TONK_LIMIT};
use tonk_engine::session::{TableSession, TurnPhase};

fn cards(list: &[&str]) -> Vec<Card> {
    list.iter().map(|s| s.parse().expect("valid card")).collect()
}

/// Deck whose deal gives `hands` (seat order), then flips `discard`, then draws `draws` in order.
fn stacked(hands: &[&[&str]], discard: &str, draws: &[&str]) -> Deck {
    let size = hands[0].len();
    let mut order = Vec::new();
    for k in 0..size {
        for h in hands {
            order.push(h[k].parse::<Card>().unwrap());
        }
    }
    order.push(discard.parse().unwrap());
    order.extend(cards(draws));
    for c in full_deck() {
        if !order.contains(&c) {
            order.push(c);
        }
    }
    Deck::stacked(order, 0).expect("valid stacked deck")
}

fn two_seat_table(deck: Deck) -> TableSession {
    let mut t = TableSession::new("t1", 5);
    t.join(PlayerProfile::new("p0", "Ann")).unwrap();
    t.join(PlayerProfile::new("p1", "Ben")).unwrap();
    t.start_with_deck(deck).unwrap();
    t
}

fn rejection(err: GameError) -> MoveRejection {
    match err {
        GameError::InvalidMove(r) => r,
        other => panic!("expected a move rejection, got {other:?}"),
    }
}

#[test]
fn sets_need_three_of_a_rank() {
    assert!(is_valid_set(&cards(&["5h", "5d", "5s"])));
    assert!(is_valid_set(&cards(&["Kh", "Kd", "Ks", "Kc"])));
    assert!(!is_valid_set(&cards(&["5h", "5d"])));
    assert!(!is_valid_set(&cards(&["5h", "5d", "6s"])));
    assert!(!is_valid_set(&[]));
}

#[test]
fn runs_need_consecutive_values_of_one_suit() {
    assert!(is_valid_run(&cards(&["Ah", "2h", "3h"])));
    assert!(is_valid_run(&cards(&["7c", "5c", "6c"])));
    assert!(is_valid_run(&cards(&["2s", "3s", "4s", "5s", "6s"])));
    assert!(!is_valid_run(&cards(&["Ah", "2h", "3d"])));
    assert!(!is_valid_run(&cards(&["2h", "3h", "5h"])));
    assert!(!is_valid_run(&cards(&["2h", "3h"])));
    // face cards share the value 10, so they never step
    assert!(!is_valid_run(&cards(&["Jh", "Qh", "Kh"])));
    assert!(!is_valid_run(&cards(&["6h", "7h", "Jh"])));
}

#[test]
fn hand_value_and_tonk_limit() {
    assert_eq!(hand_value(&cards(&["Ah", "7d", "Ks"])), 18);
    assert_eq!(hand_value(&[]), 0);
    let fifty = cards(&["Kh", "Kd", "Qs", "Qc", "Jh"]);
    assert_eq!(hand_value(&fifty), TONK_LIMIT);
    assert!(is_tonk_eligible(&fifty));
    let fifty_one = cards(&["Kh", "Kd", "Qs", "Qc", "Jh", "Ad"]);
    assert!(!is_tonk_eligible(&fifty_one));
}

#[test]
fn moves_out_of_turn_are_rejected_without_changing_state() {
    let mut t = two_seat_table(Deck::new_shuffled(9));
    let before = t.snapshot(None);
    let err = t
        .apply(&Action::new("t1", "p1", ActionKind::DrawDeck))
        .unwrap_err();
    assert_eq!(
        rejection(err),
        MoveRejection::NotYourTurn {
            expected: "p0".into(),
            actual: "p1".into()
        }
    );
    assert_eq!(t.snapshot(None), before);
}

#[test]
fn phase_order_is_enforced() {
    let mut t = two_seat_table(Deck::new_shuffled(9));
    let err = t.apply(&Action::discard("t1", "p0", 0)).unwrap_err();
    assert!(matches!(
        rejection(err),
        MoveRejection::WrongPhase {
            phase: TurnPhase::AwaitingDraw,
            ..
        }
    ));

    t.apply(&Action::new("t1", "p0", ActionKind::DrawDiscard)).unwrap();
    let err = t
        .apply(&Action::new("t1", "p0", ActionKind::DrawDeck))
        .unwrap_err();
    assert!(matches!(
        rejection(err),
        MoveRejection::WrongPhase {
            phase: TurnPhase::AwaitingDiscard,
            ..
        }
    ));
}

#[test]
fn unknown_players_and_other_tables_are_rejected() {
    let mut t = two_seat_table(Deck::new_shuffled(3));
    let err = t
        .apply(&Action::new("t1", "ghost", ActionKind::DrawDeck))
        .unwrap_err();
    assert_eq!(rejection(err), MoveRejection::NotInRound("ghost".into()));
    let err = t
        .apply(&Action::new("t2", "p0", ActionKind::DrawDeck))
        .unwrap_err();
    assert_eq!(rejection(err), MoveRejection::WrongTable("t2".into()));
}

#[test]
fn discard_selection_is_checked() {
    let mut t = two_seat_table(Deck::new_shuffled(5));
    t.apply(&Action::new("t1", "p0", ActionKind::DrawDeck)).unwrap();

    let err = t.apply(&Action::discard("t1", "p0", 6)).unwrap_err();
    assert_eq!(
        rejection(err),
        MoveRejection::IndexOutOfRange {
            index: 6,
            hand_size: 6
        }
    );
    let err = t.apply(&Action::new("t1", "p0", ActionKind::Discard)).unwrap_err();
    assert!(matches!(
        rejection(err),
        MoveRejection::WrongSelectionSize { actual: 0, .. }
    ));
    t.apply(&Action::discard("t1", "p0", 5)).unwrap();
    assert_eq!(t.current_turn_index(), 1);
}

#[test]
fn drops_must_form_a_meld() {
    let deck = stacked(
        &[
            &["3h", "3d", "3c", "Kh", "Qd"],
            &["Ah", "2d", "4c", "5s", "6h"],
        ],
        "7s",
        &["3s"],
    );
    let mut t = two_seat_table(deck);
    t.apply(&Action::new("t1", "p0", ActionKind::DrawDeck)).unwrap();

    let err = t.apply(&Action::drop_cards("t1", "p0", vec![0, 1, 3])).unwrap_err();
    assert_eq!(rejection(err), MoveRejection::NotAMeld);
    let err = t.apply(&Action::drop_cards("t1", "p0", vec![0, 0, 1])).unwrap_err();
    assert_eq!(rejection(err), MoveRejection::DuplicateIndex(0));

    t.apply(&Action::drop_cards("t1", "p0", vec![5, 0, 1, 2])).unwrap();
    let seat = t.seat("p0").unwrap();
    assert_eq!(seat.melds().len(), 1);
    assert_eq!(seat.melds()[0], cards(&["3h", "3d", "3c", "3s"]));
    assert_eq!(seat.hand(), cards(&["Kh", "Qd"]).as_slice());
    assert_eq!(seat.hand_value(), 20);
    t.check_consistency().unwrap();
}

#[test]
fn pass_needs_an_empty_hand() {
    let deck = stacked(
        &[
            &["Ah", "2h", "3h", "4h", "5h"],
            &["Kc", "Kd", "Ks", "Qc", "Qd"],
        ],
        "7s",
        &["6h"],
    );
    let mut t = two_seat_table(deck);
    t.apply(&Action::new("t1", "p0", ActionKind::DrawDeck)).unwrap();
    let err = t.apply(&Action::new("t1", "p0", ActionKind::Pass)).unwrap_err();
    assert_eq!(rejection(err), MoveRejection::PassWithCards);

    t.apply(&Action::drop_cards("t1", "p0", vec![0, 1, 2, 3, 4, 5]))
        .unwrap();
    assert!(t.seat("p0").unwrap().hand().is_empty());
    t.apply(&Action::new("t1", "p0", ActionKind::Pass)).unwrap();
    assert_eq!(t.current_turn_index(), 1);
    assert_eq!(t.phase(), TurnPhase::AwaitingDraw);
}

#[test]
fn actions_before_start_are_rejected() {
    let mut t = TableSession::new("t1", 5);
    t.join(PlayerProfile::new("p0", "Ann")).unwrap();
    let err = t
        .apply(&Action::new("t1", "p0", ActionKind::DrawDeck))
        .unwrap_err();
    assert_eq!(rejection(err), MoveRejection::RoundNotInProgress);
}
