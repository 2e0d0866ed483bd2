use tonk_ai::{create_autoplayer, POLICIES};
use tonk_engine::player::PlayerProfile;
use tonk_engine::scoring::EndReason;
use tonk_engine::session::{TableSession, TableStatus};

fn table(seats: usize, seed: u64) -> TableSession {
    let mut t = TableSession::new("bots", 3);
    for i in 0..seats {
        t.join(PlayerProfile::new(format!("bot{i}"), format!("Bot {i}")))
            .unwrap();
    }
    t.start(seed).unwrap();
    t
}

#[test]
fn every_policy_only_makes_legal_moves() {
    for name in POLICIES {
        let policy = create_autoplayer(name).expect("listed policy exists");
        for seed in 0..25 {
            let mut t = table(3, seed);
            for _ in 0..300 {
                if t.status() != TableStatus::Playing {
                    break;
                }
                let id = t.current_seat().unwrap().id().clone();
                let action = policy.next_action(&t, &id);
                t.apply(&action)
                    .unwrap_or_else(|e| panic!("{name} made an illegal move {action:?}: {e}"));
            }
            t.check_consistency().unwrap();
        }
    }
}

#[test]
fn greedy_eventually_declares_tonk() {
    let policy = create_autoplayer("greedy").unwrap();
    let mut tonks = 0;
    for seed in 0..20 {
        let mut t = table(2, seed);
        for _ in 0..500 {
            if t.status() != TableStatus::Playing {
                break;
            }
            let id = t.current_seat().unwrap().id().clone();
            t.apply(&policy.next_action(&t, &id)).unwrap();
        }
        if t.outcome().map(|o| o.reason) == Some(EndReason::Tonk) {
            tonks += 1;
        }
    }
    assert!(tonks > 0);
}

#[test]
fn unknown_policy_is_none() {
    assert!(create_autoplayer("").is_none());
    assert!(create_autoplayer("Baseline").is_none());
}
