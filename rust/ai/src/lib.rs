//! # tonk-ai: Automatic Play for Tonk Seats
//!
//! Decides moves for seats that cannot play for themselves: a player who
//! disconnected in the middle of a turn, or every seat of a simulated table.
//!
//! ## Core Components
//!
//! - [`AutoPlayer`] - Trait defining the interface for move selection
//! - [`baseline`] - The fallback policy used for disconnected seats
//! - [`greedy`] - A policy that melds and declares Tonk when it can
//! - [`create_autoplayer`] - Factory function for policies by name
//!
//! ## Quick Start
//!
//! ```rust
//! use tonk_ai::{create_autoplayer, AutoPlayer};
//! use tonk_engine::player::PlayerProfile;
//! use tonk_engine::session::TableSession;
//!
//! let mut table = TableSession::new("t1", 5);
//! table.join(PlayerProfile::new("a", "Ann")).unwrap();
//! table.join(PlayerProfile::new("b", "Ben")).unwrap();
//! table.start(42).unwrap();
//!
//! let policy = create_autoplayer("baseline").expect("known policy");
//! let action = policy.next_action(&table, &"a".to_string());
//! table.apply(&action).expect("baseline moves are legal");
//! ```
//!
//! ## Policies
//!
//! - `"baseline"` - Draw from the deck, discard the highest card
//! - `"greedy"` - Take useful discards, drop melds, Tonk on a low hand

use tonk_engine::player::{Action, PlayerId};
use tonk_engine::session::TableSession;

pub mod baseline;
pub mod greedy;

/// Names accepted by [`create_autoplayer`].
pub const POLICIES: [&str; 2] = ["baseline", "greedy"];

/// Interface for automatic move selection.
///
/// Implementations only read the session; the caller applies the returned
/// action through the normal validation path.
pub trait AutoPlayer: Send + Sync {
    /// The next action for `player_id`, who must be the seat whose turn it is.
    fn next_action(&self, session: &TableSession, player_id: &PlayerId) -> Action;

    fn name(&self) -> &str;
}

/// Factory function to create a policy by name. Returns `None` for unknown names.
///
/// ```rust
/// use tonk_ai::create_autoplayer;
///
/// assert_eq!(create_autoplayer("greedy").unwrap().name(), "GreedyAutoPlayer");
/// assert!(create_autoplayer("oracle").is_none());
/// ```
pub fn create_autoplayer(name: &str) -> Option<Box<dyn AutoPlayer>> {
    match name {
        "baseline" => Some(Box::new(baseline::BaselineAutoPlayer::new())),
        "greedy" => Some(Box::new(greedy::GreedyAutoPlayer::default())),
        _ => None,
    }
}
