//! # tonk-engine: Tonk Table Engine Core
//!
//! A deterministic engine for Tonk, a draw-and-discard rummy game played with
//! a 40-card deck by two to four seats. Provides table state management, move
//! validation, scoring and settlement logging, with a seeded RNG so any round
//! can be replayed.
//!
//! ## Core Modules
//!
//! - [`cards`] - Card representation (Suit, Rank, Card) and the 40-card set
//! - [`deck`] - Draw/discard piles with ChaCha20 shuffling and reshuffle on exhaustion
//! - [`player`] - Seats, player profiles and the actions they submit
//! - [`rules`] - Meld detection, hand values, table rules and move validation
//! - [`session`] - The table state machine (`Waiting` → `Playing` → `Ended`)
//! - [`scoring`] - Winner selection for Tonk, stalemate and forfeit
//! - [`snapshot`] - Per-viewer state snapshots with private hands hidden
//! - [`logger`] - Settlement records and JSONL output
//! - [`errors`] - Error types for table operations
//!
//! ## Quick Start
//!
//! ```rust
//! use tonk_engine::player::{Action, ActionKind, PlayerProfile};
//! use tonk_engine::session::{TableSession, TableStatus};
//!
//! let mut table = TableSession::new("t1", 5);
//! table.join(PlayerProfile::new("alice", "Alice")).unwrap();
//! table.join(PlayerProfile::new("bob", "Bob")).unwrap();
//! table.start(42).unwrap();
//!
//! table.apply(&Action::new("t1", "alice", ActionKind::DrawDeck)).unwrap();
//! table.apply(&Action::discard("t1", "alice", 0)).unwrap();
//!
//! assert_eq!(table.status(), TableStatus::Playing);
//! assert_eq!(table.current_turn_index(), 1);
//! assert_eq!(table.pot_amount(), 10);
//! ```
//!
//! ## Deterministic Dealing
//!
//! ```rust
//! use tonk_engine::deck::Deck;
//!
//! let mut a = Deck::new_shuffled(7);
//! let mut b = Deck::new_shuffled(7);
//! assert_eq!(a.deal(4, 5).unwrap(), b.deal(4, 5).unwrap());
//! ```

pub mod cards;
pub mod deck;
pub mod errors;
pub mod logger;
pub mod player;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod snapshot;
