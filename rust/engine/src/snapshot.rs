use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cards::Card;
use crate::player::{PlayerId, TableId};
use crate::session::{TableStatus, TurnPhase};

/// What one subscriber sees of a table after a given version.
///
/// Hand contents are private: `cards` is filled only on the viewer's own seat,
/// every other seat exposes just `card_count`. Melds are face up and public.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub table_id: TableId,
    /// Increases with every state change, so consumers can drop stale copies
    pub version: u64,
    pub status: TableStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<TurnPhase>,
    pub players: Vec<PlayerView>,
    pub current_player_index: usize,
    pub deck_count: usize,
    pub discard_pile_top: Option<Card>,
    pub pot_amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<BTreeMap<PlayerId, u32>>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub card_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cards: Option<Vec<Card>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub melds: Vec<Vec<Card>>,
    pub connected: bool,
    pub active: bool,
}

impl StateSnapshot {
    pub fn player(&self, id: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.id == id)
    }
}
