use crate::cards::Card;
use crate::rules::hand_value;
use serde::{Deserialize, Serialize};

pub type PlayerId = String;
pub type TableId = String;

/// Kinds of move a seated player can make on their turn.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Take the top of the draw pile
    DrawDeck,
    /// Take the top of the discard pile
    DrawDiscard,
    /// Put one hand card on the discard pile, ending the turn
    Discard,
    /// Lay down a set or run
    Drop,
    /// End the round with a hand worth at most 50
    Tonk,
    /// End the turn without discarding (empty hand only)
    Pass,
}

/// A request from a player, as received from the transport collaborator.
/// Constructed per request and dropped once applied or rejected.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub table_id: TableId,
    pub player_id: PlayerId,
    pub kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub card_indices: Vec<usize>,
}

impl Action {
    pub fn new(table_id: impl Into<TableId>, player_id: impl Into<PlayerId>, kind: ActionKind) -> Self {
        Self {
            table_id: table_id.into(),
            player_id: player_id.into(),
            kind,
            card_index: None,
            card_indices: Vec::new(),
        }
    }

    pub fn discard(table_id: impl Into<TableId>, player_id: impl Into<PlayerId>, index: usize) -> Self {
        Self {
            card_index: Some(index),
            ..Self::new(table_id, player_id, ActionKind::Discard)
        }
    }

    pub fn drop_cards(
        table_id: impl Into<TableId>,
        player_id: impl Into<PlayerId>,
        indices: impl Into<Vec<usize>>,
    ) -> Self {
        Self {
            card_indices: indices.into(),
            ..Self::new(table_id, player_id, ActionKind::Drop)
        }
    }

    /// Every hand index the action selects, from either payload field.
    pub fn selection(&self) -> Vec<usize> {
        self.card_index
            .into_iter()
            .chain(self.card_indices.iter().copied())
            .collect()
    }
}

/// Identity of a player asking to sit at a table, as handed over by the
/// table-directory collaborator.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub id: PlayerId,
    pub name: String,
}

impl PlayerProfile {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A player's fixed position in turn order, with the cards they hold.
#[derive(Debug, Clone)]
pub struct Seat {
    id: PlayerId,
    name: String,
    /// Cards in hand, in the order they were received. Action indices refer to this order.
    hand: Vec<Card>,
    /// Sets and runs dropped this round; face up and out of circulation.
    melds: Vec<Vec<Card>>,
    connected: bool,
    /// False once the player forfeits the round by leaving.
    active: bool,
}

impl Seat {
    pub fn new(profile: PlayerProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            hand: Vec::new(),
            melds: Vec::new(),
            connected: true,
            active: true,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }
    pub fn melds(&self) -> &[Vec<Card>] {
        &self.melds
    }
    pub fn is_connected(&self) -> bool {
        self.connected
    }
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the seat can take a turn.
    pub fn can_play(&self) -> bool {
        self.connected && self.active
    }

    /// Value of the cards still in hand; melded cards never count.
    pub fn hand_value(&self) -> u32 {
        hand_value(&self.hand)
    }

    pub fn profile(&self) -> PlayerProfile {
        PlayerProfile::new(self.id.clone(), self.name.clone())
    }

    /// Empty seat for the next round at the same position. The connection
    /// state carries over so an absent player is still skipped or auto-played.
    pub(crate) fn reseat(&self) -> Seat {
        Seat {
            connected: self.connected,
            ..Seat::new(self.profile())
        }
    }

    pub(crate) fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub(crate) fn forfeit(&mut self) {
        self.active = false;
    }

    pub(crate) fn take_cards(&mut self, cards: Vec<Card>) {
        self.hand = cards;
        self.melds.clear();
    }

    pub(crate) fn receive(&mut self, card: Card) {
        self.hand.push(card);
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> Card {
        self.hand.remove(index)
    }

    /// Moves the cards at `indices` into a new meld. Indices must be valid and distinct.
    pub(crate) fn meld(&mut self, indices: &[usize]) {
        let mut sorted = indices.to_vec();
        sorted.sort_unstable_by(|a, b| b.cmp(a));
        let mut meld: Vec<Card> = sorted.into_iter().map(|i| self.hand.remove(i)).collect();
        meld.reverse();
        self.melds.push(meld);
    }

    /// Every card this seat holds, in hand or melded.
    pub(crate) fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.hand.iter().chain(self.melds.iter().flatten())
    }

    #[cfg(test)]
    pub(crate) fn hand_mut(&mut self) -> &mut Vec<Card> {
        &mut self.hand
    }

    #[cfg(test)]
    pub(crate) fn melds_mut(&mut self) -> &mut Vec<Vec<Card>> {
        &mut self.melds
    }
}
