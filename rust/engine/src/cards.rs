use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of cards in a Tonk deck (a standard deck without 8s, 9s and 10s).
pub const DECK_SIZE: usize = 40;

/// Represents one of the four suits.
/// Used as a component of [`Card`] to fully define a playing card.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    /// Hearts suit (♥)
    Hearts,
    /// Diamonds suit (♦)
    Diamonds,
    /// Clubs suit (♣)
    Clubs,
    /// Spades suit (♠)
    Spades,
}

impl Suit {
    pub fn symbol(self) -> char {
        match self {
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
            Suit::Spades => '♠',
        }
    }
}

/// Represents the rank of a card. Eights, nines and tens do not exist in a Tonk deck.
/// Discriminants are the rank's position with the Ace low.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Rank {
    /// Ace, always low (value 1)
    #[serde(rename = "A")]
    Ace = 1,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    /// Jack (value 10)
    #[serde(rename = "J")]
    Jack = 11,
    /// Queen (value 10)
    #[serde(rename = "Q")]
    Queen,
    /// King (value 10)
    #[serde(rename = "K")]
    King,
}

impl Rank {
    /// Point value used for hand values and run ordering.
    pub fn value(self) -> u32 {
        match self {
            Rank::Jack | Rank::Queen | Rank::King => 10,
            numeric => numeric as u32,
        }
    }

    fn symbol(self) -> char {
        match self {
            Rank::Ace => 'A',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            numeric => char::from_digit(numeric as u32, 10).unwrap_or('?'),
        }
    }
}

/// A single playing card. Cards are immutable once constructed; the same
/// suit and rank pair appears exactly once in a deck.
///
/// On the wire a card also carries its point value, e.g.
/// `{"suit":"spades","rank":"Q","value":10}`. An incoming `value` is
/// optional but must match the rank.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(into = "WireCard", try_from = "WireCard")]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

#[derive(Serialize, Deserialize)]
struct WireCard {
    suit: Suit,
    rank: Rank,
    #[serde(default)]
    value: Option<u32>,
}

impl From<Card> for WireCard {
    fn from(card: Card) -> Self {
        WireCard {
            suit: card.suit,
            rank: card.rank,
            value: Some(card.value()),
        }
    }
}

impl TryFrom<WireCard> for Card {
    type Error = String;

    fn try_from(wire: WireCard) -> Result<Self, Self::Error> {
        let card = Card::new(wire.rank, wire.suit);
        match wire.value {
            Some(v) if v != card.value() => Err(format!("{card} is worth {}, not {v}", card.value())),
            _ => Ok(card),
        }
    }
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { suit, rank }
    }

    pub fn value(&self) -> u32 {
        self.rank.value()
    }
}

impl fmt::Display for Card {
    /// Formats as `7♥`, `A♠`, `K♦`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.symbol())
    }
}

/// Parses two-character notation such as `7h`, `As`, `Kd` or `jc`.
impl FromStr for Card {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(r), Some(su), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(format!("card notation must have two characters: {s:?}"));
        };

        let rank = match r.to_ascii_uppercase() {
            'A' => Rank::Ace,
            '2' => Rank::Two,
            '3' => Rank::Three,
            '4' => Rank::Four,
            '5' => Rank::Five,
            '6' => Rank::Six,
            '7' => Rank::Seven,
            'J' => Rank::Jack,
            'Q' => Rank::Queen,
            'K' => Rank::King,
            _ => return Err(format!("invalid rank: {r}")),
        };
        let suit = match su.to_ascii_lowercase() {
            'h' => Suit::Hearts,
            'd' => Suit::Diamonds,
            'c' => Suit::Clubs,
            's' => Suit::Spades,
            _ => return Err(format!("invalid suit: {su}")),
        };
        Ok(Card { suit, rank })
    }
}

pub fn all_suits() -> [Suit; 4] {
    [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades]
}

pub fn all_ranks() -> [Rank; 10] {
    [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ]
}

/// The fixed 40-card set in suit-major order.
pub fn full_deck() -> Vec<Card> {
    let mut v = Vec::with_capacity(DECK_SIZE);
    for &s in &all_suits() {
        for &r in &all_ranks() {
            v.push(Card { suit: s, rank: r });
        }
    }
    v
}
