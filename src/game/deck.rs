use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Why a card was permanently removed from play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BurnReason {
    /// Part of a submitted hand at round end.
    Burned,
    /// Swept because both players' hands shared this card's rank.
    RankClash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    /// Single-letter code used in card identifiers ("H-12").
    pub fn code(&self) -> char {
        match self {
            Suit::Hearts => 'H',
            Suit::Diamonds => 'D',
            Suit::Clubs => 'C',
            Suit::Spades => 'S',
        }
    }

    fn symbol(&self) -> char {
        match self {
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Clubs => '♣',
            Suit::Spades => '♠',
        }
    }
}

/// One of the 52 shared cards. The identifier is stable across the match
/// and is what clients submit back; the burn marker is monotonic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    pub suit: Suit,
    pub rank: u8, // 1-13, ace = 1
    pub burned: Option<BurnReason>,
}

impl Card {
    pub fn new(suit: Suit, rank: u8) -> Self {
        Self {
            id: format!("{}-{}", suit.code(), rank),
            suit,
            rank,
            burned: None,
        }
    }

    /// Numeric value used for target sums (ace low, king = 13).
    pub fn value(&self) -> u8 {
        self.rank
    }

    pub fn is_burned(&self) -> bool {
        self.burned.is_some()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rank_str = match self.rank {
            1 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            n => n.to_string(),
        };
        write!(f, "{}{}", rank_str, self.suit.symbol())
    }
}

/// The shared 52-card pool. Cards are never removed, only marked burned,
/// so clients can always render the full grid with burn state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Creates the full 52-card deck with no burn markers.
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(52);
        for suit in Suit::ALL {
            for rank in 1..=13 {
                cards.push(Card::new(suit, rank));
            }
        }
        Self { cards }
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Resolve card identifiers to concrete cards. Unknown identifiers are
    /// silently dropped and duplicates collapse to a single card, so callers
    /// must compare the returned count against the requested count to detect
    /// partial or malformed submissions.
    pub fn resolve(&self, ids: &[String]) -> Vec<&Card> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| self.cards.iter().find(|c| &c.id == id))
            .collect()
    }

    /// Mark every resolved, not-yet-burned card with `reason`. Cards that
    /// already carry a marker are left untouched; a marker is never cleared.
    pub fn burn(&mut self, ids: &[String], reason: BurnReason) -> usize {
        let mut burned = 0;
        for id in ids {
            if let Some(card) = self.cards.iter_mut().find(|c| &c.id == id) {
                if card.burned.is_none() {
                    card.burned = Some(reason);
                    burned += 1;
                }
            }
        }
        burned
    }

    pub fn is_burned(&self, id: &str) -> bool {
        self.cards.iter().any(|c| c.id == id && c.is_burned())
    }

    /// Burn every un-burned card whose rank is in `ranks`, skipping the
    /// explicitly excluded identifiers (the submitted hands themselves).
    /// Returns the identifiers that were burned.
    pub fn burn_ranks(
        &mut self,
        ranks: &HashSet<u8>,
        excluded_ids: &HashSet<String>,
        reason: BurnReason,
    ) -> Vec<String> {
        let mut swept = Vec::new();
        for card in &mut self.cards {
            if card.burned.is_none()
                && ranks.contains(&card.rank)
                && !excluded_ids.contains(&card.id)
            {
                card.burned = Some(reason);
                swept.push(card.id.clone());
            }
        }
        swept
    }
}
