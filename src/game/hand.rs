use rs_poker::core::{Hand, Rank as RsRank, Rankable, Suit as RsSuit, Value as RsValue};
use serde::{Deserialize, Serialize};

use super::deck::{Card, Suit};

/// Comparable strength of a five-card poker hand.
///
/// `strength` runs 0 (High Card) through 8 (Straight Flush); **higher is
/// stronger**. The private sub-rank breaks ties within a category
/// (e.g. AAQQ vs AA66 within Two Pair).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandRank {
    pub strength: i32,
    sub_rank: u32,
    pub category: String,
}

/// Equality is hand strength only, not the specific suits involved.
impl PartialEq for HandRank {
    fn eq(&self, other: &Self) -> bool {
        self.strength == other.strength && self.sub_rank == other.sub_rank
    }
}

impl Eq for HandRank {}

impl PartialOrd for HandRank {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HandRank {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.strength
            .cmp(&other.strength)
            .then_with(|| self.sub_rank.cmp(&other.sub_rank))
    }
}

// Convert to rs_poker for evaluation. Sums treat the ace as 1, but the
// poker comparison plays aces high.
fn to_rs_poker(card: &Card) -> rs_poker::core::Card {
    let value = match card.rank {
        1 => RsValue::Ace,
        2 => RsValue::Two,
        3 => RsValue::Three,
        4 => RsValue::Four,
        5 => RsValue::Five,
        6 => RsValue::Six,
        7 => RsValue::Seven,
        8 => RsValue::Eight,
        9 => RsValue::Nine,
        10 => RsValue::Ten,
        11 => RsValue::Jack,
        12 => RsValue::Queen,
        _ => RsValue::King,
    };

    let suit = match card.suit {
        Suit::Clubs => RsSuit::Club,
        Suit::Diamonds => RsSuit::Diamond,
        Suit::Hearts => RsSuit::Heart,
        Suit::Spades => RsSuit::Spade,
    };

    rs_poker::core::Card { value, suit }
}

/// Scores exactly five cards as a poker hand.
pub fn evaluate_five(cards: &[&Card]) -> HandRank {
    debug_assert_eq!(cards.len(), 5);

    let rs_cards: Vec<rs_poker::core::Card> = cards.iter().map(|c| to_rs_poker(c)).collect();
    let hand = Hand::new_with_cards(rs_cards);

    let (strength, sub_rank, category) = match hand.rank() {
        RsRank::HighCard(v) => (0, v, "High Card"),
        RsRank::OnePair(v) => (1, v, "Pair"),
        RsRank::TwoPair(v) => (2, v, "Two Pair"),
        RsRank::ThreeOfAKind(v) => (3, v, "Three of a Kind"),
        RsRank::Straight(v) => (4, v, "Straight"),
        RsRank::Flush(v) => (5, v, "Flush"),
        RsRank::FullHouse(v) => (6, v, "Full House"),
        RsRank::FourOfAKind(v) => (7, v, "Four of a Kind"),
        RsRank::StraightFlush(v) => (8, v, "Straight Flush"),
    };

    HandRank {
        strength,
        sub_rank,
        category: category.to_string(),
    }
}
