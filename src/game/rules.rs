//! Pure round-resolution engine.
//!
//! No timers, no deck mutation, no balance changes. The lifecycle controller
//! consumes the result and applies every side effect itself.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::constants::HAND_SIZE;
use super::deck::{Card, Deck};
use super::hand::{evaluate_five, HandRank};
use super::target::TargetCard;

/// What a player handed in this round, as recorded by the action handlers.
#[derive(Debug, Clone, Default)]
pub struct PlayerSubmission {
    pub target_id: Option<String>,
    pub card_ids: Option<Vec<String>>,
}

/// A scored five-card set, reported back to both clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedHand {
    pub name: String,
    pub strength: i32,
    pub cards: Vec<Card>,
}

/// Round outcome relative to the first player passed to [`resolve_round`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoundOutcome {
    Win,
    Lose,
    Draw,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundResolution {
    pub outcome: RoundOutcome,
    /// Hand descriptions keyed by player id. Absent for invalid submissions:
    /// there is no legal five-card set to score.
    pub hands: HashMap<String, ResolvedHand>,
    /// True only when both submissions passed validation, which is what
    /// arms the rank-clash sweep.
    pub both_valid: bool,
}

impl RoundResolution {
    /// The sole winner, if any, given the same player ordering used to
    /// produce this resolution.
    pub fn winner_of<'a>(&self, players: [&'a str; 2]) -> Option<&'a str> {
        match self.outcome {
            RoundOutcome::Win => Some(players[0]),
            RoundOutcome::Lose => Some(players[1]),
            RoundOutcome::Draw => None,
        }
    }
}

struct ValidatedPlay {
    valid: bool,
    cards: Vec<Card>,
}

/// Validate one player's submission against their target hand and the deck.
///
/// A submission is valid only if exactly five identifiers are present, they
/// resolve to five distinct un-burned cards, the referenced target card is
/// known and unexhausted, and the card values sum to the target exactly.
fn evaluate_player(
    submission: Option<&PlayerSubmission>,
    target_hand: &[TargetCard],
    deck: &Deck,
) -> ValidatedPlay {
    let invalid = ValidatedPlay {
        valid: false,
        cards: Vec::new(),
    };

    let Some(submission) = submission else {
        return invalid;
    };
    let Some(card_ids) = submission.card_ids.as_deref() else {
        return invalid;
    };
    if card_ids.len() != HAND_SIZE {
        return invalid;
    }

    let target_value = submission.target_id.as_deref().and_then(|id| {
        target_hand
            .iter()
            .find(|t| t.id == id && !t.used)
            .map(|t| t.value)
    });
    let Some(target_value) = target_value else {
        return invalid;
    };

    // Duplicate identifiers collapse during resolution, so a malformed
    // submission repeating a card id fails the count check here.
    let resolved = deck.resolve(card_ids);
    if resolved.len() != HAND_SIZE || resolved.iter().any(|c| c.is_burned()) {
        return invalid;
    }

    let cards: Vec<Card> = resolved.into_iter().cloned().collect();
    let sum: u32 = cards.iter().map(|c| c.value() as u32).sum();
    if sum != target_value as u32 {
        return ValidatedPlay {
            valid: false,
            cards,
        };
    }

    ValidatedPlay { valid: true, cards }
}

/// Resolve a round between two players. Pure function.
pub fn resolve_round(
    players: [&str; 2],
    submissions: &HashMap<String, PlayerSubmission>,
    target_hands: &HashMap<String, Vec<TargetCard>>,
    deck: &Deck,
) -> RoundResolution {
    let [p1, p2] = players;

    let empty_hand: Vec<TargetCard> = Vec::new();
    let hand_of = |pid: &str| target_hands.get(pid).unwrap_or(&empty_hand);

    let r1 = evaluate_player(submissions.get(p1), hand_of(p1), deck);
    let r2 = evaluate_player(submissions.get(p2), hand_of(p2), deck);

    let describe = |cards: &[Card]| -> ResolvedHand {
        let refs: Vec<&Card> = cards.iter().collect();
        let rank = evaluate_five(&refs);
        ResolvedHand {
            name: rank.category.clone(),
            strength: rank.strength,
            cards: cards.to_vec(),
        }
    };

    match (r1.valid, r2.valid) {
        (false, false) => RoundResolution {
            outcome: RoundOutcome::Draw,
            hands: HashMap::new(),
            both_valid: false,
        },
        (true, false) => RoundResolution {
            outcome: RoundOutcome::Win,
            hands: HashMap::from([(p1.to_string(), describe(&r1.cards))]),
            both_valid: false,
        },
        (false, true) => RoundResolution {
            outcome: RoundOutcome::Lose,
            hands: HashMap::from([(p2.to_string(), describe(&r2.cards))]),
            both_valid: false,
        },
        (true, true) => {
            let refs1: Vec<&Card> = r1.cards.iter().collect();
            let refs2: Vec<&Card> = r2.cards.iter().collect();
            let rank1: HandRank = evaluate_five(&refs1);
            let rank2: HandRank = evaluate_five(&refs2);

            let outcome = match rank1.cmp(&rank2) {
                std::cmp::Ordering::Greater => RoundOutcome::Win,
                std::cmp::Ordering::Less => RoundOutcome::Lose,
                std::cmp::Ordering::Equal => RoundOutcome::Draw,
            };

            RoundResolution {
                outcome,
                hands: HashMap::from([
                    (p1.to_string(), describe(&r1.cards)),
                    (p2.to_string(), describe(&r2.cards)),
                ]),
                both_valid: true,
            }
        }
    }
}

/// Ranks appearing in both players' submitted five-card sets.
pub fn clashing_ranks(a: &[Card], b: &[Card]) -> HashSet<u8> {
    let ranks_a: HashSet<u8> = a.iter().map(|c| c.rank).collect();
    b.iter()
        .map(|c| c.rank)
        .filter(|r| ranks_a.contains(r))
        .collect()
}
