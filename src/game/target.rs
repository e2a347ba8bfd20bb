use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::constants::{TARGET_HAND_SIZE, TARGET_VALUE_MAX, TARGET_VALUE_MIN};

/// A player-private numeric goal. The player locks one per round and must
/// submit five cards whose values sum to it exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetCard {
    pub id: String,
    pub value: u8,
    pub used: bool,
}

impl TargetCard {
    fn random(rng: &mut impl Rng) -> Self {
        Self {
            id: format!("tgt-{}", Uuid::new_v4()),
            value: rng.gen_range(TARGET_VALUE_MIN..=TARGET_VALUE_MAX),
            used: false,
        }
    }
}

/// Whether target hands are redealt each round or persist for the match
/// with per-card exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetHandPolicy {
    #[default]
    PerRound,
    PerMatch,
}

impl TargetHandPolicy {
    pub fn from_str_or_default(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "per_match" => TargetHandPolicy::PerMatch,
            _ => TargetHandPolicy::PerRound,
        }
    }
}

/// Deal a fresh hand of five target cards.
pub fn generate_target_hand() -> Vec<TargetCard> {
    let mut rng = ChaCha20Rng::from_entropy();
    (0..TARGET_HAND_SIZE)
        .map(|_| TargetCard::random(&mut rng))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_has_five_fresh_cards_in_range() {
        let hand = generate_target_hand();
        assert_eq!(hand.len(), TARGET_HAND_SIZE);
        for card in &hand {
            assert!((TARGET_VALUE_MIN..=TARGET_VALUE_MAX).contains(&card.value));
            assert!(!card.used);
            assert!(card.id.starts_with("tgt-"));
        }
    }

    #[test]
    fn test_hand_ids_are_unique() {
        let hand = generate_target_hand();
        for (i, a) in hand.iter().enumerate() {
            for b in &hand[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!(
            TargetHandPolicy::from_str_or_default("per_match"),
            TargetHandPolicy::PerMatch
        );
        assert_eq!(
            TargetHandPolicy::from_str_or_default("anything"),
            TargetHandPolicy::PerRound
        );
    }
}
