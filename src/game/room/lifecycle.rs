//! Round lifecycle: start, timer ticks, resolution and match termination.
//!
//! Every method mutates the room synchronously and returns the events to
//! emit; the store dispatches them after releasing the room lock. Resolution
//! happens exactly once per round: both the timer path and the completion
//! path run under the store's write lock and the phase guard in
//! [`Room::end_round`] lets only the first one through.

use super::*;
use crate::game::constants::{
    DECAY_INTERVAL_TICKS, FINAL_COUNTDOWN_SECS, ROUND_ANTE, ROUND_LIMIT, ROUND_TIME_SECS,
    TIME_SYNC_INTERVAL_SECS, WINS_FOR_DOMINANCE,
};
use crate::game::deck::BurnReason;
use crate::game::rules::{clashing_ranks, resolve_round};
use crate::game::target::generate_target_hand;
use crate::ws::events::{Envelope, ServerEvent};
use std::collections::HashSet;

impl Room {
    /// Start the next round, or end the match if the round limit is spent.
    pub fn start_round(&mut self) -> Vec<Envelope> {
        let mut events = Vec::new();

        if self.players.len() < crate::game::constants::ROOM_CAPACITY {
            tracing::warn!(
                "Room {}: cannot start round with {} player(s)",
                self.room_id,
                self.players.len()
            );
            return events;
        }
        if self.phase == GamePhase::GameOver {
            tracing::warn!("Room {}: match already over, ignoring round start", self.room_id);
            return events;
        }

        // Backstop: a next-round request after the final round ends the
        // match on a balance comparison instead of starting round six.
        if self.round >= ROUND_LIMIT {
            let game_over = self.end_match_by_round_limit();
            events.push(Envelope::to_room(ServerEvent::MatchEnded { game_over }));
            return events;
        }

        self.round += 1;
        self.try_transition(GamePhase::GameLoop);
        self.turn_data.clear();
        self.pot = 0;
        self.cancel_timer();
        self.time_remaining = ROUND_TIME_SECS;

        if self.deck.is_empty() {
            tracing::info!("Room {}: dealing fresh deck", self.room_id);
            self.deck = Deck::standard();
        }

        tracing::info!("Room {}: round {} starting", self.room_id, self.round);

        let mut ante_bankruptcy = false;
        for pid in self.players.clone() {
            let Some(state) = self.player_states.get_mut(&pid) else {
                continue;
            };
            state.submitted = false;
            state.target_locked = false;

            match self.target_policy {
                TargetHandPolicy::PerRound => state.target_hand = generate_target_hand(),
                TargetHandPolicy::PerMatch => {
                    if state.target_hand.is_empty() {
                        state.target_hand = generate_target_hand();
                    }
                }
            }

            if state.bios > 0 {
                state.bios -= ROUND_ANTE;
                self.pot += ROUND_ANTE;
            } else {
                tracing::warn!("Room {}: player {} anted with 0 bios", self.room_id, pid);
            }
            if state.bios <= 0 {
                ante_bankruptcy = true;
            }
        }

        for pid in &self.players {
            let Some(state) = self.player_states.get(pid) else {
                continue;
            };
            let opponent_bios = self
                .opponent_of(pid)
                .and_then(|op| self.player_states.get(op))
                .map(|s| s.bios)
                .unwrap_or(0);
            events.push(Envelope::to_player(
                pid.clone(),
                ServerEvent::RoundStarted {
                    round: self.round,
                    deck: self.deck.cards().to_vec(),
                    target_hand: state.target_hand.clone(),
                    bios: state.bios,
                    opponent_bios,
                    pot: self.pot,
                    time_remaining: self.time_remaining,
                },
            ));
        }

        // The ante alone can finish a player; resolve immediately instead
        // of waiting for actions that cannot save them.
        if ante_bankruptcy {
            tracing::warn!("Room {}: ante exhausted a balance, resolving", self.room_id);
            events.extend(self.end_round(EndReason::Bankruptcy));
        }

        events
    }

    /// One second of the round clock. Drives time-sync, oxygen decay and
    /// the timeout backstop.
    pub fn tick(&mut self) -> Vec<Envelope> {
        let mut events = Vec::new();
        if self.phase != GamePhase::GameLoop {
            return events;
        }

        self.time_remaining = self.time_remaining.saturating_sub(1);
        if self.time_remaining % TIME_SYNC_INTERVAL_SECS == 0
            || self.time_remaining <= FINAL_COUNTDOWN_SECS
        {
            events.push(Envelope::to_room(ServerEvent::TimeSync {
                seconds_remaining: self.time_remaining,
            }));
        }

        self.oxygen_tick = (self.oxygen_tick + 1) % DECAY_INTERVAL_TICKS;
        events.push(Envelope::to_room(ServerEvent::OxygenSync {
            tick: self.oxygen_tick,
        }));

        if self.oxygen_tick == 0 {
            let mut decay_bankruptcy = false;
            for (pid, state) in self.player_states.iter_mut() {
                state.bios = (state.bios - 1).max(0);
                if state.bios == 0 {
                    tracing::warn!("Room {}: player {} ran out of air", self.room_id, pid);
                    decay_bankruptcy = true;
                }
            }
            events.push(Envelope::to_room(ServerEvent::EconomyUpdate {
                pot: self.pot,
                bios: self.bios_snapshot(),
            }));
            events.push(Envelope::to_room(ServerEvent::DecayNotification));

            if decay_bankruptcy {
                events.extend(self.end_round(EndReason::Bankruptcy));
                return events;
            }
        }

        if self.time_remaining == 0 {
            tracing::warn!("Room {}: round {} timed out", self.room_id, self.round);
            events.extend(self.end_round(EndReason::Timeout));
        }

        events
    }

    /// Resolve the current round. No-op outside GameLoop, so the timer and
    /// the both-submitted path cannot both fire for the same round.
    pub fn end_round(&mut self, reason: EndReason) -> Vec<Envelope> {
        let mut events = Vec::new();

        if self.players.len() < crate::game::constants::ROOM_CAPACITY {
            tracing::warn!(
                "Room {}: aborting resolution with {} player(s)",
                self.room_id,
                self.players.len()
            );
            self.cancel_timer();
            self.force_lobby();
            return events;
        }
        if self.phase != GamePhase::GameLoop {
            tracing::warn!(
                "Room {}: resolution requested outside GameLoop (phase={:?})",
                self.room_id,
                self.phase
            );
            return events;
        }

        self.cancel_timer();
        self.try_transition(GamePhase::Resolution);

        let p1 = self.players[0].clone();
        let p2 = self.players[1].clone();

        let submissions = self
            .turn_data
            .iter()
            .map(|(pid, turn)| (pid.clone(), turn.into()))
            .collect();
        let target_hands = self
            .player_states
            .iter()
            .map(|(pid, s)| (pid.clone(), s.target_hand.clone()))
            .collect();

        let resolution = resolve_round([&p1, &p2], &submissions, &target_hands, &self.deck);
        let winner = resolution.winner_of([&p1, &p2]).map(str::to_string);
        tracing::info!(
            "Room {}: round {} resolved ({:?}, outcome {:?}, winner {:?})",
            self.room_id,
            self.round,
            reason,
            resolution.outcome,
            winner
        );

        // Rank-clash sweep runs against the deck remainder before the
        // submitted cards themselves are burned, and never touches them.
        if resolution.both_valid {
            let cards1 = &resolution.hands[&p1].cards;
            let cards2 = &resolution.hands[&p2].cards;
            let clash = clashing_ranks(cards1, cards2);
            if !clash.is_empty() {
                let excluded: HashSet<String> = cards1
                    .iter()
                    .chain(cards2.iter())
                    .map(|c| c.id.clone())
                    .collect();
                let swept = self.deck.burn_ranks(&clash, &excluded, BurnReason::RankClash);
                tracing::info!(
                    "Room {}: rank clash on {:?}, burned {} escape cards",
                    self.room_id,
                    clash,
                    swept.len()
                );
            }
        }

        // Payout. A draw discards the pot; it is never carried forward.
        if let Some(winner_id) = &winner {
            if let Some(state) = self.player_states.get_mut(winner_id) {
                state.bios += self.pot;
                state.wins += 1;
                tracing::info!(
                    "Room {}: {} takes the pot ({} bios)",
                    self.room_id,
                    winner_id,
                    self.pot
                );
            }
        } else {
            tracing::info!("Room {}: draw, pot of {} discarded", self.room_id, self.pot);
        }
        self.pot = 0;

        let submitted_ids: Vec<String> = [&p1, &p2]
            .iter()
            .filter_map(|pid| self.turn_data.get(*pid))
            .filter_map(|turn| turn.card_ids.as_ref())
            .flatten()
            .cloned()
            .collect();
        if !submitted_ids.is_empty() {
            let burned = self.deck.burn(&submitted_ids, BurnReason::Burned);
            tracing::info!("Room {}: burned {} submitted cards", self.room_id, burned);
        }

        for pid in [&p1, &p2] {
            let locked = self
                .turn_data
                .get(pid.as_str())
                .and_then(|turn| turn.target_id.clone());
            if let (Some(target_id), Some(state)) = (locked, self.player_states.get_mut(pid.as_str()))
            {
                if let Some(target) = state.target_hand.iter_mut().find(|t| t.id == target_id) {
                    target.used = true;
                }
            }
        }

        let revealed_targets = [&p1, &p2]
            .iter()
            .map(|pid| {
                let value = self
                    .turn_data
                    .get(pid.as_str())
                    .and_then(|turn| turn.target_id.as_deref())
                    .and_then(|tid| {
                        self.player_states
                            .get(pid.as_str())
                            .and_then(|s| s.target_hand.iter().find(|t| t.id == tid))
                    })
                    .map(|t| t.value);
                (pid.to_string(), value)
            })
            .collect();

        let game_over = self.check_match_end(&p1, &p2);

        let updated_wins = self
            .player_states
            .iter()
            .map(|(pid, s)| (pid.clone(), s.wins))
            .collect();

        events.push(Envelope::to_room(ServerEvent::RoundResult {
            outcome: resolution.outcome,
            winner,
            hands: resolution.hands,
            updated_deck: self.deck.cards().to_vec(),
            updated_bios: self.bios_snapshot(),
            updated_wins,
            revealed_targets,
            reason,
            game_over,
        }));

        events
    }

    /// Valid only from Resolution: player asked for the next round.
    pub fn request_next_round(&mut self) -> Vec<Envelope> {
        if self.phase != GamePhase::Resolution {
            tracing::warn!(
                "Room {}: next-round request ignored (phase={:?})",
                self.room_id,
                self.phase
            );
            return Vec::new();
        }
        self.start_round()
    }

    /// Terminal checks in strict precedence: bankruptcy, then dominance,
    /// then the round limit. Returns the payload when the match ends.
    fn check_match_end(&mut self, p1: &str, p2: &str) -> Option<GameOver> {
        let bios1 = self.player_states.get(p1).map(|s| s.bios).unwrap_or(0);
        let bios2 = self.player_states.get(p2).map(|s| s.bios).unwrap_or(0);
        let wins1 = self.player_states.get(p1).map(|s| s.wins).unwrap_or(0);
        let wins2 = self.player_states.get(p2).map(|s| s.wins).unwrap_or(0);

        let verdict = if bios1 <= 0 || bios2 <= 0 {
            let winner = match (bios1 <= 0, bios2 <= 0) {
                (true, true) => None,
                (true, false) => Some(p2.to_string()),
                (false, true) => Some(p1.to_string()),
                (false, false) => unreachable!(),
            };
            Some((GameOverReason::Bankruptcy, winner))
        } else if wins1 >= WINS_FOR_DOMINANCE {
            Some((GameOverReason::Dominance, Some(p1.to_string())))
        } else if wins2 >= WINS_FOR_DOMINANCE {
            Some((GameOverReason::Dominance, Some(p2.to_string())))
        } else if self.round >= ROUND_LIMIT {
            Some((GameOverReason::RoundLimit, self.richest_player()))
        } else {
            None
        };

        let (reason, winner) = verdict?;
        let game_over = GameOver {
            winner,
            reason,
            final_bios: self.bios_snapshot(),
        };
        tracing::warn!("Room {}: match over {:?}", self.room_id, game_over);
        self.try_transition(GamePhase::GameOver);
        self.game_over = Some(game_over.clone());
        Some(game_over)
    }

    fn end_match_by_round_limit(&mut self) -> GameOver {
        let game_over = GameOver {
            winner: self.richest_player(),
            reason: GameOverReason::RoundLimit,
            final_bios: self.bios_snapshot(),
        };
        tracing::info!(
            "Room {}: round limit reached, final standings {:?}",
            self.room_id,
            game_over.final_bios
        );
        self.cancel_timer();
        self.try_transition(GamePhase::GameOver);
        self.game_over = Some(game_over.clone());
        game_over
    }

    /// Higher balance wins the round-limit comparison; equal is a draw.
    fn richest_player(&self) -> Option<String> {
        let mut best: Option<(&String, i64)> = None;
        let mut tied = false;
        for (pid, state) in &self.player_states {
            match best {
                None => best = Some((pid, state.bios)),
                Some((_, top)) if state.bios > top => {
                    best = Some((pid, state.bios));
                    tied = false;
                }
                Some((_, top)) if state.bios == top => tied = true,
                _ => {}
            }
        }
        match best {
            Some((pid, _)) if !tied => Some(pid.clone()),
            _ => None,
        }
    }
}
